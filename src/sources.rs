//! Source extraction: turning `sources` archives into in-memory compilation units.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::core::SrcgenError;

/// Suffix of the entries extracted from source archives by default.
pub const DEFAULT_SOURCE_SUFFIX: &str = ".java";

/// One named source text handed to the generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    name: String,
    content: String,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Logical name: the path of the entry inside its archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Virtual URI of the unit, `string://<name>`.
    pub fn uri(&self) -> String {
        format!("string://{}", self.name)
    }
}

/// Reads source archives into [`CompilationUnit`]s.
#[derive(Debug, Clone)]
pub struct SourceExtractor {
    suffix: String,
}

impl Default for SourceExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_SUFFIX)
    }
}

impl SourceExtractor {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Extract every archive in order into one flat list of units.
    ///
    /// A unit whose name was already produced by an earlier archive is skipped,
    /// so names are unique across the result.
    pub fn extract_all(&self, archives: &[PathBuf]) -> Result<Vec<CompilationUnit>, SrcgenError> {
        let mut names = HashSet::new();
        let mut units = Vec::new();

        for archive in archives {
            for unit in self.extract_archive(archive)? {
                if names.insert(unit.name.clone()) {
                    units.push(unit);
                } else {
                    warn!("Skipping duplicate compilation unit {} from {}", unit.name, archive.display());
                }
            }
        }

        Ok(units)
    }

    /// Extract the matching entries of a single archive, in archive order.
    pub fn extract_archive(&self, archive: &Path) -> Result<Vec<CompilationUnit>, SrcgenError> {
        let failed = |entry: &str, cause: String| SrcgenError::ExtractionFailed {
            archive: archive.display().to_string(),
            entry: entry.to_string(),
            cause,
        };

        let file = File::open(archive).map_err(|e| failed("", e.to_string()))?;
        let mut zip = ZipArchive::new(file).map_err(|e| failed("", e.to_string()))?;
        let mut units = Vec::new();

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(|e| failed("", e.to_string()))?;
            let name = entry.name().to_string();

            if entry.is_dir() || !name.ends_with(&self.suffix) {
                continue;
            }
            if entry.enclosed_name().is_none() {
                return Err(failed(&name, "entry path escapes the archive".to_string()));
            }

            let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry.read_to_end(&mut bytes).map_err(|e| failed(&name, e.to_string()))?;
            let content = String::from_utf8(bytes).map_err(|e| failed(&name, e.to_string()))?;

            units.push(CompilationUnit::new(name, content));
        }

        debug!("Extracted {} unit(s) from {}", units.len(), archive.display());
        Ok(units)
    }
}
