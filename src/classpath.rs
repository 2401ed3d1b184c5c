//! Classpath assembly for symbol resolution during generation.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::artifact::ResolvedArtifact;
use crate::core::SrcgenError;

/// Duplicate-free, insertion-ordered set of binary artifact files.
///
/// Only grows. Artifacts carrying a classifier (sources, tests, ...) are never
/// admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the file of a binary artifact.
    ///
    /// Returns `false` when the artifact has a classifier or its file is
    /// already present.
    pub fn add(&mut self, artifact: &ResolvedArtifact) -> bool {
        if !artifact.coordinate.classifier().is_empty() {
            debug!("{} not added to classpath, it has a classifier", artifact.coordinate);
            return false;
        }
        self.insert(&artifact.path)
    }

    fn insert(&mut self, path: &Path) -> bool {
        if self.seen.insert(path.to_path_buf()) {
            self.entries.push(path.to_path_buf());
            true
        } else {
            false
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Platform path-list form (`:` or `;` separated), optionally preceded by `extra`.
    pub fn join(&self, extra: &[PathBuf]) -> Result<OsString, SrcgenError> {
        std::env::join_paths(extra.iter().chain(self.entries.iter())).map_err(|e| {
            SrcgenError::InvalidConfiguration {
                path: e.to_string(),
                reason: "classpath entry contains the path separator".to_string(),
            }
        })
    }
}
