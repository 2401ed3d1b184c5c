//! Test utilities for srcgen.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests.
//!
//! - [`init_test_logging`] - One-time tracing setup for tests
//! - [`InMemoryRepository`] - An [`ArtifactRepository`] backed by a map of descriptors
//! - [`RecordingProcessor`] - A [`Processor`] that records what it was given
//! - [`MavenFixture`] - A Maven layout directory on disk, usable as a `file://` remote
//! - [`write_jar`] / [`write_jar_bytes`] - Build zip archives on disk

mod maven;

pub use maven::MavenFixture;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::artifact::{Coordinate, Dependency, ManagedDependency};
use crate::core::SrcgenError;
use crate::generator::{Diagnostic, GenerationRequest, ProcessOutcome, Processor};
use crate::resolver::{ArtifactRepository, ResolveError};

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG` when set, otherwise stays silent.
/// Only the first call has an effect.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Write a zip archive with UTF-8 text entries.
pub fn write_jar(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let entries: Vec<(&str, &[u8])> =
        entries.iter().map(|(name, content)| (*name, content.as_bytes())).collect();
    write_jar_bytes(path, &entries)
}

/// Write a zip archive with raw entries. Names ending in `/` become directories.
pub fn write_jar_bytes(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options)?;
        } else {
            zip.start_file(*name, options)?;
            zip.write_all(content)?;
        }
    }

    zip.finish().context("Failed to finish archive")?;
    Ok(())
}

/// Key of a descriptor: group, artifact and version.
fn descriptor_key(coordinate: &Coordinate) -> String {
    format!("{}:{}:{}", coordinate.group_id(), coordinate.artifact_id(), coordinate.version())
}

/// An [`ArtifactRepository`] held in memory.
///
/// Every coordinate has a file under `root` unless it was [withheld](Self::withhold);
/// files registered with [`publish`](Self::publish) resolve to their real path.
/// Coordinates without a descriptor have no dependencies.
#[derive(Debug)]
pub struct InMemoryRepository {
    root: PathBuf,
    descriptors: HashMap<String, Vec<Dependency>>,
    management: HashMap<String, Vec<ManagedDependency>>,
    files: HashMap<Coordinate, PathBuf>,
    withheld: HashSet<Coordinate>,
    descriptor_reads: Mutex<Vec<Coordinate>>,
    file_requests: Mutex<Vec<Coordinate>>,
}

impl InMemoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            descriptors: HashMap::new(),
            management: HashMap::new(),
            files: HashMap::new(),
            withheld: HashSet::new(),
            descriptor_reads: Mutex::new(Vec::new()),
            file_requests: Mutex::new(Vec::new()),
        }
    }

    /// Declare the dependencies of `coordinate` (`group:artifact:version`).
    ///
    /// # Panics
    ///
    /// Panics if `coordinate` does not parse.
    pub fn add_descriptor(&mut self, coordinate: &str, dependencies: Vec<Dependency>) -> &mut Self {
        let coordinate: Coordinate = coordinate.parse().expect("valid coordinate");
        self.descriptors.insert(descriptor_key(&coordinate), dependencies);
        self
    }

    /// Declare the dependency management of `coordinate` (`group:artifact:version`).
    ///
    /// # Panics
    ///
    /// Panics if `coordinate` does not parse.
    pub fn add_management(&mut self, coordinate: &str, managed: Vec<ManagedDependency>) -> &mut Self {
        let coordinate: Coordinate = coordinate.parse().expect("valid coordinate");
        self.management.insert(descriptor_key(&coordinate), managed);
        self
    }

    /// Bind `coordinate` to an existing file.
    pub fn publish(&mut self, coordinate: Coordinate, path: impl Into<PathBuf>) -> &mut Self {
        self.withheld.remove(&coordinate);
        self.files.insert(coordinate, path.into());
        self
    }

    /// Write a jar for `coordinate` under `root` and bind it.
    pub fn publish_jar(&mut self, coordinate: &Coordinate, entries: &[(&str, &str)]) -> Result<PathBuf> {
        let path = self.default_path(coordinate);
        write_jar(&path, entries)?;
        self.publish(coordinate.clone(), path.clone());
        Ok(path)
    }

    /// Make `coordinate` unavailable.
    pub fn withhold(&mut self, coordinate: Coordinate) -> &mut Self {
        self.files.remove(&coordinate);
        self.withheld.insert(coordinate);
        self
    }

    /// Coordinates whose descriptor was read, in order.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn descriptor_reads(&self) -> Vec<Coordinate> {
        self.descriptor_reads.lock().unwrap().clone()
    }

    /// Coordinates whose file was requested, in order.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn file_requests(&self) -> Vec<Coordinate> {
        self.file_requests.lock().unwrap().clone()
    }

    fn default_path(&self, coordinate: &Coordinate) -> PathBuf {
        let mut name = format!("{}-{}", coordinate.artifact_id(), coordinate.version());
        if !coordinate.classifier().is_empty() {
            name.push('-');
            name.push_str(coordinate.classifier());
        }
        name.push('.');
        name.push_str(coordinate.extension());
        self.root.join(coordinate.group_id()).join(name)
    }
}

impl ArtifactRepository for InMemoryRepository {
    async fn dependencies(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, ResolveError> {
        self.descriptor_reads.lock().unwrap().push(coordinate.clone());
        Ok(self.descriptors.get(&descriptor_key(coordinate)).cloned().unwrap_or_default())
    }

    async fn managed_dependencies(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<ManagedDependency>, ResolveError> {
        Ok(self.management.get(&descriptor_key(coordinate)).cloned().unwrap_or_default())
    }

    async fn artifact_file(&self, coordinate: &Coordinate) -> Result<PathBuf, ResolveError> {
        self.file_requests.lock().unwrap().push(coordinate.clone());
        if self.withheld.contains(coordinate) {
            return Err(ResolveError::NotFound {
                coordinate: coordinate.clone(),
            });
        }
        Ok(self.files.get(coordinate).cloned().unwrap_or_else(|| self.default_path(coordinate)))
    }
}

/// What a [`RecordingProcessor`] saw in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub unit_names: Vec<String>,
    pub classpath: Vec<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub processor_path: Vec<PathBuf>,
}

/// A [`Processor`] returning a fixed outcome and recording every call.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    outcome: ProcessOutcome,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingProcessor {
    pub fn succeeding() -> Self {
        Self {
            outcome: ProcessOutcome {
                success: true,
                diagnostics: Vec::new(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.outcome.diagnostics.push(diagnostic);
        self
    }

    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Processor for RecordingProcessor {
    fn name(&self) -> &str {
        "recording"
    }

    async fn process(&self, request: &GenerationRequest<'_>) -> Result<ProcessOutcome, SrcgenError> {
        self.calls.lock().unwrap().push(RecordedCall {
            unit_names: request.units.iter().map(|u| u.name().to_string()).collect(),
            classpath: request.classpath.entries().to_vec(),
            output_directory: request.options.output_directory.clone(),
            processor_path: request.options.processor_path.clone(),
        });
        Ok(self.outcome.clone())
    }
}
