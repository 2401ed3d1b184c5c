//! Maven repositories as an [`ArtifactRepository`].
//!
//! [`MavenRepository`] keeps a local repository (a download cache in Maven
//! layout, `~/.m2/repository` by default) in front of an ordered list of
//! remotes. A file missing locally is looked up in each remote in turn,
//! verified against its published SHA-256 checksum when there is one, and
//! written into the local repository.
//!
//! Descriptors are turned into dependency lists by building their effective
//! model (see [`model`]), cached for the lifetime of the repository value.

pub mod layout;
pub mod model;
pub mod pom;
pub mod transport;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::artifact::{Coordinate, Dependency, ManagedDependency};
use crate::resolver::{ArtifactRepository, ResolveError};

pub use layout::LocalRepository;
pub use model::{EffectiveModel, ModelCache, PomSource};
pub use transport::{RemoteRepository, Transport};

/// Local repository plus remotes.
#[derive(Debug)]
pub struct MavenRepository {
    local: LocalRepository,
    remotes: Vec<RemoteRepository>,
    transport: Transport,
    offline: bool,
    models: ModelCache,
}

impl MavenRepository {
    pub fn new(
        local: LocalRepository,
        remotes: Vec<RemoteRepository>,
        timeout: Duration,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            local,
            remotes,
            transport: Transport::new(timeout)?,
            offline: false,
            models: ModelCache::new(),
        })
    }

    /// Never contact remotes; only files already in the local repository resolve.
    #[must_use]
    pub const fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub const fn local(&self) -> &LocalRepository {
        &self.local
    }

    pub fn remotes(&self) -> &[RemoteRepository] {
        &self.remotes
    }

    pub const fn is_offline(&self) -> bool {
        self.offline
    }

    /// Local file of `coordinate`, downloaded if needed. `None` if no repository has it.
    pub async fn fetch(&self, coordinate: &Coordinate) -> Result<Option<PathBuf>, ResolveError> {
        let target = self.local.path_for(coordinate);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!("{} found at {}", coordinate, target.display());
            return Ok(Some(target));
        }
        if self.offline {
            debug!("{coordinate} is not in the local repository and remotes are disabled");
            return Ok(None);
        }

        for remote in &self.remotes {
            let file_version = self.file_version(remote, coordinate).await?;
            let url = remote.url_of(&layout::artifact_path(coordinate, &file_version));
            debug!("Trying {url}");

            let Some(bytes) = self.transport.fetch(&url).await? else {
                continue;
            };
            info!("Downloading {} from {}", coordinate, remote.id);
            self.verify_checksum(&url, &bytes).await?;
            write_atomically(&target, &bytes).await?;
            return Ok(Some(target));
        }

        Ok(None)
    }

    /// Version used in remote file names: unique snapshot versions come from `maven-metadata.xml`.
    async fn file_version(
        &self,
        remote: &RemoteRepository,
        coordinate: &Coordinate,
    ) -> Result<String, ResolveError> {
        let version = coordinate.version();
        if !coordinate.is_snapshot() {
            return Ok(version.to_string());
        }

        let url = remote.url_of(&layout::metadata_path(coordinate));
        let Some(metadata) = self.transport.fetch(&url).await? else {
            return Ok(version.to_string());
        };
        match layout::snapshot_file_version(version, &String::from_utf8_lossy(&metadata)) {
            Ok(Some(unique)) => Ok(unique),
            Ok(None) => Ok(version.to_string()),
            Err(reason) => {
                warn!("Ignoring unreadable {url}: {reason}");
                Ok(version.to_string())
            }
        }
    }

    async fn verify_checksum(&self, url: &str, bytes: &[u8]) -> Result<(), ResolveError> {
        let checksum_url = format!("{url}.sha256");
        let Some(published) = self.transport.fetch(&checksum_url).await? else {
            debug!("No checksum published for {url}, skipping verification");
            return Ok(());
        };

        let published = String::from_utf8_lossy(&published);
        // Either the bare digest or `<digest>  <file name>`
        let expected = published.split_whitespace().next().unwrap_or_default().to_ascii_lowercase();
        let actual = hex::encode(Sha256::digest(bytes));

        if expected != actual {
            return Err(ResolveError::ChecksumMismatch {
                url: url.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

async fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), ResolveError> {
    let io_error = |source: std::io::Error| ResolveError::Io {
        path: target.to_path_buf(),
        source,
    };

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }

    let mut name = target.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    let partial = target.with_file_name(name);

    tokio::fs::write(&partial, bytes).await.map_err(io_error)?;
    tokio::fs::rename(&partial, target).await.map_err(io_error)?;
    Ok(())
}

impl PomSource for MavenRepository {
    async fn pom(&self, coordinate: &Coordinate) -> Result<Option<String>, ResolveError> {
        let Some(path) = self.fetch(coordinate).await? else {
            return Ok(None);
        };
        let text = tokio::fs::read_to_string(&path).await.map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(text))
    }
}

impl ArtifactRepository for MavenRepository {
    async fn dependencies(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, ResolveError> {
        match model::effective_model(self, &self.models, coordinate).await? {
            Some(model) => Ok(model.dependencies.clone()),
            None => {
                warn!("No descriptor for {coordinate}, assuming it has no dependencies");
                Ok(Vec::new())
            }
        }
    }

    async fn managed_dependencies(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<ManagedDependency>, ResolveError> {
        let model = model::effective_model(self, &self.models, coordinate).await?;
        Ok(model.map(|m| m.managed_dependencies()).unwrap_or_default())
    }

    async fn artifact_file(&self, coordinate: &Coordinate) -> Result<PathBuf, ResolveError> {
        self.fetch(coordinate).await?.ok_or_else(|| ResolveError::NotFound {
            coordinate: coordinate.clone(),
        })
    }
}
