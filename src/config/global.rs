//! Global configuration for srcgen.
//!
//! The configuration file lives in a platform-specific location:
//!
//! - **Unix/macOS**: `~/.srcgen/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\srcgen\config.toml`
//!
//! It can be replaced with `--config <FILE>` or the `SRCGEN_CONFIG` environment
//! variable. A missing file means defaults everywhere.
//!
//! # File Format
//!
//! ```toml
//! local_repository = "~/.m2/repository"
//! timeout_secs = 60
//! offline = false
//! javac = "/usr/lib/jvm/java-17/bin/javac"
//! source_suffix = ".java"
//! family = "exact"
//!
//! [[remotes]]
//! id = "central"
//! url = "https://repo.maven.apache.org/maven2/"
//!
//! [[remotes]]
//! id = "internal"
//! url = "https://nexus.example.com/repository/maven-public/"
//! ```
//!
//! Declaring `[[remotes]]` replaces the default list (central and Sonatype snapshots).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::maven::RemoteRepository;
use crate::resolver::FamilyRule;
use crate::sources::DEFAULT_SOURCE_SUFFIX;

/// Default location of the local repository.
pub const DEFAULT_LOCAL_REPOSITORY: &str = "~/.m2/repository";

const fn default_timeout_secs() -> u64 {
    60
}

/// User-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Local repository path; `~` and environment variables are expanded
    pub local_repository: String,

    /// Remote repositories, tried in order
    pub remotes: Vec<RemoteRepository>,

    /// Timeout of a single HTTP request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Resolve from the local repository only
    pub offline: bool,

    /// Java compiler; looked up on `PATH` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javac: Option<PathBuf>,

    /// Suffix of the archive entries turned into compilation units
    pub source_suffix: String,

    /// Which dependencies count as part of a root's family
    pub family: FamilyRule,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            local_repository: DEFAULT_LOCAL_REPOSITORY.to_string(),
            remotes: vec![RemoteRepository::central(), RemoteRepository::snapshots()],
            timeout_secs: default_timeout_secs(),
            offline: false,
            javac: None,
            source_suffix: DEFAULT_SOURCE_SUFFIX.to_string(),
            family: FamilyRule::default(),
        }
    }
}

impl GlobalConfig {
    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing file yields the defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))?;
        config.validate().with_context(|| format!("Invalid global config {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// Platform default path of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("srcgen")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".srcgen")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// The local repository with `~` and environment variables expanded.
    pub fn local_repository_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.local_repository).with_context(|| {
            format!("Failed to expand local repository path '{}'", self.local_repository)
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.source_suffix.is_empty() {
            anyhow::bail!("source_suffix must not be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        for remote in &self.remotes {
            let supported = ["http://", "https://", "file://"];
            if !supported.iter().any(|scheme| remote.url.starts_with(scheme)) {
                anyhow::bail!("remote '{}' has unsupported URL {}", remote.id, remote.url);
            }
        }
        Ok(())
    }
}
