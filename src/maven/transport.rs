//! Fetching files from remote repositories over HTTP(S) or `file://`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolver::ResolveError;

/// Maven Central.
pub const CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2/";

/// Sonatype OSS snapshots.
pub const SNAPSHOTS_URL: &str = "https://oss.sonatype.org/content/repositories/snapshots/";

/// A remote repository in Maven layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub id: String,
    pub url: String,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    pub fn central() -> Self {
        Self::new("central", CENTRAL_URL)
    }

    pub fn snapshots() -> Self {
        Self::new("snapshots", SNAPSHOTS_URL)
    }

    /// Absolute URL of `relative` (a `/`-separated layout path) in this repository.
    pub fn url_of(&self, relative: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), relative.trim_start_matches('/'))
    }
}

/// HTTP client plus local-file access for `file://` remotes.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    pub fn new(timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("srcgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::Transfer {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
        })
    }

    /// Contents of `url`, or `None` if the remote does not have it.
    pub async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        if let Some(path) = file_url_path(url) {
            return match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ResolveError::Transfer {
                    url: url.to_string(),
                    reason: e.to_string(),
                }),
            };
        }

        let transfer = |reason: String| ResolveError::Transfer {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(|e| transfer(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("{url} not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(transfer(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await.map_err(|e| transfer(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Local path of a `file://` URL, percent-decoded.
fn file_url_path(url: &str) -> Option<PathBuf> {
    let parsed = reqwest::Url::parse(url).ok()?;
    if parsed.scheme() != "file" {
        return None;
    }
    parsed.to_file_path().ok()
}
