//! Maven repository layout.
//!
//! ```text
//! <base>/<group with '.' as '/'>/<artifact>/<version>/<artifact>-<file version>[-<classifier>].<extension>
//! ```
//!
//! The file version equals the version, except for snapshots deployed to a
//! remote with unique versions, where `-SNAPSHOT` is replaced by
//! `-<timestamp>-<buildNumber>` as published in `maven-metadata.xml`.

use std::path::{Path, PathBuf};

use crate::artifact::Coordinate;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Directory of `coordinate`'s version, relative to a repository root, with `/` separators.
pub fn version_directory(coordinate: &Coordinate) -> String {
    format!(
        "{}/{}/{}",
        coordinate.group_id().replace('.', "/"),
        coordinate.artifact_id(),
        coordinate.version()
    )
}

/// Relative path of `coordinate`'s file named after `file_version`.
pub fn artifact_path(coordinate: &Coordinate, file_version: &str) -> String {
    let mut path = format!(
        "{}/{}-{}",
        version_directory(coordinate),
        coordinate.artifact_id(),
        file_version
    );
    if !coordinate.classifier().is_empty() {
        path.push('-');
        path.push_str(coordinate.classifier());
    }
    path.push('.');
    path.push_str(coordinate.extension());
    path
}

/// Relative path of the version-level metadata of a snapshot.
pub fn metadata_path(coordinate: &Coordinate) -> String {
    format!("{}/maven-metadata.xml", version_directory(coordinate))
}

/// Unique file version of a snapshot, read from its `maven-metadata.xml`.
///
/// Returns `Ok(None)` when the metadata has no timestamped snapshot (the
/// files were deployed under the `-SNAPSHOT` name).
pub fn snapshot_file_version(version: &str, metadata: &str) -> Result<Option<String>, String> {
    let document = roxmltree::Document::parse(metadata).map_err(|e| e.to_string())?;
    let snapshot = document
        .root_element()
        .children()
        .find(|n| n.has_tag_name("versioning"))
        .and_then(|versioning| versioning.children().find(|n| n.has_tag_name("snapshot")));

    let Some(snapshot) = snapshot else {
        return Ok(None);
    };
    let field = |name: &str| {
        snapshot
            .children()
            .find(|n| n.has_tag_name(name))
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    };

    match (field("timestamp"), field("buildNumber")) {
        (Some(timestamp), Some(build)) => {
            let base = version.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(version);
            Ok(Some(format!("{base}-{timestamp}-{build}")))
        }
        _ => Ok(None),
    }
}

/// The local repository: a download cache in Maven layout.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    base: PathBuf,
}

impl LocalRepository {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Where `coordinate` is stored. Snapshots are always stored under their `-SNAPSHOT` name.
    pub fn path_for(&self, coordinate: &Coordinate) -> PathBuf {
        let relative = artifact_path(coordinate, coordinate.version());
        relative.split('/').fold(self.base.clone(), |path, segment| path.join(segment))
    }
}
