//! Artifact resolution: walking a root's dependency graph under a selection policy.
//!
//! Resolution is split across two capabilities:
//!
//! - [`ArtifactRepository`] answers "what does this artifact depend on?" and
//!   "where is this artifact's file?". The [`crate::maven`] module implements it
//!   on top of a Maven repository layout.
//! - [`ArtifactResolver`] turns a root coordinate and a [`DependencySelector`]
//!   into the flat, deduplicated list of resolved artifacts. [`DependencyCollector`]
//!   implements it for any repository.
//!
//! The selection policy itself lives in [`selector`].

mod collector;
pub mod selector;

use std::path::PathBuf;

use thiserror::Error;

use crate::artifact::{Coordinate, Dependency, ManagedDependency, ResolvedArtifact};

pub use collector::{CollectedNode, DependencyCollector};
pub use selector::{DependencySelector, FamilyRule, SelectionMode, Variant};

/// Failures of the artifact resolution service.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No configured repository has the artifact.
    #[error("artifact {coordinate} not found in any repository")]
    NotFound {
        coordinate: Coordinate,
    },

    /// A remote repository could not be reached or answered with an error.
    #[error("transfer of {url} failed: {reason}")]
    Transfer {
        url: String,
        reason: String,
    },

    /// A downloaded file does not match its published checksum.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    /// A descriptor could not be parsed or its model could not be built.
    #[error("invalid descriptor for {coordinate}: {reason}")]
    InvalidDescriptor {
        coordinate: String,
        reason: String,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One resolution call: a root coordinate and the variant it is requested as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub root: Coordinate,
    pub variant: Variant,
}

impl ResolveRequest {
    /// Request the source variant of `root`.
    pub fn sources(root: &Coordinate) -> Self {
        Self {
            root: root.sources(),
            variant: Variant::Source,
        }
    }

    /// Request `root` as given.
    pub fn binary(root: &Coordinate) -> Self {
        Self {
            root: root.clone(),
            variant: Variant::Binary,
        }
    }
}

/// Descriptor and file access for a repository of artifacts.
#[allow(async_fn_in_trait)]
pub trait ArtifactRepository {
    /// Declared dependencies of `coordinate`, with inherited and managed values applied.
    ///
    /// An artifact without a descriptor has no dependencies.
    async fn dependencies(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>, ResolveError>;

    /// Dependency management declared by `coordinate`'s descriptor, imports expanded.
    ///
    /// Only the requested root's management is consulted, and only for edges
    /// below its direct dependencies.
    async fn managed_dependencies(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<ManagedDependency>, ResolveError>;

    /// Local file of `coordinate`, downloading it first if needed.
    async fn artifact_file(&self, coordinate: &Coordinate) -> Result<PathBuf, ResolveError>;
}

/// The artifact resolution service.
#[allow(async_fn_in_trait)]
pub trait ArtifactResolver {
    /// Resolve `request.root` and its selected transitive dependencies.
    ///
    /// `selector` is consulted for every edge encountered; its state is scoped
    /// to this call.
    async fn resolve(
        &self,
        request: &ResolveRequest,
        selector: &mut DependencySelector,
    ) -> Result<Vec<ResolvedArtifact>, ResolveError>;
}
