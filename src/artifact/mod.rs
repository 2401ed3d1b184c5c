//! Artifact identity: coordinates, dependency edges and resolved files.

mod coordinate;
mod dependency;

pub use coordinate::{ArtifactKey, Coordinate, DEFAULT_EXTENSION, SOURCES_CLASSIFIER};
pub use dependency::{Dependency, Exclusion, ManagedDependency, ResolvedArtifact, Scope};
