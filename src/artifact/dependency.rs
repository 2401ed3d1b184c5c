//! Dependency edges, scopes and resolved artifacts.

use std::fmt;
use std::path::PathBuf;

use super::{ArtifactKey, Coordinate};

/// Dependency scope as declared in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
    /// Anything a descriptor declares that Maven does not define
    Other(String),
}

impl Scope {
    /// Parse a declared scope. An empty string is the default `compile` scope.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "compile" => Self::Compile,
            "provided" => Self::Provided,
            "runtime" => Self::Runtime,
            "test" => Self::Test,
            "system" => Self::System,
            "import" => Self::Import,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Compile => "compile",
            Self::Provided => "provided",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::System => "system",
            Self::Import => "import",
            Self::Other(other) => other,
        }
    }

    /// Effective scope of a dependency declared with `self` under a parent whose
    /// effective scope is `parent`.
    ///
    /// `system` and `test` always keep themselves; a `compile` parent passes the
    /// declared scope through; `test` and `runtime` parents impose themselves;
    /// `system` and `provided` parents turn everything into `provided`.
    #[must_use]
    pub fn derive(&self, parent: &Self) -> Self {
        if matches!(self, Self::System | Self::Test) {
            return self.clone();
        }
        match parent {
            Self::Compile => self.clone(),
            Self::Test | Self::Runtime => parent.clone(),
            Self::System | Self::Provided => Self::Provided,
            _ => Self::Runtime,
        }
    }

    /// The wider of two scopes reached for the same artifact along different paths.
    ///
    /// `compile` beats `runtime`, `runtime` beats `provided` and `provided`
    /// beats `test`. `system` and unknown scopes only stand when they are the
    /// sole candidate. On a tie `self` is kept.
    #[must_use]
    pub fn widest(&self, other: &Self) -> Self {
        if other.mediation_rank() > self.mediation_rank() {
            other.clone()
        } else {
            self.clone()
        }
    }

    fn mediation_rank(&self) -> u8 {
        match self {
            Self::Compile => 4,
            Self::Runtime => 3,
            Self::Provided => 2,
            Self::Test => 1,
            Self::System | Self::Import | Self::Other(_) => 0,
        }
    }

    /// Scopes visible to a compile classpath.
    pub fn on_compile_classpath(&self) -> bool {
        matches!(self, Self::Compile | Self::Provided | Self::System)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{group, artifact}` pattern removed from a dependency's subtree. `*` matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        (self.group_id == "*" || self.group_id == coordinate.group_id())
            && (self.artifact_id == "*" || self.artifact_id == coordinate.artifact_id())
    }
}

/// One declared dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
    /// Local file of a `system` dependency; such artifacts are never fetched
    pub system_path: Option<PathBuf>,
}

impl Dependency {
    /// A non-optional dependency without exclusions.
    pub fn new(coordinate: Coordinate, scope: Scope) -> Self {
        Self {
            coordinate,
            scope,
            optional: false,
            exclusions: Vec::new(),
            system_path: None,
        }
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    #[must_use]
    pub fn with_system_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.system_path = Some(path.into());
        self
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.coordinate, self.scope)?;
        if self.optional {
            write!(f, ", optional")?;
        }
        write!(f, ")")
    }
}

/// A dependency management entry of the requested root.
///
/// Every value that is set replaces the one declared on a matching edge;
/// exclusions are added to the edge's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDependency {
    pub key: ArtifactKey,
    pub version: Option<String>,
    pub scope: Option<Scope>,
    pub optional: Option<bool>,
    pub exclusions: Vec<Exclusion>,
}

impl ManagedDependency {
    /// An entry for `key` that manages nothing yet.
    pub const fn new(key: ArtifactKey) -> Self {
        Self {
            key,
            version: None,
            scope: None,
            optional: None,
            exclusions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub const fn with_optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    #[must_use]
    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn manages(&self, dependency: &Dependency) -> bool {
        dependency.coordinate.key() == self.key
    }

    /// `dependency` with the managed values in place.
    #[must_use]
    pub fn apply(&self, mut dependency: Dependency) -> Dependency {
        if let Some(version) = &self.version {
            dependency.coordinate = dependency.coordinate.with_version(version.as_str());
        }
        if let Some(scope) = &self.scope {
            dependency.scope = scope.clone();
        }
        if let Some(optional) = self.optional {
            dependency.optional = optional;
        }
        for exclusion in &self.exclusions {
            if !dependency.exclusions.contains(exclusion) {
                dependency.exclusions.push(exclusion.clone());
            }
        }
        dependency
    }
}

/// An artifact bound to its file in the local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    pub path: PathBuf,
}

impl ResolvedArtifact {
    pub fn new(coordinate: Coordinate, path: impl Into<PathBuf>) -> Self {
        Self {
            coordinate,
            path: path.into(),
        }
    }
}
