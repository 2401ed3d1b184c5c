//! Maven-style artifact coordinates.

use std::fmt;
use std::str::FromStr;

use crate::core::SrcgenError;

/// Classifier of the source variant of a package.
pub const SOURCES_CLASSIFIER: &str = "sources";

/// Extension used when a coordinate string does not name one.
pub const DEFAULT_EXTENSION: &str = "jar";

/// Identifies one published file: `group:artifact[:extension[:classifier]]:version`.
///
/// Coordinates are immutable; the `with_*` methods return modified copies.
///
/// # Examples
///
/// ```rust
/// use srcgen_cli::artifact::Coordinate;
///
/// let binary: Coordinate = "io.vertx:vertx-core:4.5.0".parse().unwrap();
/// let sources = binary.sources();
/// assert_eq!(sources.to_string(), "io.vertx:vertx-core:jar:sources:4.5.0");
/// assert!(binary.same_identity(&sources));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    group_id: String,
    artifact_id: String,
    extension: String,
    classifier: String,
    version: String,
}

/// The part of a coordinate that conflict mediation keys on (everything but the version).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// Group id
    pub group_id: String,
    /// Artifact id
    pub artifact_id: String,
    /// File extension
    pub extension: String,
    /// Classifier, empty for the main artifact
    pub classifier: String,
}

impl Coordinate {
    /// Build a coordinate from its parts. An empty extension becomes `jar`.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        extension: impl Into<String>,
        classifier: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let extension = extension.into();
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            extension: if extension.is_empty() {
                DEFAULT_EXTENSION.to_string()
            } else {
                extension
            },
            classifier: classifier.into(),
            version: version.into(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The source variant: same group, artifact, extension and version, classifier `sources`.
    #[must_use]
    pub fn sources(&self) -> Self {
        self.with_classifier(SOURCES_CLASSIFIER)
    }

    #[must_use]
    pub fn with_classifier(&self, classifier: impl Into<String>) -> Self {
        Self {
            classifier: classifier.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self.clone()
        }
    }

    /// The descriptor (POM) of this artifact. Descriptors never carry a classifier.
    #[must_use]
    pub fn pom(&self) -> Self {
        Self::new(self.group_id.clone(), self.artifact_id.clone(), "pom", "", self.version.clone())
    }

    pub fn is_sources(&self) -> bool {
        self.classifier == SOURCES_CLASSIFIER
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with("-SNAPSHOT")
    }

    /// Same group and artifact id, whatever the classifier, extension or version.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            extension: self.extension.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.extension)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

impl FromStr for Coordinate {
    type Err = SrcgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| SrcgenError::MalformedCoordinate {
            coordinate: s.to_string(),
            reason: reason.to_string(),
        };

        if s.chars().any(char::is_whitespace) {
            return Err(malformed("whitespace is not allowed"));
        }

        let parts: Vec<&str> = s.split(':').collect();
        let (group, artifact, extension, classifier, version) = match parts.as_slice() {
            [g, a, v] => (*g, *a, "", "", *v),
            [g, a, e, v] => (*g, *a, *e, "", *v),
            [g, a, e, c, v] => {
                if c.is_empty() {
                    return Err(malformed("classifier must not be empty"));
                }
                (*g, *a, *e, *c, *v)
            }
            _ => {
                return Err(malformed(
                    "expected group:artifact[:extension[:classifier]]:version",
                ));
            }
        };

        if group.is_empty() {
            return Err(malformed("group id must not be empty"));
        }
        if artifact.is_empty() {
            return Err(malformed("artifact id must not be empty"));
        }
        if version.is_empty() {
            return Err(malformed("version must not be empty"));
        }

        Ok(Self::new(group, artifact, extension, classifier, version))
    }
}
