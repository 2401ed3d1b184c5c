//! On-disk Maven repositories for tests.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::write_jar;
use crate::artifact::{Coordinate, Dependency, Scope};
use crate::maven::RemoteRepository;
use crate::maven::layout;

/// A directory in Maven layout, usable as a `file://` remote or as a local repository.
///
/// # Examples
///
/// ```rust,ignore
/// use srcgen_cli::test_utils::MavenFixture;
///
/// # fn example() -> anyhow::Result<()> {
/// let repo = MavenFixture::new("/tmp/remote");
/// repo.publish_pom("g:a:1.0", &[])?;
/// repo.publish_jar("g:a:jar:sources:1.0", &[("g/A.java", "package g; class A {}")])?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MavenFixture {
    root: PathBuf,
}

impl MavenFixture {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `file://` URL of the repository root.
    pub fn url(&self) -> String {
        let path = self.root.display().to_string().replace('\\', "/");
        if path.starts_with('/') {
            format!("file://{path}")
        } else {
            format!("file:///{path}")
        }
    }

    pub fn remote(&self) -> RemoteRepository {
        RemoteRepository::new("fixture", self.url())
    }

    /// Where `coordinate`'s file lives in this repository.
    pub fn path_of(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(layout::artifact_path(coordinate, coordinate.version()))
    }

    /// Write raw bytes at a layout-relative path.
    pub fn write_file(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Publish a jar (or sources jar) for `coordinate`.
    pub fn publish_jar(&self, coordinate: &str, entries: &[(&str, &str)]) -> Result<PathBuf> {
        let coordinate: Coordinate = coordinate.parse()?;
        let path = self.path_of(&coordinate);
        write_jar(&path, entries)?;
        Ok(path)
    }

    /// Publish a POM for `coordinate` declaring `dependencies`.
    pub fn publish_pom(&self, coordinate: &str, dependencies: &[Dependency]) -> Result<PathBuf> {
        let coordinate: Coordinate = coordinate.parse()?;
        self.publish_pom_xml(&coordinate, &pom_xml(&coordinate, dependencies))
    }

    /// Publish a hand-written POM for `coordinate`.
    pub fn publish_pom_xml(&self, coordinate: &Coordinate, xml: &str) -> Result<PathBuf> {
        let path = self.path_of(&coordinate.pom());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, xml)?;
        Ok(path)
    }
}

fn pom_xml(coordinate: &Coordinate, dependencies: &[Dependency]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n  <modelVersion>4.0.0</modelVersion>\n  <groupId>{}</groupId>\n  <artifactId>{}</artifactId>\n  <version>{}</version>\n  <dependencies>\n",
        coordinate.group_id(),
        coordinate.artifact_id(),
        coordinate.version()
    );

    for dependency in dependencies {
        let c = &dependency.coordinate;
        let _ = write!(
            xml,
            "    <dependency>\n      <groupId>{}</groupId>\n      <artifactId>{}</artifactId>\n      <version>{}</version>\n",
            c.group_id(),
            c.artifact_id(),
            c.version()
        );
        if c.extension() != "jar" {
            let _ = writeln!(xml, "      <type>{}</type>", c.extension());
        }
        if !c.classifier().is_empty() {
            let _ = writeln!(xml, "      <classifier>{}</classifier>", c.classifier());
        }
        if dependency.scope != Scope::Compile {
            let _ = writeln!(xml, "      <scope>{}</scope>", dependency.scope);
        }
        if dependency.optional {
            xml.push_str("      <optional>true</optional>\n");
        }
        if !dependency.exclusions.is_empty() {
            xml.push_str("      <exclusions>\n");
            for exclusion in &dependency.exclusions {
                let _ = writeln!(
                    xml,
                    "        <exclusion><groupId>{}</groupId><artifactId>{}</artifactId></exclusion>",
                    exclusion.group_id, exclusion.artifact_id
                );
            }
            xml.push_str("      </exclusions>\n");
        }
        xml.push_str("    </dependency>\n");
    }

    xml.push_str("  </dependencies>\n</project>\n");
    xml
}
