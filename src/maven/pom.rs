//! POM parsing.
//!
//! Only the parts of the project model that dependency collection needs are
//! read: identity, parent, properties, dependencies and dependency management.
//! Values are kept as written; interpolation happens in [`super::model`].

use std::collections::HashMap;

use roxmltree::{Document, Node, ParsingOptions};

/// Reference to a parent POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A `<dependency>` element as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub kind: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<String>,
    pub system_path: Option<String>,
    pub exclusions: Vec<(String, String)>,
}

impl RawDependency {
    /// Dependency management key: group, artifact, type and classifier.
    pub fn management_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.kind.as_deref().unwrap_or("jar"),
            self.classifier.as_deref().unwrap_or("")
        )
    }

    /// Apply `interpolate` to every textual field.
    #[must_use]
    pub fn map_values(&self, interpolate: impl Fn(&str) -> String) -> Self {
        let opt = |value: &Option<String>| value.as_deref().map(&interpolate);
        Self {
            group_id: interpolate(&self.group_id),
            artifact_id: interpolate(&self.artifact_id),
            version: opt(&self.version),
            kind: opt(&self.kind),
            classifier: opt(&self.classifier),
            scope: opt(&self.scope),
            optional: opt(&self.optional),
            system_path: opt(&self.system_path),
            exclusions: self
                .exclusions
                .iter()
                .map(|(g, a)| (interpolate(g), interpolate(a)))
                .collect(),
        }
    }
}

/// A parsed POM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: HashMap<String, String>,
    pub dependencies: Vec<RawDependency>,
    pub dependency_management: Vec<RawDependency>,
}

/// Parse a POM document.
pub fn parse(xml: &str) -> Result<RawPom, String> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let document = Document::parse_with_options(xml, options).map_err(|e| e.to_string())?;
    let project = document.root_element();
    if !project.has_tag_name("project") {
        return Err(format!("root element is <{}>, expected <project>", project.tag_name().name()));
    }

    let parent = match child(project, "parent") {
        Some(node) => Some(ParentRef {
            group_id: required(node, "groupId", "parent")?,
            artifact_id: required(node, "artifactId", "parent")?,
            version: required(node, "version", "parent")?,
        }),
        None => None,
    };

    let properties = child(project, "properties")
        .map(|node| {
            node.children()
                .filter(Node::is_element)
                .map(|p| (p.tag_name().name().to_string(), p.text().unwrap_or_default().trim().to_string()))
                .collect()
        })
        .unwrap_or_default();

    let dependencies = match child(project, "dependencies") {
        Some(node) => parse_dependencies(node)?,
        None => Vec::new(),
    };
    let dependency_management =
        match child(project, "dependencyManagement").and_then(|n| child(n, "dependencies")) {
            Some(node) => parse_dependencies(node)?,
            None => Vec::new(),
        };

    Ok(RawPom {
        group_id: text(project, "groupId"),
        artifact_id: text(project, "artifactId"),
        version: text(project, "version"),
        packaging: text(project, "packaging"),
        parent,
        properties,
        dependencies,
        dependency_management,
    })
}

fn parse_dependencies(list: Node<'_, '_>) -> Result<Vec<RawDependency>, String> {
    list.children()
        .filter(|n| n.has_tag_name("dependency"))
        .map(|node| {
            let exclusions = child(node, "exclusions")
                .map(|ex| {
                    ex.children()
                        .filter(|n| n.has_tag_name("exclusion"))
                        .map(|e| {
                            (
                                text(e, "groupId").unwrap_or_else(|| "*".to_string()),
                                text(e, "artifactId").unwrap_or_else(|| "*".to_string()),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();

            Ok(RawDependency {
                group_id: required(node, "groupId", "dependency")?,
                artifact_id: required(node, "artifactId", "dependency")?,
                version: text(node, "version"),
                kind: text(node, "type"),
                classifier: text(node, "classifier"),
                scope: text(node, "scope"),
                optional: text(node, "optional"),
                system_path: text(node, "systemPath"),
                exclusions,
            })
        })
        .collect()
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn required(node: Node<'_, '_>, name: &str, context: &str) -> Result<String, String> {
    text(node, name).ok_or_else(|| format!("<{context}> without <{name}>"))
}
