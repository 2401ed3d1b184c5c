//! Effective descriptor models.
//!
//! The effective model of a POM is what remains after inheritance from its
//! parent chain, property interpolation, expansion of imported BOMs and
//! application of dependency management. Only the dependency list survives
//! into the resolver; everything else is kept so children and importers can
//! build on it.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use super::pom::{self, RawDependency, RawPom};
use crate::artifact::{Coordinate, Dependency, Exclusion, ManagedDependency, Scope};
use crate::resolver::ResolveError;

/// Upper bound on nested `${...}` expansion.
const MAX_INTERPOLATION_PASSES: usize = 10;

/// Supplier of POM text.
#[allow(async_fn_in_trait)]
pub trait PomSource {
    /// The POM of `coordinate` (extension `pom`), or `None` when no repository has one.
    async fn pom(&self, coordinate: &Coordinate) -> Result<Option<String>, ResolveError>;
}

/// A fully built project model.
#[derive(Debug, Clone)]
pub struct EffectiveModel {
    pub coordinate: Coordinate,
    /// Declared properties of the whole parent chain, child values first
    pub properties: HashMap<String, String>,
    /// Dependency management with imports expanded, interpolated
    pub management: Vec<RawDependency>,
    /// Dependencies ready for collection
    pub dependencies: Vec<Dependency>,
    // Inherited declarations, before interpolation
    declared_dependencies: Vec<RawDependency>,
    declared_management: Vec<RawDependency>,
}

impl EffectiveModel {
    /// The management section as entries the collector can apply to edges.
    pub fn managed_dependencies(&self) -> Vec<ManagedDependency> {
        self.management.iter().map(to_managed).collect()
    }
}

/// Effective models built during one run, keyed by descriptor coordinate.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: Mutex<HashMap<Coordinate, Option<Arc<EffectiveModel>>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.models.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, coordinate: &Coordinate) -> Option<Option<Arc<EffectiveModel>>> {
        self.models.lock().unwrap_or_else(PoisonError::into_inner).get(coordinate).cloned()
    }

    fn insert(&self, coordinate: Coordinate, model: Option<Arc<EffectiveModel>>) {
        self.models.lock().unwrap_or_else(PoisonError::into_inner).insert(coordinate, model);
    }
}

/// Build (or fetch from `cache`) the effective model of `coordinate`'s descriptor.
///
/// Returns `Ok(None)` when the descriptor does not exist.
pub async fn effective_model<S: PomSource>(
    source: &S,
    cache: &ModelCache,
    coordinate: &Coordinate,
) -> Result<Option<Arc<EffectiveModel>>, ResolveError> {
    build(source, cache, coordinate.pom(), Vec::new()).await
}

type ModelFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<Arc<EffectiveModel>>, ResolveError>> + 'a>>;

fn build<'a, S: PomSource>(
    source: &'a S,
    cache: &'a ModelCache,
    coordinate: Coordinate,
    mut chain: Vec<Coordinate>,
) -> ModelFuture<'a> {
    Box::pin(async move {
        if let Some(cached) = cache.get(&coordinate) {
            return Ok(cached);
        }
        if chain.contains(&coordinate) {
            let path: Vec<String> = chain.iter().map(ToString::to_string).collect();
            return Err(invalid(&coordinate, format!("cyclic reference via {}", path.join(" -> "))));
        }

        let Some(text) = source.pom(&coordinate).await? else {
            cache.insert(coordinate, None);
            return Ok(None);
        };
        let raw = pom::parse(&text).map_err(|reason| invalid(&coordinate, reason))?;
        chain.push(coordinate.clone());

        let parent = match &raw.parent {
            Some(reference) => {
                let parent_coordinate = Coordinate::new(
                    &reference.group_id,
                    &reference.artifact_id,
                    "pom",
                    "",
                    &reference.version,
                );
                let parent = build(source, cache, parent_coordinate.clone(), chain.clone()).await?;
                if parent.is_none() {
                    warn!("Parent {parent_coordinate} of {coordinate} not found, ignoring it");
                }
                parent
            }
            None => None,
        };

        let model = Arc::new(assemble(source, cache, &coordinate, &raw, parent.as_deref(), &chain).await?);
        debug!("Built model of {} with {} dependencies", coordinate, model.dependencies.len());
        cache.insert(coordinate, Some(Arc::clone(&model)));
        Ok(Some(model))
    })
}

async fn assemble<S: PomSource>(
    source: &S,
    cache: &ModelCache,
    coordinate: &Coordinate,
    raw: &RawPom,
    parent: Option<&EffectiveModel>,
    chain: &[Coordinate],
) -> Result<EffectiveModel, ResolveError> {
    let mut properties = parent.map(|p| p.properties.clone()).unwrap_or_default();
    properties.extend(raw.properties.iter().map(|(k, v)| (k.clone(), v.clone())));

    let declared_dependencies = inherit(
        parent.map_or(&[][..], |p| p.declared_dependencies.as_slice()),
        &raw.dependencies,
    );
    let declared_management = inherit(
        parent.map_or(&[][..], |p| p.declared_management.as_slice()),
        &raw.dependency_management,
    );

    let context = interpolation_context(coordinate, raw, &properties);
    let resolve = |value: &str| interpolate(value, &context);

    let mut management = Vec::new();
    let mut managed_keys = HashSet::new();
    let mut imports = Vec::new();
    for entry in declared_management.iter().map(|d| d.map_values(resolve)) {
        if entry.scope.as_deref() == Some("import") && entry.kind.as_deref() == Some("pom") {
            imports.push(entry);
        } else if managed_keys.insert(entry.management_key()) {
            management.push(entry);
        }
    }

    for import in imports {
        let Some(version) = import.version.as_deref() else {
            warn!("Import of {}:{} in {} has no version", import.group_id, import.artifact_id, coordinate);
            continue;
        };
        let bom = Coordinate::new(&import.group_id, &import.artifact_id, "pom", "", version);
        match build(source, cache, bom.clone(), chain.to_vec()).await? {
            Some(model) => {
                for entry in &model.management {
                    if managed_keys.insert(entry.management_key()) {
                        management.push(entry.clone());
                    }
                }
            }
            None => warn!("Imported {bom} of {coordinate} not found"),
        }
    }

    let mut dependencies = Vec::new();
    for declared in declared_dependencies.iter().map(|d| d.map_values(resolve)) {
        let key = declared.management_key();
        let managed = management.iter().find(|m| m.management_key() == key);
        let declared = apply_management(declared, managed);

        match to_dependency(&declared) {
            Ok(dependency) => dependencies.push(dependency),
            Err(reason) => warn!(
                "Skipping dependency {}:{} of {}: {}",
                declared.group_id, declared.artifact_id, coordinate, reason
            ),
        }
    }

    Ok(EffectiveModel {
        coordinate: coordinate.clone(),
        properties,
        management,
        dependencies,
        declared_dependencies,
        declared_management,
    })
}

/// Child declarations replace parent declarations with the same management key.
fn inherit(parent: &[RawDependency], child: &[RawDependency]) -> Vec<RawDependency> {
    let child_keys: HashSet<String> = child.iter().map(RawDependency::management_key).collect();
    child
        .iter()
        .cloned()
        .chain(parent.iter().filter(|d| !child_keys.contains(&d.management_key())).cloned())
        .collect()
}

fn interpolation_context(
    coordinate: &Coordinate,
    raw: &RawPom,
    properties: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut context = properties.clone();
    let parent = raw.parent.as_ref();

    let group_id = raw
        .group_id
        .clone()
        .or_else(|| parent.map(|p| p.group_id.clone()))
        .unwrap_or_else(|| coordinate.group_id().to_string());
    let artifact_id = raw.artifact_id.clone().unwrap_or_else(|| coordinate.artifact_id().to_string());
    let version = raw
        .version
        .clone()
        .or_else(|| parent.map(|p| p.version.clone()))
        .unwrap_or_else(|| coordinate.version().to_string());

    for prefix in ["project.", "pom.", ""] {
        context.insert(format!("{prefix}groupId"), group_id.clone());
        context.insert(format!("{prefix}artifactId"), artifact_id.clone());
        context.insert(format!("{prefix}version"), version.clone());
    }
    if let Some(parent) = parent {
        for prefix in ["project.parent.", "parent."] {
            context.insert(format!("{prefix}groupId"), parent.group_id.clone());
            context.insert(format!("{prefix}artifactId"), parent.artifact_id.clone());
            context.insert(format!("{prefix}version"), parent.version.clone());
        }
    }
    if let Some(packaging) = &raw.packaging {
        context.insert("project.packaging".to_string(), packaging.clone());
    }
    context
}

/// Expand `${name}` placeholders. Unknown names are left as written.
pub fn interpolate(value: &str, properties: &HashMap<String, String>) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_INTERPOLATION_PASSES {
        if !current.contains("${") {
            break;
        }
        let next = interpolate_once(&current, properties);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn interpolate_once(value: &str, properties: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match properties.get(name) {
            Some(replacement) => out.push_str(replacement),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn apply_management(mut declared: RawDependency, managed: Option<&RawDependency>) -> RawDependency {
    let Some(managed) = managed else {
        return declared;
    };
    if declared.version.is_none() {
        declared.version.clone_from(&managed.version);
    }
    if declared.scope.is_none() {
        declared.scope.clone_from(&managed.scope);
    }
    if declared.optional.is_none() {
        declared.optional.clone_from(&managed.optional);
    }
    if declared.system_path.is_none() {
        declared.system_path.clone_from(&managed.system_path);
    }
    for exclusion in &managed.exclusions {
        if !declared.exclusions.contains(exclusion) {
            declared.exclusions.push(exclusion.clone());
        }
    }
    declared
}

/// Extension and classifier implied by a dependency `type`.
fn type_mapping(kind: &str) -> (&str, &str) {
    match kind {
        "test-jar" => ("jar", "tests"),
        "java-source" => ("jar", "sources"),
        "bundle" | "maven-plugin" | "ejb" => ("jar", ""),
        other => (other, ""),
    }
}

fn to_dependency(raw: &RawDependency) -> Result<Dependency, String> {
    let version = match raw.version.as_deref() {
        None => return Err("no version declared or managed".to_string()),
        Some(v) if v.contains("${") => return Err(format!("unresolved version {v}")),
        Some(v) => v,
    };

    let scope = Scope::parse(raw.scope.as_deref().unwrap_or("compile"));
    let coordinate = raw_coordinate(raw, version);

    let mut dependency = Dependency::new(coordinate, scope).optional(is_true(raw.optional.as_deref()));
    for (group_id, artifact_id) in &raw.exclusions {
        dependency = dependency.with_exclusion(Exclusion::new(group_id, artifact_id));
    }
    if dependency.scope == Scope::System {
        match raw.system_path.as_deref() {
            Some(path) => dependency = dependency.with_system_path(path),
            None => warn!("System dependency {} declares no <systemPath>", dependency.coordinate),
        }
    }
    Ok(dependency)
}

fn to_managed(raw: &RawDependency) -> ManagedDependency {
    let mut managed = ManagedDependency::new(raw_coordinate(raw, "").key());
    managed.version.clone_from(&raw.version);
    managed.scope = raw.scope.as_deref().map(Scope::parse);
    managed.optional = raw.optional.as_deref().map(|o| is_true(Some(o)));
    for (group_id, artifact_id) in &raw.exclusions {
        managed = managed.with_exclusion(Exclusion::new(group_id, artifact_id));
    }
    managed
}

fn raw_coordinate(raw: &RawDependency, version: &str) -> Coordinate {
    let (extension, implied_classifier) = type_mapping(raw.kind.as_deref().unwrap_or("jar"));
    let classifier = raw.classifier.as_deref().unwrap_or(implied_classifier);
    Coordinate::new(&raw.group_id, &raw.artifact_id, extension, classifier, version)
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn invalid(coordinate: &Coordinate, reason: impl Into<String>) -> ResolveError {
    ResolveError::InvalidDescriptor {
        coordinate: coordinate.to_string(),
        reason: reason.into(),
    }
}
