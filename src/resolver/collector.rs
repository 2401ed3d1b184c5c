//! Breadth-first dependency collection.
//!
//! The walk visits nodes level by level. Nodes are keyed by group, artifact,
//! extension and classifier; the first occurrence of a key (the nearest one,
//! then the first declared) fixes the version and is the only one walked.
//! This is the repository's default "nearest wins" mediation, and it is also
//! what keeps cyclic graphs finite: the selector itself has no cycle guard.
//!
//! Scopes are mediated separately. A later occurrence of a key that derives a
//! wider scope (`compile` over `runtime` over `provided` over `test`) widens
//! the kept node and everything below it. Direct dependencies of the root
//! keep the scope they declare.
//!
//! The dependency management of the requested root applies to every edge
//! below its direct dependencies, after the selector has accepted the edge.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use tracing::{debug, warn};

use super::{
    ArtifactRepository, ArtifactResolver, DependencySelector, ResolveError, ResolveRequest,
    SelectionMode, Variant,
};
use crate::artifact::{
    Coordinate, Dependency, Exclusion, ManagedDependency, ResolvedArtifact, Scope,
};

/// A node kept after collection and mediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedNode {
    pub coordinate: Coordinate,
    /// Effective scope after derivation and mediation
    pub scope: Scope,
    /// Distance from the root; the root itself is at depth 0
    pub depth: usize,
    /// Local file of a `system` dependency
    pub system_path: Option<PathBuf>,
}

/// How a kept node is walked, and the edges found when it was.
struct Walk {
    mode: SelectionMode,
    exclusions: Vec<Exclusion>,
    /// `system` dependencies have no descriptor to read
    has_descriptor: bool,
    edges: Vec<Edge>,
}

/// An accepted edge to a kept node, with the scope it was declared with.
struct Edge {
    target: usize,
    declared: Scope,
}

/// [`ArtifactResolver`] for any [`ArtifactRepository`].
#[derive(Debug)]
pub struct DependencyCollector<R> {
    repository: R,
}

impl<R: ArtifactRepository> DependencyCollector<R> {
    pub const fn new(repository: R) -> Self {
        Self {
            repository,
        }
    }

    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Walk the graph of `request.root` and return every selected node, root first.
    ///
    /// No artifact files are fetched; only descriptors are read.
    pub async fn collect(
        &self,
        request: &ResolveRequest,
        selector: &mut DependencySelector,
    ) -> Result<Vec<CollectedNode>, ResolveError> {
        let root = request.root.clone();
        let management = self.repository.managed_dependencies(&root).await?;

        let mut index = HashMap::from([(root.key(), 0)]);
        let mut nodes = vec![CollectedNode {
            coordinate: root,
            scope: Scope::Compile,
            depth: 0,
            system_path: None,
        }];
        let mut walks = vec![Walk {
            mode: selector.initial_mode(),
            exclusions: Vec::new(),
            has_descriptor: true,
            edges: Vec::new(),
        }];
        let mut queue = VecDeque::from([0]);

        while let Some(parent) = queue.pop_front() {
            if !walks[parent].has_descriptor {
                continue;
            }
            let parent_coordinate = nodes[parent].coordinate.clone();
            let depth = nodes[parent].depth;
            let mode = walks[parent].mode;
            let declared = self.repository.dependencies(&parent_coordinate).await?;

            for dependency in declared {
                if walks[parent].exclusions.iter().any(|e| e.matches(&dependency.coordinate)) {
                    debug!("{} excluded below {}", dependency.coordinate, parent_coordinate);
                    continue;
                }
                if !selector.select(mode, &dependency) {
                    continue;
                }
                let dependency =
                    if depth > 0 { manage(&management, dependency) } else { dependency };

                let child_mode = selector.child_mode(mode, &dependency);
                let variant = selector.variant(request.variant, mode, &dependency);
                let coordinate = match variant {
                    Variant::Source => dependency.coordinate.sources(),
                    Variant::Binary => dependency.coordinate.clone(),
                };
                if variant == Variant::Binary && coordinate.is_sources() {
                    debug!("{} skipped, sources are only resolved for family members", coordinate);
                    continue;
                }

                let scope = dependency.scope.derive(&nodes[parent].scope);
                let key = coordinate.key();
                let target = if let Some(&existing) = index.get(&key) {
                    debug!("{} omitted, a nearer occurrence was already selected", coordinate);
                    widen(&mut nodes, &walks, existing, scope);
                    existing
                } else {
                    let mut exclusions = walks[parent].exclusions.clone();
                    exclusions.extend(dependency.exclusions.iter().cloned());
                    let is_system = dependency.scope == Scope::System;

                    let added = nodes.len();
                    index.insert(key, added);
                    nodes.push(CollectedNode {
                        coordinate,
                        scope,
                        depth: depth + 1,
                        system_path: dependency.system_path.clone(),
                    });
                    walks.push(Walk {
                        mode: child_mode,
                        exclusions,
                        has_descriptor: !is_system,
                        edges: Vec::new(),
                    });
                    queue.push_back(added);
                    added
                };
                walks[parent].edges.push(Edge {
                    target,
                    declared: dependency.scope,
                });
            }
        }

        Ok(nodes)
    }
}

/// `dependency` with the root's management entry for it applied, if there is one.
fn manage(management: &[ManagedDependency], dependency: Dependency) -> Dependency {
    match management.iter().find(|m| m.manages(&dependency)) {
        Some(managed) => {
            let applied = managed.apply(dependency);
            debug!("{} managed by the root", applied);
            applied
        }
        None => dependency,
    }
}

/// Give `target` the wider of its scope and `scope`, re-deriving the scopes below it.
fn widen(nodes: &mut [CollectedNode], walks: &[Walk], target: usize, scope: Scope) {
    let mut pending = vec![(target, scope)];
    while let Some((current, scope)) = pending.pop() {
        let node = &mut nodes[current];
        if node.depth <= 1 {
            continue;
        }
        let widest = node.scope.widest(&scope);
        if widest == node.scope {
            continue;
        }
        debug!("{} widened from {} to {}", node.coordinate, node.scope, widest);
        node.scope = widest;
        for edge in &walks[current].edges {
            pending.push((edge.target, edge.declared.derive(&node.scope)));
        }
    }
}

impl<R: ArtifactRepository> ArtifactResolver for DependencyCollector<R> {
    async fn resolve(
        &self,
        request: &ResolveRequest,
        selector: &mut DependencySelector,
    ) -> Result<Vec<ResolvedArtifact>, ResolveError> {
        let nodes = self.collect(request, selector).await?;
        debug!("collected {} node(s) for {}", nodes.len(), request.root);

        let mut artifacts = Vec::with_capacity(nodes.len());
        for node in nodes {
            if node.depth > 0 && !node.scope.on_compile_classpath() {
                debug!("{} skipped, {} scope is not on the compile classpath", node.coordinate, node.scope);
                continue;
            }
            if node.scope == Scope::System {
                let Some(path) = node.system_path else {
                    warn!("Skipping {}: system dependency without a path", node.coordinate);
                    continue;
                };
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    artifacts.push(ResolvedArtifact::new(node.coordinate, path));
                } else {
                    warn!("Skipping {}: {} does not exist", node.coordinate, path.display());
                }
                continue;
            }
            let path = self.repository.artifact_file(&node.coordinate).await?;
            artifacts.push(ResolvedArtifact::new(node.coordinate, path));
        }
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FamilyRule;
    use crate::test_utils::InMemoryRepository;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn compile(s: &str) -> Dependency {
        Dependency::new(coord(s), Scope::Compile)
    }

    fn names(nodes: &[CollectedNode]) -> Vec<String> {
        nodes.iter().map(|n| n.coordinate.to_string()).collect()
    }

    /// `g:a` -> `g:a-ext` -> (optional `g:z`, compile `lib:x`)
    fn multi_module_repository() -> InMemoryRepository {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("g:a-ext:1.0")]);
        repo.add_descriptor(
            "g:a-ext:1.0",
            vec![compile("g:z:1.0").optional(true), compile("lib:x:2.0")],
        );
        repo
    }

    #[tokio::test]
    async fn test_exact_family_prunes_optional_below_library() {
        let collector = DependencyCollector::new(multi_module_repository());
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        assert_eq!(names(&nodes), ["g:a:jar:1.0", "g:a-ext:jar:1.0", "lib:x:jar:2.0"]);
    }

    #[tokio::test]
    async fn test_prefix_family_walks_member_children_in_root_mode() {
        let collector = DependencyCollector::new(multi_module_repository());
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Prefix);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        // Root mode accepts the optional edge because g:a-ext is a family member
        assert_eq!(
            names(&nodes),
            ["g:a:jar:1.0", "g:a-ext:jar:1.0", "g:z:jar:1.0", "lib:x:jar:2.0"]
        );
        let recorded: Vec<String> =
            selector.root_dependencies().iter().map(ToString::to_string).collect();
        assert_eq!(recorded, ["g:a-ext:jar:1.0", "g:z:jar:1.0", "lib:x:jar:2.0"]);
    }

    #[tokio::test]
    async fn test_source_request_reclassifies_family_members_only() {
        let collector = DependencyCollector::new(multi_module_repository());
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Prefix);

        let nodes = collector.collect(&ResolveRequest::sources(&root), &mut selector).await.unwrap();

        assert_eq!(
            names(&nodes),
            [
                "g:a:jar:sources:1.0",
                "g:a-ext:jar:sources:1.0",
                "g:z:jar:1.0",
                "lib:x:jar:2.0"
            ]
        );
    }

    #[tokio::test]
    async fn test_test_scope_of_family_member_is_selected() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("g:a-core:1.0")]);
        repo.add_descriptor("g:a-core:1.0", vec![Dependency::new(coord("junit:junit:4.13"), Scope::Test)]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Prefix);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        let junit = nodes.iter().find(|n| n.coordinate.artifact_id() == "junit").unwrap();
        assert_eq!(junit.scope, Scope::Test);
        assert_eq!(junit.depth, 2);
    }

    #[tokio::test]
    async fn test_library_pruning_is_transitive() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("lib:x:1.0")]);
        repo.add_descriptor(
            "lib:x:1.0",
            vec![Dependency::new(coord("lib:rt:1.0"), Scope::Runtime), compile("lib:y:1.0")],
        );
        repo.add_descriptor("lib:rt:1.0", vec![compile("lib:below-rt:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        assert_eq!(names(&nodes), ["g:a:jar:1.0", "lib:x:jar:1.0", "lib:y:jar:1.0"]);
        assert!(!collector.repository().descriptor_reads().contains(&coord("lib:rt:1.0")));
    }

    #[tokio::test]
    async fn test_nearest_occurrence_wins() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("lib:x:1.0"), compile("lib:y:1.0")]);
        repo.add_descriptor("lib:x:1.0", vec![compile("lib:y:2.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        assert_eq!(names(&nodes), ["g:a:jar:1.0", "lib:x:jar:1.0", "lib:y:jar:1.0"]);
    }

    #[tokio::test]
    async fn test_compile_path_widens_scope_of_shared_dependency() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor(
            "g:a:1.0",
            vec![Dependency::new(coord("lib:a:1.0"), Scope::Runtime), compile("lib:b:1.0")],
        );
        repo.add_descriptor("lib:a:1.0", vec![compile("lib:c:1.0")]);
        repo.add_descriptor("lib:b:1.0", vec![compile("lib:m:1.0")]);
        // lib:c is walked as runtime before the compile path through lib:m reaches it
        repo.add_descriptor("lib:m:1.0", vec![compile("lib:c:1.0")]);
        repo.add_descriptor("lib:c:1.0", vec![compile("lib:d:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let artifacts =
            collector.resolve(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        let resolved: Vec<String> = artifacts.iter().map(|a| a.coordinate.to_string()).collect();
        assert_eq!(
            resolved,
            ["g:a:jar:1.0", "lib:b:jar:1.0", "lib:c:jar:1.0", "lib:m:jar:1.0", "lib:d:jar:1.0"]
        );
    }

    #[tokio::test]
    async fn test_direct_dependency_keeps_declared_scope() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor(
            "g:a:1.0",
            vec![Dependency::new(coord("lib:rt:1.0"), Scope::Runtime), compile("lib:b:1.0")],
        );
        repo.add_descriptor("lib:b:1.0", vec![compile("lib:rt:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        let rt = nodes.iter().find(|n| n.coordinate.artifact_id() == "rt").unwrap();
        assert_eq!(rt.scope, Scope::Runtime);
        assert_eq!(rt.depth, 1);
    }

    #[tokio::test]
    async fn test_root_management_applies_below_direct_dependencies() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("lib:x:1.0"), compile("lib:z:1.0")]);
        repo.add_management(
            "g:a:1.0",
            vec![
                ManagedDependency::new(coord("lib:y:1").key()).with_version("2.0"),
                ManagedDependency::new(coord("lib:z:1").key()).with_version("9.9"),
            ],
        );
        repo.add_descriptor("lib:x:1.0", vec![compile("lib:y:1.0")]);
        repo.add_descriptor("lib:y:2.0", vec![compile("lib:w:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        // Direct dependencies are taken as declared
        assert_eq!(
            names(&nodes),
            ["g:a:jar:1.0", "lib:x:jar:1.0", "lib:z:jar:1.0", "lib:y:jar:2.0", "lib:w:jar:1.0"]
        );
    }

    #[tokio::test]
    async fn test_root_management_scope_takes_dependency_off_classpath() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("lib:x:1.0")]);
        repo.add_management(
            "g:a:1.0",
            vec![ManagedDependency::new(coord("lib:y:1").key()).with_scope(Scope::Test)],
        );
        repo.add_descriptor("lib:x:1.0", vec![compile("lib:y:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let artifacts =
            collector.resolve(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        let resolved: Vec<String> = artifacts.iter().map(|a| a.coordinate.to_string()).collect();
        assert_eq!(resolved, ["g:a:jar:1.0", "lib:x:jar:1.0"]);
    }

    #[tokio::test]
    async fn test_declared_sources_of_library_are_not_resolved() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("lib:x:1.0"), compile("lib:doc:jar:sources:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");

        for request in [ResolveRequest::binary(&root), ResolveRequest::sources(&root)] {
            let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);
            let artifacts = collector.resolve(&request, &mut selector).await.unwrap();

            assert!(artifacts.iter().all(|a| a.coordinate.artifact_id() != "doc"));
            assert!(artifacts.iter().any(|a| a.coordinate.artifact_id() == "x"));
        }
    }

    #[tokio::test]
    async fn test_system_dependency_uses_its_path_and_is_not_walked() {
        let temp = tempfile::TempDir::new().unwrap();
        let tools = temp.path().join("tools.jar");
        std::fs::write(&tools, b"jar").unwrap();

        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor(
            "g:a:1.0",
            vec![
                Dependency::new(coord("jdk:tools:1.8"), Scope::System).with_system_path(&tools),
                Dependency::new(coord("jdk:gone:1.8"), Scope::System)
                    .with_system_path(temp.path().join("gone.jar")),
            ],
        );
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let artifacts =
            collector.resolve(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        let recorded: Vec<String> =
            selector.root_dependencies().iter().map(ToString::to_string).collect();
        assert_eq!(recorded, ["jdk:tools:jar:1.8", "jdk:gone:jar:1.8"]);
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[1].path, tools);
        let repository = collector.repository();
        assert_eq!(repository.descriptor_reads(), [coord("g:a:1.0")]);
        assert_eq!(repository.file_requests(), [coord("g:a:1.0")]);
    }

    #[tokio::test]
    async fn test_cycles_terminate() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("g:a:1.0"), compile("lib:x:1.0")]);
        repo.add_descriptor("lib:x:1.0", vec![compile("lib:y:1.0")]);
        repo.add_descriptor("lib:y:1.0", vec![compile("lib:x:1.0"), compile("g:a:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        assert_eq!(names(&nodes), ["g:a:jar:1.0", "lib:x:jar:1.0", "lib:y:jar:1.0"]);
    }

    #[tokio::test]
    async fn test_exclusions_apply_to_whole_subtree() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor(
            "g:a:1.0",
            vec![compile("lib:x:1.0").with_exclusion(Exclusion::new("lib", "deep"))],
        );
        repo.add_descriptor("lib:x:1.0", vec![compile("lib:y:1.0")]);
        repo.add_descriptor("lib:y:1.0", vec![compile("lib:deep:1.0")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let nodes = collector.collect(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        assert_eq!(names(&nodes), ["g:a:jar:1.0", "lib:x:jar:1.0", "lib:y:jar:1.0"]);
    }

    #[tokio::test]
    async fn test_resolve_filters_to_compile_classpath() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor(
            "g:a:1.0",
            vec![
                compile("lib:x:1.0"),
                Dependency::new(coord("junit:junit:4.13"), Scope::Test),
                Dependency::new(coord("lib:rt:1.0"), Scope::Runtime),
                Dependency::new(coord("lib:api:1.0"), Scope::Provided),
            ],
        );
        repo.add_descriptor("junit:junit:4.13", vec![compile("org.hamcrest:hamcrest-core:1.3")]);
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let artifacts =
            collector.resolve(&ResolveRequest::binary(&root), &mut selector).await.unwrap();

        let resolved: Vec<String> = artifacts.iter().map(|a| a.coordinate.to_string()).collect();
        assert_eq!(resolved, ["g:a:jar:1.0", "lib:x:jar:1.0", "lib:api:jar:1.0"]);
        assert!(artifacts.iter().all(|a| a.path.starts_with("/repo")));
    }

    #[tokio::test]
    async fn test_resolve_propagates_missing_file() {
        let mut repo = InMemoryRepository::new("/repo");
        repo.add_descriptor("g:a:1.0", vec![compile("lib:x:1.0")]);
        repo.withhold(coord("lib:x:1.0"));
        let collector = DependencyCollector::new(repo);
        let root = coord("g:a:1.0");
        let mut selector = DependencySelector::new(root.clone(), FamilyRule::Exact);

        let err = collector.resolve(&ResolveRequest::binary(&root), &mut selector).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { coordinate } if coordinate.artifact_id() == "x"));
    }
}
