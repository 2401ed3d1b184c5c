//! Resolution orchestration: from root coordinates to one generation pass.
//!
//! Every root is resolved twice, one root at a time:
//!
//! 1. as its source variant, which yields the `sources` archives of the root
//!    and of the members of its family;
//! 2. as its binary variant, which yields the classpath.
//!
//! Each call gets a fresh [`DependencySelector`]. Once all roots are resolved
//! the source archives are extracted and the processor runs exactly once over
//! everything. Any failure aborts the run before the processor is invoked.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::artifact::{Coordinate, ResolvedArtifact};
use crate::classpath::Classpath;
use crate::core::SrcgenError;
use crate::generator::{self, GenerationReport, GenerationRequest, Processor, ProcessorOptions};
use crate::resolver::{ArtifactResolver, DependencySelector, FamilyRule, ResolveError, ResolveRequest};
use crate::sources::{CompilationUnit, SourceExtractor};

/// Inputs gathered from all roots of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    /// Source archives in resolution order, without duplicates
    pub source_archives: Vec<PathBuf>,
    pub classpath: Classpath,
}

/// One run of resolve, extract and generate.
#[derive(Debug)]
pub struct Pipeline<R> {
    resolver: R,
    family_rule: FamilyRule,
    extractor: SourceExtractor,
}

impl<R: ArtifactResolver> Pipeline<R> {
    pub fn new(resolver: R, family_rule: FamilyRule, source_suffix: impl Into<String>) -> Self {
        Self {
            resolver,
            family_rule,
            extractor: SourceExtractor::new(source_suffix),
        }
    }

    /// Resolve every root, sequentially, into source archives and a classpath.
    pub async fn resolve(&self, roots: &[Coordinate]) -> Result<ResolvedInputs, SrcgenError> {
        let mut inputs = ResolvedInputs::default();
        let mut seen_archives = HashSet::new();

        for root in roots {
            debug!("Resolving {root}");

            for archive in self.resolve_sources(root).await? {
                if seen_archives.insert(archive.path.clone()) {
                    inputs.source_archives.push(archive.path);
                }
            }

            for artifact in self.resolve_binaries(root).await? {
                inputs.classpath.add(&artifact);
            }
        }

        Ok(inputs)
    }

    /// Source archives of `root` and its family members.
    async fn resolve_sources(&self, root: &Coordinate) -> Result<Vec<ResolvedArtifact>, SrcgenError> {
        let request = ResolveRequest::sources(root);
        let mut selector = DependencySelector::new(root.clone(), self.family_rule);

        let artifacts = match self.resolver.resolve(&request, &mut selector).await {
            Ok(artifacts) => artifacts,
            Err(ResolveError::NotFound {
                coordinate,
            }) if coordinate == request.root => {
                return Err(SrcgenError::SourceArtifactNotFound {
                    coordinate: root.to_string(),
                });
            }
            Err(e) => return Err(resolution_failed(root, &e)),
        };
        debug!(
            "{} dependencies accepted in root mode for {}",
            selector.root_dependencies().len(),
            root
        );

        let archives: Vec<ResolvedArtifact> = artifacts
            .into_iter()
            .filter(|a| a.coordinate.is_sources() && selector.is_family(&a.coordinate))
            .collect();

        if !archives.iter().any(|a| a.coordinate == request.root) {
            return Err(SrcgenError::SourceArtifactNotFound {
                coordinate: root.to_string(),
            });
        }
        Ok(archives)
    }

    async fn resolve_binaries(&self, root: &Coordinate) -> Result<Vec<ResolvedArtifact>, SrcgenError> {
        let request = ResolveRequest::binary(root);
        let mut selector = DependencySelector::new(root.clone(), self.family_rule);
        self.resolver.resolve(&request, &mut selector).await.map_err(|e| resolution_failed(root, &e))
    }

    /// Compilation units of every source archive in `inputs`.
    pub fn extract(&self, inputs: &ResolvedInputs) -> Result<Vec<CompilationUnit>, SrcgenError> {
        let units = self.extractor.extract_all(&inputs.source_archives)?;
        debug!(
            "Extracted {} compilation unit(s) from {} archive(s)",
            units.len(),
            inputs.source_archives.len()
        );
        Ok(units)
    }

    /// Resolve, extract and run `processor` once over the result.
    pub async fn run<P: Processor>(
        &self,
        roots: &[Coordinate],
        processor: &P,
        options: &ProcessorOptions,
    ) -> Result<GenerationReport, SrcgenError> {
        let inputs = self.resolve(roots).await?;
        let units = self.extract(&inputs)?;

        generator::generate(
            processor,
            &GenerationRequest {
                units: &units,
                classpath: &inputs.classpath,
                options,
            },
        )
        .await
    }
}

fn resolution_failed(root: &Coordinate, error: &ResolveError) -> SrcgenError {
    SrcgenError::ResolutionFailed {
        coordinate: root.to_string(),
        cause: error.to_string(),
    }
}
