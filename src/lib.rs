//! srcgen - code generation from the sources of Maven artifacts
//!
//! Given one or more root coordinates, srcgen resolves each root twice: once
//! for its `sources` artifacts and once for its binaries. The sources of the
//! root and of its *family* (dependencies that belong to the same project)
//! are extracted from their archives and compiled with `javac -proc:only`
//! against the binary classpath, so that annotation processors can generate
//! code from them. There is exactly one processor pass per run.
//!
//! # Architecture Overview
//!
//! ```text
//! coordinates ─► Pipeline ─► DependencyCollector ─► MavenRepository ─► local repo / remotes
//!                   │              ▲
//!                   │              └─ DependencySelector (root mode, library mode)
//!                   ├─► SourceExtractor (sources jars ─► compilation units)
//!                   ├─► Classpath (binary artifacts on the compile classpath)
//!                   └─► Processor (javac -proc:only, once)
//! ```
//!
//! # Core Modules
//!
//! - [`artifact`] - Coordinates, scopes, exclusions and resolved artifacts
//! - [`resolver`] - Dependency selection and transitive collection
//! - [`maven`] - Maven repository layout, POM models and downloads
//! - [`sources`] - Compilation units from source archives
//! - [`classpath`] - The ordered, duplicate-free compile classpath
//! - [`generator`] - The single generation pass and its diagnostics
//! - [`pipeline`] - Orchestration from coordinates to one generation pass
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Global configuration (`~/.srcgen/config.toml`)
//! - [`core`] - Error types and user-facing error formatting
//!
//! # Family Rules
//!
//! Which dependencies belong to a root's family is decided by a rule:
//!
//! - `exact` (default): same groupId and artifactId as the root
//! - `prefix`: same groupId, and an artifactId that is the root's or starts
//!   with `<root artifactId>-` (`api` takes in `api-model`, `api-client`)
//!
//! Family members contribute sources; everything else only contributes to
//! the classpath.

pub mod artifact;
pub mod classpath;
pub mod cli;
pub mod config;
pub mod core;
pub mod generator;
pub mod maven;
pub mod pipeline;
pub mod resolver;
pub mod sources;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
