//! Configuration for srcgen.
//!
//! There is a single, optional, user-wide file (see [`global`]); command-line
//! flags override its values for one invocation.
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (`--javac`, `--family`, `--offline`, `--local-repository`)
//! 2. The file named by `--config` or `SRCGEN_CONFIG`, else `~/.srcgen/config.toml`
//! 3. Default values

pub mod global;

pub use global::{DEFAULT_LOCAL_REPOSITORY, GlobalConfig};
