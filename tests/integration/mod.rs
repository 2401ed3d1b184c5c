//! Integration test suite for srcgen
//!
//! End-to-end runs of the `srcgen` binary against a `file://` remote in
//! Maven layout and a fake `javac` that records what it was given.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: Usage output, argument validation and exit codes
//! - **generate**: Resolution, extraction and the generation pass

#[path = "../common/mod.rs"]
mod common;

mod cli;
#[cfg(unix)]
mod generate;
