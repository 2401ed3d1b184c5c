//! Common test utilities for srcgen integration tests
//!
//! A [`TestProject`] owns a temporary directory with a remote repository in
//! Maven layout (served through `file://`), an empty local repository, an
//! output directory and a config file pointing at all of them.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use srcgen_cli::test_utils::MavenFixture;

/// Isolated environment for one srcgen invocation
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    local_repo: PathBuf,
    target_dir: PathBuf,
    config_path: PathBuf,
    remote: MavenFixture,
}

impl TestProject {
    /// Create a project whose config file names the fixture remote only
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let local_repo = temp_dir.path().join("local-repository");
        let target_dir = project_dir.join("generated");
        let remote = MavenFixture::new(temp_dir.path().join("remote"));

        fs::create_dir_all(&target_dir)?;
        fs::create_dir_all(&local_repo)?;
        fs::create_dir_all(remote.root())?;

        let project = Self {
            config_path: temp_dir.path().join("config.toml"),
            _temp_dir: temp_dir,
            project_dir,
            local_repo,
            target_dir,
            remote,
        };
        project.write_config("")?;
        Ok(project)
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    pub fn local_repo(&self) -> &Path {
        &self.local_repo
    }

    pub fn target_path(&self) -> &Path {
        &self.target_dir
    }

    pub fn remote(&self) -> &MavenFixture {
        &self.remote
    }

    /// Write the config file: the fixture remote plus `extra` top-level keys
    pub fn write_config(&self, extra: &str) -> Result<()> {
        let content = format!(
            "{extra}\n[[remotes]]\nid = \"fixture\"\nurl = \"{}\"\n",
            self.remote.url()
        );
        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config to {}", self.config_path.display()))
    }

    /// Install a fake `javac` that records its arguments and the source list
    ///
    /// The script exits with `exit_code` after printing `stderr` to standard error.
    #[cfg(unix)]
    pub fn install_fake_javac(&self, stderr: &str, exit_code: i32) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let log_dir = self.project_dir.join("javac-log");
        fs::create_dir_all(&log_dir)?;
        let script = self.project_dir.join("fake-javac");
        let content = format!(
            r#"#!/bin/sh
printf '%s\n' "$@" > "{log}/args.txt"
for arg in "$@"; do
  case "$arg" in
    @*) cat "${{arg#@}}" > "{log}/sources.txt" ;;
  esac
done
printf '%s' '{stderr}' >&2
exit {exit_code}
"#,
            log = log_dir.display(),
        );
        fs::write(&script, content)?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;
        Ok(script)
    }

    /// Arguments the fake `javac` received, one per entry
    pub fn javac_args(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(self.project_dir.join("javac-log/args.txt"))?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Source files the fake `javac` was asked to process
    pub fn javac_sources(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(self.project_dir.join("javac-log/sources.txt"))?;
        Ok(content.lines().map(|l| l.trim_matches('"').to_string()).collect())
    }

    pub fn javac_was_run(&self) -> bool {
        self.project_dir.join("javac-log/args.txt").exists()
    }

    /// Run srcgen with this project's config and local repository
    pub fn run_srcgen(&self, args: &[&str]) -> Result<CommandOutput> {
        let binary = env!("CARGO_BIN_EXE_srcgen");
        let output = Command::new(binary)
            .arg("--config")
            .arg(&self.config_path)
            .arg("--local-repository")
            .arg(&self.local_repo)
            .args(args)
            .current_dir(&self.project_dir)
            .env_remove("SRCGEN_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .context("Failed to run srcgen command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    /// Assert the command exited with code 1
    pub fn assert_failure(&self) -> &Self {
        assert_eq!(
            self.code,
            Some(1),
            "Expected exit code 1\nStdout: {}\nStderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
