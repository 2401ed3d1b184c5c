use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_no_arguments_prints_usage_and_succeeds() -> Result<()> {
    let project = TestProject::new()?;

    project
        .run_srcgen(&[])?
        .assert_success()
        .assert_stdout_contains("Please provide an artifact to process")
        .assert_stdout_contains("Usage:");
    Ok(())
}

#[test]
fn test_help_and_version_exit_zero() {
    Command::cargo_bin("srcgen").unwrap().arg("--help").assert().success().stdout(
        predicate::str::contains("--codegen").and(predicate::str::contains("--target")),
    );

    Command::cargo_bin("srcgen")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_exits_with_one() {
    Command::cargo_bin("srcgen")
        .unwrap()
        .args(["--no-such-flag", "g:a:1.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--no-such-flag"));
}

#[test]
fn test_malformed_coordinate_is_reported() -> Result<()> {
    let project = TestProject::new()?;

    project
        .run_srcgen(&["not-a-coordinate"])?
        .assert_failure()
        .assert_stderr_contains("Malformed coordinate 'not-a-coordinate'");
    Ok(())
}

#[test]
fn test_missing_target_directory_fails_before_resolution() -> Result<()> {
    let project = TestProject::new()?;
    let missing = project.project_path().join("missing");

    project
        .run_srcgen(&["--target", missing.to_str().unwrap(), "g:a:1.0"])?
        .assert_failure()
        .assert_stderr_contains("does not exist");

    // Nothing was downloaded
    assert_eq!(std::fs::read_dir(project.local_repo())?.count(), 0);
    Ok(())
}

#[test]
fn test_target_must_be_a_directory() -> Result<()> {
    let project = TestProject::new()?;
    let file = project.project_path().join("file.txt");
    std::fs::write(&file, "")?;

    project
        .run_srcgen(&["--target", file.to_str().unwrap(), "g:a:1.0"])?
        .assert_failure()
        .assert_stderr_contains("is not a directory");
    Ok(())
}

#[test]
fn test_codegen_must_be_a_file() -> Result<()> {
    let project = TestProject::new()?;
    let dir = project.project_path().to_str().unwrap().to_string();

    project
        .run_srcgen(&["--codegen", &dir, "g:a:1.0"])?
        .assert_failure()
        .assert_stderr_contains("is not a file");
    Ok(())
}

#[test]
fn test_invalid_config_file_is_reported() -> Result<()> {
    let project = TestProject::new()?;
    project.write_config("family = \"sideways\"")?;

    project
        .run_srcgen(&["g:a:1.0"])?
        .assert_failure()
        .assert_stderr_contains("Invalid configuration")
        .assert_stderr_contains("sideways");
    Ok(())
}
