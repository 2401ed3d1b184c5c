use anyhow::Result;
use std::path::Path;

use srcgen_cli::artifact::{Coordinate, Dependency, Scope};

use crate::common::TestProject;

fn dep(coordinate: &str) -> Dependency {
    let coordinate: Coordinate = coordinate.parse().unwrap();
    Dependency::new(coordinate, Scope::Compile)
}

/// `g:a` -> `g:a-ext` -> (optional `g:z`, compile `lib:x:2.0`), binaries and sources published.
fn publish_multi_module(project: &TestProject) -> Result<()> {
    let remote = project.remote();
    remote.publish_pom("g:a:1.0", &[dep("g:a-ext:1.0")])?;
    remote.publish_pom("g:a-ext:1.0", &[dep("g:z:1.0").optional(true), dep("lib:x:2.0")])?;
    remote.publish_pom("lib:x:2.0", &[])?;

    remote.publish_jar("g:a:1.0", &[("g/a/A.class", "")])?;
    remote.publish_jar("g:a-ext:1.0", &[("g/a/ext/Ext.class", "")])?;
    remote.publish_jar("g:z:1.0", &[("g/z/Z.class", "")])?;
    remote.publish_jar("lib:x:2.0", &[("lib/x/X.class", "")])?;

    remote.publish_jar(
        "g:a:jar:sources:1.0",
        &[("g/a/A.java", "package g.a; public class A {}"), ("META-INF/MANIFEST.MF", "")],
    )?;
    remote.publish_jar(
        "g:a-ext:jar:sources:1.0",
        &[("g/a/ext/Ext.java", "package g.a.ext; public class Ext {}")],
    )?;
    Ok(())
}

fn classpath_of(args: &[String]) -> Vec<String> {
    args.iter()
        .position(|a| a == "-classpath")
        .map(|i| args[i + 1].split(':').map(str::to_string).collect())
        .unwrap_or_default()
}

fn file_name(path: &str) -> String {
    Path::new(path).file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn test_generate_with_exact_family() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;
    let target = project.target_path().to_str().unwrap().to_string();

    project
        .run_srcgen(&["--javac", javac.to_str().unwrap(), "--target", &target, "g:a:1.0"])?
        .assert_success()
        .assert_stdout_contains("Resolving g:a:jar:1.0")
        .assert_stdout_contains("Processed 1 compilation unit(s)");

    let args = project.javac_args()?;
    assert!(args.contains(&"-proc:only".to_string()));
    assert!(args.contains(&format!("-AoutputDirectory={target}")));

    let sources: Vec<String> = project.javac_sources()?.iter().map(|s| file_name(s)).collect();
    assert_eq!(sources, ["A.java"]);

    let classpath: Vec<String> = classpath_of(&args).iter().map(|s| file_name(s)).collect();
    assert!(classpath.contains(&"x-2.0.jar".to_string()), "{classpath:?}");
    assert!(classpath.contains(&"a-ext-1.0.jar".to_string()), "{classpath:?}");
    // Optional dependency of a library is pruned
    assert!(!classpath.contains(&"z-1.0.jar".to_string()), "{classpath:?}");
    assert!(classpath.iter().all(|entry| !entry.contains("sources")), "{classpath:?}");

    // Downloads land in the local repository
    assert!(project.local_repo().join("g/a/1.0/a-1.0-sources.jar").exists());
    assert!(project.local_repo().join("lib/x/2.0/x-2.0.jar").exists());
    Ok(())
}

#[test]
fn test_generate_with_prefix_family() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;

    project
        .run_srcgen(&["--javac", javac.to_str().unwrap(), "--family", "prefix", "g:a:1.0"])?
        .assert_success()
        .assert_stdout_contains("Processed 2 compilation unit(s)");

    let mut sources: Vec<String> = project.javac_sources()?.iter().map(|s| file_name(s)).collect();
    sources.sort();
    assert_eq!(sources, ["A.java", "Ext.java"]);

    // g:a-ext is walked in root mode, so its optional dependency is kept
    let classpath: Vec<String> = classpath_of(&project.javac_args()?).iter().map(|s| file_name(s)).collect();
    assert!(classpath.contains(&"z-1.0.jar".to_string()), "{classpath:?}");
    Ok(())
}

#[test]
fn test_family_rule_from_config_file() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;
    project.write_config(&format!("family = \"prefix\"\njavac = \"{}\"", javac.display()))?;

    project.run_srcgen(&["g:a:1.0"])?.assert_success().assert_stdout_contains("Processed 2 compilation unit(s)");
    Ok(())
}

#[test]
fn test_codegen_directory_is_on_processor_path() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;
    let templates = project.project_path().join("templates");
    std::fs::create_dir_all(&templates)?;
    std::fs::write(templates.join("codegen.js"), "// template")?;

    project
        .run_srcgen(&[
            "--javac",
            javac.to_str().unwrap(),
            "--codegen",
            templates.join("codegen.js").to_str().unwrap(),
            "--processor",
            "com.example.CodeGenProcessor",
            "g:a:1.0",
        ])?
        .assert_success();

    let args = project.javac_args()?;
    let index = args.iter().position(|a| a == "-processorpath").expect("processor path passed");
    assert!(args[index + 1].split(':').any(|entry| Path::new(entry) == templates));
    let index = args.iter().position(|a| a == "-processor").expect("processor passed");
    assert_eq!(args[index + 1], "com.example.CodeGenProcessor");
    Ok(())
}

#[test]
fn test_missing_sources_artifact_fails_without_generation() -> Result<()> {
    let project = TestProject::new()?;
    let remote = project.remote();
    remote.publish_pom("other:b:1.0", &[])?;
    remote.publish_jar("other:b:1.0", &[("other/B.class", "")])?;
    let javac = project.install_fake_javac("", 0)?;

    project
        .run_srcgen(&["--javac", javac.to_str().unwrap(), "other:b:1.0"])?
        .assert_failure()
        .assert_stderr_contains("No sources artifact found for other:b:jar:1.0");

    assert!(!project.javac_was_run());
    Ok(())
}

#[test]
fn test_one_bad_root_aborts_every_root() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;

    project
        .run_srcgen(&["--javac", javac.to_str().unwrap(), "g:a:1.0", "g:missing:1.0"])?
        .assert_failure();

    assert!(!project.javac_was_run());
    Ok(())
}

#[test]
fn test_processor_errors_are_reported() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project
        .install_fake_javac("g/a/A.java:1: error: template failed\n1 error\n", 1)?;

    project
        .run_srcgen(&["--javac", javac.to_str().unwrap(), "g:a:1.0"])?
        .assert_failure()
        .assert_stderr_contains("Code generation failed with 1 diagnostic(s)")
        .assert_stderr_contains("template failed");
    Ok(())
}

#[test]
fn test_offline_run_uses_local_repository() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;
    let javac = javac.to_str().unwrap();

    // Populate the local repository, then remove the remote
    project.run_srcgen(&["--javac", javac, "g:a:1.0"])?.assert_success();
    std::fs::remove_dir_all(project.remote().root())?;

    project
        .run_srcgen(&["--javac", javac, "--offline", "g:a:1.0"])?
        .assert_success()
        .assert_stdout_contains("Processed 1 compilation unit(s)");
    Ok(())
}

#[test]
fn test_quiet_suppresses_progress() -> Result<()> {
    let project = TestProject::new()?;
    publish_multi_module(&project)?;
    let javac = project.install_fake_javac("", 0)?;

    let output = project.run_srcgen(&["--quiet", "--javac", javac.to_str().unwrap(), "g:a:1.0"])?;
    output.assert_success();
    assert!(output.stdout.is_empty(), "unexpected output: {}", output.stdout);
    Ok(())
}
