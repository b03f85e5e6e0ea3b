//! The `targetgen` binary.

use anyhow::Result;
use predicates::prelude::*;

use crate::common::{TestProject, env_repo};

fn dynamic_project(project: &TestProject) -> Result<()> {
    let git = env_repo(project)?;
    project.write_project(&format!(
        r#"targets:
  - name: "{{{{ target.args.env }}}}"
    dynamicArgs:
      - name: env
      - name: replicas
    targetConfig:
      project:
        url: {}
      refPattern: "env/.*"
"#,
        git.file_url()
    ))
}

#[test]
fn test_list_targets_text() -> Result<()> {
    let project = TestProject::new()?;
    dynamic_project(&project)?;

    project
        .command()
        .arg("list-targets")
        .assert()
        .success()
        .stdout(predicate::str::contains("NAME"))
        .stdout(predicate::str::is_match(r"(?m)^dev\s+.*env/dev$")?)
        .stdout(predicate::str::is_match(r"(?m)^prod\s+.*env/prod$")?);
    Ok(())
}

#[test]
fn test_list_targets_json() -> Result<()> {
    let project = TestProject::new()?;
    dynamic_project(&project)?;

    let output = project.command().args(["list-targets", "--format", "json"]).output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = value
        .as_array()
        .map(|a| a.iter().filter_map(|t| t["target"]["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["dev", "prod"]);
    assert_eq!(value[0]["baseTargetName"], "{{ target.args.env }}");
    Ok(())
}

#[test]
fn test_render_target_yaml() -> Result<()> {
    let project = TestProject::new()?;
    dynamic_project(&project)?;

    project
        .command()
        .args(["render-target", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: prod"))
        .stdout(predicate::str::contains("ref: env/prod"))
        .stdout(predicate::str::contains("replicas: 2"));
    Ok(())
}

#[test]
fn test_render_unknown_target() -> Result<()> {
    let project = TestProject::new()?;
    dynamic_project(&project)?;

    project
        .command()
        .args(["render-target", "prd"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("target 'prd' not found"))
        .stderr(predicate::str::contains("prod"));
    Ok(())
}

#[test]
fn test_missing_project_file() -> Result<()> {
    let project = TestProject::new()?;

    project
        .command()
        .arg("list-targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No .targetgen.yml found"));
    Ok(())
}

#[test]
fn test_project_dir_flag() -> Result<()> {
    let project = TestProject::new()?;
    project.write_project("targets:\n  - name: plain\n")?;

    let elsewhere = tempfile::tempdir()?;
    project
        .command()
        .current_dir(elsewhere.path())
        .arg("--project-dir")
        .arg(project.project_path())
        .args(["list-targets", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: plain"));
    Ok(())
}

#[test]
fn test_invalid_global_config() -> Result<()> {
    let project = TestProject::new()?;
    project.write_project("targets: []\n")?;
    project.write_global_config("max_parallel = \"many\"\n")?;

    project
        .command()
        .arg("list-targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse global config"));
    Ok(())
}

#[test]
fn test_ref_and_pattern_conflict_reported() -> Result<()> {
    let project = TestProject::new()?;
    project.write_project(
        "targets:\n  - name: t\n    targetConfig:\n      project:\n        url: file:///nowhere\n      ref: main\n      refPattern: \".*\"\n",
    )?;

    project
        .command()
        .arg("list-targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("can't be specified together"));
    Ok(())
}
