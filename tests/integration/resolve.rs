//! End to end resolution of project files.

use anyhow::Result;
use std::sync::Arc;
use targetgen_cli::core::{ErrorKind, classify};
use targetgen_cli::project::{LocalClusterLoader, Project};
use targetgen_cli::repository::GitRepositoryProvider;
use targetgen_cli::targets::{DynamicTarget, TargetResolver};

use crate::common::{TestProject, env_repo};

async fn resolve(project: &TestProject) -> Result<Vec<DynamicTarget>> {
    let loaded = Project::load(project.project_path()).await?;
    TargetResolver::new(&loaded.dir, Arc::new(GitRepositoryProvider::new(project.cache_path())))
        .with_clusters(Arc::new(LocalClusterLoader::for_project(&loaded.dir)))
        .with_max_parallel(2)
        .resolve(loaded.targets())
        .await
}

fn names(targets: &[DynamicTarget]) -> Vec<&str> {
    targets.iter().map(|t| t.target.name.as_str()).collect()
}

#[tokio::test]
async fn test_dynamic_targets_per_branch() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    project.write_cluster("dev", "  name: dev\n  context: kind-dev\n")?;
    project.write_cluster("prod", "  name: prod\n  context: gke-prod\n")?;
    project.write_project(&format!(
        r#"targets:
  - name: "{{{{ target.args.env }}}}-app"
    cluster: "{{{{ target.args.env }}}}"
    context: "{{{{ cluster.context }}}}"
    args:
      env: none
      replicas: 1
    dynamicArgs:
      - name: env
        pattern: "dev|prod"
      - name: replicas
    targetConfig:
      project:
        url: {}
      refPattern: "env/.*"
"#,
        git.file_url()
    ))?;

    let resolved = resolve(&project).await?;
    assert_eq!(names(&resolved), vec!["dev-app", "prod-app"]);

    let prod = &resolved[1].target;
    assert_eq!(prod.cluster.as_deref(), Some("prod"));
    assert_eq!(prod.context.as_deref(), Some("gke-prod"));
    assert_eq!(prod.args["replicas"], 2);
    assert_eq!(prod.target_config.as_ref().and_then(|tc| tc.git_ref.as_deref()), Some("env/prod"));
    assert_eq!(resolved[1].base_target_name, "{{ target.args.env }}-app");
    Ok(())
}

#[tokio::test]
async fn test_invalid_branch_is_skipped() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    git.create_branch("env/bad")?;
    git.write_file("target-config.yml", "args:\n  env: staging\n")?;
    git.commit_all("bad")?;
    git.checkout("main")?;

    project.write_project(&format!(
        r#"targets:
  - name: "{{{{ target.targetConfig.ref }}}}"
    dynamicArgs:
      - name: env
        pattern: "dev|prod"
      - name: replicas
    targetConfig:
      project:
        url: {}
      refPattern: "env/.*"
"#,
        git.file_url()
    ))?;

    let resolved = resolve(&project).await?;
    assert_eq!(names(&resolved), vec!["env/dev", "env/prod"]);
    Ok(())
}

#[tokio::test]
async fn test_default_branch_and_local_targets() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    project.write_file("target-config.yaml", "args:\n  env: local\n")?;
    project.write_project(&format!(
        r#"targets:
  - name: from-default
    dynamicArgs:
      - name: env
    targetConfig:
      project:
        url: {}
  - name: "local-{{{{ target.args.env }}}}"
    dynamicArgs:
      - name: env
    targetConfig: {{}}
  - name: plain
"#,
        git.file_url()
    ))?;

    let resolved = resolve(&project).await?;
    assert_eq!(names(&resolved), vec!["from-default", "local-local", "plain"]);
    assert_eq!(resolved[0].target.args["env"], "main");
    assert_eq!(
        resolved[0].target.target_config.as_ref().and_then(|tc| tc.git_ref.as_deref()),
        Some("main")
    );
    Ok(())
}

#[tokio::test]
async fn test_pinned_ref_failure_aborts() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    project.write_project(&format!(
        r#"targets:
  - name: pinned
    targetConfig:
      project:
        url: {}
      ref: env/dev
"#,
        git.file_url()
    ))?;

    // env/dev supplies undeclared args
    let err = resolve(&project).await.unwrap_err();
    assert_eq!(classify(&err), ErrorKind::Validation);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_names_keep_first() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    project.write_project(&format!(
        r#"targets:
  - name: shared
    discriminator: first
    dynamicArgs:
      - name: env
      - name: replicas
    targetConfig:
      project:
        url: {url}
      refPattern: env/dev
  - name: shared
    discriminator: second
    dynamicArgs:
      - name: env
      - name: replicas
    targetConfig:
      project:
        url: {url}
      refPattern: env/prod
"#,
        url = git.file_url()
    ))?;

    let resolved = resolve(&project).await?;
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].target.discriminator.as_deref(), Some("first"));
    assert_eq!(resolved[0].target.args["env"], "dev");
    Ok(())
}

#[tokio::test]
async fn test_missing_project_file() {
    let project = TestProject::new().unwrap();
    let err = Project::load(project.project_path()).await.unwrap_err();
    assert_eq!(classify(&err), ErrorKind::Config);
}
