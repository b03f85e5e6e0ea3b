//! The git backed repository provider against real repositories.

use anyhow::Result;
use targetgen_cli::repository::{GitRepositoryProvider, RepositoryProvider};

use crate::common::{TestProject, env_repo};

#[tokio::test]
async fn test_entry_lists_refs_and_default_branch() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    let provider = GitRepositoryProvider::new(project.cache_path());

    let info = provider.get_entry(&git.file_url()).await?;
    assert_eq!(info.default_ref.as_deref(), Some("main"));
    let refs: Vec<&str> = info.remote_refs.iter().map(String::as_str).collect();
    assert_eq!(refs, vec!["refs/heads/env/dev", "refs/heads/env/prod", "refs/heads/main", "refs/tags/v1"]);

    assert!(provider.mirror_path(&git.file_url()).join("HEAD").is_file());
    Ok(())
}

#[tokio::test]
async fn test_tree_reads_files_of_ref() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    let provider = GitRepositoryProvider::new(project.cache_path());
    let url = git.file_url();

    let dev = provider.get_tree(&url, "env/dev").await?;
    assert!(dev.exists("target-config.yml").await?);
    assert!(!dev.exists("target-config.yaml").await?);
    let content = String::from_utf8(dev.read("target-config.yml").await?)?;
    assert!(content.contains("env: dev"));
    assert!(dev.describe().ends_with("@env/dev"));

    let tag = provider.get_tree(&url, "v1").await?;
    assert!(String::from_utf8(tag.read("target-config.yml").await?)?.contains("env: main"));

    assert!(dev.read("missing.yml").await.is_err());
    assert!(provider.get_tree(&url, "env/none").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_existing_mirror_is_updated() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    let url = git.file_url();

    GitRepositoryProvider::new(project.cache_path()).get_entry(&url).await?;

    git.create_branch("env/qa")?;
    git.write_file("target-config.yml", "args:\n  env: qa\n")?;
    git.commit_all("qa")?;
    git.checkout("main")?;
    git.delete_branch("env/prod")?;

    // A new provider shares the mirror but not the in-memory entries
    let provider = GitRepositoryProvider::new(project.cache_path());
    let info = provider.get_entry(&url).await?;
    assert!(info.has_branch("env/qa"));
    assert!(!info.has_branch("env/prod"));

    let qa = provider.get_tree(&url, "env/qa").await?;
    assert!(String::from_utf8(qa.read("target-config.yml").await?)?.contains("env: qa"));
    Ok(())
}

#[tokio::test]
async fn test_entry_is_memoized() -> Result<()> {
    let project = TestProject::new()?;
    let git = env_repo(&project)?;
    let provider = GitRepositoryProvider::new(project.cache_path());
    let url = git.file_url();

    let first = provider.get_entry(&url).await?;
    git.create_branch("env/late")?;
    git.checkout("main")?;
    let second = provider.get_entry(&url).await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_repository_fails() {
    let project = TestProject::new().unwrap();
    let provider = GitRepositoryProvider::new(project.cache_path());
    let url = format!("file://{}", project.project_path().join("nope").display());
    assert!(provider.get_entry(&url).await.is_err());
}
