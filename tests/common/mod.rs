//! Common test utilities for targetgen integration tests

// Not every suite uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use targetgen_cli::test_utils::TestGit;

/// A temporary project directory with its own cache and config.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    cache_dir: PathBuf,
    config_path: PathBuf,
    sources_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        targetgen_cli::test_utils::init_test_logging(None);
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let cache_dir = temp_dir.path().join("cache");
        let config_path = temp_dir.path().join("config.toml");
        let sources_dir = temp_dir.path().join("sources");

        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(&sources_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            cache_dir,
            config_path,
            sources_dir,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_dir
    }

    /// Write `.targetgen.yml`.
    pub fn write_project(&self, content: &str) -> Result<()> {
        self.write_file(".targetgen.yml", content)
    }

    /// Write a file relative to the project directory.
    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let full = self.project_dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, content).with_context(|| format!("Failed to write {}", full.display()))
    }

    /// Write `clusters/<name>.yml`.
    pub fn write_cluster(&self, name: &str, body: &str) -> Result<()> {
        self.write_file(&format!("clusters/{name}.yml"), &format!("cluster:\n{body}"))
    }

    pub fn write_global_config(&self, content: &str) -> Result<()> {
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Create an empty git repository under the sources directory.
    pub fn create_source_repo(&self, name: &str) -> Result<TestGit> {
        let git = TestGit::new(self.sources_dir.join(name));
        git.init()?;
        Ok(git)
    }

    /// `targetgen` with this project's directories preconfigured.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("targetgen").expect("targetgen binary");
        cmd.current_dir(&self.project_dir)
            .env("TARGETGEN_CACHE_DIR", &self.cache_dir)
            .env("TARGETGEN_CONFIG_PATH", &self.config_path)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// A repository with config files on `main`, `env/dev`, `env/prod` and tag `v1`.
///
/// HEAD is left on `main`.
pub fn env_repo(project: &TestProject) -> Result<TestGit> {
    let git = project.create_source_repo("envs")?;
    git.write_file("target-config.yml", "args:\n  env: main\n")?;
    git.commit_all("main")?;
    git.tag("v1")?;

    for env in ["dev", "prod"] {
        git.create_branch(&format!("env/{env}"))?;
        git.write_file("target-config.yml", &format!("args:\n  env: {env}\n  replicas: 2\n"))?;
        git.commit_all(env)?;
        git.checkout("main")?;
    }
    Ok(git)
}
