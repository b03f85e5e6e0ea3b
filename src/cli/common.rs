//! Common utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::GlobalConfig;
use crate::project::{LocalClusterLoader, Project};
use crate::repository::GitRepositoryProvider;
use crate::targets::{DynamicTarget, TargetResolver};

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub project_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Everything a command needs to resolve the targets of a project.
#[derive(Debug)]
pub struct CommandContext {
    pub project: Project,
    pub global: GlobalConfig,
    /// Directory holding repository mirrors
    pub cache_dir: PathBuf,
}

impl CommandContext {
    /// Load the project and global configuration named by `options`.
    pub async fn load(options: &GlobalOptions) -> Result<Self> {
        let project_dir = match &options.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let global = GlobalConfig::load_with_optional(options.config_path.clone()).await?;
        let cache_dir = global.resolved_cache_dir(options.cache_dir.as_deref())?;
        let project = Project::load(&project_dir).await?;

        Ok(Self {
            project,
            global,
            cache_dir,
        })
    }

    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project.dir
    }

    /// Resolver for this project, backed by git mirrors in the cache directory.
    #[must_use]
    pub fn resolver(&self) -> TargetResolver {
        let mut provider = GitRepositoryProvider::new(&self.cache_dir);
        if let Some(timeout) = self.global.git_timeout() {
            provider = provider.with_network_timeout(timeout);
        }

        TargetResolver::new(self.project_dir(), Arc::new(provider))
            .with_clusters(Arc::new(LocalClusterLoader::for_project(self.project_dir())))
            .with_max_parallel(self.global.max_parallel())
    }

    /// Resolve every target of the project.
    pub async fn resolve(&self) -> Result<Vec<DynamicTarget>> {
        self.resolver()
            .resolve(self.project.targets())
            .await
            .with_context(|| format!("Failed to resolve targets of {}", self.project.file.display()))
    }
}
