//! Project directory handling
//!
//! A project directory contains a `.targetgen.yml` declaring the base targets
//! and, optionally, a `clusters/` directory with cluster configs:
//!
//! ```text
//! my-project/
//! ├── .targetgen.yml
//! ├── target-config.yml     # config for local (non-external) targets
//! └── clusters/
//!     └── dev.yml
//! ```

pub mod cluster;
pub mod types;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants::PROJECT_FILES;
use crate::core::TargetError;
use crate::utils::parse_yaml;

pub use cluster::{ClusterConfigLoader, LocalClusterLoader};
pub use types::{
    DynamicArg, ExternalTargetConfig, FixedImage, GitProject, ProjectConfig, Target, TargetConfig,
};

/// A loaded project.
#[derive(Debug, Clone)]
pub struct Project {
    /// The project directory, local targets load their config relative to it
    pub dir: PathBuf,
    /// The project file that was loaded
    pub file: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    /// Locate the project file inside `dir`.
    #[must_use]
    pub fn find_project_file(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES.iter().map(|name| dir.join(name)).find(|p| p.is_file())
    }

    /// Load the project in `dir`.
    pub async fn load(dir: &Path) -> Result<Self> {
        let file = Self::find_project_file(dir).ok_or_else(|| TargetError::ProjectNotFound {
            path: dir.display().to_string(),
        })?;

        let bytes = tokio::fs::read(&file)
            .await
            .with_context(|| format!("Failed to read project file: {}", file.display()))?;
        let config: ProjectConfig = parse_yaml(&bytes, &file.display().to_string())?;

        tracing::debug!("Loaded {} target declaration(s) from {}", config.targets.len(), file.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            file,
            config,
        })
    }

    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.config.targets
    }
}
