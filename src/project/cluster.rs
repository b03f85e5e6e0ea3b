//! Cluster configs referenced by targets.
//!
//! A cluster config lives at `clusters/<name>.yml` (or `.yaml`) inside the
//! project directory and holds a single top-level `cluster` mapping:
//!
//! ```yaml
//! cluster:
//!   name: dev
//!   context: kind-dev
//!   domain: dev.example.com
//! ```
//!
//! The mapping is exposed to target templates as the `cluster` namespace.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::constants::CLUSTERS_DIR;
use crate::core::TargetError;
use crate::utils::{ensure_within_directory, read_yaml_file, secure_join};

/// Source of cluster configs by name.
#[async_trait]
pub trait ClusterConfigLoader: Send + Sync {
    /// Load the `cluster` mapping of the named cluster.
    async fn load_cluster(&self, name: &str) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterFile {
    cluster: Value,
}

/// Loads cluster configs from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalClusterLoader {
    dir: PathBuf,
}

impl LocalClusterLoader {
    /// Loader rooted at `<project_dir>/clusters`.
    #[must_use]
    pub fn for_project(project_dir: &Path) -> Self {
        Self::new(project_dir.join(CLUSTERS_DIR))
    }

    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self {
            dir,
        }
    }

    async fn find_file(&self, name: &str) -> Option<PathBuf> {
        for ext in ["yml", "yaml"] {
            let candidate = secure_join(&self.dir, &format!("{name}.{ext}"));
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

#[async_trait]
impl ClusterConfigLoader for LocalClusterLoader {
    async fn load_cluster(&self, name: &str) -> Result<Value> {
        let path = self.find_file(name).await.ok_or_else(|| TargetError::IoError {
            path: self.dir.join(format!("{name}.yml")).display().to_string(),
            reason: format!("cluster config '{name}' does not exist"),
        })?;
        let location = path.display().to_string();
        if !ensure_within_directory(&path, &self.dir).unwrap_or(false) {
            return Err(TargetError::IoError {
                path: location,
                reason: format!("cluster config '{name}' resolves outside of {}", self.dir.display()),
            }
            .into());
        }

        let file: ClusterFile = read_yaml_file(&path).await?;

        if !file.cluster.is_object() {
            return Err(TargetError::config(format!("'cluster' in {location} must be a mapping")).into());
        }
        if let Some(declared) = file.cluster.get("name").and_then(Value::as_str)
            && declared != name
        {
            return Err(TargetError::config(format!(
                "cluster config {location} declares name '{declared}', expected '{name}'"
            ))
            .into());
        }

        tracing::debug!("Loaded cluster config '{}' from {}", name, location);
        Ok(file.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let clusters = dir.path().join(CLUSTERS_DIR);
        std::fs::create_dir_all(&clusters).unwrap();
        std::fs::write(clusters.join("dev.yaml"), "cluster:\n  name: dev\n  context: kind-dev\n")
            .unwrap();

        let loader = LocalClusterLoader::for_project(dir.path());
        let cluster = loader.load_cluster("dev").await.unwrap();
        assert_eq!(cluster["context"], "kind-dev");
    }

    #[tokio::test]
    async fn test_missing_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let loader = LocalClusterLoader::for_project(dir.path());
        let err = loader.load_cluster("{{ target.args.env }}").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<TargetError>(), Some(TargetError::IoError { .. })));
    }

    #[tokio::test]
    async fn test_name_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let clusters = dir.path().join(CLUSTERS_DIR);
        std::fs::create_dir_all(&clusters).unwrap();
        std::fs::write(clusters.join("dev.yml"), "cluster:\n  name: prod\n").unwrap();

        let loader = LocalClusterLoader::for_project(dir.path());
        assert!(loader.load_cluster("dev").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_cluster_outside_project_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let clusters = dir.path().join(CLUSTERS_DIR);
        std::fs::create_dir_all(&clusters).unwrap();
        std::fs::write(dir.path().join("other.yml"), "cluster:\n  name: dev\n").unwrap();
        std::os::unix::fs::symlink("../other.yml", clusters.join("dev.yml")).unwrap();

        let loader = LocalClusterLoader::for_project(dir.path());
        let err = loader.load_cluster("dev").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<TargetError>(), Some(TargetError::IoError { .. })));
    }
}
