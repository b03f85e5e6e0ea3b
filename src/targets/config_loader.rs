//! Loading raw target config files for an [`ExpansionRequest`].
//!
//! Without an explicit `targetConfig.file`, `target-config.yml` is used if it
//! exists and `target-config.yaml` otherwise.

use anyhow::Result;

use super::expander::{ConfigSource, ExpansionRequest};
use crate::constants::DEFAULT_TARGET_CONFIG_FILES;
use crate::core::TargetError;
use crate::repository::GitTree;
use crate::utils::{ensure_within_directory, join_tree_path, secure_join};

/// Raw contents of a target config file.
#[derive(Debug, Clone)]
pub struct LoadedConfigFile {
    /// Where the file was read from, for messages
    pub location: String,
    pub bytes: Vec<u8>,
}

/// Read the target config of `request`.
pub async fn load_target_config(request: &ExpansionRequest) -> Result<LoadedConfigFile> {
    let explicit = request.base.target_config.as_ref().and_then(|tc| tc.file.as_deref());

    match &request.source {
        ConfigSource::Git {
            tree,
            sub_dir,
        } => load_from_tree(tree.as_ref(), sub_dir.as_deref(), explicit).await,
        ConfigSource::Local {
            dir,
        } => load_from_dir(dir, explicit).await,
    }
}

async fn load_from_tree(
    tree: &dyn GitTree,
    sub_dir: Option<&str>,
    explicit: Option<&str>,
) -> Result<LoadedConfigFile> {
    let io_error = |path: &str, reason: String| TargetError::IoError {
        path: format!("{}:{path}", tree.describe()),
        reason,
    };

    let path = match explicit {
        Some(file) => join_tree_path(sub_dir, file),
        None => {
            let [yml, yaml] = DEFAULT_TARGET_CONFIG_FILES.map(|f| join_tree_path(sub_dir, f));
            let exists = tree.exists(&yml).await.map_err(|e| io_error(&yml, format!("{e:#}")))?;
            if exists { yml } else { yaml }
        }
    };

    let bytes = tree.read(&path).await.map_err(|e| io_error(&path, format!("{e:#}")))?;
    tracing::debug!("Loaded target config {}:{}", tree.describe(), path);

    Ok(LoadedConfigFile {
        location: format!("{}:{path}", tree.describe()),
        bytes,
    })
}

async fn load_from_dir(dir: &std::path::Path, explicit: Option<&str>) -> Result<LoadedConfigFile> {
    let file = match explicit {
        Some(file) => file.to_string(),
        None => {
            let [yml, yaml] = DEFAULT_TARGET_CONFIG_FILES;
            let yml_exists = tokio::fs::try_exists(secure_join(dir, yml)).await.unwrap_or(false);
            let chosen = if yml_exists { yml } else { yaml };
            chosen.to_string()
        }
    };

    let path = secure_join(dir, &file);
    if !tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
        return Err(TargetError::IoError {
            path: path.display().to_string(),
            reason: format!("no target config file with name {file} found in target"),
        }
        .into());
    }
    if !ensure_within_directory(&path, dir).unwrap_or(false) {
        return Err(TargetError::IoError {
            path: path.display().to_string(),
            reason: format!("target config file {file} resolves outside of {}", dir.display()),
        }
        .into());
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| TargetError::IoError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!("Loaded target config {}", path.display());

    Ok(LoadedConfigFile {
        location: path.display().to_string(),
        bytes,
    })
}
