//! Global configuration for targetgen.
//!
//! The global configuration file (`~/.targetgen/config.toml`) holds per-user
//! settings that do not belong in a project: where repository mirrors are
//! cached, how long network git operations may take and how much work runs
//! in parallel.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.targetgen/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\targetgen\config.toml`
//!
//! The location can be overridden with the `TARGETGEN_CONFIG_PATH`
//! environment variable or the `--config` flag.
//!
//! # File Format
//!
//! ```toml
//! cache_dir = "~/.cache/targetgen"
//! git_timeout_secs = 120
//! max_parallel = 4
//! ```
//!
//! Every field is optional. A missing file is the same as an empty one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::utils::{get_cache_dir, resolve_path};

/// Environment variable overriding the global config location
pub const CONFIG_PATH_ENV: &str = "TARGETGEN_CONFIG_PATH";

/// Per-user settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Directory for repository mirrors. `~` and environment variables are
    /// expanded. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Timeout for `ls-remote`, `clone` and `fetch`, replacing the built-in
    /// defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,

    /// Upper bound on concurrently resolved targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,
}

impl GlobalConfig {
    /// Load from `TARGETGEN_CONFIG_PATH` or the default location.
    ///
    /// Returns the default configuration if the file does not exist.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise as [`GlobalConfig::load`] does.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file, which must exist.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// The global config location, honoring `TARGETGEN_CONFIG_PATH`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return resolve_path(&path);
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("targetgen")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".targetgen")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Cache directory to use, `override_dir` taking precedence over the file.
    pub fn resolved_cache_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.to_path_buf());
        }
        match &self.cache_dir {
            Some(dir) => resolve_path(dir),
            None => get_cache_dir(),
        }
    }

    #[must_use]
    pub fn git_timeout(&self) -> Option<Duration> {
        self.git_timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn max_parallel(&self) -> usize {
        self.max_parallel.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_PARALLEL)
    }
}
