//! [`RepositoryProvider`] backed by bare mirrors in the cache directory.
//!
//! Mirrors live at `<cache_dir>/repos/<name>-<hash>` where `hash` is derived
//! from the URL, so two URLs with the same repository name never collide.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{GitTree, RepoCache, RepoInfo, RepositoryProvider};
use crate::core::TargetError;
use crate::git::{GitRepo, list_remote_refs, strip_auth_from_url};

/// Git-backed repository provider.
#[derive(Debug)]
pub struct GitRepositoryProvider {
    cache_dir: PathBuf,
    entries: RepoCache<RepoInfo>,
    /// Replaces the default timeouts of network operations
    network_timeout: Option<Duration>,
}

impl GitRepositoryProvider {
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            entries: RepoCache::new(),
            network_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Location of the bare mirror for `url`.
    #[must_use]
    pub fn mirror_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = hex::encode(hasher.finalize());

        let name = url
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .rsplit(['/', ':', '\\'])
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("repo");
        let name: String =
            name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect();

        self.cache_dir.join("repos").join(format!("{name}-{}", &hash[..16]))
    }

    /// Clone the mirror if missing, otherwise fetch into it.
    async fn sync_mirror(&self, url: &str) -> Result<GitRepo> {
        let path = self.mirror_path(url);
        let repo = GitRepo::new(&path);

        if repo.is_git_repo() {
            tracing::debug!("Updating mirror of {} at {}", strip_auth_from_url(url), path.display());
            repo.fetch_all(url, self.network_timeout).await?;
            return Ok(repo);
        }

        if path.exists() {
            tracing::warn!("Removing corrupt mirror at {}", path.display());
            tokio::fs::remove_dir_all(&path)
                .await
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }

        tracing::debug!("Cloning {} into {}", strip_auth_from_url(url), path.display());
        GitRepo::clone_bare(url, &path, self.network_timeout).await
    }

    async fn fetch_entry(&self, url: &str) -> Result<RepoInfo> {
        let remote = list_remote_refs(url, self.network_timeout).await?;
        self.sync_mirror(url).await?;

        let info = RepoInfo {
            default_ref: remote.default_branch().map(ToString::to_string),
            remote_refs: remote.refs.into_keys().collect(),
        };
        tracing::debug!(
            "{}: {} ref(s), default branch {:?}",
            strip_auth_from_url(url),
            info.remote_refs.len(),
            info.default_ref
        );
        Ok(info)
    }
}

#[async_trait]
impl RepositoryProvider for GitRepositoryProvider {
    async fn get_entry(&self, url: &str) -> Result<RepoInfo> {
        self.entries.get_or_try_init(url, || self.fetch_entry(url)).await
    }

    async fn get_tree(&self, url: &str, short_ref: &str) -> Result<Arc<dyn GitTree>> {
        // Makes sure the mirror exists and is current
        self.get_entry(url).await?;
        let repo = GitRepo::new(self.mirror_path(url));

        // Branches win over tags of the same name, matching ref pattern order
        let candidates =
            [format!("refs/heads/{short_ref}"), format!("refs/tags/{short_ref}"), short_ref.to_string()];
        for candidate in &candidates {
            if let Some(commit) = repo.resolve_commit(candidate).await? {
                tracing::trace!("{}@{} resolved to {}", strip_auth_from_url(url), short_ref, commit);
                return Ok(Arc::new(GitRepoTree {
                    repo,
                    commit,
                    label: format!("{}@{short_ref}", strip_auth_from_url(url)),
                }));
            }
        }

        Err(TargetError::GitCommandError {
            operation: "rev-parse".to_string(),
            stderr: format!("ref '{short_ref}' not found in {}", strip_auth_from_url(url)),
        }
        .into())
    }
}

/// The files of one commit in a bare mirror.
#[derive(Debug)]
struct GitRepoTree {
    repo: GitRepo,
    commit: String,
    label: String,
}

#[async_trait]
impl GitTree for GitRepoTree {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.repo.object_exists(&self.commit, path).await
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.repo.read_blob(&self.commit, path).await
    }
}
