//! Access to external git repositories holding target configs.
//!
//! Resolution only needs two things from a repository: which refs exist (and
//! which branch is the default), and the files of one ref. [`RepositoryProvider`]
//! captures exactly that so the expander can be driven by the real
//! [`GitRepositoryProvider`] or by an in-memory provider in tests.

pub mod cache;
pub mod git_provider;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

pub use cache::RepoCache;
pub use git_provider::GitRepositoryProvider;

/// Metadata of a remote repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    /// Short name of the default branch, `None` if the remote reports none
    pub default_ref: Option<String>,
    /// Full names of all branches and tags, e.g. `refs/heads/main`
    pub remote_refs: BTreeSet<String>,
}

impl RepoInfo {
    /// Whether `refs/heads/<branch>` exists.
    #[must_use]
    pub fn has_branch(&self, branch: &str) -> bool {
        self.remote_refs.contains(&format!("refs/heads/{branch}"))
    }
}

/// Read-only view of the files of one ref.
#[async_trait]
pub trait GitTree: Send + Sync + Debug {
    /// Human readable `<url>@<ref>` used in log and error messages.
    fn describe(&self) -> String;

    /// Whether a file exists at `path` (relative to the repository root).
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Read the file at `path`.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Source of repository metadata and trees, keyed by project URL.
///
/// Implementations must memoize [`RepositoryProvider::get_entry`] per URL and
/// be safe to call concurrently: many base targets may reference the same
/// repository within one pass.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    async fn get_entry(&self, url: &str) -> Result<RepoInfo>;

    /// The tree of the branch or tag `short_ref` (a full ref name is accepted too).
    async fn get_tree(&self, url: &str, short_ref: &str) -> Result<Arc<dyn GitTree>>;
}
