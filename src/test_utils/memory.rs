//! In-memory repository and cluster sources.
//!
//! These stand in for git remotes and the `clusters/` directory so expansion
//! and rendering can be tested without spawning git.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::TargetError;
use crate::project::ClusterConfigLoader;
use crate::repository::{GitTree, RepoCache, RepoInfo, RepositoryProvider};

/// Files of one ref.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    label: String,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryTree {
    pub fn new(label: impl Into<String>, files: &[(&str, &str)]) -> Self {
        Self {
            label: label.into(),
            files: files.iter().map(|(p, c)| ((*p).to_string(), c.as_bytes().to_vec())).collect(),
        }
    }
}

#[async_trait]
impl GitTree for MemoryTree {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| anyhow!("{path} not found in {}", self.label))
    }
}

/// A fake remote: a default branch plus branches and tags with their files.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    default_ref: Option<String>,
    /// Keyed by full ref name
    refs: BTreeMap<String, Vec<(String, String)>>,
}

impl MemoryRepo {
    /// Repository whose HEAD points at `default_branch`.
    pub fn new(default_branch: &str) -> Self {
        Self {
            default_ref: Some(default_branch.to_string()),
            refs: BTreeMap::new(),
        }
    }

    /// Repository that reports no HEAD.
    pub fn without_default() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn branch(self, name: &str, files: &[(&str, &str)]) -> Self {
        self.with_ref(format!("refs/heads/{name}"), files)
    }

    #[must_use]
    pub fn tag(self, name: &str, files: &[(&str, &str)]) -> Self {
        self.with_ref(format!("refs/tags/{name}"), files)
    }

    fn with_ref(mut self, full: String, files: &[(&str, &str)]) -> Self {
        let files = files.iter().map(|(p, c)| ((*p).to_string(), (*c).to_string())).collect();
        self.refs.insert(full, files);
        self
    }

    fn tree(&self, url: &str, short_ref: &str) -> Option<MemoryTree> {
        let candidates = [format!("refs/heads/{short_ref}"), format!("refs/tags/{short_ref}"), short_ref.to_string()];
        candidates.iter().find_map(|full| {
            self.refs.get(full).map(|files| {
                let files: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
                MemoryTree::new(format!("{url}@{short_ref}"), &files)
            })
        })
    }
}

/// [`RepositoryProvider`] over [`MemoryRepo`]s.
///
/// Entries are memoized like the git provider does, and the number of
/// uncached lookups is counted.
#[derive(Debug, Default)]
pub struct MemoryRepositoryProvider {
    repos: DashMap<String, MemoryRepo>,
    entries: RepoCache<RepoInfo>,
    entry_calls: AtomicUsize,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repo(&self, url: &str, repo: MemoryRepo) {
        self.repos.insert(url.to_string(), repo);
    }

    /// Number of entries built so far, cache hits excluded.
    pub fn entry_calls(&self) -> usize {
        self.entry_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn get_entry(&self, url: &str) -> Result<RepoInfo> {
        self.entries
            .get_or_try_init(url, || async {
                self.entry_calls.fetch_add(1, Ordering::SeqCst);
                let repo = self.repos.get(url).ok_or_else(|| TargetError::GitCloneFailed {
                    url: url.to_string(),
                    reason: "repository not found".to_string(),
                })?;
                Ok::<_, anyhow::Error>(RepoInfo {
                    default_ref: repo.default_ref.clone(),
                    remote_refs: repo.refs.keys().cloned().collect(),
                })
            })
            .await
    }

    async fn get_tree(&self, url: &str, short_ref: &str) -> Result<Arc<dyn GitTree>> {
        let repo = self.repos.get(url).ok_or_else(|| anyhow!("unknown repository {url}"))?;
        let tree = repo.tree(url, short_ref).ok_or_else(|| anyhow!("{url} has no ref {short_ref}"))?;
        Ok(Arc::new(tree))
    }
}

/// [`ClusterConfigLoader`] over a fixed set of cluster mappings.
#[derive(Debug, Clone, Default)]
pub struct MemoryClusterLoader {
    clusters: HashMap<String, Value>,
}

impl MemoryClusterLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cluster(mut self, name: &str, cluster: Value) -> Self {
        self.clusters.insert(name.to_string(), cluster);
        self
    }
}

#[async_trait]
impl ClusterConfigLoader for MemoryClusterLoader {
    async fn load_cluster(&self, name: &str) -> Result<Value> {
        self.clusters.get(name).cloned().ok_or_else(|| {
            TargetError::IoError {
                path: format!("clusters/{name}.yml"),
                reason: "cluster not found".to_string(),
            }
            .into()
        })
    }
}
