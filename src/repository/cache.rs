//! Single-flight memoization keyed by repository URL.
//!
//! The first caller for a URL runs the fetch, concurrent callers for the same
//! URL wait for it and share the result. A failed fetch is not cached, the
//! next caller tries again.

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Per-URL memoizing cache.
#[derive(Debug)]
pub struct RepoCache<T> {
    entries: DashMap<String, Arc<OnceCell<T>>>,
}

impl<T> Default for RepoCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: Clone> RepoCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `url`, running `init` if there is none yet.
    pub async fn get_or_try_init<F, Fut>(&self, url: &str, init: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Clone the cell out so the shard lock is not held across the await
        let cell = self.entries.entry(url.to_string()).or_default().clone();
        cell.get_or_try_init(init).await.cloned()
    }

    /// The cached value for `url`, if a fetch already succeeded.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<T> {
        self.entries.get(url).and_then(|cell| cell.get().cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().initialized()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
