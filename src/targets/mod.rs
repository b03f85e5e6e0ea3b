//! Resolution of deployment targets.
//!
//! ```text
//! base targets ─► expander ─► config loader ─► builder ─► renderer ─► registry
//!                 (per ref)    (raw bytes)     (merge)    (fixed pt)  (dedup, sort)
//! ```
//!
//! [`TargetResolver`] drives one resolution pass. Base targets are expanded
//! and requests are built concurrently, but results are collected in
//! declaration order and, within a base target, in ref name order, so the
//! output does not depend on scheduling.
//!
//! # Failure policy
//!
//! A failure while building or rendering a request of a dynamic target (one
//! with `refPattern`) is logged and only that request is dropped. Any other
//! failure aborts the pass. Expansion errors are reported before build
//! errors, each kind in declaration order.

pub mod args;
pub mod builder;
pub mod config_loader;
pub mod expander;
pub mod ref_matcher;
pub mod registry;
pub mod render;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;

use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::project::{ClusterConfigLoader, Target};
use crate::repository::RepositoryProvider;

pub use builder::{build_target, merge_target_config};
pub use expander::{ConfigSource, ExpansionRequest, TargetExpander};
pub use ref_matcher::{RefMatcher, match_ref};
pub use registry::{DynamicTarget, TargetRegistry, register_all};
pub use render::{RenderOutcome, TargetRenderer};

/// Resolves base target declarations into the final target list.
pub struct TargetResolver {
    expander: TargetExpander,
    renderer: TargetRenderer,
    max_parallel: usize,
}

impl TargetResolver {
    pub fn new(project_dir: impl Into<PathBuf>, provider: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            expander: TargetExpander::new(project_dir, provider),
            renderer: TargetRenderer::new(),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    /// Expose cluster configs to templates as `cluster`.
    #[must_use]
    pub fn with_clusters(mut self, clusters: Arc<dyn ClusterConfigLoader>) -> Self {
        self.renderer = TargetRenderer::with_clusters(clusters);
        self
    }

    /// Bound the number of expansions and builds in flight.
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Run one resolution pass over `targets`.
    pub async fn resolve(&self, targets: &[Target]) -> Result<Vec<DynamicTarget>> {
        tracing::debug!("Resolving {} base target(s)", targets.len());
        let bases: Vec<Arc<Target>> = targets.iter().cloned().map(Arc::new).collect();

        // `buffered` yields in input order, which fixes the production order
        let expanded: Vec<_> = stream::iter(bases.iter().map(|base| self.expand(base)))
            .buffered(self.max_parallel)
            .collect()
            .await;
        let mut requests = Vec::new();
        for result in expanded {
            requests.extend(result?);
        }

        let built: Vec<_> = stream::iter(requests.iter().map(|request| self.build_and_render(request)))
            .buffered(self.max_parallel)
            .collect()
            .await;

        let mut registry = TargetRegistry::new();
        for (request, result) in requests.iter().zip(built) {
            match result {
                Ok(target) => {
                    registry.register(DynamicTarget {
                        target,
                        base_target_name: request.base.name.clone(),
                    });
                }
                Err(e) if request.is_dynamic() => {
                    tracing::warn!("Failed to load dynamic {}: {:#}", request.describe(), e);
                }
                Err(e) => {
                    return Err(e.context(format!("Failed to resolve {}", request.describe())));
                }
            }
        }

        let resolved = registry.into_sorted();
        tracing::debug!("Resolved {} target(s)", resolved.len());
        Ok(resolved)
    }

    async fn expand(&self, base: &Arc<Target>) -> Result<Vec<ExpansionRequest>> {
        self.expander
            .expand(base)
            .await
            .with_context(|| format!("Failed to expand target '{}'", base.name))
    }

    async fn build_and_render(&self, request: &ExpansionRequest) -> Result<Target> {
        let built = build_target(request).await?;
        self.renderer.render(built).await
    }
}
