//! Fixed-point rendering of targets.
//!
//! Target fields may reference other fields of the same target
//! (`name: "{{ target.args.env }}-app"`) and, once the cluster is known, the
//! fields of its cluster config (`context: "{{ cluster.context }}"`). A
//! referenced field may itself be templated, so rendering repeats until a
//! pass no longer changes the target, for at most
//! [`MAX_RENDER_ITERATIONS`] passes.
//!
//! Every pass exposes the current, possibly partially rendered, target as
//! `target`. If the current target names a cluster and that cluster config
//! loads, it is exposed as `cluster`; a load failure is tolerated because the
//! cluster name may still be a template at that point.

use anyhow::Result;
use std::sync::Arc;

use crate::constants::MAX_RENDER_ITERATIONS;
use crate::core::TargetError;
use crate::project::{ClusterConfigLoader, Target};
use crate::templating::{TemplateContext, TemplateRenderer};

/// Result of rendering one target.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub target: Target,
    /// Number of passes performed, including the one that confirmed the fixed point
    pub iterations: usize,
    /// Whether the last pass left the target unchanged
    pub converged: bool,
}

/// Renders targets to their fixed point.
#[derive(Clone, Default)]
pub struct TargetRenderer {
    clusters: Option<Arc<dyn ClusterConfigLoader>>,
}

impl TargetRenderer {
    /// Renderer without cluster configs; `cluster.*` references cannot resolve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clusters(clusters: Arc<dyn ClusterConfigLoader>) -> Self {
        Self {
            clusters: Some(clusters),
        }
    }

    /// Render `target`, returning the fixed point or the last value computed.
    pub async fn render(&self, target: Target) -> Result<Target> {
        Ok(self.render_with_outcome(target).await?.target)
    }

    /// Like [`TargetRenderer::render`], also reporting how rendering went.
    pub async fn render_with_outcome(&self, target: Target) -> Result<RenderOutcome> {
        let mut renderer = TemplateRenderer::new();
        let mut current = target;
        let mut deferred = Vec::new();

        for iteration in 1..=MAX_RENDER_ITERATIONS {
            let context = self.context_for(&current).await?;
            let value = serde_json::to_value(&current)?;

            let rendered = renderer.render_json(&value, &context).map_err(|source| {
                TargetError::TemplateError {
                    target: current.name.clone(),
                    source,
                }
            })?;
            deferred = rendered.deferred;

            let next: Target = serde_json::from_value(rendered.value).map_err(|e| {
                TargetError::config(format!("Rendered target '{}' is invalid: {e}", current.name))
            })?;

            if next == current {
                tracing::trace!("Target '{}' reached its fixed point after {} pass(es)", current.name, iteration);
                return Self::finish(current, iteration, true, deferred);
            }
            current = next;
        }

        tracing::warn!(
            "Target '{}' did not stabilize after {} render passes, using the last result",
            current.name,
            MAX_RENDER_ITERATIONS
        );
        Self::finish(current, MAX_RENDER_ITERATIONS, false, deferred)
    }

    /// Templates that never got their namespace are errors once rendering stops.
    fn finish(
        target: Target,
        iterations: usize,
        converged: bool,
        deferred: Vec<crate::templating::TemplateError>,
    ) -> Result<RenderOutcome> {
        if let Some(source) = deferred.into_iter().next() {
            return Err(TargetError::TemplateError {
                target: target.name,
                source,
            }
            .into());
        }
        Ok(RenderOutcome {
            target,
            iterations,
            converged,
        })
    }

    async fn context_for(&self, current: &Target) -> Result<TemplateContext> {
        let mut context = TemplateContext::new();
        context.insert("target", current);

        if let (Some(name), Some(clusters)) = (&current.cluster, &self.clusters) {
            match clusters.load_cluster(name).await {
                Ok(cluster) => context.insert("cluster", &cluster),
                Err(e) => {
                    tracing::debug!("Cluster '{}' not available for target '{}': {:#}", name, current.name, e);
                }
            }
        }

        Ok(context)
    }
}
