//! Collecting resolved targets into the final, deduplicated list.

use serde::Serialize;
use std::collections::HashSet;

use crate::project::Target;

/// A fully resolved target and the base target it was produced from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicTarget {
    pub target: Target,
    pub base_target_name: String,
}

/// Deduplicates resolved targets by name, first registration wins.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    seen: HashSet<String>,
    targets: Vec<DynamicTarget>,
    duplicates: Vec<String>,
}

impl TargetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target, returning `false` if its name was already taken.
    pub fn register(&mut self, target: DynamicTarget) -> bool {
        if !self.seen.insert(target.target.name.clone()) {
            tracing::warn!(
                "Duplicate target {} (from base target '{}'), keeping the first one",
                target.target.name,
                target.base_target_name
            );
            self.duplicates.push(target.target.name);
            return false;
        }
        self.targets.push(target);
        true
    }

    /// Names that were rejected as duplicates, in rejection order.
    #[must_use]
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// The kept targets sorted by name.
    #[must_use]
    pub fn into_sorted(mut self) -> Vec<DynamicTarget> {
        self.targets.sort_by(|a, b| a.target.name.cmp(&b.target.name));
        self.targets
    }
}

/// Deduplicate `resolved` (in production order) and sort it by name.
#[must_use]
pub fn register_all(resolved: impl IntoIterator<Item = DynamicTarget>) -> Vec<DynamicTarget> {
    let mut registry = TargetRegistry::new();
    for target in resolved {
        registry.register(target);
    }
    registry.into_sorted()
}
