//! targetgen - dynamic GitOps deployment targets
//!
//! A project declares base targets in `.targetgen.yml`. A base target may
//! point at an external git repository and select refs of it with a regex
//! (`refPattern`); every matching branch or tag then produces its own target,
//! configured by the `target-config.yml` found at that ref. Target fields are
//! Tera templates that can reference the target itself and its cluster config,
//! and are rendered to a fixed point.
//!
//! ```text
//! .targetgen.yml ─► TargetResolver ─► [DynamicTarget]
//!                       │
//!                       ├─ repository: refs and trees of external repos (git mirrors)
//!                       ├─ project: clusters/<name>.yml
//!                       └─ targets: expand ─► load ─► build ─► render ─► register
//! ```
//!
//! # Modules
//!
//! - [`targets`] - ref matching, expansion, config merge, rendering, registry
//! - [`repository`] - repository metadata and trees, memoized per URL
//! - [`git`] - git operations over the system `git` binary
//! - [`project`] - project file, target data model, cluster configs
//! - [`templating`] - Tera rendering with structured errors
//! - [`config`] - global user configuration (`~/.targetgen/config.toml`)
//! - [`core`] - error types and user facing error reporting
//! - [`cli`] - the `targetgen` command line
//! - [`utils`] - path, platform and YAML helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use targetgen_cli::project::{LocalClusterLoader, Project};
//! use targetgen_cli::repository::GitRepositoryProvider;
//! use targetgen_cli::targets::TargetResolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let project = Project::load(Path::new(".")).await?;
//! let resolver = TargetResolver::new(&project.dir, Arc::new(GitRepositoryProvider::new("/tmp/cache")))
//!     .with_clusters(Arc::new(LocalClusterLoader::for_project(&project.dir)));
//!
//! for resolved in resolver.resolve(project.targets()).await? {
//!     println!("{} (from {})", resolved.target.name, resolved.base_target_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod project;
pub mod repository;
pub mod targets;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
