//! Test utilities for targetgen
//!
//! In-memory stand-ins for git remotes and cluster configs, a helper for
//! building real git repositories, and one-time log initialization.
//!
//! # Example
//!
//! ```rust,no_run
//! use targetgen_cli::test_utils::{MemoryRepo, MemoryRepositoryProvider};
//!
//! let provider = MemoryRepositoryProvider::new();
//! provider.add_repo(
//!     "https://example.com/envs.git",
//!     MemoryRepo::new("main").branch("main", &[("target-config.yml", "args: {}")]),
//! );
//! ```

pub mod git_helper;
pub mod memory;

pub use git_helper::TestGit;
pub use memory::{MemoryClusterLoader, MemoryRepo, MemoryRepositoryProvider, MemoryTree};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither set, nothing is logged.
///
/// ```bash
/// RUST_LOG=targetgen_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
