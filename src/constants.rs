//! Global constants used throughout the targetgen codebase.

use std::time::Duration;

/// Upper bound on fixed-point rendering passes for a single target.
///
/// Self-referential templates that keep changing are cut off after this many
/// iterations and the last computed value is returned.
pub const MAX_RENDER_ITERATIONS: usize = 10;

/// Target config file names probed, in order, when no explicit file is set.
pub const DEFAULT_TARGET_CONFIG_FILES: [&str; 2] = ["target-config.yml", "target-config.yaml"];

/// Project file names probed, in order, inside the project directory.
pub const PROJECT_FILES: [&str; 2] = [".targetgen.yml", ".targetgen.yaml"];

/// Directory (relative to the project) holding cluster configs.
pub const CLUSTERS_DIR: &str = "clusters";

/// Timeout for Git ls-remote operations (60 seconds).
pub const GIT_LS_REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for Git fetch operations (60 seconds).
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for Git clone operations (120 seconds).
///
/// Clone operations may take longer than fetch, especially
/// for large repositories.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of base targets resolved concurrently.
pub const DEFAULT_MAX_PARALLEL: usize = 8;
