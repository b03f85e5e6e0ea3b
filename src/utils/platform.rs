//! Platform-specific helpers.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Name of the git executable for the current platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Returns the user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().context(
        "Could not determine home directory.\n\n\
        Set the HOME environment variable (USERPROFILE on Windows).",
    )
}

/// Resolve a user-supplied path, expanding `~` and environment variables.
///
/// # Examples
///
/// ```rust,no_run
/// use targetgen_cli::utils::resolve_path;
///
/// let cache = resolve_path("~/.targetgen/cache")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Default cache directory for cloned repositories.
pub fn get_cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TARGETGEN_CACHE_DIR") {
        return resolve_path(&dir);
    }
    let base = dirs::cache_dir().map_or_else(|| get_home_dir().map(|h| h.join(".cache")), Ok)?;
    Ok(base.join("targetgen"))
}
