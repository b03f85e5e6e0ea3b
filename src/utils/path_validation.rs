//! Path handling that never escapes a base directory.
//!
//! Target config file names come from project declarations and must not be
//! able to point outside the project directory or repository tree, so every
//! such name goes through [`secure_join`] or [`clean_relative`]. Files on disk
//! are also checked with [`ensure_within_directory`] once symlinks resolve.

use anyhow::{Context, Result, anyhow};
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a relative path so it stays below its root.
///
/// `.` components are dropped, `..` pops the previous component but never
/// climbs above the root, and root or prefix components are ignored so an
/// absolute path is treated as relative. The result uses `/` separators,
/// which is the form git tree paths use.
#[must_use]
pub fn clean_relative(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => {
                if let Some(part) = part.to_str() {
                    parts.push(part);
                }
            }
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    parts.join("/")
}

/// Join `unsafe_path` onto `base` without ever leaving `base`.
///
/// Unlike [`Path::join`], an absolute `unsafe_path` does not replace `base`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use targetgen_cli::utils::secure_join;
///
/// let base = Path::new("/project");
/// assert_eq!(secure_join(base, "../../etc/passwd"), Path::new("/project/etc/passwd"));
/// assert_eq!(secure_join(base, "/abs/file.yml"), Path::new("/project/abs/file.yml"));
/// ```
#[must_use]
pub fn secure_join(base: &Path, unsafe_path: &str) -> PathBuf {
    let cleaned = clean_relative(unsafe_path);
    if cleaned.is_empty() {
        base.to_path_buf()
    } else {
        base.join(cleaned)
    }
}

/// Canonicalize `path`, falling back to its canonical parent when `path`
/// itself does not exist.
pub fn safe_canonicalize(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        if let Some(parent) = path.parent()
            && parent.exists()
        {
            let canonical_parent = parent
                .canonicalize()
                .with_context(|| format!("Failed to canonicalize parent of '{}'", path.display()))?;

            if let Some(file_name) = path.file_name() {
                return Ok(canonical_parent.join(file_name));
            }
        }
        return Err(anyhow!("Path does not exist: {}", path.display()));
    }

    path.canonicalize().with_context(|| format!("Failed to canonicalize path: {}", path.display()))
}

/// Whether `path` stays inside `boundary` after both are canonicalized.
///
/// A lexically clean path can still leave its base through a symlink, which
/// only shows up here.
pub fn ensure_within_directory(path: &Path, boundary: &Path) -> Result<bool> {
    let canonical_path = safe_canonicalize(path)?;
    let canonical_boundary = safe_canonicalize(boundary)?;

    Ok(canonical_path.starts_with(&canonical_boundary))
}

/// Join a file name onto an optional subdirectory, both cleaned.
#[must_use]
pub fn join_tree_path(sub_dir: Option<&str>, file: &str) -> String {
    match sub_dir.map(clean_relative).filter(|d| !d.is_empty()) {
        Some(dir) => clean_relative(&format!("{dir}/{file}")),
        None => clean_relative(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_relative() {
        assert_eq!(clean_relative("target-config.yml"), "target-config.yml");
        assert_eq!(clean_relative("./a/./b.yml"), "a/b.yml");
        assert_eq!(clean_relative("a/../b.yml"), "b.yml");
        assert_eq!(clean_relative("../../../etc/passwd"), "etc/passwd");
        assert_eq!(clean_relative("/etc/passwd"), "etc/passwd");
        assert_eq!(clean_relative(".."), "");
    }

    #[test]
    fn test_secure_join_stays_inside_base() {
        let base = Path::new("/work/project");
        assert_eq!(secure_join(base, "cfg/t.yml"), Path::new("/work/project/cfg/t.yml"));
        assert_eq!(secure_join(base, "../../outside.yml"), Path::new("/work/project/outside.yml"));
        assert!(secure_join(base, "/etc/shadow").starts_with(base));
        assert_eq!(secure_join(base, ""), base);
    }

    #[test]
    fn test_ensure_within_directory() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("project");
        std::fs::create_dir_all(base.join("cfg")).unwrap();
        std::fs::write(base.join("cfg/t.yml"), "").unwrap();
        std::fs::write(root.path().join("outside.yml"), "").unwrap();

        assert!(ensure_within_directory(&base.join("cfg/t.yml"), &base).unwrap());
        assert!(ensure_within_directory(&base.join("cfg/missing.yml"), &base).unwrap());
        assert!(!ensure_within_directory(&root.path().join("outside.yml"), &base).unwrap());
        assert!(ensure_within_directory(&base.join("nope/missing.yml"), &base).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_directory_detected() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("project");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(root.path().join("outside.yml"), "").unwrap();
        std::os::unix::fs::symlink("../outside.yml", base.join("link.yml")).unwrap();

        let joined = secure_join(&base, "link.yml");
        assert!(joined.starts_with(&base));
        assert!(!ensure_within_directory(&joined, &base).unwrap());
    }

    #[test]
    fn test_join_tree_path() {
        assert_eq!(join_tree_path(None, "target-config.yml"), "target-config.yml");
        assert_eq!(join_tree_path(Some("envs/prod"), "t.yml"), "envs/prod/t.yml");
        assert_eq!(join_tree_path(Some("envs"), "../../t.yml"), "t.yml");
        assert_eq!(join_tree_path(Some("./"), "t.yml"), "t.yml");
    }
}
