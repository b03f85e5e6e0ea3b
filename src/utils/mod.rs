//! Shared helpers
//!
//! - [`path_validation`] - traversal-safe joins for config file names
//! - [`platform`] - git executable name, home and cache directories, path expansion
//! - [`yaml`] - typed YAML parsing with file-aware errors

pub mod path_validation;
pub mod platform;
pub mod yaml;

pub use path_validation::{
    clean_relative, ensure_within_directory, join_tree_path, safe_canonicalize, secure_join,
};
pub use platform::{get_cache_dir, get_git_command, get_home_dir, resolve_path};
pub use yaml::{parse_yaml, read_yaml_file};
