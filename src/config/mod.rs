//! Configuration management for targetgen
//!
//! targetgen reads three kinds of configuration:
//!
//! 1. **Global configuration** (`~/.targetgen/config.toml`, this module) with
//!    per-user settings such as the cache directory
//! 2. **Project file** (`.targetgen.yml`, see [`crate::project`]) declaring
//!    the base targets
//! 3. **Target configs** (`target-config.yml`) living next to the project or
//!    in external git repositories, merged into targets during resolution

mod global;

pub use global::{CONFIG_PATH_ENV, GlobalConfig};
