//! Command-line interface for targetgen.
//!
//! # Available Commands
//!
//! - `list-targets` - resolve every target of the project and list them
//! - `render-target` - resolve the project and print a single target
//!
//! # Global Options
//!
//! - `--project-dir` - directory containing `.targetgen.yml` (default: current directory)
//! - `--cache-dir` - where git mirrors are kept
//! - `--config` - path to the global config file
//! - `--verbose` / `--quiet` - log level `debug` / `error` instead of `warn`
//!
//! `RUST_LOG` overrides the log level chosen by the flags.
//!
//! # Example
//!
//! ```bash
//! targetgen --project-dir ./deploy list-targets --format json
//! targetgen -v render-target prod-app
//! ```

pub mod common;
mod list_targets;
mod render_target;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use common::{CommandContext, GlobalOptions};
pub use list_targets::{ListFormat, ListTargetsCommand};
pub use render_target::{RenderFormat, RenderTargetCommand, find_target};

/// Resolve dynamic GitOps deployment targets.
#[derive(Parser, Debug)]
#[command(
    name = "targetgen",
    about = "Resolve dynamic deployment targets from git refs",
    version,
    long_about = "targetgen expands target declarations into concrete deployment targets, \
                  one per matching git branch or tag, and renders their templates."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory containing .targetgen.yml
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    /// Directory for repository mirrors
    #[arg(long, global = true, env = "TARGETGEN_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Path to the global configuration file
    #[arg(short, long, global = true, env = "TARGETGEN_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve and list all targets
    ListTargets(ListTargetsCommand),

    /// Resolve and print one target
    RenderTarget(RenderTargetCommand),
}

impl Cli {
    /// Log level selected by `--verbose`/`--quiet`.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Install the global tracing subscriber, logging to stderr.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_level()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    #[must_use]
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            project_dir: self.project_dir.clone(),
            cache_dir: self.cache_dir.clone(),
            config_path: self.config.clone(),
        }
    }

    pub async fn execute(self) -> Result<()> {
        let options = self.global_options();
        match self.command {
            Commands::ListTargets(cmd) => cmd.execute(&options).await,
            Commands::RenderTarget(cmd) => cmd.execute(&options).await,
        }
    }
}
