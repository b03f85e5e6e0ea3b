//! Fluent builder for running the system `git` binary
//!
//! Every git invocation in targetgen goes through [`GitCommand`] so timeouts,
//! logging and the mapping of failures onto [`TargetError`] stay consistent.
//!
//! # Examples
//!
//! ```rust,no_run
//! use targetgen_cli::git::command_builder::GitCommand;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let listing = GitCommand::ls_remote_symref("https://github.com/example/envs.git")
//!     .with_context("envs")
//!     .execute_stdout()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::{GIT_CLONE_TIMEOUT, GIT_FETCH_TIMEOUT, GIT_LS_REMOTE_TIMEOUT};
use crate::core::TargetError;
use crate::utils::platform::get_git_command;

/// Builder for a single git invocation.
///
/// Defaults: output captured, 5 minute timeout, current process directory,
/// and `GIT_TERMINAL_PROMPT=0` so a missing credential fails instead of
/// waiting for input.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    timeout_duration: Option<Duration>,
    /// Identifier included in log lines (usually the repository URL)
    context: Option<String>,
    /// For clone commands, the URL used for error messages
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: Some(Duration::from_secs(300)),
            context: None,
            clone_url: None,
        }
    }
}

impl GitCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the command inside `dir` (passed to git as `-C <dir>`).
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    #[must_use]
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Replace the timeout only if `duration` is set.
    #[must_use]
    pub fn with_timeout_override(self, duration: Option<Duration>) -> Self {
        match duration {
            Some(d) => self.with_timeout(Some(d)),
            None => self,
        }
    }

    /// Set a context for logging
    ///
    /// Resolution runs many git commands concurrently, the context tells
    /// their log lines apart:
    /// ```text
    /// (https://example.com/envs.git) Executing command: git ls-remote --symref ...
    /// ```
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn full_args(&self) -> Vec<String> {
        let mut full_args = Vec::with_capacity(self.args.len() + 2);
        if let Some(dir) = &self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        full_args
    }

    /// The git subcommand, skipping `-C <dir>`.
    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    fn log_prefix(&self) -> String {
        self.context.as_ref().map(|ctx| format!("({ctx}) ")).unwrap_or_default()
    }

    /// Spawn git and wait for it, without interpreting the exit status.
    async fn run(&self) -> Result<Output> {
        let git_command = get_git_command();
        let full_args = self.full_args();
        let prefix = self.log_prefix();

        tracing::debug!(
            target: "git",
            "{}Executing command: {} {}",
            prefix,
            git_command,
            full_args.join(" ")
        );

        let mut cmd = Command::new(git_command);
        cmd.args(&full_args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }
        // A timed out git must not linger
        cmd.kill_on_drop(true);

        let start = std::time::Instant::now();
        let output_future = cmd.output();
        let result = if let Some(duration) = self.timeout_duration {
            let Ok(result) = timeout(duration, output_future).await else {
                tracing::warn!(
                    target: "git",
                    "{}Command timed out after {} seconds: git {}",
                    prefix,
                    duration.as_secs(),
                    full_args.join(" ")
                );
                return Err(TargetError::GitCommandError {
                    operation: self.operation(),
                    stderr: format!(
                        "Git command timed out after {} seconds. This may indicate:\n\
                        - Network connectivity issues\n\
                        - Authentication prompts waiting for input\n\
                        Try running the command manually: git {}",
                        duration.as_secs(),
                        full_args.join(" ")
                    ),
                }
                .into());
            };
            result
        } else {
            output_future.await
        };
        let output =
            result.with_context(|| format!("Failed to execute git {}", full_args.join(" ")))?;

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "git::perf", "{}Git {} took {:.2}s", prefix, self.operation(), elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "git::perf", "{}Git {} took {}ms", prefix, self.operation(), elapsed.as_millis());
        }

        Ok(output)
    }

    /// Turn a failed exit status into the matching [`TargetError`].
    fn failure(&self, output: &Output) -> TargetError {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::debug!(
            target: "git",
            "{}Command failed with exit code {:?}: {}",
            self.log_prefix(),
            output.status.code(),
            stderr.trim()
        );

        if let Some(url) = &self.clone_url {
            TargetError::GitCloneFailed {
                url: url.clone(),
                reason: stderr,
            }
        } else {
            TargetError::GitCommandError {
                operation: self.operation(),
                stderr,
            }
        }
    }

    /// Execute the command and return its raw stdout.
    pub async fn execute_bytes(self) -> Result<Vec<u8>> {
        let output = self.run().await?;
        if !output.status.success() {
            return Err(self.failure(&output).into());
        }
        Ok(output.stdout)
    }

    /// Execute the command and return the output
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let output = self.run().await?;
        if !output.status.success() {
            return Err(self.failure(&output).into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.trim().is_empty() {
            tracing::trace!(target: "git", "{}{}", self.log_prefix(), stderr.trim());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout as a trimmed string
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and check for success
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }

    /// Execute the command and report whether git exited successfully.
    ///
    /// A non-zero exit is `Ok(false)`; only spawn failures and timeouts are errors.
    pub async fn execute_status(self) -> Result<bool> {
        Ok(self.run().await?.status.success())
    }
}

/// Output from a Git command
#[derive(Debug)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

// Convenience builders for the operations the repository provider needs

impl GitCommand {
    /// List all refs of a remote plus the ref its HEAD points to.
    #[must_use]
    pub fn ls_remote_symref(url: &str) -> Self {
        Self::new()
            .args(["ls-remote", "--symref", url])
            .with_timeout(Some(GIT_LS_REMOTE_TIMEOUT))
    }

    /// Bare clone carrying branches and tags under their remote names.
    #[must_use]
    pub fn clone_bare(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new()
            .args(["clone", "--bare", "--quiet", url])
            .arg(target.as_ref().display().to_string())
            .with_timeout(Some(GIT_CLONE_TIMEOUT));
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    /// Update every branch and tag of a bare clone, dropping deleted refs.
    #[must_use]
    pub fn fetch_all_refs(url: &str) -> Self {
        Self::new()
            .args([
                "fetch",
                "--prune",
                "--force",
                "--quiet",
                url,
                "+refs/heads/*:refs/heads/*",
                "+refs/tags/*:refs/tags/*",
            ])
            .with_timeout(Some(GIT_FETCH_TIMEOUT))
    }

    /// Resolve a revision to a commit id.
    #[must_use]
    pub fn rev_parse_commit(rev: &str) -> Self {
        Self::new().args(["rev-parse", "--verify", "--quiet"]).arg(format!("{rev}^{{commit}}"))
    }

    /// Check that `<commit>:<path>` names an existing object.
    #[must_use]
    pub fn object_exists(commit: &str, path: &str) -> Self {
        Self::new().args(["cat-file", "-e"]).arg(format!("{commit}:{path}"))
    }

    /// Print the contents of the blob at `<commit>:<path>`.
    #[must_use]
    pub fn read_blob(commit: &str, path: &str) -> Self {
        Self::new().args(["cat-file", "blob"]).arg(format!("{commit}:{path}"))
    }
}
