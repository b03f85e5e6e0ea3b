//! Error handling for targetgen
//!
//! This module provides the error taxonomy used while resolving deployment
//! targets, together with user-friendly reporting for the CLI.
//!
//! # Architecture
//!
//! - [`TargetError`] - Enumerated error types for all failure cases
//! - [`ErrorKind`] - Coarse classification used by the resolution failure policy
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! Library code returns [`anyhow::Result`] and carries [`TargetError`] values
//! inside the `anyhow` chain, so callers can still classify a failure with
//! [`classify`] after context has been attached.
//!
//! # Examples
//!
//! ```rust,no_run
//! use targetgen_cli::core::{TargetError, ErrorKind, user_friendly_error};
//!
//! let error = TargetError::ConfigError {
//!     message: "'refPattern' and 'ref' can't be specified together".to_string(),
//! };
//! assert_eq!(error.kind(), ErrorKind::Config);
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::templating::TemplateError as RenderError;

/// The main error type for target resolution
///
/// # Error Categories
///
/// ## Declarations
/// - [`ConfigError`] - Structurally invalid target declarations
/// - [`ValidationError`] - Loaded target config supplies an undeclared argument
/// - [`PatternError`] - Ref pattern is not a valid regular expression
///
/// ## Loading
/// - [`IoError`] - Target config missing or unreadable
/// - [`ProjectNotFound`] - No project file in the project directory
/// - [`YamlError`] - YAML document could not be parsed
///
/// ## Rendering
/// - [`TemplateError`] - A templated target field failed to render
///
/// ## Git
/// - [`GitCommandError`] - A git command failed
/// - [`GitCloneFailed`] - Repository could not be cloned into the cache
///
/// [`ConfigError`]: TargetError::ConfigError
/// [`ValidationError`]: TargetError::ValidationError
/// [`PatternError`]: TargetError::PatternError
/// [`IoError`]: TargetError::IoError
/// [`ProjectNotFound`]: TargetError::ProjectNotFound
/// [`YamlError`]: TargetError::YamlError
/// [`TemplateError`]: TargetError::TemplateError
/// [`GitCommandError`]: TargetError::GitCommandError
/// [`GitCloneFailed`]: TargetError::GitCloneFailed
#[derive(Error, Debug, Clone)]
pub enum TargetError {
    /// Invalid target declaration
    ///
    /// Raised when both `ref` and `refPattern` are set, when either is set
    /// without an external project, when the repository has no default branch,
    /// or when an explicit ref does not exist on the remote.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Target config file missing or unreadable
    #[error("Failed to load target config '{path}': {reason}")]
    IoError {
        /// Path of the file (relative to the tree or project directory)
        path: String,
        /// The underlying failure
        reason: String,
    },

    /// A loaded target config supplies an argument the target does not allow
    #[error("Invalid dynamic argument '{path}' for target '{target}': {reason}")]
    ValidationError {
        /// Name of the base target being merged
        target: String,
        /// Dotted key path of the offending argument
        path: String,
        /// Why the argument was rejected
        reason: String,
    },

    /// Rendering a templated field failed
    #[error("Failed to render target '{target}': {source}")]
    TemplateError {
        /// Name of the target being rendered (possibly still templated)
        target: String,
        /// Structured rendering failure
        #[source]
        source: RenderError,
    },

    /// Ref pattern does not compile
    #[error("Invalid ref pattern '{pattern}': {reason}")]
    PatternError {
        /// The offending pattern
        pattern: String,
        /// Regex compiler message
        reason: String,
    },

    /// Git operation failed during execution
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed (e.g., "ls-remote", "fetch")
        operation: String,
        /// The error output from the git command
        stderr: String,
    },

    /// Git repository clone failed
    #[error("Failed to clone repository: {url}")]
    GitCloneFailed {
        /// The repository URL that failed to clone
        url: String,
        /// The reason for the clone failure
        reason: String,
    },

    /// No project file found
    #[error("No .targetgen.yml found in {path}")]
    ProjectNotFound {
        /// Directory that was searched
        path: String,
    },

    /// YAML document could not be parsed
    #[error("Invalid YAML in {file}: {reason}")]
    YamlError {
        /// File (or logical document) that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// Generic error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Coarse classification of a [`TargetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Validation,
    Template,
    Pattern,
    Git,
    Other,
}

impl TargetError {
    /// Classify this error.
    ///
    /// Parse failures of a loaded target config count as configuration errors.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError {
                ..
            }
            | Self::YamlError {
                ..
            }
            | Self::ProjectNotFound {
                ..
            } => ErrorKind::Config,
            Self::IoError {
                ..
            } => ErrorKind::Io,
            Self::ValidationError {
                ..
            } => ErrorKind::Validation,
            Self::TemplateError {
                ..
            } => ErrorKind::Template,
            Self::PatternError {
                ..
            } => ErrorKind::Pattern,
            Self::GitCommandError {
                ..
            }
            | Self::GitCloneFailed {
                ..
            } => ErrorKind::Git,
            Self::Other {
                ..
            } => ErrorKind::Other,
        }
    }

    /// Shorthand for [`TargetError::ConfigError`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// Find the first [`TargetError`] in an `anyhow` chain and classify it.
///
/// Returns [`ErrorKind::Other`] when no typed error is present.
#[must_use]
pub fn classify(error: &anyhow::Error) -> ErrorKind {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<TargetError>())
        .map_or(ErrorKind::Other, TargetError::kind)
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: TargetError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`TargetError`]
    #[must_use]
    pub const fn new(error: TargetError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`TargetError`] anywhere in the chain, [`std::io::Error`] and
/// [`serde_yaml::Error`]; everything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(target_error) = error.chain().find_map(|c| c.downcast_ref::<TargetError>()) {
        let ctx = create_error_context(target_error.clone());
        // Keep the outer context messages, they usually name the target involved
        let outer: Vec<String> = error
            .chain()
            .take_while(|c| c.downcast_ref::<TargetError>().is_none())
            .map(ToString::to_string)
            .collect();
        if outer.is_empty() {
            return ctx;
        }
        let details = match ctx.details {
            Some(d) => format!("{}\n{d}", outer.join("\n  → ")),
            None => outer.join("\n  → "),
        };
        return ErrorContext {
            details: Some(details),
            ..ctx
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(TargetError::IoError {
                    path: "unknown".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the project directory")
                .with_details("targetgen could not read a file it needs");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(TargetError::IoError {
                    path: "unknown".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(TargetError::YamlError {
            file: "unknown".to_string(),
            reason: yaml_error.to_string(),
        })
        .with_suggestion("Check the YAML syntax: indentation, quoting and list markers");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(TargetError::Other {
        message,
    })
}

/// Map each [`TargetError`] variant to an [`ErrorContext`] with suggestions.
fn create_error_context(error: TargetError) -> ErrorContext {
    match &error {
        TargetError::ConfigError { message } => {
            let suggestion = if message.contains("together") {
                "Remove either 'ref' or 'refPattern' from the targetConfig of this target"
            } else if message.contains("not allowed for non-external") {
                "Add a 'project' with a git url to targetConfig, or drop 'ref'/'refPattern'"
            } else if message.contains("default branch") {
                "Set an explicit 'ref' or 'refPattern' on the target"
            } else if message.contains("has no ref") {
                "Check the branch name with 'git ls-remote --heads <url>'"
            } else {
                "Review the target declarations in .targetgen.yml"
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        TargetError::IoError { path, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Create '{path}' or point targetConfig.file at an existing file"
            ))
            .with_details("Without an explicit file, target-config.yml and then target-config.yaml are probed"),

        TargetError::ValidationError { path, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Declare '{path}' under dynamicArgs of the target, or remove it from the target config"
            ))
            .with_details("Only arguments listed in dynamicArgs may be supplied by a target config"),

        TargetError::TemplateError { source, .. } => ErrorContext::new(error.clone())
            .with_suggestion("Templates may reference 'target.*' and, once the cluster is known, 'cluster.*'")
            .with_details(source.format_with_context()),

        TargetError::PatternError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("refPattern is a regular expression matched against refs/heads/<pattern> and refs/tags/<pattern>"),

        TargetError::GitCommandError { stderr, .. } => {
            let details = if stderr.trim().is_empty() {
                "Git operations often fail due to network issues, authentication problems, or invalid references".to_string()
            } else {
                stderr.trim().to_string()
            };
            ErrorContext::new(error.clone())
                .with_suggestion("Check your git configuration and repository access. Try running the git command manually for more details")
                .with_details(details)
        }

        TargetError::GitCloneFailed { url, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Verify the repository URL is correct: {url}. Check your internet connection and repository access"
            )),

        TargetError::ProjectNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Run from a project directory or pass --project-dir"),

        TargetError::YamlError { file, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Check the YAML syntax in {file}")),

        TargetError::Other { .. } => ErrorContext::new(error),
    }
}
