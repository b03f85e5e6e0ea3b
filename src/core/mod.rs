//! Core types for targetgen
//!
//! This module holds the error taxonomy shared by every stage of target
//! resolution:
//! - [`TargetError`] - Enumerated error types covering all failure modes
//! - [`ErrorKind`] - Classification used to decide whether a failure aborts a pass
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format

pub mod error;

pub use error::{ErrorContext, ErrorKind, TargetError, classify, user_friendly_error};
