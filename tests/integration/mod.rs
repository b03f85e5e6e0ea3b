//! Integration test suite for targetgen
//!
//! These tests build real git repositories in temporary directories and
//! resolve projects against them through `file://` URLs, so they need a
//! `git` binary on `PATH`.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **git_provider**: mirrors, ref listing and tree reads
//! - **resolve**: project files resolved through the library API
//! - **cli**: the `targetgen` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod git_provider;
mod resolve;
