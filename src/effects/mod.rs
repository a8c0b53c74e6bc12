//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Pure review logic that returns effects as data
//! - Testability via mock interpreters
//! - Logging of intended writes before they happen

pub mod github;
pub mod interpreter;

pub use github::{CommentData, GitHubEffect, GitHubResponse, PrData};
pub use interpreter::GitHubInterpreter;
