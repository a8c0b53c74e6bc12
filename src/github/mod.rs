//! GitHub API client and effect interpreter.
//!
//! This module executes GitHub effects via the octocrab library. It implements
//! the `GitHubInterpreter` trait defined in the effects module.
//!
//! Failures are classified as transient or permanent for logging; nothing is
//! retried here.

mod client;
mod error;
mod interpreter;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
