//! Effect interpreter trait.
//!
//! The octocrab-backed implementation lives in `github::interpreter`; tests
//! use the recording mock in `test_utils`.

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId`, so all effects executed
/// through a single interpreter instance are scoped to that repository.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct CannedInterpreter {
///     files: Vec<String>,
/// }
///
/// impl GitHubInterpreter for CannedInterpreter {
///     type Error = anyhow::Error;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         match effect {
///             GitHubEffect::ListChangedFiles { .. } => {
///                 Ok(GitHubResponse::ChangedFiles(self.files.clone()))
///             }
///             other => Err(anyhow!("unexpected effect: {:?}", other)),
///         }
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}
