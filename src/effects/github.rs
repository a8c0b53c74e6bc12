//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The review logic returns them; an interpreter executes them against the
//! actual GitHub API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PrNumber, Sha, TreeHash};

/// A GitHub API effect.
///
/// Each variant describes a GitHub API operation. Effects are repo-scoped:
/// the interpreter is constructed with a `RepoId`, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── PR Queries ───────────────────────────────────────────────────────────
    /// Fetch a single PR by number.
    ///
    /// Comment webhooks don't carry the head commit, so comment handling
    /// starts here.
    GetPr { pr: PrNumber },

    /// List the paths of all files changed by a PR.
    ListChangedFiles { pr: PrNumber },

    /// Resolve the source tree hash of a commit.
    GetTreeHash { commit: Sha },

    // ─── Comments ─────────────────────────────────────────────────────────────
    /// List all comments on a PR, oldest first.
    ListComments { pr: PrNumber },

    /// Post a new comment on a PR.
    PostComment { pr: PrNumber, body: String },

    /// Update an existing comment.
    UpdateComment { comment_id: CommentId, body: String },

    // ─── Labels ───────────────────────────────────────────────────────────────
    /// Add a label to a PR.
    AddLabel { pr: PrNumber, label: String },

    /// Remove a label from a PR.
    RemoveLabel { pr: PrNumber, label: String },
}

impl GitHubEffect {
    /// Returns true if executing the effect changes anything on GitHub.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            GitHubEffect::PostComment { .. }
                | GitHubEffect::UpdateComment { .. }
                | GitHubEffect::AddLabel { .. }
                | GitHubEffect::RemoveLabel { .. }
        )
    }

    /// A short human-readable name for the operation, used in error context.
    pub fn operation(&self) -> &'static str {
        match self {
            GitHubEffect::GetPr { .. } => "get pull request",
            GitHubEffect::ListChangedFiles { .. } => "get PR changes",
            GitHubEffect::GetTreeHash { .. } => "get tree hash",
            GitHubEffect::ListComments { .. } => "list comments",
            GitHubEffect::PostComment { .. } => "post comment",
            GitHubEffect::UpdateComment { .. } => "update comment",
            GitHubEffect::AddLabel { .. } => "add label",
            GitHubEffect::RemoveLabel { .. } => "remove label",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// PR data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    /// The PR number.
    pub number: PrNumber,
    /// The current head SHA.
    pub head_sha: Sha,
    /// The base branch name.
    pub base_ref: String,
    /// Whether the PR is open.
    pub open: bool,
}

/// Comment data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    /// The comment ID.
    pub id: CommentId,
    /// The author's login.
    pub author: String,
    /// The comment body.
    pub body: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPr`.
    Pr(PrData),

    /// Response to `ListChangedFiles`.
    ChangedFiles(Vec<String>),

    /// Response to `GetTreeHash`.
    TreeHash(TreeHash),

    /// Response to `ListComments`.
    Comments(Vec<CommentData>),

    /// Response to `PostComment`.
    CommentPosted {
        /// The ID of the newly created comment.
        id: CommentId,
    },

    /// Response to `UpdateComment`.
    CommentUpdated,

    /// Response to `AddLabel`.
    LabelAdded,

    /// Response to `RemoveLabel`.
    LabelRemoved,
}
