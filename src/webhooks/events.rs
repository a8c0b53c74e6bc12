//! GitHub webhook event types.
//!
//! This module defines typed representations of GitHub webhook events that the
//! LGTM bot handles. Each event type corresponds to a GitHub webhook event
//! with the fields we need for processing.
//!
//! # Event Types
//!
//! - `issue_comment` - `/lgtm` and `/lgtm cancel` commands
//! - `pull_request` - PR lifecycle (opened, synchronize, reopened)

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PrNumber, RepoId, Sha};

/// A parsed GitHub webhook event.
///
/// This enum contains only the event types the bot cares about. Unknown or
/// irrelevant events are represented by returning `None` from the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    /// An issue or PR comment was created, edited, or deleted.
    ///
    /// Note: In GitHub's API, PR comments on the conversation tab are delivered
    /// as `issue_comment` events, not `pull_request_review_comment` events.
    IssueComment(IssueCommentEvent),

    /// A pull request was opened, closed, edited, or synchronized.
    PullRequest(PullRequestEvent),
}

impl GitHubEvent {
    /// Returns the repository this event belongs to.
    pub fn repo_id(&self) -> &RepoId {
        match self {
            GitHubEvent::IssueComment(e) => &e.repo,
            GitHubEvent::PullRequest(e) => &e.repo,
        }
    }

    /// Returns the pull request this event concerns, if any.
    pub fn pr_number(&self) -> Option<PrNumber> {
        match self {
            GitHubEvent::IssueComment(e) => e.pr_number,
            GitHubEvent::PullRequest(e) => Some(e.pr_number),
        }
    }
}

/// Action performed on an issue comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    /// Comment was created.
    Created,
    /// Comment was edited.
    Edited,
    /// Comment was deleted.
    Deleted,
}

/// An issue/PR comment event.
///
/// In GitHub's model, comments on the PR conversation tab are "issue comments"
/// even when they're on a PR. This is where `/lgtm` commands appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    /// The repository.
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: CommentAction,

    /// The PR number (issue number for PRs).
    ///
    /// This is only set if the comment is on a pull request, not a regular issue.
    pub pr_number: Option<PrNumber>,

    /// The comment ID.
    pub comment_id: CommentId,

    /// The comment body text.
    ///
    /// For `deleted` actions, this will be empty.
    pub body: String,

    /// The comment author's login name.
    pub author_login: String,

    /// The login of the user who opened the PR.
    pub pr_author: String,

    /// Whether the PR is open.
    pub pr_open: bool,

    /// Label names on the PR when the comment was made.
    pub labels: Vec<String>,
}

/// Action performed on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// PR was closed (merged or not).
    Closed,
    /// PR was edited (title, body, or base branch changed).
    Edited,
    /// PR head was updated (new commits pushed).
    Synchronize,
    /// PR was reopened.
    Reopened,
}

/// A pull request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The repository.
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub pr_number: PrNumber,

    /// The current head SHA of the PR branch.
    pub head_sha: Sha,

    /// The base branch name.
    pub base_branch: String,

    /// The PR author's login name.
    pub author_login: String,

    /// Whether the PR is open.
    pub open: bool,

    /// Label names on the PR.
    pub labels: Vec<String>,
}
