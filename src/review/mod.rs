//! Review transitions: how each event changes consensus and what gets written.
//!
//! Everything here is pure. Functions take the current [`ConsensusState`] and
//! the event context, and return a [`Transition`]: the new state plus the
//! GitHub writes that publish it. The worker performs all reads beforehand and
//! executes the returned effects afterwards.
//!
//! - [`strict`]: `/lgtm` and `/lgtm cancel`
//! - [`lifecycle`]: PR opened and source branch changed
//! - [`load`]: locating the authoritative notification among PR comments

pub mod lifecycle;
pub mod load;
pub mod strict;

pub use lifecycle::{on_opened, on_source_changed};
pub use load::{LoadedNotification, Lookup, find_notification};
pub use strict::{SELF_APPROVAL_REPLY, approve, cancel};

use crate::consensus::{ConsensusState, ReviewerIndex};
use crate::effects::GitHubEffect;
use crate::notification::{Verdict, format_notification};
use crate::types::PrNumber;
use crate::webhooks::{IssueCommentEvent, PullRequestEvent};

/// Pull request details as carried by the triggering event.
#[derive(Debug, Clone, Copy)]
pub enum PrInfo<'a> {
    Comment(&'a IssueCommentEvent),
    PullRequest(&'a PullRequestEvent),
}

impl PrInfo<'_> {
    /// The login of the user who opened the PR.
    pub fn author(&self) -> &str {
        match self {
            PrInfo::Comment(e) => &e.pr_author,
            PrInfo::PullRequest(e) => &e.author_login,
        }
    }

    /// Returns true if the PR carried `label` when the event fired.
    pub fn has_label(&self, label: &str) -> bool {
        let labels = match self {
            PrInfo::Comment(e) => &e.labels,
            PrInfo::PullRequest(e) => &e.labels,
        };
        labels.iter().any(|l| l == label)
    }

    /// Returns true if the PR was open when the event fired.
    pub fn is_open(&self) -> bool {
        match self {
            PrInfo::Comment(e) => e.pr_open,
            PrInfo::PullRequest(e) => e.open,
        }
    }
}

/// Inputs shared by the comment-driven transitions.
#[derive(Debug, Clone, Copy)]
pub struct ReviewContext<'a> {
    pub pr_number: PrNumber,
    pub pr: PrInfo<'a>,
    /// Name of the label marking a PR as ready.
    pub label: &'a str,
    /// Reviewers of each currently changed file.
    pub reviewers: &'a ReviewerIndex,
}

impl ReviewContext<'_> {
    fn has_label(&self) -> bool {
        self.pr.has_label(self.label)
    }
}

/// The result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    /// The state to publish, or `None` if consensus did not change.
    pub state: Option<ConsensusState>,
    /// Writes to perform, in order.
    pub effects: Vec<GitHubEffect>,
}

impl Transition {
    /// A transition that changes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.state.is_none() && self.effects.is_empty()
    }
}

/// Publishes `state`, rewriting its anchor comment or posting a new one.
pub(crate) fn write_notification(
    pr: PrNumber,
    state: &ConsensusState,
    verdict: Verdict,
) -> GitHubEffect {
    let body = format_notification(state, verdict);
    match state.anchor() {
        Some(comment_id) => GitHubEffect::UpdateComment { comment_id, body },
        None => GitHubEffect::PostComment { pr, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{comment_event, pull_request_event};
    use crate::types::{CommentId, TreeHash};
    use std::collections::BTreeSet;

    #[test]
    fn pr_info_reads_comment_payload() {
        let mut event = comment_event("alice", "/lgtm");
        event.labels = vec!["lgtm".to_string()];
        let pr = PrInfo::Comment(&event);

        assert_eq!(pr.author(), "dave");
        assert!(pr.has_label("lgtm"));
        assert!(!pr.has_label("LGTM"));
        assert!(pr.is_open());
    }

    #[test]
    fn pr_info_reads_pull_request_payload() {
        let mut event = pull_request_event(crate::webhooks::PrAction::Synchronize);
        event.open = false;
        let pr = PrInfo::PullRequest(&event);

        assert_eq!(pr.author(), "dave");
        assert!(!pr.has_label("lgtm"));
        assert!(!pr.is_open());
    }

    #[test]
    fn write_posts_without_anchor_and_updates_with_one() {
        let state = ConsensusState::new(TreeHash::from("t"), BTreeSet::new());
        assert!(matches!(
            write_notification(PrNumber(1), &state, Verdict::Lgtm),
            GitHubEffect::PostComment { pr: PrNumber(1), .. }
        ));

        let anchored = state.with_anchor(Some(CommentId(77)));
        assert!(matches!(
            write_notification(PrNumber(1), &anchored, Verdict::Lgtm),
            GitHubEffect::UpdateComment {
                comment_id: CommentId(77),
                ..
            }
        ));
    }

    #[test]
    fn default_transition_is_noop() {
        assert!(Transition::none().is_noop());
    }
}
