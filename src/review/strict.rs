//! Strict review: `/lgtm` and `/lgtm cancel` handling.
//!
//! Every directory touched by the PR needs an approval from one of its
//! reviewers, and a single cancel from any reviewer puts every directory back
//! up for review.

use tracing::debug;

use super::{ReviewContext, Transition, write_notification};
use crate::consensus::ConsensusState;
use crate::effects::GitHubEffect;
use crate::notification::Verdict;
use crate::types::normalize_login;

/// Reply posted when the PR author tries to approve their own PR.
pub const SELF_APPROVAL_REPLY: &str = "you cannot LGTM your own PR.";

/// Applies a `/lgtm` from `commenter`.
pub fn approve(ctx: &ReviewContext<'_>, mut state: ConsensusState, commenter: &str) -> Transition {
    if same_login(commenter, ctx.pr.author()) {
        debug!(commenter, "Rejecting self-approval");
        return Transition {
            state: None,
            effects: vec![GitHubEffect::PostComment {
                pr: ctx.pr_number,
                body: format!("@{}, {SELF_APPROVAL_REPLY}", commenter.trim_start_matches('@')),
            }],
        };
    }

    if state.has_consented(commenter) {
        debug!(commenter, "Repeated approval, nothing to do");
        return Transition::none();
    }

    let is_reviewer = ctx.reviewers.is_reviewer(commenter);
    state.record_approval(commenter, is_reviewer);

    if !is_reviewer {
        // Recorded for visibility only; coverage and the label are untouched.
        let write = write_notification(ctx.pr_number, &state, Verdict::from_ready(ctx.has_label()));
        return Transition {
            state: Some(state),
            effects: vec![write],
        };
    }

    state.set_outstanding(ctx.reviewers.outstanding_directories(&state.confirmed_reviewers()));

    let ready = state.is_label_ready();
    let mut effects = vec![write_notification(ctx.pr_number, &state, Verdict::from_ready(ready))];
    effects.extend(label_change(ctx, ready));

    Transition {
        state: Some(state),
        effects,
    }
}

/// Applies a `/lgtm cancel` from `commenter`.
///
/// From the PR author this withdraws every vote. From a reviewer it records an
/// objection. In both cases every changed directory needs review again and the
/// label comes off.
pub fn cancel(ctx: &ReviewContext<'_>, mut state: ConsensusState, commenter: &str) -> Transition {
    let is_author = same_login(commenter, ctx.pr.author());

    if !is_author && !ctx.reviewers.is_reviewer(commenter) {
        state.record_objection(commenter, false);
        let write = write_notification(ctx.pr_number, &state, Verdict::from_ready(ctx.has_label()));
        return Transition {
            state: Some(state),
            effects: vec![write],
        };
    }

    if is_author {
        state.clear_votes();
    } else {
        state.record_objection(commenter, true);
    }

    state.set_outstanding(ctx.reviewers.all_directories());

    let mut effects = vec![write_notification(ctx.pr_number, &state, Verdict::NotLgtm)];
    effects.extend(label_change(ctx, false));

    Transition {
        state: Some(state),
        effects,
    }
}

/// The label write needed to make the PR's label match `ready`, if any.
fn label_change(ctx: &ReviewContext<'_>, ready: bool) -> Option<GitHubEffect> {
    let label = ctx.label.to_string();
    match (ready, ctx.has_label()) {
        (true, false) => Some(GitHubEffect::AddLabel {
            pr: ctx.pr_number,
            label,
        }),
        (false, true) => Some(GitHubEffect::RemoveLabel {
            pr: ctx.pr_number,
            label,
        }),
        _ => None,
    }
}

fn same_login(a: &str, b: &str) -> bool {
    normalize_login(a) == normalize_login(b)
}
