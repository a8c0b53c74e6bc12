//! Pull request lifecycle: opening and new commits.

use std::collections::BTreeSet;

use super::{LoadedNotification, PrInfo, Transition, write_notification};
use crate::consensus::ConsensusState;
use crate::effects::GitHubEffect;
use crate::notification::Verdict;
use crate::types::{PrNumber, TreeHash};

/// Posts the first notification for a newly opened PR.
///
/// Every directory touched by the PR starts out needing review.
pub fn on_opened(pr: PrNumber, tree_hash: TreeHash, directories: BTreeSet<String>) -> Transition {
    let state = ConsensusState::new(tree_hash, directories);
    let write = write_notification(pr, &state, Verdict::NotLgtm);

    Transition {
        state: Some(state),
        effects: vec![write],
    }
}

/// Invalidates consensus after the PR's source branch moved.
///
/// If the stored notification already describes the current tree (for
/// example a push that left the tree unchanged) nothing happens. Otherwise the
/// reset state is published and the label removed.
pub fn on_source_changed(
    pr_number: PrNumber,
    pr: PrInfo<'_>,
    label: &str,
    loaded: LoadedNotification,
) -> Transition {
    if !loaded.tree_changed {
        return Transition::none();
    }

    let state = loaded.state;
    let mut effects = vec![write_notification(pr_number, &state, Verdict::NotLgtm)];
    if pr.has_label(label) {
        effects.push(GitHubEffect::RemoveLabel {
            pr: pr_number,
            label: label.to_string(),
        });
    }

    Transition {
        state: Some(state),
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::Lookup;
    use crate::test_utils::{effect_body, pull_request_event};
    use crate::types::CommentId;
    use crate::webhooks::PrAction;

    fn dirs(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn opened_posts_not_ready_notification() {
        let t = on_opened(PrNumber(3), TreeHash::from("t1"), dirs(&["a", "b"]));

        let state = t.state.clone().unwrap();
        assert_eq!(state.outstanding(), &dirs(&["a", "b"]));
        assert!(state.consentors().is_empty());
        assert_eq!(t.effects.len(), 1);
        assert!(matches!(t.effects[0], GitHubEffect::PostComment { pr: PrNumber(3), .. }));
        assert!(effect_body(&t.effects[0]).unwrap().contains("**NOT LGTM**"));
    }

    #[test]
    fn unchanged_tree_is_skipped() {
        let event = pull_request_event(PrAction::Synchronize);
        let mut state = ConsensusState::new(TreeHash::from("t1"), BTreeSet::new());
        state.record_approval("alice", true);
        let loaded = Lookup::Current(state).resolve(TreeHash::from("t1"), dirs(&["a"]));

        let t = on_source_changed(PrNumber(7), PrInfo::PullRequest(&event), "lgtm", loaded);
        assert!(t.is_noop());
    }

    #[test]
    fn changed_tree_rewrites_and_removes_label() {
        let mut event = pull_request_event(PrAction::Synchronize);
        event.labels = vec!["lgtm".to_string()];
        let loaded = Lookup::Reset {
            anchor: Some(CommentId(11)),
        }
        .resolve(TreeHash::from("t2"), dirs(&["a"]));

        let t = on_source_changed(PrNumber(7), PrInfo::PullRequest(&event), "lgtm", loaded);

        let state = t.state.clone().unwrap();
        assert_eq!(state.tree_hash(), &TreeHash::from("t2"));
        assert_eq!(state.outstanding(), &dirs(&["a"]));
        assert_eq!(
            t.effects[1],
            GitHubEffect::RemoveLabel {
                pr: PrNumber(7),
                label: "lgtm".to_string()
            }
        );
        assert!(matches!(
            t.effects[0],
            GitHubEffect::UpdateComment {
                comment_id: CommentId(11),
                ..
            }
        ));
    }

    #[test]
    fn changed_tree_without_label_only_rewrites() {
        let event = pull_request_event(PrAction::Reopened);
        let loaded = Lookup::Reset { anchor: None }.resolve(TreeHash::from("t2"), dirs(&["a"]));

        let t = on_source_changed(PrNumber(7), PrInfo::PullRequest(&event), "lgtm", loaded);
        assert_eq!(t.effects.len(), 1);
        assert!(matches!(t.effects[0], GitHubEffect::PostComment { .. }));
    }
}
