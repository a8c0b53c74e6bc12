//! Locating the authoritative notification among a PR's comments.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::consensus::ConsensusState;
use crate::effects::CommentData;
use crate::notification::{Decoded, decode_notification};
use crate::types::{CommentId, TreeHash, normalize_login};

/// What the comment scan found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The notification was written for the current tree; its votes stand.
    Current(ConsensusState),

    /// There is no usable state for the current tree. `anchor` is the
    /// notification comment to rewrite, if one exists.
    Reset { anchor: Option<CommentId> },
}

impl Lookup {
    /// Turns the lookup into a usable state.
    ///
    /// On reset the state starts with no votes and every directory in
    /// `directories` outstanding.
    pub fn resolve(self, tree_hash: TreeHash, directories: BTreeSet<String>) -> LoadedNotification {
        match self {
            Lookup::Current(state) => LoadedNotification {
                state,
                tree_changed: false,
            },
            Lookup::Reset { anchor } => LoadedNotification {
                state: ConsensusState::new(tree_hash, directories).with_anchor(anchor),
                tree_changed: true,
            },
        }
    }
}

/// Consensus state ready for a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedNotification {
    pub state: ConsensusState,
    /// True if the stored state was absent, stale or unreadable and was reset.
    pub tree_changed: bool,
}

/// Scans `comments` oldest first for the bot's notification.
///
/// Only comments by `bot_login` are considered, and the first one that looks
/// like a notification decides the outcome, even if it is stale or
/// unreadable: its id becomes the anchor and later comments are ignored.
pub fn find_notification(comments: &[CommentData], bot_login: &str, tree_hash: &TreeHash) -> Lookup {
    let bot = normalize_login(bot_login);

    let mut ordered: Vec<&CommentData> = comments
        .iter()
        .filter(|c| normalize_login(&c.author) == bot)
        .collect();
    ordered.sort_by_key(|c| c.created_at);

    for comment in ordered {
        match decode_notification(&comment.body, tree_hash) {
            Decoded::NotFound => continue,
            Decoded::Current(state) => {
                debug!(comment_id = %comment.id, "Found notification for current tree");
                return Lookup::Current(state.with_anchor(Some(comment.id)));
            }
            Decoded::DifferentTree { stored } => {
                debug!(
                    comment_id = %comment.id,
                    stored = %stored,
                    current = %tree_hash,
                    "Notification is for an older tree"
                );
                return Lookup::Reset {
                    anchor: Some(comment.id),
                };
            }
            Decoded::Malformed(err) => {
                warn!(comment_id = %comment.id, error = %err, "Ignoring unreadable notification");
                return Lookup::Reset {
                    anchor: Some(comment.id),
                };
            }
        }
    }

    Lookup::Reset { anchor: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Verdict, format_notification};
    use chrono::{Duration, TimeZone, Utc};

    const BOT: &str = "lgtm-bot";

    fn comment(id: u64, author: &str, body: &str, minute: i64) -> CommentData {
        CommentData {
            id: CommentId(id),
            author: author.to_string(),
            body: body.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
        }
    }

    fn notification(tree: &str, approver: &str) -> String {
        let mut state = ConsensusState::new(TreeHash::from(tree), BTreeSet::new());
        state.record_approval(approver, true);
        format_notification(&state, Verdict::Lgtm)
    }

    fn dirs() -> BTreeSet<String> {
        ["a".to_string()].into_iter().collect()
    }

    #[test]
    fn no_comments_resets_without_anchor() {
        let lookup = find_notification(&[], BOT, &TreeHash::from("t1"));
        assert_eq!(lookup, Lookup::Reset { anchor: None });

        let loaded = lookup.resolve(TreeHash::from("t1"), dirs());
        assert!(loaded.tree_changed);
        assert_eq!(loaded.state.outstanding(), &dirs());
        assert_eq!(loaded.state.anchor(), None);
    }

    #[test]
    fn current_notification_is_loaded_with_anchor() {
        let comments = vec![
            comment(1, "alice", "/lgtm", 0),
            comment(2, BOT, &notification("t1", "alice"), 1),
        ];

        let loaded = find_notification(&comments, BOT, &TreeHash::from("t1"))
            .resolve(TreeHash::from("t1"), dirs());

        assert!(!loaded.tree_changed);
        assert!(loaded.state.has_consented("alice"));
        assert_eq!(loaded.state.anchor(), Some(CommentId(2)));
    }

    #[test]
    fn stale_notification_donates_anchor() {
        let comments = vec![comment(5, BOT, &notification("old", "alice"), 0)];

        let loaded = find_notification(&comments, BOT, &TreeHash::from("new"))
            .resolve(TreeHash::from("new"), dirs());

        assert!(loaded.tree_changed);
        assert!(loaded.state.consentors().is_empty());
        assert_eq!(loaded.state.tree_hash(), &TreeHash::from("new"));
        assert_eq!(loaded.state.anchor(), Some(CommentId(5)));
    }

    #[test]
    fn malformed_notification_resets_but_keeps_anchor() {
        let body = notification("t1", "alice").replace("**LGTM**.", "??.");
        let comments = vec![comment(9, BOT, &body, 0)];

        let lookup = find_notification(&comments, BOT, &TreeHash::from("t1"));
        assert_eq!(
            lookup,
            Lookup::Reset {
                anchor: Some(CommentId(9))
            }
        );
    }

    #[test]
    fn notifications_by_others_are_ignored() {
        let comments = vec![comment(3, "mallory", &notification("t1", "mallory"), 0)];

        let lookup = find_notification(&comments, BOT, &TreeHash::from("t1"));
        assert_eq!(lookup, Lookup::Reset { anchor: None });
    }

    #[test]
    fn bot_login_match_is_normalized() {
        let comments = vec![comment(4, "LGTM-Bot", &notification("t1", "alice"), 0)];

        let lookup = find_notification(&comments, "@lgtm-bot", &TreeHash::from("t1"));
        assert!(matches!(lookup, Lookup::Current(_)));
    }

    #[test]
    fn oldest_notification_wins() {
        // Delivered out of order; the older one is authoritative.
        let comments = vec![
            comment(20, BOT, &notification("t1", "bob"), 5),
            comment(10, BOT, &notification("t0", "alice"), 1),
        ];

        let lookup = find_notification(&comments, BOT, &TreeHash::from("t1"));
        assert_eq!(
            lookup,
            Lookup::Reset {
                anchor: Some(CommentId(10))
            }
        );
    }

    #[test]
    fn unrelated_bot_comments_are_skipped() {
        let comments = vec![
            comment(1, BOT, "@dave, you cannot LGTM your own PR.", 0),
            comment(2, BOT, &notification("t1", "alice"), 1),
        ];

        let lookup = find_notification(&comments, BOT, &TreeHash::from("t1"));
        assert!(matches!(lookup, Lookup::Current(s) if s.anchor() == Some(CommentId(2))));
    }
}
