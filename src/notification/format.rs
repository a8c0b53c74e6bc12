//! Notification comment formatting.
//!
//! The notification is the only place consensus state lives between events,
//! so the layout here is a wire format: [`super::parse`] reads it back.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::consensus::ConsensusState;

/// Opening text of every notification; identifies the comment as ours.
pub const HEADER: &str = "LGTM NOTIFIER: This PR is ";

/// Precedes the list of logins that approved.
pub const CONSENT_MARKER: &str = ".\n\nReviewers added `/lgtm` are: ";

/// Precedes the list of logins that cancelled.
pub const OPPOSE_MARKER: &str = ".\n\nReviewers added `/lgtm cancel` are: ";

/// Precedes the outstanding directory block.
pub const DIRECTORIES_MARKER: &str =
    ".\n\nIt still needs review for the codes in each of these directories:";

/// Misspelled directory header written by older deployments.
pub const LEGACY_DIRECTORIES_MARKER: &str =
    ".\n\nIt still needs review for the codes in each of these directoris:";

/// Starts each line of the directory block.
pub const DIRECTORY_BULLET: &str = "\n- ";

/// Opens the footer carrying the tree hash.
pub const TREE_HASH_OPEN: &str = "\n<details>Git tree hash: ";

/// Closes the footer.
pub const TREE_HASH_CLOSE: &str = "</details>";

/// Joins logins within a reviewer list.
pub const LIST_SEPARATOR: &str = ", ";

/// Whether the notification reports the pull request as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Lgtm,
    NotLgtm,
}

impl Verdict {
    pub const LGTM_MARKER: &'static str = "**LGTM**";
    pub const NOT_LGTM_MARKER: &'static str = "**NOT LGTM**";

    pub fn from_ready(ready: bool) -> Self {
        if ready { Verdict::Lgtm } else { Verdict::NotLgtm }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Verdict::Lgtm => Self::LGTM_MARKER,
            Verdict::NotLgtm => Self::NOT_LGTM_MARKER,
        }
    }

    /// Inverse of [`marker`](Self::marker).
    pub fn from_marker(text: &str) -> Option<Self> {
        match text {
            Self::LGTM_MARKER => Some(Verdict::Lgtm),
            Self::NOT_LGTM_MARKER => Some(Verdict::NotLgtm),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Renders the notification comment for `state`.
///
/// The comment format is:
/// ```text
/// LGTM NOTIFIER: This PR is **NOT LGTM**.
///
/// Reviewers added `/lgtm` are: **alice**, carol.
///
/// Reviewers added `/lgtm cancel` are: .
///
/// It still needs review for the codes in each of these directories:
/// - b
/// <details>Git tree hash: 4b825dc6</details>
/// ```
///
/// Authorized reviewers are shown in bold. Logins and directories are emitted
/// in sorted order so that the same state always renders the same text.
pub fn format_notification(state: &ConsensusState, verdict: Verdict) -> String {
    format!(
        "{HEADER}{verdict}{CONSENT_MARKER}{}{OPPOSE_MARKER}{}{DIRECTORIES_MARKER}{}{TREE_HASH_OPEN}{}{TREE_HASH_CLOSE}",
        format_reviewers(state.consentors()),
        format_reviewers(state.opponents()),
        format_directories(state.outstanding()),
        state.tree_hash(),
    )
}

fn format_reviewers(reviewers: &BTreeMap<String, bool>) -> String {
    reviewers
        .iter()
        .map(|(login, is_reviewer)| {
            if *is_reviewer {
                format!("**{login}**")
            } else {
                login.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn format_directories(dirs: &BTreeSet<String>) -> String {
    dirs.iter()
        .map(|dir| format!("{DIRECTORY_BULLET}{dir}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::ROOT_DIRECTORY;
    use crate::types::TreeHash;

    fn sample_state() -> ConsensusState {
        let outstanding = [ROOT_DIRECTORY, "b"].iter().map(|s| s.to_string()).collect();
        let mut state = ConsensusState::new(TreeHash::from("abc123"), outstanding);
        state.record_approval("carol", false);
        state.record_approval("alice", true);
        state.record_objection("bob", true);
        state
    }

    #[test]
    fn renders_full_layout() {
        let body = format_notification(&sample_state(), Verdict::NotLgtm);

        assert_eq!(
            body,
            "LGTM NOTIFIER: This PR is **NOT LGTM**.\n\n\
             Reviewers added `/lgtm` are: **alice**, carol.\n\n\
             Reviewers added `/lgtm cancel` are: **bob**.\n\n\
             It still needs review for the codes in each of these directories:\n\
             - b\n\
             - root directory\n\
             <details>Git tree hash: abc123</details>"
        );
    }

    #[test]
    fn empty_state_has_empty_lists_and_no_directory_block() {
        let state = ConsensusState::new(TreeHash::from("t"), BTreeSet::new());
        let body = format_notification(&state, Verdict::Lgtm);

        assert!(body.starts_with("LGTM NOTIFIER: This PR is **LGTM**.\n\n"));
        assert!(body.contains("Reviewers added `/lgtm` are: .\n\n"));
        assert!(body.contains("Reviewers added `/lgtm cancel` are: .\n\n"));
        assert!(body.ends_with("directories:\n<details>Git tree hash: t</details>"));
    }

    #[test]
    fn verdict_markers_round_trip() {
        for verdict in [Verdict::Lgtm, Verdict::NotLgtm] {
            assert_eq!(Verdict::from_marker(verdict.marker()), Some(verdict));
        }
        assert_eq!(Verdict::from_marker("LGTM"), None);
        assert_eq!(Verdict::from_ready(true), Verdict::Lgtm);
        assert_eq!(Verdict::from_ready(false), Verdict::NotLgtm);
    }

    #[test]
    fn rendering_ignores_vote_order() {
        let mut reordered = ConsensusState::new(
            TreeHash::from("abc123"),
            ["b", ROOT_DIRECTORY].iter().map(|s| s.to_string()).collect(),
        );
        reordered.record_objection("bob", true);
        reordered.record_approval("alice", true);
        reordered.record_approval("carol", false);

        assert_eq!(
            format_notification(&sample_state(), Verdict::Lgtm),
            format_notification(&reordered, Verdict::Lgtm)
        );
    }
}
