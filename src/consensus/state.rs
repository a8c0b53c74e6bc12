//! The per-PR consensus state carried by the notification comment.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::types::{CommentId, TreeHash, normalize_login};

/// A login appeared as both a consentor and an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{login} is recorded as both approving and objecting")]
pub struct VoteConflict {
    pub login: String,
}

/// Review consensus for one pull request at one source tree.
///
/// Owns both vote maps so that a login can never be recorded as approving and
/// objecting at the same time: every mutation goes through
/// [`record_approval`](Self::record_approval) or
/// [`record_objection`](Self::record_objection), which move the login between
/// the two maps.
///
/// The boolean attached to each vote says whether the voter was an authorized
/// reviewer for at least one changed file when the vote was cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusState {
    tree_hash: TreeHash,
    consentors: BTreeMap<String, bool>,
    opponents: BTreeMap<String, bool>,
    outstanding: BTreeSet<String>,
    anchor: Option<CommentId>,
}

impl ConsensusState {
    /// Creates a state with no votes, valid for `tree_hash`.
    pub fn new(tree_hash: TreeHash, outstanding: BTreeSet<String>) -> Self {
        ConsensusState {
            tree_hash,
            consentors: BTreeMap::new(),
            opponents: BTreeMap::new(),
            outstanding,
            anchor: None,
        }
    }

    /// Reassembles a state from decoded parts.
    ///
    /// # Errors
    ///
    /// Returns `VoteConflict` if a login is present in both vote maps.
    pub fn from_parts(
        tree_hash: TreeHash,
        consentors: BTreeMap<String, bool>,
        opponents: BTreeMap<String, bool>,
        outstanding: BTreeSet<String>,
    ) -> Result<Self, VoteConflict> {
        if let Some(login) = consentors.keys().find(|k| opponents.contains_key(*k)) {
            return Err(VoteConflict {
                login: login.clone(),
            });
        }

        Ok(ConsensusState {
            tree_hash,
            consentors,
            opponents,
            outstanding,
            anchor: None,
        })
    }

    pub fn tree_hash(&self) -> &TreeHash {
        &self.tree_hash
    }

    pub fn consentors(&self) -> &BTreeMap<String, bool> {
        &self.consentors
    }

    pub fn opponents(&self) -> &BTreeMap<String, bool> {
        &self.opponents
    }

    /// Directories that still need an approving reviewer.
    pub fn outstanding(&self) -> &BTreeSet<String> {
        &self.outstanding
    }

    /// The bot comment currently carrying this state, if one exists.
    pub fn anchor(&self) -> Option<CommentId> {
        self.anchor
    }

    pub fn with_anchor(mut self, anchor: Option<CommentId>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Returns true if `login` has an approval on record.
    pub fn has_consented(&self, login: &str) -> bool {
        self.consentors.contains_key(login)
    }

    /// Records an approval, withdrawing any objection by the same login.
    pub fn record_approval(&mut self, login: &str, is_reviewer: bool) {
        self.opponents.remove(login);
        self.consentors.insert(login.to_string(), is_reviewer);
    }

    /// Records an objection, withdrawing any approval by the same login.
    pub fn record_objection(&mut self, login: &str, is_reviewer: bool) {
        self.consentors.remove(login);
        self.opponents.insert(login.to_string(), is_reviewer);
    }

    /// Drops every approval and objection.
    pub fn clear_votes(&mut self) {
        self.consentors.clear();
        self.opponents.clear();
    }

    /// Replaces the outstanding directory set wholesale.
    pub fn set_outstanding(&mut self, outstanding: BTreeSet<String>) {
        self.outstanding = outstanding;
    }

    /// Discards all votes and rebinds the state to a new tree.
    ///
    /// The anchor comment is kept so the existing notification is rewritten
    /// rather than a second one posted.
    pub fn reset(&mut self, tree_hash: TreeHash, outstanding: BTreeSet<String>) {
        self.tree_hash = tree_hash;
        self.clear_votes();
        self.outstanding = outstanding;
    }

    /// Normalized logins of approvers who were authorized reviewers.
    pub fn confirmed_reviewers(&self) -> BTreeSet<String> {
        self.consentors
            .iter()
            .filter(|(_, is_reviewer)| **is_reviewer)
            .map(|(login, _)| normalize_login(login))
            .collect()
    }

    /// Returns true if an authorized reviewer has an objection on record.
    pub fn has_reviewer_objection(&self) -> bool {
        self.opponents.values().any(|is_reviewer| *is_reviewer)
    }

    /// Whether the ready label belongs on the PR.
    ///
    /// Every changed directory must be covered and no authorized reviewer may
    /// be objecting.
    pub fn is_label_ready(&self) -> bool {
        self.outstanding.is_empty() && !self.has_reviewer_objection()
    }
}
