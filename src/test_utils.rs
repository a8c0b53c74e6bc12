//! Shared test fixtures, arbitrary generators, and an in-memory GitHub.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use thiserror::Error;

use crate::consensus::{ConsensusState, ROOT_DIRECTORY};
use crate::effects::{CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::types::{CommentId, PrNumber, RepoId, Sha, TreeHash};
use crate::webhooks::{CommentAction, IssueCommentEvent, PrAction, PullRequestEvent};

/// Login the bot posts as in tests.
pub const BOT_LOGIN: &str = "lgtm-bot";

pub fn arb_login() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}".prop_map(String::from)
}

/// Directory names as `parent_directory` can produce them, including
/// whitespace-only ones from paths like `" /x.go"`.
pub fn arb_directory() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9_./-]{0,20}",
        1 => "[ a-z]{1,6}",
    ]
}

pub fn arb_tree_hash() -> impl Strategy<Value = TreeHash> {
    "[0-9a-f]{40}".prop_map(TreeHash::new)
}

/// States with disjoint vote maps, sorted directories and no anchor.
pub fn arb_consensus_state() -> impl Strategy<Value = ConsensusState> {
    (
        arb_tree_hash(),
        prop::collection::btree_map(arb_login(), (any::<bool>(), any::<bool>()), 0..6),
        prop::collection::btree_set(
            prop_oneof![
                4 => arb_directory(),
                1 => Just(ROOT_DIRECTORY.to_string()),
            ],
            0..5,
        ),
    )
        .prop_map(|(tree_hash, votes, outstanding)| {
            let mut consentors = BTreeMap::new();
            let mut opponents = BTreeMap::new();
            for (login, (consents, flag)) in votes {
                if consents {
                    consentors.insert(login, flag);
                } else {
                    opponents.insert(login, flag);
                }
            }
            ConsensusState::from_parts(tree_hash, consentors, opponents, outstanding)
                .expect("generated vote maps are disjoint")
        })
}

/// A `/lgtm`-style comment by `author` on open PR acme/widgets#7, opened by dave.
pub fn comment_event(author: &str, body: &str) -> IssueCommentEvent {
    IssueCommentEvent {
        repo: RepoId::new("acme", "widgets"),
        action: CommentAction::Created,
        pr_number: Some(PrNumber(7)),
        comment_id: CommentId(5),
        body: body.to_string(),
        author_login: author.to_string(),
        pr_author: "dave".to_string(),
        pr_open: true,
        labels: Vec::new(),
    }
}

/// A pull request event for open PR acme/widgets#7, opened by dave.
pub fn pull_request_event(action: PrAction) -> PullRequestEvent {
    PullRequestEvent {
        repo: RepoId::new("acme", "widgets"),
        action,
        pr_number: PrNumber(7),
        head_sha: Sha::new("a".repeat(40)),
        base_branch: "main".to_string(),
        author_login: "dave".to_string(),
        open: true,
        labels: Vec::new(),
    }
}

/// The comment text an effect writes, if it writes one.
pub fn effect_body(effect: &GitHubEffect) -> Option<&str> {
    match effect {
        GitHubEffect::PostComment { body, .. } | GitHubEffect::UpdateComment { body, .. } => {
            Some(body)
        }
        _ => None,
    }
}

#[derive(Debug, Error)]
#[error("mock failure: {0}")]
pub struct MockError(pub String);

/// An in-memory pull request that records every effect.
///
/// Comments posted through it become visible to later `ListComments` calls,
/// authored by [`BOT_LOGIN`], so several events can be replayed against the
/// same PR. Clones share state.
#[derive(Debug, Clone)]
pub struct MockGitHub {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    pr: PrData,
    tree_hash: TreeHash,
    files: Vec<String>,
    comments: Vec<CommentData>,
    next_comment_id: u64,
    fail_on: Option<&'static str>,
    effects: Vec<GitHubEffect>,
}

impl MockGitHub {
    /// An open PR #7 changing `files`.
    pub fn new(files: &[&str]) -> Self {
        MockGitHub {
            inner: Arc::new(Mutex::new(MockState {
                pr: PrData {
                    number: PrNumber(7),
                    head_sha: Sha::new("a".repeat(40)),
                    base_ref: "main".to_string(),
                    open: true,
                },
                tree_hash: TreeHash::new("1".repeat(40)),
                files: files.iter().map(|f| f.to_string()).collect(),
                comments: Vec::new(),
                next_comment_id: 100,
                fail_on: None,
                effects: Vec::new(),
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap()
    }

    pub fn set_tree_hash(&self, hash: impl Into<String>) {
        self.state().tree_hash = TreeHash::new(hash);
    }

    pub fn set_open(&self, open: bool) {
        self.state().pr.open = open;
    }

    /// Makes every effect whose [`GitHubEffect::operation`] is `operation` fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.state().fail_on = Some(operation);
    }

    /// Undoes [`MockGitHub::fail_on`].
    pub fn recover(&self) {
        self.state().fail_on = None;
    }

    /// Adds a comment as if a user had written it.
    pub fn add_comment(&self, author: &str, body: &str) -> CommentId {
        self.state().push_comment(author, body.to_string())
    }

    /// All effects received so far, reads included.
    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.state().effects.clone()
    }

    pub fn writes(&self) -> Vec<GitHubEffect> {
        self.effects().into_iter().filter(|e| e.is_write()).collect()
    }

    /// Bodies of the bot's comments, oldest first.
    pub fn bot_comments(&self) -> Vec<String> {
        self.state()
            .comments
            .iter()
            .filter(|c| c.author == BOT_LOGIN)
            .map(|c| c.body.clone())
            .collect()
    }

    pub fn labels_added(&self) -> Vec<String> {
        self.label_effects(|e| match e {
            GitHubEffect::AddLabel { label, .. } => Some(label.clone()),
            _ => None,
        })
    }

    pub fn labels_removed(&self) -> Vec<String> {
        self.label_effects(|e| match e {
            GitHubEffect::RemoveLabel { label, .. } => Some(label.clone()),
            _ => None,
        })
    }

    fn label_effects(&self, pick: impl Fn(&GitHubEffect) -> Option<String>) -> Vec<String> {
        self.state().effects.iter().filter_map(pick).collect()
    }
}

impl MockState {
    fn push_comment(&mut self, author: &str, body: String) -> CommentId {
        let id = CommentId(self.next_comment_id);
        self.next_comment_id += 1;
        let created_at = base_time() + Duration::seconds(id.0 as i64);
        self.comments.push(CommentData {
            id,
            author: author.to_string(),
            body,
            created_at,
        });
        id
    }
}

fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

impl GitHubInterpreter for MockGitHub {
    type Error = MockError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let mut state = self.state();
        state.effects.push(effect.clone());

        if state.fail_on == Some(effect.operation()) {
            return Err(MockError(effect.operation().to_string()));
        }

        let response = match effect {
            GitHubEffect::GetPr { .. } => GitHubResponse::Pr(state.pr.clone()),
            GitHubEffect::ListChangedFiles { .. } => {
                GitHubResponse::ChangedFiles(state.files.clone())
            }
            GitHubEffect::GetTreeHash { .. } => {
                GitHubResponse::TreeHash(state.tree_hash.clone())
            }
            GitHubEffect::ListComments { .. } => {
                GitHubResponse::Comments(state.comments.clone())
            }
            GitHubEffect::PostComment { body, .. } => {
                let id = state.push_comment(BOT_LOGIN, body);
                GitHubResponse::CommentPosted { id }
            }
            GitHubEffect::UpdateComment { comment_id, body } => {
                let comment = state
                    .comments
                    .iter_mut()
                    .find(|c| c.id == comment_id)
                    .ok_or_else(|| MockError(format!("no comment {}", comment_id)))?;
                comment.body = body;
                GitHubResponse::CommentUpdated
            }
            GitHubEffect::AddLabel { .. } => GitHubResponse::LabelAdded,
            GitHubEffect::RemoveLabel { .. } => GitHubResponse::LabelRemoved,
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_github_posts_and_updates_comments() {
        let github = MockGitHub::new(&["a/x.go"]);
        github.add_comment("alice", "/lgtm");

        let posted = github
            .interpret(GitHubEffect::PostComment {
                pr: PrNumber(7),
                body: "first".to_string(),
            })
            .await
            .unwrap();
        let GitHubResponse::CommentPosted { id } = posted else {
            panic!("unexpected response: {:?}", posted);
        };

        github
            .interpret(GitHubEffect::UpdateComment {
                comment_id: id,
                body: "second".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(github.bot_comments(), vec!["second".to_string()]);
        assert_eq!(github.writes().len(), 2);
    }

    #[tokio::test]
    async fn mock_github_fails_selected_operation() {
        let github = MockGitHub::new(&[]);
        github.fail_on("add label");

        let err = github
            .interpret(GitHubEffect::AddLabel {
                pr: PrNumber(7),
                label: "lgtm".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "mock failure: add label");
        assert_eq!(github.effects().len(), 1);
    }
}
