//! Event processing: reads, one pure transition, writes.
//!
//! For each event the processor fetches everything the transition needs
//! (head tree, comments, changed files, ownership), runs the matching function
//! from [`crate::review`], and executes the returned effects in order. Nothing
//! is written until the new state is fully computed. Any failed call aborts the
//! event; nothing is retried.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, trace};

use crate::commands::{Command, parse_command};
use crate::consensus::ReviewerIndex;
use crate::effects::{CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::owners::{OwnersError, OwnersResolver};
use crate::review::{
    Lookup, PrInfo, ReviewContext, Transition, approve, cancel, find_notification, on_opened,
    on_source_changed,
};
use crate::types::{PrNumber, RepoId, Sha, TreeHash, normalize_login};
use crate::webhooks::{CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent};

/// Errors that abort processing of a single event.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A GitHub call failed.
    #[error("{context}: {source}")]
    GitHub {
        /// The operation and PR, e.g. `cannot list comments for acme/widgets#7`.
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Ownership data could not be loaded.
    #[error("cannot load reviewers for {repo}: {source}")]
    Owners {
        repo: RepoId,
        #[source]
        source: OwnersError,
    },

    /// GitHub answered with something that does not fit the request.
    #[error("inconsistent data: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// Settings shared by every processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Login the bot posts as. Only its comments carry consensus state.
    pub bot_login: String,
    /// Label applied to PRs that reached consensus.
    pub label: String,
}

impl ProcessorConfig {
    pub fn new(bot_login: impl Into<String>) -> Self {
        ProcessorConfig {
            bot_login: bot_login.into(),
            label: "lgtm".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// What happened to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event does not concern the bot.
    Ignored(&'static str),
    /// The event was relevant but nothing needed writing.
    Unchanged,
    /// `writes` effects were executed.
    Applied { writes: usize },
}

/// Processes events for one repository.
pub struct EventProcessor<G, O> {
    repo: RepoId,
    github: G,
    owners: Arc<O>,
    config: Arc<ProcessorConfig>,
}

impl<G, O> EventProcessor<G, O>
where
    G: GitHubInterpreter,
    G::Error: StdError + Send + Sync + 'static,
    O: OwnersResolver,
{
    pub fn new(repo: RepoId, github: G, owners: Arc<O>, config: Arc<ProcessorConfig>) -> Self {
        EventProcessor {
            repo,
            github,
            owners,
            config,
        }
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Handles one webhook event to completion.
    pub async fn process(&self, event: &GitHubEvent) -> Result<Outcome> {
        match event {
            GitHubEvent::IssueComment(e) => self.on_comment(e).await,
            GitHubEvent::PullRequest(e) => self.on_pull_request(e).await,
        }
    }

    #[instrument(
        skip(self, event),
        fields(repo = %self.repo, pr = ?event.pr_number, commenter = %event.author_login)
    )]
    async fn on_comment(&self, event: &IssueCommentEvent) -> Result<Outcome> {
        if event.action != CommentAction::Created {
            return Ok(Outcome::Ignored("comment was not newly created"));
        }
        let Some(pr_number) = event.pr_number else {
            return Ok(Outcome::Ignored("comment is not on a pull request"));
        };
        if !PrInfo::Comment(event).is_open() {
            return Ok(Outcome::Ignored("pull request is not open"));
        }
        if normalize_login(&event.author_login) == normalize_login(&self.config.bot_login) {
            return Ok(Outcome::Ignored("comment was written by the bot"));
        }
        let Some(command) = parse_command(&event.body) else {
            return Ok(Outcome::Ignored("no command in comment"));
        };

        debug!(?command, "Handling review command");

        // Comment payloads carry neither the head commit nor the base branch.
        let pr = self.get_pr(pr_number).await?;
        if !pr.open {
            return Ok(Outcome::Ignored("pull request is not open"));
        }

        let tree_hash = self.get_tree_hash(pr_number, &pr.head_sha).await?;
        let comments = self.list_comments(pr_number).await?;
        let reviewers = self.reviewer_index(pr_number, &pr.base_ref).await?;

        let loaded = find_notification(&comments, &self.config.bot_login, &tree_hash)
            .resolve(tree_hash, reviewers.all_directories());

        let ctx = ReviewContext {
            pr_number,
            pr: PrInfo::Comment(event),
            label: &self.config.label,
            reviewers: &reviewers,
        };
        let transition = match command {
            Command::Lgtm => approve(&ctx, loaded.state, &event.author_login),
            Command::LgtmCancel => cancel(&ctx, loaded.state, &event.author_login),
        };

        self.apply(pr_number, transition).await
    }

    #[instrument(
        skip(self, event),
        fields(repo = %self.repo, pr = %event.pr_number, action = ?event.action)
    )]
    async fn on_pull_request(&self, event: &PullRequestEvent) -> Result<Outcome> {
        if !PrInfo::PullRequest(event).is_open() {
            return Ok(Outcome::Ignored("pull request is not open"));
        }
        let pr_number = event.pr_number;

        match event.action {
            PrAction::Opened => {
                let tree_hash = self.get_tree_hash(pr_number, &event.head_sha).await?;
                let reviewers = self.reviewer_index(pr_number, &event.base_branch).await?;
                let transition = on_opened(pr_number, tree_hash, reviewers.all_directories());
                self.apply(pr_number, transition).await
            }
            PrAction::Synchronize | PrAction::Reopened => {
                let tree_hash = self.get_tree_hash(pr_number, &event.head_sha).await?;
                let comments = self.list_comments(pr_number).await?;
                let lookup = find_notification(&comments, &self.config.bot_login, &tree_hash);
                if matches!(lookup, Lookup::Current(_)) {
                    debug!(tree_hash = %tree_hash, "Tree unchanged, keeping consensus");
                    return Ok(Outcome::Unchanged);
                }

                let reviewers = self.reviewer_index(pr_number, &event.base_branch).await?;
                let loaded = lookup.resolve(tree_hash, reviewers.all_directories());
                let transition = on_source_changed(
                    pr_number,
                    PrInfo::PullRequest(event),
                    &self.config.label,
                    loaded,
                );
                self.apply(pr_number, transition).await
            }
            PrAction::Closed | PrAction::Edited => {
                Ok(Outcome::Ignored("action does not affect review"))
            }
        }
    }

    /// Executes the writes of a transition in order.
    async fn apply(&self, pr: PrNumber, transition: Transition) -> Result<Outcome> {
        if transition.is_noop() {
            debug!("Transition changed nothing");
            return Ok(Outcome::Unchanged);
        }

        if let Some(state) = &transition.state {
            info!(
                tree_hash = %state.tree_hash(),
                outstanding = state.outstanding().len(),
                ready = state.is_label_ready(),
                "Publishing consensus"
            );
        }

        let writes = transition.effects.len();
        for effect in transition.effects {
            match self.run(pr, effect).await? {
                GitHubResponse::CommentPosted { id } => {
                    debug!(comment_id = %id, "Posted comment");
                }
                response => trace!(?response, "Write completed"),
            }
        }

        Ok(Outcome::Applied { writes })
    }

    async fn run(&self, pr: PrNumber, effect: GitHubEffect) -> Result<GitHubResponse> {
        let operation = effect.operation();
        trace!(?effect, "Executing GitHub effect");

        self.github
            .interpret(effect)
            .await
            .map_err(|e| ProcessError::GitHub {
                context: format!("cannot {} for {}{}", operation, self.repo, pr),
                source: Box::new(e),
            })
    }

    async fn get_pr(&self, pr: PrNumber) -> Result<PrData> {
        match self.run(pr, GitHubEffect::GetPr { pr }).await? {
            GitHubResponse::Pr(data) => Ok(data),
            other => Err(self.unexpected(pr, "pull request", &other)),
        }
    }

    async fn get_tree_hash(&self, pr: PrNumber, commit: &Sha) -> Result<TreeHash> {
        let effect = GitHubEffect::GetTreeHash {
            commit: commit.clone(),
        };
        match self.run(pr, effect).await? {
            GitHubResponse::TreeHash(hash) => Ok(hash),
            other => Err(self.unexpected(pr, "tree hash", &other)),
        }
    }

    async fn list_comments(&self, pr: PrNumber) -> Result<Vec<CommentData>> {
        match self.run(pr, GitHubEffect::ListComments { pr }).await? {
            GitHubResponse::Comments(comments) => Ok(comments),
            other => Err(self.unexpected(pr, "comment list", &other)),
        }
    }

    /// Maps every changed file to its reviewers as of `base_ref`.
    async fn reviewer_index(&self, pr: PrNumber, base_ref: &str) -> Result<ReviewerIndex> {
        let files = match self.run(pr, GitHubEffect::ListChangedFiles { pr }).await? {
            GitHubResponse::ChangedFiles(files) => files,
            other => return Err(self.unexpected(pr, "changed file list", &other)),
        };

        let owners = self
            .owners
            .load(&self.repo, base_ref)
            .await
            .map_err(|source| ProcessError::Owners {
                repo: self.repo.clone(),
                source,
            })?;

        let index = ReviewerIndex::build(files, |path| owners.reviewers(path));
        debug!(files = index.len(), base_ref, "Built reviewer index");
        Ok(index)
    }

    fn unexpected(&self, pr: PrNumber, expected: &str, got: &GitHubResponse) -> ProcessError {
        ProcessError::Inconsistent(format!(
            "expected {} for {}{}, got {:?}",
            expected, self.repo, pr, got
        ))
    }
}
