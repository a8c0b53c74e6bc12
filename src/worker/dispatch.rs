//! Event dispatch layer for routing webhooks to per-repo workers.
//!
//! The dispatcher routes webhook events to the appropriate per-repo worker,
//! creating workers on demand when the first event for a repository arrives.
//! Different repositories are processed concurrently, but events within a
//! single repository are strictly serialized.
//!
//! ```text
//!                                     ┌──► repo A channel ──► worker A
//! ┌─────────────┐     ┌──────────┐    │
//! │   axum      │ ──► │ dispatch │ ───┤
//! │  (accepts)  │     │ by repo  │    │
//! └─────────────┘     └──────────┘    └──► repo B channel ──► worker B
//!       │
//!       │ returns 202 Accepted
//!       ▼
//! ```

use std::collections::{BTreeSet, HashMap};
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

use crate::effects::GitHubInterpreter;
use crate::owners::OwnersResolver;
use crate::types::RepoId;
use crate::webhooks::GitHubEvent;

use super::message::WorkerMessage;
use super::processor::{EventProcessor, ProcessorConfig};
use super::worker::RepoWorker;

/// Errors that can occur during dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Failed to send message to worker.
    #[error("failed to send message to worker: channel closed")]
    ChannelClosed,
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// What the dispatcher did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Handed to the repository's worker.
    Queued,
    /// The repository is not one the bot applies to.
    NotWatched,
}

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Settings passed to every worker's processor.
    pub processor: ProcessorConfig,

    /// Repositories the bot applies to. `None` means every repository.
    pub repos: Option<BTreeSet<RepoId>>,
}

impl DispatcherConfig {
    pub fn new(processor: ProcessorConfig) -> Self {
        DispatcherConfig {
            processor,
            repos: None,
        }
    }

    /// Restricts the bot to the given repositories.
    pub fn with_repos(mut self, repos: impl IntoIterator<Item = RepoId>) -> Self {
        self.repos = Some(repos.into_iter().collect());
        self
    }

    /// Returns true if events for `repo` should be processed.
    pub fn watches(&self, repo: &RepoId) -> bool {
        self.repos.as_ref().is_none_or(|repos| repos.contains(repo))
    }
}

/// Builds the GitHub interpreter a new worker uses for its repository.
pub type GitHubFactory<G> = Box<dyn Fn(&RepoId) -> G + Send + Sync>;

/// Channel buffer size for worker messages.
const WORKER_CHANNEL_BUFFER: usize = 100;

/// Per-repo worker handle.
struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,

    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// Event dispatcher that routes webhooks to per-repo workers.
///
/// The dispatcher is thread-safe and can be shared across multiple HTTP handler
/// tasks. It creates workers on demand as async tasks and routes events via
/// message channels.
pub struct Dispatcher<G, O> {
    config: DispatcherConfig,

    processor_config: Arc<ProcessorConfig>,

    github_for: GitHubFactory<G>,

    owners: Arc<O>,

    /// Active workers, keyed by repository ID.
    workers: RwLock<HashMap<RepoId, WorkerHandle>>,

    /// Global shutdown token.
    shutdown: CancellationToken,
}

impl<G, O> Dispatcher<G, O>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: StdError + Send + Sync + 'static,
    O: OwnersResolver + Send + Sync + 'static,
{
    /// Creates a new dispatcher with the given configuration.
    pub fn new(config: DispatcherConfig, github_for: GitHubFactory<G>, owners: Arc<O>) -> Self {
        Self::new_with_shutdown(config, github_for, owners, CancellationToken::new())
    }

    /// Creates a new dispatcher with a custom shutdown token.
    pub fn new_with_shutdown(
        config: DispatcherConfig,
        github_for: GitHubFactory<G>,
        owners: Arc<O>,
        shutdown: CancellationToken,
    ) -> Self {
        info!(
            bot_login = %config.processor.bot_login,
            label = %config.processor.label,
            repos = ?config.repos,
            "Creating dispatcher"
        );

        Dispatcher {
            processor_config: Arc::new(config.processor.clone()),
            config,
            github_for,
            owners,
            workers: RwLock::new(HashMap::new()),
            shutdown,
        }
    }

    /// Returns the shutdown token.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Routes an event to its repository's worker.
    ///
    /// This creates a new worker for the repository if one doesn't exist.
    /// Returns once the event is queued; processing happens in the worker.
    #[instrument(skip(self, event), fields(repo = %event.repo_id(), pr = ?event.pr_number()))]
    pub async fn dispatch(&self, event: GitHubEvent) -> Result<Dispatched> {
        let repo = event.repo_id().clone();
        if !self.config.watches(&repo) {
            debug!("Repository is not watched, ignoring event");
            return Ok(Dispatched::NotWatched);
        }

        let tx = self.get_or_spawn_worker(&repo).await;
        tx.send(WorkerMessage::Event(event))
            .await
            .map_err(|_| DispatchError::ChannelClosed)?;

        Ok(Dispatched::Queued)
    }

    /// Gets an existing worker's sender or spawns a new worker task.
    async fn get_or_spawn_worker(&self, repo: &RepoId) -> mpsc::Sender<WorkerMessage> {
        {
            let workers = self.workers.read().await;
            if let Some(handle) = workers.get(repo) {
                return handle.tx.clone();
            }
        }

        let mut workers = self.workers.write().await;

        // Another task may have spawned it while we waited for the write lock.
        if let Some(handle) = workers.get(repo) {
            return handle.tx.clone();
        }

        debug!(repo = %repo, "Spawning new worker task");
        let processor = EventProcessor::new(
            repo.clone(),
            (self.github_for)(repo),
            Arc::clone(&self.owners),
            Arc::clone(&self.processor_config),
        );
        let worker = RepoWorker::new(processor);

        let (tx, rx) = mpsc::channel(WORKER_CHANNEL_BUFFER);
        let task = tokio::spawn(worker.run(rx, self.shutdown.child_token()));

        workers.insert(
            repo.clone(),
            WorkerHandle {
                tx: tx.clone(),
                task,
            },
        );

        tx
    }

    /// Returns the number of active workers.
    pub async fn worker_count(&self) -> usize {
        self.workers.read().await.len()
    }

    /// Sends a shutdown signal to all workers.
    pub async fn shutdown_all(&self) {
        info!("Shutting down all workers");
        self.shutdown.cancel();

        let workers = self.workers.read().await;
        for (repo, handle) in workers.iter() {
            trace!(repo = %repo, "Sending shutdown to worker");
            let _ = handle.tx.send(WorkerMessage::Shutdown).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::owners::{RepoOwners, StaticOwners};
    use crate::test_utils::{BOT_LOGIN, MockGitHub, comment_event};

    fn owners() -> Arc<StaticOwners> {
        let mut owners = StaticOwners::new();
        for name in ["widgets", "gadgets"] {
            owners.insert(RepoId::new("acme", name), RepoOwners::new().with("", ["alice"]));
        }
        Arc::new(owners)
    }

    fn dispatcher(
        github: &MockGitHub,
        config: DispatcherConfig,
    ) -> Dispatcher<MockGitHub, StaticOwners> {
        let github = github.clone();
        Dispatcher::new(config, Box::new(move |_| github.clone()), owners())
    }

    fn config() -> DispatcherConfig {
        DispatcherConfig::new(ProcessorConfig::new(BOT_LOGIN))
    }

    fn lgtm_in(repo: &str) -> GitHubEvent {
        let mut event = comment_event("alice", "/lgtm");
        event.repo = RepoId::new("acme", repo);
        GitHubEvent::IssueComment(event)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[test]
    fn config_watches_everything_by_default() {
        let config = config();
        assert!(config.watches(&RepoId::new("any", "thing")));

        let config = config.with_repos([RepoId::new("acme", "widgets")]);
        assert!(config.watches(&RepoId::new("acme", "widgets")));
        assert!(!config.watches(&RepoId::new("acme", "gadgets")));
    }

    #[tokio::test]
    async fn dispatcher_creates_worker_on_first_event() {
        let github = MockGitHub::new(&["a/x.go"]);
        let dispatcher = dispatcher(&github, config());

        assert_eq!(dispatcher.worker_count().await, 0);

        let dispatched = dispatcher.dispatch(lgtm_in("widgets")).await.unwrap();
        assert_eq!(dispatched, Dispatched::Queued);
        settle().await;

        assert_eq!(dispatcher.worker_count().await, 1);
        assert_eq!(github.bot_comments().len(), 1);
    }

    #[tokio::test]
    async fn dispatcher_reuses_worker_and_separates_repos() {
        let github = MockGitHub::new(&["a/x.go"]);
        let dispatcher = dispatcher(&github, config());

        dispatcher.dispatch(lgtm_in("widgets")).await.unwrap();
        dispatcher.dispatch(lgtm_in("widgets")).await.unwrap();
        assert_eq!(dispatcher.worker_count().await, 1);

        dispatcher.dispatch(lgtm_in("gadgets")).await.unwrap();
        assert_eq!(dispatcher.worker_count().await, 2);
    }

    #[tokio::test]
    async fn dispatcher_concurrent_dispatch_spawns_one_worker() {
        let github = MockGitHub::new(&["a/x.go"]);
        let dispatcher = Arc::new(dispatcher(&github, config()));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.dispatch(lgtm_in("widgets")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(dispatcher.worker_count().await, 1);
    }

    #[tokio::test]
    async fn unwatched_repository_is_ignored() {
        let github = MockGitHub::new(&["a/x.go"]);
        let config = config().with_repos([RepoId::new("acme", "widgets")]);
        let dispatcher = dispatcher(&github, config);

        let dispatched = dispatcher.dispatch(lgtm_in("gadgets")).await.unwrap();
        settle().await;

        assert_eq!(dispatched, Dispatched::NotWatched);
        assert_eq!(dispatcher.worker_count().await, 0);
        assert!(github.effects().is_empty());
    }

    #[tokio::test]
    async fn shutdown_all_stops_workers() {
        let github = MockGitHub::new(&["a/x.go"]);
        let shutdown = CancellationToken::new();
        let dispatcher = {
            let github = github.clone();
            Dispatcher::new_with_shutdown(
                config(),
                Box::new(move |_| github.clone()),
                owners(),
                shutdown.clone(),
            )
        };

        dispatcher.dispatch(lgtm_in("widgets")).await.unwrap();
        settle().await;
        assert_eq!(github.bot_comments().len(), 1);

        dispatcher.shutdown_all().await;
        settle().await;

        assert!(shutdown.is_cancelled());
        let effects = github.effects().len();
        assert!(matches!(
            dispatcher.dispatch(lgtm_in("widgets")).await,
            Err(DispatchError::ChannelClosed)
        ));
        settle().await;
        assert_eq!(github.effects().len(), effects);
    }
}
