//! The per-repo event loop.

use std::error::Error as StdError;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::effects::GitHubInterpreter;
use crate::owners::OwnersResolver;

use super::message::WorkerMessage;
use super::processor::{EventProcessor, Outcome};

/// Processes the events of one repository, one at a time.
pub struct RepoWorker<G, O> {
    processor: EventProcessor<G, O>,
}

impl<G, O> RepoWorker<G, O>
where
    G: GitHubInterpreter,
    G::Error: StdError + Send + Sync + 'static,
    O: OwnersResolver,
{
    pub fn new(processor: EventProcessor<G, O>) -> Self {
        RepoWorker { processor }
    }

    /// Runs until `shutdown` fires, a `Shutdown` message arrives, or every
    /// sender is dropped.
    ///
    /// An event that fails is logged and dropped; the loop carries on with
    /// the next one.
    #[instrument(skip_all, fields(repo = %self.processor.repo()))]
    pub async fn run(self, mut rx: mpsc::Receiver<WorkerMessage>, shutdown: CancellationToken) {
        info!("Worker event loop started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping worker");
                    break;
                }

                msg = rx.recv() => {
                    match msg {
                        Some(WorkerMessage::Event(event)) => {
                            match self.processor.process(&event).await {
                                Ok(Outcome::Ignored(reason)) => {
                                    debug!(pr = ?event.pr_number(), reason, "Event ignored");
                                }
                                Ok(outcome) => {
                                    debug!(pr = ?event.pr_number(), ?outcome, "Event processed");
                                }
                                Err(e) => {
                                    error!(pr = ?event.pr_number(), error = %e, "Error processing event");
                                }
                            }
                        }
                        Some(WorkerMessage::Shutdown) => {
                            info!("Shutdown message received");
                            break;
                        }
                        None => {
                            info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("Worker event loop stopped");
    }
}
