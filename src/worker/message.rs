//! Messages sent to a per-repo worker.

use crate::webhooks::GitHubEvent;

/// Messages that can be sent to a per-repo worker.
///
/// Workers receive these via `tokio::sync::mpsc` and handle them one at a
/// time, so events for one repository never interleave.
#[derive(Debug)]
pub enum WorkerMessage {
    /// A parsed webhook event for the worker's repository.
    Event(GitHubEvent),

    /// Finish the current event and exit the loop.
    Shutdown,
}
