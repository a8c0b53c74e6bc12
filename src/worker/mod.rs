//! Per-repo worker system for webhook event processing.
//!
//! Each repository gets a dedicated worker that processes events serially,
//! so two commands on the same repository never race on its notification
//! comment, while different repositories proceed concurrently.
//!
//! - [`dispatch`]: routing events to workers, spawning them on demand
//! - [`processor`]: reads, transition, and writes for a single event
//! - [`message`]: worker message types

pub mod dispatch;
mod message;
pub mod processor;
#[allow(clippy::module_inception)]
mod worker;

pub use dispatch::{DispatchError, Dispatched, Dispatcher, DispatcherConfig, GitHubFactory};
pub use message::WorkerMessage;
pub use processor::{EventProcessor, Outcome, ProcessError, ProcessorConfig};
pub use worker::RepoWorker;
