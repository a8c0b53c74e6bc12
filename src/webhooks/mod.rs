//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Typed representations of the events the bot reacts to
//! - Parsing of raw webhook payloads into those types

pub mod events;
pub mod parser;

pub use events::{
    CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent,
};
pub use parser::{ParseError, parse_webhook};
