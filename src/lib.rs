//! LGTM bot - a GitHub bot that tracks strict per-directory `/lgtm` consensus.
//!
//! Reviewers approve with `/lgtm` and object with `/lgtm cancel`. The bot
//! keeps the resulting state in a single comment on the pull request, and
//! applies a label once every changed directory has an approving reviewer and
//! no reviewer objects.

pub mod commands;
pub mod config;
pub mod consensus;
pub mod effects;
pub mod github;
pub mod notification;
pub mod owners;
pub mod review;
pub mod server;
pub mod types;
pub mod webhooks;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_utils;
