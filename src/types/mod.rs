//! Core domain types for the LGTM bot.
//!
//! Identifier newtypes live here so that every layer (codec, review logic,
//! GitHub client) agrees on what a PR number, comment ID, or tree hash is.

pub mod ids;

pub use ids::{CommentId, PrNumber, RepoId, Sha, TreeHash, normalize_login};
