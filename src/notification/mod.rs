//! The notification comment: consensus state persisted on the pull request.
//!
//! The bot keeps no database. After every event it rewrites a single comment
//! that lists who approved, who cancelled, which directories still need a
//! reviewer, and the source tree hash those votes apply to. The next event
//! reads the state back from that comment.

pub mod format;
pub mod parse;

pub use format::{Verdict, format_notification};
pub use parse::{Decoded, ParseError, ParsedNotification, decode_notification, parse_notification};
