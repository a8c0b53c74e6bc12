//! Command types for `/lgtm` review commands.
//!
//! These commands are parsed from pull request comments.

use serde::{Deserialize, Serialize};

/// A parsed review command from a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Approves the pull request: `/lgtm` or `/lgtm no-issue`.
    Lgtm,

    /// Withdraws approval or objects to the pull request: `/lgtm cancel`.
    ///
    /// From the PR author this resets every vote; from a reviewer it
    /// re-opens review of every changed directory.
    LgtmCancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serde_roundtrip() {
        for cmd in [Command::Lgtm, Command::LgtmCancel] {
            let json = serde_json::to_string(&cmd).unwrap();
            let parsed: Command = serde_json::from_str(&json).unwrap();
            assert_eq!(cmd, parsed);
        }
    }
}
