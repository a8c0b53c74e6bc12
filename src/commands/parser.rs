//! Parser for review commands in comment text.
//!
//! This module provides a pure parser that extracts a structured command from
//! unstructured comment text.

use super::types::Command;

const LGTM: &str = "/lgtm";
const LGTM_NO_ISSUE: &str = "/lgtm no-issue";
const LGTM_CANCEL: &str = "/lgtm cancel";

/// Parses the review command carried by a comment, if any.
///
/// # Parsing Rules
///
/// - A command occupies a whole line: it must start at the beginning of the
///   line and may only be followed by ASCII whitespace
/// - Matching is case-insensitive
/// - `/lgtm` and `/lgtm no-issue` approve, `/lgtm cancel` cancels
/// - An approving line anywhere in the comment wins over a cancel line
/// - Returns `None` if no line is a command
///
/// # Examples
///
/// ```
/// use lgtm_bot::commands::{parse_command, Command};
///
/// assert_eq!(parse_command("/lgtm"), Some(Command::Lgtm));
/// assert_eq!(parse_command("Looks good.\n/LGTM  \n"), Some(Command::Lgtm));
/// assert_eq!(parse_command("/lgtm no-issue"), Some(Command::Lgtm));
/// assert_eq!(parse_command("/lgtm cancel"), Some(Command::LgtmCancel));
/// assert_eq!(parse_command("  /lgtm"), None);
/// assert_eq!(parse_command("/lgtm please"), None);
/// ```
pub fn parse_command(text: &str) -> Option<Command> {
    let mut cancel = false;

    for line in text.split('\n') {
        let line = line.trim_end_matches(|c: char| c.is_ascii_whitespace());

        if line.eq_ignore_ascii_case(LGTM) || line.eq_ignore_ascii_case(LGTM_NO_ISSUE) {
            return Some(Command::Lgtm);
        }

        if line.eq_ignore_ascii_case(LGTM_CANCEL) {
            cancel = true;
        }
    }

    cancel.then_some(Command::LgtmCancel)
}
