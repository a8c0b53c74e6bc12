//! Notification comment parsing.
//!
//! Reads consensus state back out of a comment written by
//! [`format_notification`](super::format_notification).

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::format::{
    CONSENT_MARKER, DIRECTORIES_MARKER, DIRECTORY_BULLET, HEADER, LEGACY_DIRECTORIES_MARKER,
    LIST_SEPARATOR, OPPOSE_MARKER, TREE_HASH_CLOSE, TREE_HASH_OPEN, Verdict,
};
use crate::consensus::ConsensusState;
use crate::types::TreeHash;

/// Errors that can occur when parsing a notification comment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The comment does not follow the notification layout at all.
    #[error("notification template not found")]
    TemplateNotFound,

    /// The layout matched but one of its slots holds unusable data.
    #[error("malformed {slot} in notification: {detail}")]
    Malformed { slot: &'static str, detail: String },
}

impl ParseError {
    fn malformed(slot: &'static str, detail: impl Into<String>) -> Self {
        ParseError::Malformed {
            slot,
            detail: detail.into(),
        }
    }
}

/// A successfully parsed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNotification {
    pub verdict: Verdict,
    pub state: ConsensusState,
}

/// Outcome of checking a comment against the current source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A notification for the current tree; its votes still apply.
    Current(ConsensusState),

    /// A notification written for an earlier tree; its votes are stale.
    DifferentTree { stored: TreeHash },

    /// The comment looks like a notification but cannot be read.
    Malformed(ParseError),

    /// The comment is not a notification.
    NotFound,
}

impl Decoded {
    /// Returns true if the comment is a notification in any form.
    ///
    /// A stale or unreadable notification is still the comment to rewrite.
    pub fn is_notification(&self) -> bool {
        !matches!(self, Decoded::NotFound)
    }
}

/// Parses a notification comment body.
///
/// # Errors
///
/// Returns `ParseError::TemplateNotFound` if the body does not follow the
/// notification layout.
///
/// Returns `ParseError::Malformed` if the layout matches but the verdict,
/// a reviewer list, the directory block or the tree hash is unusable.
pub fn parse_notification(body: &str) -> Result<ParsedNotification, ParseError> {
    let slots = split_slots(body)?;

    let verdict = Verdict::from_marker(slots.verdict)
        .ok_or_else(|| ParseError::malformed("verdict", slots.verdict))?;
    let consentors = parse_reviewers("approval list", slots.consentors)?;
    let opponents = parse_reviewers("cancellation list", slots.opponents)?;
    let outstanding = parse_directories(slots.directories)?;

    if slots.tree_hash.is_empty() || slots.tree_hash.contains(char::is_whitespace) {
        return Err(ParseError::malformed("tree hash", slots.tree_hash));
    }

    let state = ConsensusState::from_parts(
        TreeHash::new(slots.tree_hash),
        consentors,
        opponents,
        outstanding,
    )
    .map_err(|conflict| ParseError::malformed("reviewer lists", conflict.to_string()))?;

    Ok(ParsedNotification { verdict, state })
}

/// Classifies a comment body relative to the tree the PR currently points at.
pub fn decode_notification(body: &str, current_tree: &TreeHash) -> Decoded {
    match parse_notification(body) {
        Ok(parsed) if parsed.state.tree_hash() == current_tree => Decoded::Current(parsed.state),
        Ok(parsed) => Decoded::DifferentTree {
            stored: parsed.state.tree_hash().clone(),
        },
        Err(ParseError::TemplateNotFound) => Decoded::NotFound,
        Err(err) => Decoded::Malformed(err),
    }
}

/// The raw text of each slot in the layout.
struct Slots<'a> {
    verdict: &'a str,
    consentors: &'a str,
    opponents: &'a str,
    directories: &'a str,
    tree_hash: &'a str,
}

fn split_slots(body: &str) -> Result<Slots<'_>, ParseError> {
    let start = body.find(HEADER).ok_or(ParseError::TemplateNotFound)?;
    let rest = &body[start + HEADER.len()..];

    let (verdict, rest) = single_line(rest, CONSENT_MARKER)?;
    let (consentors, rest) = single_line(rest, OPPOSE_MARKER)?;

    let (opponents, rest) = match single_line(rest, DIRECTORIES_MARKER) {
        Ok(split) => split,
        Err(_) => single_line(rest, LEGACY_DIRECTORIES_MARKER)?,
    };

    // The directory block spans lines; the footer is the last one in the body.
    let footer = rest.rfind(TREE_HASH_OPEN).ok_or(ParseError::TemplateNotFound)?;
    let directories = &rest[..footer];
    let rest = &rest[footer + TREE_HASH_OPEN.len()..];

    let (tree_hash, _) = single_line(rest, TREE_HASH_CLOSE)?;

    Ok(Slots {
        verdict,
        consentors,
        opponents,
        directories,
        tree_hash,
    })
}

/// Splits at `marker`, requiring the text before it to stay on one line.
fn single_line<'a>(text: &'a str, marker: &str) -> Result<(&'a str, &'a str), ParseError> {
    let line_end = text.find('\n').unwrap_or(text.len());
    match text.find(marker) {
        Some(pos) if pos <= line_end => Ok((&text[..pos], &text[pos + marker.len()..])),
        _ => Err(ParseError::TemplateNotFound),
    }
}

fn parse_reviewers(slot: &'static str, text: &str) -> Result<BTreeMap<String, bool>, ParseError> {
    let mut reviewers = BTreeMap::new();
    if text.is_empty() {
        return Ok(reviewers);
    }

    for item in text.split(LIST_SEPARATOR) {
        let login = item.trim_matches('*');
        if login.is_empty() {
            return Err(ParseError::malformed(slot, format!("empty entry {item:?}")));
        }
        reviewers.insert(login.to_string(), login.len() != item.len());
    }

    Ok(reviewers)
}

fn parse_directories(text: &str) -> Result<BTreeSet<String>, ParseError> {
    if text.is_empty() {
        return Ok(BTreeSet::new());
    }

    let block = text
        .strip_prefix(DIRECTORY_BULLET)
        .ok_or_else(|| ParseError::malformed("directory block", text))?;

    block
        .split(DIRECTORY_BULLET)
        .map(|dir| {
            if dir.is_empty() || dir.contains('\n') {
                Err(ParseError::malformed("directory block", dir))
            } else {
                Ok(dir.to_string())
            }
        })
        .collect()
}
