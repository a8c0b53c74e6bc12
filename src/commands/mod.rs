//! Command parsing for review commands.
//!
//! This module provides types and parsing for the commands reviewers issue
//! via pull request comments.
//!
//! # Supported Commands
//!
//! - `/lgtm` - Approves the pull request
//! - `/lgtm no-issue` - Same as `/lgtm`
//! - `/lgtm cancel` - Withdraws approval (author) or objects (reviewer)
//!
//! # Example
//!
//! ```
//! use lgtm_bot::commands::{parse_command, Command};
//!
//! let comment = "Checked the migration scripts.\n\n/lgtm";
//! assert_eq!(parse_command(comment), Some(Command::Lgtm));
//!
//! assert_eq!(parse_command("/lgtm cancel"), Some(Command::LgtmCancel));
//! assert_eq!(parse_command("no command here"), None);
//! ```

mod parser;
mod types;

pub use parser::parse_command;
pub use types::Command;
