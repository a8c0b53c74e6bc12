//! Review consensus: vote bookkeeping and directory coverage.
//!
//! A pull request is ready for the LGTM label when every directory it touches
//! has been approved by at least one authorized reviewer of a file in that
//! directory, and no authorized reviewer has an outstanding `/lgtm cancel`.
//!
//! - [`state`]: [`ConsensusState`], the votes and outstanding directories for
//!   one source tree
//! - [`coverage`]: [`ReviewerIndex`] and the outstanding-directory computation

pub mod coverage;
pub mod state;

pub use coverage::{ROOT_DIRECTORY, ReviewerIndex, directories_of, parent_directory};
pub use state::{ConsensusState, VoteConflict};
