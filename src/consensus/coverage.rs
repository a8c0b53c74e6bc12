//! Directory coverage: which changed directories still lack an approving reviewer.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::normalize_login;

/// Label used in place of `.` for files at the repository root.
///
/// The directory list is shown to humans, and a bare `.` reads poorly.
pub const ROOT_DIRECTORY: &str = "root directory";

/// Returns the directory containing `path`, or [`ROOT_DIRECTORY`] for
/// top-level files.
pub fn parent_directory(path: &str) -> String {
    let path = path.trim_start_matches("./");
    match path.rsplit_once('/') {
        Some((dir, _)) => {
            let dir = dir.trim_end_matches('/');
            if dir.is_empty() || dir == "." {
                ROOT_DIRECTORY.to_string()
            } else {
                dir.to_string()
            }
        }
        None => ROOT_DIRECTORY.to_string(),
    }
}

/// Collects the distinct parent directories of `files`.
pub fn directories_of<'a>(files: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    files.into_iter().map(parent_directory).collect()
}

/// Authorized reviewers for each file changed by a pull request.
///
/// Built fresh for every event from the live changed-file list; reviewer
/// logins are stored normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerIndex {
    files: BTreeMap<String, BTreeSet<String>>,
}

impl ReviewerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index by asking `reviewers_for` about each changed file.
    pub fn build<I, F>(files: I, mut reviewers_for: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: FnMut(&str) -> BTreeSet<String>,
    {
        let mut index = Self::new();
        for file in files {
            let reviewers = reviewers_for(&file);
            index.insert(file, reviewers);
        }
        index
    }

    /// Adds (or replaces) the reviewer set for a file.
    pub fn insert(&mut self, path: impl Into<String>, reviewers: impl IntoIterator<Item = String>) {
        let reviewers = reviewers
            .into_iter()
            .map(|r| normalize_login(&r))
            .collect();
        self.files.insert(path.into(), reviewers);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The changed file paths.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Returns true if `login` may review at least one changed file.
    pub fn is_reviewer(&self, login: &str) -> bool {
        let login = normalize_login(login);
        self.files.values().any(|reviewers| reviewers.contains(&login))
    }

    /// Every directory touched by the pull request.
    pub fn all_directories(&self) -> BTreeSet<String> {
        directories_of(self.files())
    }

    /// Directories containing a file that none of `confirmed` may review.
    ///
    /// `confirmed` must hold normalized logins. A directory stays outstanding
    /// while any of its files is uncovered; a file with no reviewers at all
    /// can never be covered.
    pub fn outstanding_directories(&self, confirmed: &BTreeSet<String>) -> BTreeSet<String> {
        self.files
            .iter()
            .filter(|(_, reviewers)| reviewers.is_disjoint(confirmed))
            .map(|(path, _)| parent_directory(path))
            .collect()
    }
}
