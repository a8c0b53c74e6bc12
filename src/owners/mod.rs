//! Code ownership: which logins may review which files.
//!
//! Ownership is hierarchical. A reviewer listed for a directory may review
//! every file beneath it, so the reviewers of a file are the union of the
//! reviewers listed for its directory and each ancestor up to the root.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::types::{RepoId, normalize_login};

/// Errors that can occur when loading ownership data.
#[derive(Debug, Error)]
pub enum OwnersError {
    #[error("failed to read owners file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid owners file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid repository key in owners file: {0:?}")]
    InvalidRepository(String),

    #[error("no ownership data for {0}")]
    UnknownRepository(RepoId),
}

/// Resolves ownership for a repository at a given base branch.
pub trait OwnersResolver {
    /// Loads the ownership table that applies to pull requests into `base_ref`.
    fn load(
        &self,
        repo: &RepoId,
        base_ref: &str,
    ) -> impl Future<Output = Result<RepoOwners, OwnersError>> + Send;
}

/// Ownership table for one repository.
///
/// Directory keys are stored without leading or trailing slashes; the root
/// directory is the empty string. Logins are stored normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoOwners {
    directories: BTreeMap<String, BTreeSet<String>>,
}

impl RepoOwners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists `reviewers` as owners of `directory`, adding to any already listed.
    pub fn add<I, S>(&mut self, directory: &str, reviewers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.directories
            .entry(normalize_directory(directory))
            .or_default()
            .extend(reviewers.into_iter().map(|r| normalize_login(r.as_ref())));
    }

    pub fn with<I, S>(mut self, directory: &str, reviewers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(directory, reviewers);
        self
    }

    /// Reviewers allowed to approve changes to the file at `path`.
    pub fn reviewers(&self, path: &str) -> BTreeSet<String> {
        let path = normalize_directory(path);
        let mut reviewers = BTreeSet::new();

        for dir in ancestors(&path) {
            if let Some(owners) = self.directories.get(dir) {
                reviewers.extend(owners.iter().cloned());
            }
        }

        reviewers
    }
}

/// Strips `./` and surrounding slashes so `/a/b/`, `./a/b` and `a/b` agree.
fn normalize_directory(path: &str) -> String {
    let path = path.trim_start_matches("./").trim_matches('/');
    if path == "." { String::new() } else { path.to_string() }
}

/// Yields every directory enclosing `path`, from the deepest up to the root.
///
/// `path` itself is included, so a table keyed by file path also matches.
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(path);
    std::iter::from_fn(move || {
        let current = next?;
        next = if current.is_empty() {
            None
        } else {
            Some(current.rsplit_once('/').map_or("", |(parent, _)| parent))
        };
        Some(current)
    })
}

/// Ownership tables read once from a JSON file.
///
/// The file maps `owner/repo` to a table of directory to reviewer logins:
///
/// ```json
/// {
///   "acme/widgets": {
///     "": ["lead"],
///     "storage": ["alice"],
///     "net/http": ["bob", "@Carol"]
///   }
/// }
/// ```
///
/// The same table applies to every base branch.
#[derive(Debug, Clone, Default)]
pub struct StaticOwners {
    repos: HashMap<RepoId, RepoOwners>,
}

impl StaticOwners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, repo: RepoId, owners: RepoOwners) {
        self.repos.insert(repo, owners);
    }

    /// Parses ownership tables from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `OwnersError::Json` for invalid JSON and
    /// `OwnersError::InvalidRepository` for a key that is not `owner/repo`.
    pub fn from_json(text: &str) -> Result<Self, OwnersError> {
        let raw: HashMap<String, BTreeMap<String, Vec<String>>> = serde_json::from_str(text)?;

        let mut owners = StaticOwners::new();
        for (key, table) in raw {
            let repo =
                RepoId::parse(&key).ok_or_else(|| OwnersError::InvalidRepository(key.clone()))?;
            let mut repo_owners = RepoOwners::new();
            for (directory, reviewers) in &table {
                repo_owners.add(directory, reviewers);
            }
            owners.insert(repo, repo_owners);
        }

        Ok(owners)
    }

    /// Reads ownership tables from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OwnersError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OwnersError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let owners = Self::from_json(&text)?;
        debug!(path = %path.display(), repos = owners.repos.len(), "Loaded owners file");
        Ok(owners)
    }
}

impl OwnersResolver for StaticOwners {
    async fn load(&self, repo: &RepoId, _base_ref: &str) -> Result<RepoOwners, OwnersError> {
        self.repos
            .get(repo)
            .cloned()
            .ok_or_else(|| OwnersError::UnknownRepository(repo.clone()))
    }
}
