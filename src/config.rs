//! Runtime configuration from environment variables.
//!
//! | Variable           | Required | Default | Meaning                                   |
//! |--------------------|----------|---------|-------------------------------------------|
//! | `GITHUB_TOKEN`     | yes      |         | token the bot authenticates with          |
//! | `LGTM_BOT_LOGIN`   | yes      |         | login whose comments carry state          |
//! | `LGTM_OWNERS_FILE` | yes      |         | JSON file of reviewers per directory      |
//! | `LGTM_LABEL`       | no       | `lgtm`  | label marking a PR as ready               |
//! | `LGTM_REPOS`       | no       | all     | comma-separated `owner/repo` allow-list   |
//! | `PORT`             | no       | `3000`  | HTTP listen port                          |

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::types::RepoId;
use crate::worker::{DispatcherConfig, ProcessorConfig};

const DEFAULT_LABEL: &str = "lgtm";
const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub github_token: String,
    pub bot_login: String,
    pub owners_file: PathBuf,
    pub label: String,
    /// `None` means every repository that sends webhooks.
    pub repos: Option<BTreeSet<RepoId>>,
    pub port: u16,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns a variable's
    /// value or `None` if it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", name))
        };

        let github_token = required("GITHUB_TOKEN")?;
        let bot_login = required("LGTM_BOT_LOGIN")?;
        let owners_file = PathBuf::from(required("LGTM_OWNERS_FILE")?);

        let label = lookup("LGTM_LABEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());

        let repos = lookup("LGTM_REPOS")
            .map(|v| parse_repos(&v))
            .transpose()
            .context("invalid LGTM_REPOS")?;

        let port = match lookup("PORT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT: {:?}", v))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            github_token,
            bot_login,
            owners_file,
            label,
            repos,
            port,
        })
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let processor = ProcessorConfig::new(&self.bot_login).with_label(&self.label);
        DispatcherConfig {
            processor,
            repos: self.repos.clone(),
        }
    }
}

// The token stays out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_login", &self.bot_login)
            .field("owners_file", &self.owners_file)
            .field("label", &self.label)
            .field("repos", &self.repos)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

fn parse_repos(value: &str) -> Result<BTreeSet<RepoId>> {
    let mut repos = BTreeSet::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match RepoId::parse(item) {
            Some(repo) => {
                repos.insert(repo);
            }
            None => bail!("expected owner/repo, got {:?}", item),
        }
    }
    Ok(repos)
}
