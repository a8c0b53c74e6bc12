//! GitHub effect interpreter using octocrab.
//!
//! This module implements the `GitHubInterpreter` trait, executing GitHub effects
//! against the real GitHub API via octocrab.
//!
//! Endpoints octocrab has no typed builder for (commit objects, paginated PR
//! files, label deletion) go through its raw `get`/`delete` helpers with
//! local response structs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::types::{CommentId, PrNumber, Sha, TreeHash};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

/// Page size for every paginated listing.
const PER_PAGE: u8 = 100;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Executes a single effect against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::ListChangedFiles { pr } => list_changed_files(client, pr).await,
        GitHubEffect::GetTreeHash { commit } => get_tree_hash(client, commit).await,
        GitHubEffect::ListComments { pr } => list_comments(client, pr).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
        GitHubEffect::UpdateComment { comment_id, body } => {
            update_comment(client, comment_id, body).await
        }
        GitHubEffect::AddLabel { pr, label } => add_label(client, pr, label).await,
        GitHubEffect::RemoveLabel { pr, label } => remove_label(client, pr, label).await,
    }
}

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

// ─── PR Queries ───────────────────────────────────────────────────────────────

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let open = pull.state == Some(octocrab::models::IssueState::Open);

    Ok(GitHubResponse::Pr(PrData {
        number: pr,
        head_sha: Sha::new(pull.head.sha),
        base_ref: pull.base.ref_field,
        open,
    }))
}

#[derive(Debug, Deserialize)]
struct RawPrFile {
    filename: String,
}

async fn list_changed_files(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/pulls/{}/files",
        client.owner(),
        client.repo_name(),
        pr.0
    );

    let mut page = 1u32;
    let mut files = Vec::new();

    loop {
        let params = PageParams {
            per_page: PER_PAGE,
            page,
        };
        let items: Vec<RawPrFile> = client
            .inner()
            .get(&url, Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let is_last_page = items.len() < usize::from(PER_PAGE);
        files.extend(items.into_iter().map(|f| f.filename));

        if is_last_page {
            break;
        }
        page += 1;
    }

    debug!(pr = pr.0, count = files.len(), "Listed changed files");
    Ok(GitHubResponse::ChangedFiles(files))
}

#[derive(Debug, Deserialize)]
struct RawGitCommit {
    tree: Option<RawGitTree>,
}

#[derive(Debug, Deserialize)]
struct RawGitTree {
    sha: String,
}

async fn get_tree_hash(
    client: &OctocrabClient,
    commit: Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/git/commits/{}",
        client.owner(),
        client.repo_name(),
        commit
    );

    let raw: RawGitCommit = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let tree = raw.tree.filter(|t| !t.sha.is_empty()).ok_or_else(|| {
        GitHubApiError::inconsistent(format!(
            "commit {} in {} has no tree",
            commit,
            client.repo()
        ))
    })?;

    Ok(GitHubResponse::TreeHash(TreeHash::new(tree.sha)))
}

// ─── Comments ─────────────────────────────────────────────────────────────────

async fn list_comments(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut all_comments = Vec::new();

    loop {
        let page_result = client
            .inner()
            .issues(client.owner(), client.repo_name())
            .list_comments(pr.0)
            .per_page(PER_PAGE)
            .page(page)
            .send()
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let items = page_result.items;
        let is_last_page = items.len() < usize::from(PER_PAGE);

        for comment in items {
            all_comments.push(CommentData {
                id: CommentId(comment.id.into_inner()),
                author: comment.user.login,
                body: comment.body.unwrap_or_default(),
                created_at: comment.created_at,
            });
        }

        if is_last_page {
            break;
        }
        page += 1;
    }

    // Oldest first.
    all_comments.sort_by_key(|c| c.created_at);

    Ok(GitHubResponse::Comments(all_comments))
}

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let comment = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentPosted {
        id: CommentId(comment.id.into_inner()),
    })
}

async fn update_comment(
    client: &OctocrabClient,
    comment_id: CommentId,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/issues/comments/{}",
        client.owner(),
        client.repo_name(),
        comment_id.0
    );

    #[derive(Serialize)]
    struct UpdateRequest {
        body: String,
    }

    let _: serde_json::Value = client
        .inner()
        .patch(&url, Some(&UpdateRequest { body }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentUpdated)
}

// ─── Labels ───────────────────────────────────────────────────────────────────

async fn add_label(
    client: &OctocrabClient,
    pr: PrNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_labels(pr.0, &[label])
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelAdded)
}

async fn remove_label(
    client: &OctocrabClient,
    pr: PrNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = label_url(client.owner(), client.repo_name(), pr, &label);

    let result: Result<serde_json::Value, _> = client.inner().delete(&url, None::<&()>).await;

    match result {
        Ok(_) => Ok(GitHubResponse::LabelRemoved),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            // Already gone is as good as removed.
            if err.is_not_found() {
                debug!(pr = pr.0, label = %label, "Label was not present");
                Ok(GitHubResponse::LabelRemoved)
            } else {
                Err(err)
            }
        }
    }
}

/// Builds the label endpoint, escaping names such as `kind/bug` or `needs review`.
fn label_url(owner: &str, repo: &str, pr: PrNumber, label: &str) -> String {
    format!(
        "/repos/{}/{}/issues/{}/labels/{}",
        owner,
        repo,
        pr.0,
        urlencoding::encode(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_url_escapes_name() {
        assert_eq!(
            label_url("acme", "widgets", PrNumber(4), "kind/bug fix"),
            "/repos/acme/widgets/issues/4/labels/kind%2Fbug%20fix"
        );
        assert_eq!(
            label_url("acme", "widgets", PrNumber(4), "lgtm"),
            "/repos/acme/widgets/issues/4/labels/lgtm"
        );
    }

    #[test]
    fn page_params_serialize_as_query() {
        let params = PageParams {
            per_page: PER_PAGE,
            page: 3,
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({"per_page": 100, "page": 3})
        );
    }

    #[test]
    fn git_commit_without_tree_deserializes() {
        let raw: RawGitCommit = serde_json::from_str(r#"{"sha": "abc"}"#).unwrap();
        assert!(raw.tree.is_none());

        let raw: RawGitCommit =
            serde_json::from_str(r#"{"sha": "abc", "tree": {"sha": "def"}}"#).unwrap();
        assert_eq!(raw.tree.unwrap().sha, "def");
    }
}
