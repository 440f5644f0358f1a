use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::RepositoryHost;
use crate::content::{BLOB_TYPE, TreeEntry};
use crate::errors::RemoteError;
use crate::util::{decode_response, error_message};

pub const GITHUB_API_URL: &str = "https://api.github.com";
const SERVICE: &str = "GitHub";

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

/// Response from `GET /git/ref/{ref}` (subset of fields).
#[derive(Debug, Deserialize)]
struct RefResponse {
    object: GitObject,
}

/// Response from `GET /git/commits/{sha}` (subset of fields).
#[derive(Debug, Deserialize)]
struct CommitResponse {
    tree: GitObject,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct NewTreeItem<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct NewTree<'a> {
    base_tree: &'a str,
    tree: Vec<NewTreeItem<'a>>,
}

#[derive(Debug, Serialize)]
struct NewCommit<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [String],
}

#[derive(Debug, Serialize)]
struct RefUpdate<'a> {
    sha: &'a str,
    force: bool,
}

/// Client for the GitHub git-data API of one repository.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubClient {
    pub fn new(
        api_url: &str,
        owner: &str,
        repo: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("board-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|source| RemoteError::Transport {
                url: api_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    fn git_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/git/{}",
            self.api_url,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo),
            encode_path(path)
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, RemoteError> {
        builder.send().await.map_err(|source| RemoteError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

/// Percent-encode each segment of a `/`-separated ref path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a failed ref update means the branch moved underneath us.
fn is_non_fast_forward(status: StatusCode, message: &str) -> bool {
    match status {
        StatusCode::CONFLICT => true,
        StatusCode::UNPROCESSABLE_ENTITY => message.to_lowercase().contains("fast forward"),
        _ => false,
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn get_ref(&self, reference: &str) -> Result<String, RemoteError> {
        let url = self.git_url(&format!("ref/{}", reference));
        debug!(%url, "get ref");
        let resp = self.send(self.request(reqwest::Method::GET, &url), &url).await?;
        let body: RefResponse = decode_response(SERVICE, &url, resp).await?;
        Ok(body.object.sha)
    }

    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String, RemoteError> {
        let url = self.git_url(&format!("commits/{}", commit_sha));
        debug!(%url, "get commit");
        let resp = self.send(self.request(reqwest::Method::GET, &url), &url).await?;
        let body: CommitResponse = decode_response(SERVICE, &url, resp).await?;
        Ok(body.tree.sha)
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String, RemoteError> {
        let url = self.git_url("trees");
        let payload = NewTree {
            base_tree,
            tree: entries
                .iter()
                .map(|entry| NewTreeItem {
                    path: &entry.path,
                    mode: entry.mode(),
                    kind: BLOB_TYPE,
                    content: &entry.content,
                })
                .collect(),
        };
        debug!(%url, entries = entries.len(), "create tree");
        let resp = self
            .send(self.request(reqwest::Method::POST, &url).json(&payload), &url)
            .await?;
        let body: ShaResponse = decode_response(SERVICE, &url, resp).await?;
        Ok(body.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> Result<String, RemoteError> {
        let url = self.git_url("commits");
        let payload = NewCommit {
            message,
            tree: tree_sha,
            parents,
        };
        debug!(%url, tree = %tree_sha, "create commit");
        let resp = self
            .send(self.request(reqwest::Method::POST, &url).json(&payload), &url)
            .await?;
        let body: ShaResponse = decode_response(SERVICE, &url, resp).await?;
        Ok(body.sha)
    }

    async fn update_ref(&self, reference: &str, sha: &str, force: bool) -> Result<(), RemoteError> {
        let url = self.git_url(&format!("refs/{}", reference));
        debug!(%url, %sha, force, "update ref");
        let resp = self
            .send(
                self.request(reqwest::Method::PATCH, &url)
                    .json(&RefUpdate { sha, force }),
                &url,
            )
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        if !force && is_non_fast_forward(status, &message) {
            return Err(RemoteError::Rejected { message });
        }
        Err(RemoteError::Status {
            service: SERVICE,
            status: status.as_u16(),
            message,
        })
    }
}
