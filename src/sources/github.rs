//! GitHub REST API reference sources.
//!
//! Three sources over one [`GithubClient`]: releases, tags, and commits.
//! Each normalizes its upstream payload into a [`ReferencePair`] and folds
//! every failure into a JSON error body with an HTTP-style status, so the
//! resolver treats all of them uniformly.
//!
//! The client carries an optional pre-minted bearer token; without one,
//! requests go out unauthenticated and are subject to the much stricter
//! anonymous rate limits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::traits::{ReferenceSource, SourceResponse};
use crate::types::{ReferenceEntity, ReferencePair};
use crate::{MuninnError, Result};

/// Default base URL for the GitHub REST API.
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Shared GitHub API client.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Create a client against the public GitHub API.
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Create a client with a custom base URL (for testing with wiremock,
    /// or for GitHub Enterprise instances).
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("muninn/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }

    /// GET a JSON endpoint under the API base URL.
    ///
    /// Non-2xx statuses become [`MuninnError::Api`] so callers can match
    /// on the upstream status code.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MuninnError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MuninnError::Api {
                status: status.as_u16(),
                message: format!("GitHub API error: {status}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| MuninnError::Http(e.to_string()))
    }

    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>> {
        self.get_json(&format!("/repos/{repo}/releases")).await
    }

    async fn list_tags(&self, repo: &str) -> Result<Vec<Tag>> {
        self.get_json(&format!("/repos/{repo}/tags")).await
    }

    async fn list_commits(&self, repo: &str) -> Result<Vec<Commit>> {
        self.get_json(&format!("/repos/{repo}/commits")).await
    }

    async fn get_commit(&self, repo: &str, git_ref: &str) -> Result<Commit> {
        self.get_json(&format!("/repos/{repo}/commits/{git_ref}"))
            .await
    }

    /// Newest reference the repository has to offer, comparing the newest
    /// release and the newest tag by date and preferring the release on a
    /// tie. Either listing failing silently narrows the comparison.
    async fn latest_reference(&self, repo: &str) -> Option<ReferenceEntity> {
        let latest_release = self
            .list_releases(repo)
            .await
            .ok()
            .and_then(|releases| releases.into_iter().next());

        let latest_tag = self
            .list_tags(repo)
            .await
            .ok()
            .and_then(|tags| tags.into_iter().next());

        let latest_tag_commit = match &latest_tag {
            Some(tag) => self.get_commit(repo, &tag.commit.sha).await.ok(),
            None => None,
        };

        match (latest_release, latest_tag) {
            (Some(release), Some(tag)) => {
                // RFC 3339 timestamps from the API compare lexicographically.
                if let Some(commit) = &latest_tag_commit {
                    let release_time = release.published_at.as_deref().unwrap_or("");
                    let tag_time = commit_date(commit);
                    if tag_time > release_time {
                        return Some(entity_from_tag(&tag, latest_tag_commit.as_ref()));
                    }
                }
                Some(entity_from_release(&release))
            }
            (Some(release), None) => Some(entity_from_release(&release)),
            (None, Some(tag)) => Some(entity_from_tag(&tag, latest_tag_commit.as_ref())),
            (None, None) => None,
        }
    }
}

// ============================================================================
// Upstream payload models
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct Release {
    tag_name: String,
    html_url: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    author: Option<Actor>,
}

#[derive(Debug, Clone, Deserialize)]
struct Actor {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Tag {
    name: String,
    commit: TagCommit,
}

#[derive(Debug, Clone, Deserialize)]
struct TagCommit {
    sha: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Commit {
    sha: String,
    html_url: String,
    commit: CommitDetail,
    #[serde(default)]
    author: Option<Actor>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommitDetail {
    message: String,
    #[serde(default)]
    author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommitAuthor {
    #[serde(default)]
    date: Option<String>,
}

// ============================================================================
// Normalization
// ============================================================================

fn entity_from_release(release: &Release) -> ReferenceEntity {
    ReferenceEntity {
        reference: release.tag_name.clone(),
        url: release.html_url.clone(),
        message: release.body.clone().unwrap_or_default(),
        author: release
            .author
            .as_ref()
            .map(|a| a.login.clone())
            .unwrap_or_default(),
        published_at: release.published_at.clone().unwrap_or_default(),
    }
}

fn entity_from_commit(commit: &Commit) -> ReferenceEntity {
    ReferenceEntity {
        reference: commit.sha.clone(),
        url: commit.html_url.clone(),
        message: commit.commit.message.clone(),
        author: commit
            .author
            .as_ref()
            .map(|a| a.login.clone())
            .unwrap_or_default(),
        published_at: commit_date(commit).to_string(),
    }
}

/// Tag entities borrow their detail from the commit the tag points at;
/// without it only the name survives.
fn entity_from_tag(tag: &Tag, commit: Option<&Commit>) -> ReferenceEntity {
    match commit {
        Some(commit) => ReferenceEntity {
            reference: tag.name.clone(),
            url: commit.html_url.clone(),
            message: commit.commit.message.clone(),
            author: commit
                .author
                .as_ref()
                .map(|a| a.login.clone())
                .unwrap_or_default(),
            published_at: commit_date(commit).to_string(),
        },
        None => ReferenceEntity {
            reference: tag.name.clone(),
            url: String::new(),
            message: String::new(),
            author: String::new(),
            published_at: String::new(),
        },
    }
}

fn commit_date(commit: &Commit) -> &str {
    commit
        .commit
        .author
        .as_ref()
        .and_then(|a| a.date.as_deref())
        .unwrap_or("")
}

// ============================================================================
// Sources
// ============================================================================

/// Release lookup — the richest, most curated reference type, tried first.
pub struct ReleaseSource {
    client: GithubClient,
}

impl ReleaseSource {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferenceSource for ReleaseSource {
    fn name(&self) -> &str {
        "releases"
    }

    async fn lookup(&self, repo: &str, git_ref: &str) -> SourceResponse {
        let releases = match self.client.list_releases(repo).await {
            Ok(releases) => releases,
            Err(err) => {
                warn!(repo, %err, "failed to list releases");
                return SourceResponse::error(500, "Failed to fetch release information");
            }
        };

        // The API lists releases newest-first.
        let latest = releases.first();
        let current = releases.iter().find(|r| r.tag_name == git_ref);

        match (latest, current) {
            (Some(latest), Some(current)) => SourceResponse::json(
                200,
                &ReferencePair {
                    latest: Some(entity_from_release(latest)),
                    current: Some(entity_from_release(current)),
                },
            ),
            _ => SourceResponse::error(404, "No release found for the given repository and gitRef"),
        }
    }
}

/// Tag lookup — tried when no release carries the reference.
pub struct TagSource {
    client: GithubClient,
}

impl TagSource {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferenceSource for TagSource {
    fn name(&self) -> &str {
        "tags"
    }

    async fn lookup(&self, repo: &str, git_ref: &str) -> SourceResponse {
        let tags = match self.client.list_tags(repo).await {
            Ok(tags) => tags,
            Err(MuninnError::Api { status: 404, .. }) => {
                return SourceResponse::error(404, "Tag not found");
            }
            Err(err) => {
                warn!(repo, %err, "failed to list tags");
                return SourceResponse::error(500, "Failed to fetch tag information");
            }
        };

        let Some(tag) = tags.iter().find(|t| t.name == git_ref) else {
            return SourceResponse::error(404, "Tag not found");
        };

        let commit = match self.client.get_commit(repo, &tag.commit.sha).await {
            Ok(commit) => commit,
            Err(err) => {
                warn!(repo, git_ref, %err, "failed to fetch commit for tag");
                return SourceResponse::error(500, "Failed to fetch tag information");
            }
        };

        let latest = self.client.latest_reference(repo).await;

        SourceResponse::json(
            200,
            &ReferencePair {
                latest,
                current: Some(entity_from_tag(tag, Some(&commit))),
            },
        )
    }
}

/// Commit lookup — the universal fallback: any valid reference that isn't
/// a named release or tag is assumed to resolve to a commit, or to fail
/// here definitively.
pub struct CommitSource {
    client: GithubClient,
}

impl CommitSource {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferenceSource for CommitSource {
    fn name(&self) -> &str {
        "commits"
    }

    async fn lookup(&self, repo: &str, git_ref: &str) -> SourceResponse {
        let current = match self.client.get_commit(repo, git_ref).await {
            Ok(commit) => commit,
            // 422 is GitHub's answer for a ref that cannot name a commit.
            Err(MuninnError::Api {
                status: 404 | 422, ..
            }) => {
                return SourceResponse::error(
                    404,
                    "No commit found for the given repository and gitRef",
                );
            }
            Err(err) => {
                warn!(repo, git_ref, %err, "failed to fetch commit");
                return SourceResponse::error(500, "Failed to fetch commit information");
            }
        };

        // Partial results are fine: a failed latest-commit listing still
        // lets the caller see the commit they asked about.
        let latest = match self.client.list_commits(repo).await {
            Ok(commits) => commits.into_iter().next().map(|c| entity_from_commit(&c)),
            Err(err) => {
                warn!(repo, %err, "failed to fetch latest commit");
                None
            }
        };

        SourceResponse::json(
            200,
            &ReferencePair {
                latest,
                current: Some(entity_from_commit(&current)),
            },
        )
    }
}
