use crate::error::{DigestError, Result};
use crate::github::types::{ApiCommit, ApiFile, ApiIssue, ApiPullRequest, ApiRepository};
use crate::github::{HostingApi, Page, RepoName, RepositoryInfo};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;
const USER_AGENT: &str = concat!("pulse-digest/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API client
pub struct GitHubClient {
    token: String,
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a new GitHub API client
    pub fn new(token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            token,
            client,
            base_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Point the client at a different API root (GitHub Enterprise, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(DigestError::GitHubApi {
                status,
                message: error_message(&text),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.get(path, query).await?;
        Ok(response.json().await?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
        page: u32,
    ) -> Result<Page<T>> {
        query.push(("per_page", PER_PAGE.to_string()));
        query.push(("page", page.to_string()));

        let response = self.get(path, &query).await?;
        let next = next_page(response.headers())?;
        let items: Vec<T> = response.json().await?;

        Ok(Page { items, next })
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn repository(&self, repo: &RepoName) -> Result<RepositoryInfo> {
        let api: ApiRepository = self.get_json(&format!("/repos/{}", repo), &[]).await?;
        Ok(api.into())
    }

    async fn commits(
        &self,
        repo: &RepoName,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<ApiCommit>> {
        let mut query = Vec::new();
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(until) = until {
            query.push(("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        self.get_page(&format!("/repos/{}/commits", repo), query, page)
            .await
    }

    async fn commit_files(&self, repo: &RepoName, sha: &str) -> Result<Vec<String>> {
        let commit: ApiCommit = self
            .get_json(&format!("/repos/{}/commits/{}", repo, sha), &[])
            .await?;
        Ok(commit
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.filename)
            .collect())
    }

    async fn pull_requests(&self, repo: &RepoName, page: u32) -> Result<Page<ApiPullRequest>> {
        self.get_page(&format!("/repos/{}/pulls", repo), updated_desc(), page)
            .await
    }

    async fn pull_request_files(&self, repo: &RepoName, number: u64) -> Result<Vec<String>> {
        let files: Vec<ApiFile> = self
            .get_json(
                &format!("/repos/{}/pulls/{}/files", repo, number),
                &[("per_page", PER_PAGE.to_string())],
            )
            .await?;
        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    async fn issues(&self, repo: &RepoName, page: u32) -> Result<Page<ApiIssue>> {
        self.get_page(&format!("/repos/{}/issues", repo), updated_desc(), page)
            .await
    }
}

fn updated_desc() -> Vec<(&'static str, String)> {
    vec![
        ("state", "all".to_string()),
        ("sort", "updated".to_string()),
        ("direction", "desc".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Prefer GitHub's JSON `message`, otherwise the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => "empty response".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Page number of the `rel="next"` entry of a `Link` header
fn next_page(headers: &HeaderMap) -> Result<Option<u32>> {
    let Some(link) = headers.get(LINK).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };

    let re = Regex::new(r#"<([^>]*)>;\s*rel="next""#)?;
    let page_re = Regex::new(r"[?&]page=(\d+)")?;

    let next = re
        .captures(link)
        .and_then(|c| c.get(1))
        .and_then(|url| page_re.captures(url.as_str()))
        .and_then(|c| c.get(1))
        .and_then(|n| n.as_str().parse().ok());

    Ok(next)
}
