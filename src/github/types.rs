//! Wire types for the GitHub REST API.
//!
//! Every field GitHub may omit or null is an `Option` here; conversion into
//! the records in [`crate::github`] applies the defaults so nothing
//! downstream deals with missing fields.

use crate::github::{CommitRecord, IssueRecord, ItemState, PullRequestRecord, RepositoryInfo};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const UNKNOWN_AUTHOR: &str = "Unknown";
const GHOST_USER: &str = "ghost";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepository {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ApiRepository> for RepositoryInfo {
    fn from(repo: ApiRepository) -> Self {
        Self {
            full_name: repo.full_name,
            description: repo.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
    pub sha: String,
    pub commit: ApiCommitDetail,
    #[serde(default)]
    pub files: Option<Vec<ApiFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommitDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<ApiSignature>,
    #[serde(default)]
    pub committer: Option<ApiSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFile {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
    #[serde(default)]
    pub comments: u64,
    /// Present when the issue is actually a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl ApiCommit {
    /// Author date, falling back to the committer date
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit
            .author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| self.commit.committer.as_ref().and_then(|c| c.date))
    }

    /// Convert into a record; `None` when the commit carries no usable date
    pub fn into_record(self) -> Option<CommitRecord> {
        let authored_at = self.authored_at()?;
        let author_name = self
            .commit
            .author
            .and_then(|a| a.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let changed_files = self
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.filename)
            .collect();

        Some(CommitRecord {
            short_sha: self.sha.chars().take(8).collect(),
            message: self.commit.message.unwrap_or_default(),
            author_name,
            authored_at,
            changed_files,
        })
    }
}

impl ApiIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

impl From<ApiPullRequest> for PullRequestRecord {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            body: non_blank(pr.body),
            state: parse_state(pr.state.as_deref()),
            author: login_or_ghost(pr.user),
            created_at: pr.created_at.unwrap_or(pr.updated_at),
            updated_at: pr.updated_at,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            changed_files: Vec::new(),
        }
    }
}

impl From<ApiIssue> for IssueRecord {
    fn from(issue: ApiIssue) -> Self {
        Self {
            number: issue.number,
            title: issue.title.unwrap_or_default(),
            body: non_blank(issue.body),
            state: parse_state(issue.state.as_deref()),
            author: login_or_ghost(issue.user),
            created_at: issue.created_at.unwrap_or(issue.updated_at),
            updated_at: issue.updated_at,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            comment_count: issue.comments,
        }
    }
}

fn parse_state(state: Option<&str>) -> ItemState {
    match state {
        Some(s) if s.eq_ignore_ascii_case("closed") => ItemState::Closed,
        _ => ItemState::Open,
    }
}

fn login_or_ghost(user: Option<ApiUser>) -> String {
    user.map(|u| u.login)
        .unwrap_or_else(|| GHOST_USER.to_string())
}

fn non_blank(body: Option<String>) -> Option<String> {
    body.filter(|b| !b.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_commit_defaults_missing_fields() {
        let commit: ApiCommit = serde_json::from_value(json!({
            "sha": "0123456789abcdef",
            "commit": {
                "message": "Fix login",
                "author": { "name": null, "date": "2024-01-15T10:00:00Z" }
            }
        }))
        .unwrap();

        let record = commit.into_record().unwrap();
        assert_eq!(record.short_sha, "01234567");
        assert_eq!(record.author_name, "Unknown");
        assert!(record.changed_files.is_empty());
    }

    #[test]
    fn test_commit_without_dates_is_dropped() {
        let commit: ApiCommit = serde_json::from_value(json!({
            "sha": "abc",
            "commit": { "message": "x", "author": null, "committer": null }
        }))
        .unwrap();
        assert!(commit.into_record().is_none());
    }

    #[test]
    fn test_commit_falls_back_to_committer_date() {
        let commit: ApiCommit = serde_json::from_value(json!({
            "sha": "abc",
            "commit": {
                "message": "x",
                "committer": { "name": "bot", "date": "2024-01-15T10:00:00Z" }
            }
        }))
        .unwrap();
        assert!(commit.authored_at().is_some());
    }

    #[test]
    fn test_naive_timestamp_is_rejected() {
        let result: std::result::Result<ApiPullRequest, _> = serde_json::from_value(json!({
            "number": 1,
            "updated_at": "2024-01-15T10:00:00"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_pull_request_conversion() {
        let pr: ApiPullRequest = serde_json::from_value(json!({
            "number": 42,
            "title": "Add feature",
            "body": "   ",
            "state": "closed",
            "user": null,
            "updated_at": "2024-01-15T10:00:00Z",
            "labels": [{ "name": "enhancement" }]
        }))
        .unwrap();

        let record = PullRequestRecord::from(pr);
        assert_eq!(record.number, 42);
        assert_eq!(record.state, ItemState::Closed);
        assert_eq!(record.author, "ghost");
        assert!(record.body.is_none());
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.labels, vec!["enhancement".to_string()]);
    }

    #[test]
    fn test_issue_detects_pull_request() {
        let issue: ApiIssue = serde_json::from_value(json!({
            "number": 7,
            "title": "Bug",
            "state": "open",
            "user": { "login": "octocat" },
            "created_at": "2024-01-14T10:00:00Z",
            "updated_at": "2024-01-15T10:00:00Z",
            "comments": 3,
            "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/7" }
        }))
        .unwrap();
        assert!(issue.is_pull_request());

        let record = IssueRecord::from(issue);
        assert_eq!(record.comment_count, 3);
        assert_eq!(record.author, "octocat");
        assert_eq!(record.state, ItemState::Open);
    }
}
