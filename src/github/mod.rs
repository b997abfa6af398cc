pub mod client;
pub mod collector;
pub mod repo;
pub mod types;

pub use repo::{InvalidEntry, RepoName};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity collected for a single repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryActivity {
    /// Repository identifier (`owner/repo`)
    pub name: String,
    /// Either the collected activity or the reason collection failed
    pub outcome: CollectionOutcome,
}

/// Result of collecting one repository
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    Collected(Activity),
    Failed(String),
}

/// Commits, pull requests and issues inside the activity window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activity {
    pub description: String,
    pub commits: Vec<CommitRecord>,
    pub pull_requests: Vec<PullRequestRecord>,
    pub issues: Vec<IssueRecord>,
}

impl Activity {
    /// True when nothing in the window qualified
    pub fn is_idle(&self) -> bool {
        self.commits.is_empty() && self.pull_requests.is_empty() && self.issues.is_empty()
    }
}

impl RepositoryActivity {
    pub fn collected(name: impl Into<String>, activity: Activity) -> Self {
        Self {
            name: name.into(),
            outcome: CollectionOutcome::Collected(activity),
        }
    }

    /// Record a failed collection. Empty messages are replaced so the error is never blank.
    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "unknown error".to_string()
        } else {
            error
        };
        Self {
            name: name.into(),
            outcome: CollectionOutcome::Failed(error),
        }
    }

    pub fn activity(&self) -> Option<&Activity> {
        match &self.outcome {
            CollectionOutcome::Collected(activity) => Some(activity),
            CollectionOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            CollectionOutcome::Collected(_) => None,
            CollectionOutcome::Failed(error) => Some(error),
        }
    }

    pub fn commits(&self) -> &[CommitRecord] {
        self.activity().map(|a| a.commits.as_slice()).unwrap_or(&[])
    }

    pub fn pull_requests(&self) -> &[PullRequestRecord] {
        self.activity()
            .map(|a| a.pull_requests.as_slice())
            .unwrap_or(&[])
    }

    pub fn issues(&self) -> &[IssueRecord] {
        self.activity().map(|a| a.issues.as_slice()).unwrap_or(&[])
    }
}

/// A commit authored inside the window
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    /// First 8 characters of the commit sha
    pub short_sha: String,
    /// Full commit message
    pub message: String,
    pub author_name: String,
    pub authored_at: DateTime<Utc>,
    pub changed_files: Vec<String>,
}

/// Open/closed state shared by pull requests and issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Open => f.write_str("open"),
            ItemState::Closed => f.write_str("closed"),
        }
    }
}

/// A pull request updated inside the window
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestRecord {
    /// Repository-unique number
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: ItemState,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub changed_files: Vec<String>,
}

/// An issue updated inside the window
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    /// Repository-unique number
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: ItemState,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub comment_count: u64,
}

/// Inclusive time window used to filter activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    /// Start (inclusive)
    pub start: DateTime<Utc>,
    /// End (inclusive)
    pub end: DateTime<Utc>,
}

impl ActivityWindow {
    /// Window of `days` days ending at `end`, clamped to the earliest representable time
    pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    /// Check if a timestamp is within this window
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        at >= &self.start && at <= &self.end
    }

    /// Whole days covered, rounded down
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Human wording of the window length, e.g. "24 hours" or "30 days"
    pub fn span_description(&self) -> String {
        match self.days() {
            1 => "24 hours".to_string(),
            d if d > 1 => format!("{} days", d),
            _ => format!("{} hours", (self.end - self.start).num_hours()),
        }
    }

    /// `start to end` formatted as `%Y-%m-%d %H:%M`
    pub fn range_label(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Repository metadata needed by the collector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub description: Option<String>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page number to request next, if any
    pub next: Option<u32>,
}

/// Read-only view of the source hosting API
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Fetch repository metadata
    async fn repository(&self, repo: &RepoName) -> Result<RepositoryInfo>;

    /// List commits, newest first, optionally bounded by author date
    async fn commits(
        &self,
        repo: &RepoName,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<types::ApiCommit>>;

    /// Paths changed by a commit
    async fn commit_files(&self, repo: &RepoName, sha: &str) -> Result<Vec<String>>;

    /// All pull requests, most recently updated first
    async fn pull_requests(&self, repo: &RepoName, page: u32) -> Result<Page<types::ApiPullRequest>>;

    /// Paths changed by a pull request
    async fn pull_request_files(&self, repo: &RepoName, number: u64) -> Result<Vec<String>>;

    /// All issues (pull requests included upstream), most recently updated first
    async fn issues(&self, repo: &RepoName, page: u32) -> Result<Page<types::ApiIssue>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, 0, 0).unwrap()
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = ActivityWindow {
            start: at(8),
            end: at(18),
        };
        assert!(window.contains(&at(8)));
        assert!(window.contains(&at(18)));
        assert!(window.contains(&at(12)));
        assert!(!window.contains(&at(7)));
        assert!(!window.contains(&at(19)));
    }

    #[test]
    fn test_window_span_description() {
        let daily = ActivityWindow::ending_at(at(12), 1);
        assert_eq!(daily.span_description(), "24 hours");
        let monthly = ActivityWindow::ending_at(at(12), 30);
        assert_eq!(monthly.span_description(), "30 days");
        assert_eq!(daily.range_label(), "2024-01-14 12:00 to 2024-01-15 12:00");
    }

    #[test]
    fn test_window_start_clamped_instead_of_overflowing() {
        let window = ActivityWindow::ending_at(at(12), u32::MAX);
        assert_eq!(window.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(window.end, at(12));
        assert!(window.contains(&at(0)));
    }

    #[test]
    fn test_failed_activity_has_no_collections() {
        let repo = RepositoryActivity::failed("a/b", "timeout");
        assert_eq!(repo.error(), Some("timeout"));
        assert!(repo.activity().is_none());
        assert!(repo.commits().is_empty());
        assert!(repo.pull_requests().is_empty());
        assert!(repo.issues().is_empty());
    }

    #[test]
    fn test_failed_activity_error_never_blank() {
        let repo = RepositoryActivity::failed("a/b", "  ");
        assert_eq!(repo.error(), Some("unknown error"));
    }

    #[test]
    fn test_idle_activity() {
        let activity = Activity::default();
        assert!(activity.is_idle());
        let repo = RepositoryActivity::collected("a/b", activity);
        assert!(repo.error().is_none());
    }

    #[test]
    fn test_item_state_display() {
        assert_eq!(ItemState::Open.to_string(), "open");
        assert_eq!(ItemState::Closed.to_string(), "closed");
    }
}
