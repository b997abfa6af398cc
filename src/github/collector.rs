use crate::config::Config;
use crate::error::Result;
use crate::github::types::{ApiIssue, ApiPullRequest};
use crate::github::{
    Activity, ActivityWindow, CommitRecord, HostingApi, IssueRecord, Page, PullRequestRecord,
    RepoName, RepositoryActivity,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Limits applied while collecting one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLimits {
    pub max_commits: usize,
    pub max_pull_requests: usize,
    pub max_issues: usize,
    /// Listing records examined per resource type before giving up
    pub max_scanned: usize,
    /// Fetch changed-file lists for commits and pull requests
    pub include_file_changes: bool,
}

impl CollectionLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_commits: config.max_commits_per_repo,
            max_pull_requests: config.max_prs_per_repo,
            max_issues: config.max_issues_per_repo,
            max_scanned: config.max_scanned_per_repo,
            include_file_changes: config.include_file_changes,
        }
    }
}

/// Collects windowed activity for repositories through a [`HostingApi`]
pub struct Collector<'a> {
    api: &'a dyn HostingApi,
    limits: CollectionLimits,
    descriptions: BTreeMap<String, String>,
}

impl<'a> Collector<'a> {
    pub fn new(api: &'a dyn HostingApi, limits: CollectionLimits) -> Self {
        Self {
            api,
            limits,
            descriptions: BTreeMap::new(),
        }
    }

    /// Descriptions that replace the upstream repository description
    pub fn with_descriptions(mut self, descriptions: BTreeMap<String, String>) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// Collect one repository. Failures are captured in the result, never returned.
    pub async fn collect(&self, repo: &RepoName, window: &ActivityWindow) -> RepositoryActivity {
        let span = info_span!("collect", repo = %repo);
        async {
            match self.try_collect(repo, window).await {
                Ok(activity) => {
                    info!(
                        commits = activity.commits.len(),
                        pull_requests = activity.pull_requests.len(),
                        issues = activity.issues.len(),
                        "Collected activity"
                    );
                    RepositoryActivity::collected(repo.to_string(), activity)
                }
                Err(e) => {
                    error!("Error collecting data: {}", e);
                    RepositoryActivity::failed(repo.to_string(), e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_collect(&self, repo: &RepoName, window: &ActivityWindow) -> Result<Activity> {
        let info = self.api.repository(repo).await?;
        debug!(full_name = %info.full_name, "Fetched repository metadata");
        let description = self
            .descriptions
            .get(&repo.to_string())
            .cloned()
            .or(info.description)
            .unwrap_or_default();

        let commits = self.collect_commits(repo, window).await?;
        let pull_requests = self.collect_pull_requests(repo, window).await?;
        let issues = self.collect_issues(repo, window).await?;

        Ok(Activity {
            description,
            commits,
            pull_requests,
            issues,
        })
    }

    async fn collect_commits(
        &self,
        repo: &RepoName,
        window: &ActivityWindow,
    ) -> Result<Vec<CommitRecord>> {
        // Full shas are kept alongside the records for the changed-files lookup.
        let mut records: Vec<(String, CommitRecord)> = Vec::new();
        let mut scanned = 0;
        let mut page = 1;

        loop {
            let batch = self
                .api
                .commits(repo, Some(window.start), Some(window.end), page)
                .await?;

            for commit in batch.items {
                scanned += 1;
                let sha = commit.sha.clone();
                match commit.into_record() {
                    Some(record) if window.contains(&record.authored_at) => {
                        records.push((sha, record))
                    }
                    Some(_) => {}
                    None => debug!(%sha, "Skipping commit without author date"),
                }
                if scanned >= self.limits.max_scanned {
                    break;
                }
            }

            match batch.next {
                Some(next) if scanned < self.limits.max_scanned => page = next,
                _ => break,
            }
        }

        records.sort_by(|a, b| b.1.authored_at.cmp(&a.1.authored_at));
        records.truncate(self.limits.max_commits);

        if self.limits.include_file_changes {
            for (sha, record) in &mut records {
                match self.api.commit_files(repo, sha).await {
                    Ok(files) => record.changed_files = files,
                    Err(e) => warn!(%sha, "Could not list changed files: {}", e),
                }
            }
        }

        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    async fn collect_pull_requests(
        &self,
        repo: &RepoName,
        window: &ActivityWindow,
    ) -> Result<Vec<PullRequestRecord>> {
        let items = scan_updated(
            |page| self.api.pull_requests(repo, page),
            |pr: &ApiPullRequest| Some(pr.updated_at),
            window,
            self.limits.max_scanned,
        )
        .await?;

        let mut records: Vec<PullRequestRecord> = items.into_iter().map(Into::into).collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(self.limits.max_pull_requests);

        if self.limits.include_file_changes {
            for record in &mut records {
                match self.api.pull_request_files(repo, record.number).await {
                    Ok(files) => record.changed_files = files,
                    Err(e) => warn!(number = record.number, "Could not list changed files: {}", e),
                }
            }
        }

        Ok(records)
    }

    async fn collect_issues(
        &self,
        repo: &RepoName,
        window: &ActivityWindow,
    ) -> Result<Vec<IssueRecord>> {
        // The issues listing also returns pull requests; those are reported separately.
        let items = scan_updated(
            |page| self.api.issues(repo, page),
            |issue: &ApiIssue| (!issue.is_pull_request()).then_some(issue.updated_at),
            window,
            self.limits.max_scanned,
        )
        .await?;

        let mut records: Vec<IssueRecord> = items.into_iter().map(Into::into).collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(self.limits.max_issues);

        Ok(records)
    }
}

/// Walk an update-sorted (newest first) listing and keep the items updated inside `window`.
///
/// `updated_at` returns `None` for items that should be ignored outright. Paging stops at
/// the last page, at the first item older than the window, or after `max_scanned` records.
async fn scan_updated<T, F, Fut>(
    mut fetch: F,
    updated_at: impl Fn(&T) -> Option<DateTime<Utc>>,
    window: &ActivityWindow,
    max_scanned: usize,
) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut kept = Vec::new();
    let mut scanned = 0;
    let mut page = 1;

    loop {
        let batch = fetch(page).await?;

        for item in batch.items {
            scanned += 1;
            if let Some(at) = updated_at(&item) {
                if at < window.start {
                    debug!(scanned, "Reached items older than the window");
                    return Ok(kept);
                }
                if at <= window.end {
                    kept.push(item);
                }
            }
            if scanned >= max_scanned {
                debug!(scanned, "Scan bound reached");
                return Ok(kept);
            }
        }

        match batch.next {
            Some(next) => page = next,
            None => return Ok(kept),
        }
    }
}
