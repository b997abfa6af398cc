use crate::ai::prompt::{build_prompt, PromptSettings};
use crate::ai::Summarizer;
use crate::config::Config;
use crate::digest::writer::DigestWriter;
use crate::digest::{render_digest, DigestLabels, DigestSource};
use crate::error::Result;
use crate::github::collector::{CollectionLimits, Collector};
use crate::github::{ActivityWindow, HostingApi, InvalidEntry, RepoName, RepositoryActivity};
use crate::publish::{commit_message, Publisher};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

/// Summary of one completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub path: PathBuf,
    pub source: DigestSource,
    /// Repositories with data that went into the digest
    pub collected: usize,
    pub failed: usize,
    pub skipped_idle: usize,
}

/// Repositories kept for the digest plus the tallies behind them
struct Gathered {
    repos: Vec<RepositoryActivity>,
    collected: usize,
    failed: usize,
    skipped_idle: usize,
}

/// Coordinates collection, summarization, writing and publishing
pub struct Orchestrator {
    config: Config,
    hosting: Box<dyn HostingApi>,
    summarizer: Box<dyn Summarizer>,
    publisher: Option<Box<dyn Publisher>>,
    invalid_entries: Vec<InvalidEntry>,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        hosting: Box<dyn HostingApi>,
        summarizer: Box<dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            hosting,
            summarizer,
            publisher: None,
            invalid_entries: Vec::new(),
            show_progress: true,
        }
    }

    /// Commit and push each written digest through `publisher`
    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Repository list entries that could not be parsed; each is reported as a failed repository
    pub fn with_invalid_entries(mut self, invalid_entries: Vec<InvalidEntry>) -> Self {
        self.invalid_entries = invalid_entries;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn window(&self, now: DateTime<Utc>) -> ActivityWindow {
        let window = ActivityWindow::ending_at(now, self.config.window_days);
        info!(
            start = %window.start.to_rfc3339(),
            end = %window.end.to_rfc3339(),
            "Collecting activity for the last {}",
            window.span_description()
        );
        window
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style.progress_chars("=>-"));
        }
        progress
    }

    /// Collect every repository in input order, one after another
    async fn gather(&self, repos: &[RepoName], window: &ActivityWindow) -> Gathered {
        let collector = Collector::new(self.hosting.as_ref(), CollectionLimits::from_config(&self.config))
            .with_descriptions(self.config.repository_descriptions.clone());

        let progress = self.progress_bar(repos.len());
        let mut gathered = Gathered {
            repos: Vec::with_capacity(repos.len()),
            collected: 0,
            failed: 0,
            skipped_idle: 0,
        };

        for repo in repos {
            progress.set_message(format!("Collecting {}", repo));
            let result = collector.collect(repo, window).await;
            progress.inc(1);

            match result.activity() {
                None => gathered.failed += 1,
                Some(activity) if activity.is_idle() && !self.config.include_idle_repositories => {
                    info!(repo = %repo, "No activity in window, leaving repository out");
                    gathered.skipped_idle += 1;
                    continue;
                }
                Some(_) => gathered.collected += 1,
            }
            gathered.repos.push(result);
        }

        progress.finish_with_message("Collection complete");

        for invalid in &self.invalid_entries {
            warn!(entry = %invalid.entry, "Skipping invalid repository entry");
            gathered
                .repos
                .push(RepositoryActivity::failed(invalid.entry.clone(), invalid.error.clone()));
            gathered.failed += 1;
        }

        info!(
            collected = gathered.collected,
            failed = gathered.failed,
            skipped_idle = gathered.skipped_idle,
            "Collected repository activity"
        );
        gathered
    }

    /// Build the prompt a run would submit, without summarizing, writing or publishing
    pub async fn preview(&self, repos: &[RepoName], now: DateTime<Utc>) -> String {
        let window = self.window(now);
        let gathered = self.gather(repos, &window).await;
        build_prompt(&gathered.repos, &window, &PromptSettings::from_config(&self.config))
    }

    /// Run one full digest pass
    pub async fn run(&self, repos: &[RepoName], now: DateTime<Utc>) -> Result<RunReport> {
        let window = self.window(now);
        let gathered = self.gather(repos, &window).await;

        let prompt = build_prompt(&gathered.repos, &window, &PromptSettings::from_config(&self.config));
        info!(chars = prompt.chars().count(), "Requesting digest summary");
        let outcome = self.summarizer.summarize(&prompt).await;

        let labels = DigestLabels::from_config(&self.config);
        let document = render_digest(outcome, &gathered.repos, &window, &labels, now);

        let writer = DigestWriter::new(self.config.output_dir.clone(), self.config.file_slug());
        let path = writer.write(&document)?;

        match &self.publisher {
            Some(publisher) => {
                let message = commit_message(&self.config.commit_message_format, &self.config.label, &now);
                publisher.publish(&path, &message).await?;
            }
            None => warn!(path = %path.display(), "Publishing disabled, digest left uncommitted"),
        }

        Ok(RunReport {
            path,
            source: document.source,
            collected: gathered.collected,
            failed: gathered.failed,
            skipped_idle: gathered.skipped_idle,
        })
    }
}
