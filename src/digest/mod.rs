pub mod fallback;
pub mod writer;

use crate::ai::SummaryOutcome;
use crate::config::Config;
use crate::github::{ActivityWindow, RepositoryActivity};
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// How the digest body was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestSource {
    Generated,
    Fallback,
}

/// Final digest, rendered once per run
#[derive(Debug, Clone, PartialEq)]
pub struct DigestDocument {
    pub title: String,
    pub body: String,
    pub generated_at: DateTime<Utc>,
    pub source: DigestSource,
}

impl DigestDocument {
    /// Title header followed by the body, minus any heading the body brought along
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}", self.title, strip_leading_title(&self.body))
    }
}

/// Labels used for titles and the fallback text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestLabels {
    pub label: String,
    pub period_name: String,
}

impl DigestLabels {
    pub fn from_config(config: &Config) -> Self {
        Self {
            label: config.label.clone(),
            period_name: config.period_name.clone(),
        }
    }

    /// `Pulse AI: 2024-01-15 - Daily Summary`
    pub fn heading(&self, at: &DateTime<Utc>) -> String {
        format!(
            "{}: {} - {} Summary",
            self.label,
            at.format("%Y-%m-%d"),
            self.period_name
        )
    }

    /// Heading with the generation time, e.g. `... - Daily Summary (14:30 UTC)`
    pub fn title(&self, at: &DateTime<Utc>) -> String {
        format!("{} ({} UTC)", self.heading(at), at.format("%H:%M"))
    }
}

/// Pick the generated text or fall back to the deterministic digest
pub fn render_digest(
    outcome: SummaryOutcome,
    repos: &[RepositoryActivity],
    window: &ActivityWindow,
    labels: &DigestLabels,
    now: DateTime<Utc>,
) -> DigestDocument {
    let (body, source) = match outcome {
        SummaryOutcome::Text(text) if !text.trim().is_empty() => {
            info!("Using generated digest");
            (text, DigestSource::Generated)
        }
        SummaryOutcome::Text(_) | SummaryOutcome::Empty => {
            error!("Empty response from summarizer, using fallback digest");
            (fallback::fallback_digest(repos, window, labels, &now), DigestSource::Fallback)
        }
        SummaryOutcome::Failed(reason) => {
            error!(%reason, "Summarizer failed, using fallback digest");
            (fallback::fallback_digest(repos, window, labels, &now), DigestSource::Fallback)
        }
    };

    DigestDocument {
        title: labels.title(&now),
        body,
        generated_at: now,
        source,
    }
}

/// Drop the first line when it is a top-level heading. Only the first line is inspected.
pub fn strip_leading_title(body: &str) -> &str {
    let (first, rest) = match body.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (body, ""),
    };

    if first.trim_end_matches('\r').starts_with("# ") {
        rest
    } else {
        body
    }
}
