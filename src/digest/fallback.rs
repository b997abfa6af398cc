use crate::digest::DigestLabels;
use crate::github::{ActivityWindow, RepositoryActivity};
use chrono::{DateTime, Utc};

/// Deterministic digest used when summarization fails. Pure formatting, never fails.
pub fn fallback_digest(
    repos: &[RepositoryActivity],
    window: &ActivityWindow,
    labels: &DigestLabels,
    now: &DateTime<Utc>,
) -> String {
    let mut digest = String::new();

    digest.push_str(&format!("# {}\n\n", labels.heading(now)));
    digest.push_str("## Executive Summary\n");
    digest.push_str(&format!(
        "Generated {} digest for the last {} ({}).\n\n",
        labels.label,
        window.span_description(),
        window.range_label()
    ));
    digest.push_str("## Repository Activity\n\n");

    for repo in repos {
        digest.push_str(&format!("### {}\n", repo.name));
        match repo.error() {
            Some(error) => digest.push_str(&format!("Error: {}\n\n", error)),
            None => {
                digest.push_str(&format!("- Commits: {}\n", repo.commits().len()));
                digest.push_str(&format!("- Pull Requests: {}\n", repo.pull_requests().len()));
                digest.push_str(&format!("- Issues: {}\n\n", repo.issues().len()));
            }
        }
    }

    if repos.is_empty() {
        digest.push_str("No repository activity was collected.\n\n");
    }

    digest.push_str("## Note\n");
    digest.push_str(
        "This is a fallback digest generated due to API issues. Please check the logs for details.\n",
    );

    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::github::{Activity, CommitRecord};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_fallback_counts_and_errors() {
        let commit = CommitRecord {
            short_sha: "abcdef12".to_string(),
            message: "c1".to_string(),
            author_name: "Ada".to_string(),
            authored_at: now(),
            changed_files: vec![],
        };
        let repos = vec![
            RepositoryActivity::collected(
                "A",
                Activity {
                    commits: vec![commit],
                    ..Default::default()
                },
            ),
            RepositoryActivity::failed("B", "timeout"),
        ];
        let labels = DigestLabels::from_config(&Config::default());
        let window = ActivityWindow::ending_at(now(), 1);

        let digest = fallback_digest(&repos, &window, &labels, &now());

        assert!(digest.starts_with("# Pulse AI: 2024-01-15 - Daily Summary\n"));
        assert!(digest.contains(
            "Generated Pulse AI digest for the last 24 hours (2024-01-14 14:30 to 2024-01-15 14:30)."
        ));
        assert!(digest.contains("### A\n- Commits: 1\n- Pull Requests: 0\n- Issues: 0\n"));
        assert!(digest.contains("### B\nError: timeout\n"));
        assert!(digest.contains("## Note"));
    }

    #[test]
    fn test_fallback_without_repositories() {
        let labels = DigestLabels {
            label: "AI Digest".to_string(),
            period_name: "Monthly".to_string(),
        };
        let window = ActivityWindow::ending_at(now(), 30);
        let digest = fallback_digest(&[], &window, &labels, &now());
        assert!(digest.starts_with("# AI Digest: 2024-01-15 - Monthly Summary\n"));
        assert!(digest.contains("for the last 30 days"));
        assert!(digest.contains("No repository activity was collected."));
    }
}
