use crate::config::Config;
use crate::github::{ActivityWindow, RepositoryActivity};

/// Maximum characters of a PR/issue body included in the prompt
pub const BODY_CHAR_LIMIT: usize = 200;
/// Maximum file paths listed per commit
pub const FILE_LIST_LIMIT: usize = 5;
const ELLIPSIS: &str = "...";

/// Static prompt text, fixed per deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub label: String,
    pub period_name: String,
    pub preamble: Option<String>,
    pub instructions: Option<String>,
    pub suffix: Option<String>,
    pub priority_labels: Vec<String>,
}

impl PromptSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            label: config.label.clone(),
            period_name: config.period_name.clone(),
            preamble: config.prompt_preamble.clone(),
            instructions: config.prompt_instructions.clone(),
            suffix: config.prompt_suffix.clone(),
            priority_labels: config.priority_labels.clone(),
        }
    }

    fn is_priority(&self, labels: &[String]) -> bool {
        labels.iter().any(|label| {
            self.priority_labels
                .iter()
                .any(|p| p.eq_ignore_ascii_case(label))
        })
    }
}

/// Message used instead of a prompt when no repository has usable data
pub fn no_activity_message(window: &ActivityWindow) -> String {
    format!(
        "No activity found in any repositories for the past {}.",
        window.span_description()
    )
}

/// Render collected activity into the summarization prompt
pub fn build_prompt(
    repos: &[RepositoryActivity],
    window: &ActivityWindow,
    settings: &PromptSettings,
) -> String {
    let valid: Vec<_> = repos
        .iter()
        .filter_map(|repo| repo.activity().map(|activity| (repo.name.as_str(), activity)))
        .collect();

    if valid.is_empty() {
        return no_activity_message(window);
    }

    let mut prompt = String::new();

    if let Some(preamble) = settings.preamble.as_deref().map(str::trim) {
        if !preamble.is_empty() {
            prompt.push_str(preamble);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str(&format!(
        "You are an AI assistant creating a {} digest of GitHub activity for the \"{}\" report.\n",
        settings.period_name.to_lowercase(),
        settings.label
    ));
    prompt.push_str(&format!(
        "\nPERIOD: Last {} ({})\n",
        window.span_description(),
        window.range_label()
    ));
    prompt.push_str("\nREPOSITORY ACTIVITY DATA:\n");

    for (name, activity) in valid {
        prompt.push_str(&format!("\n## {}\n", name));
        prompt.push_str(&format!("Description: {}\n", activity.description));

        // Commits
        if !activity.commits.is_empty() {
            prompt.push_str(&format!("\n### Commits ({})\n", activity.commits.len()));
            for commit in &activity.commits {
                prompt.push_str(&format!(
                    "- **{}** by {}: {}\n",
                    commit.short_sha, commit.author_name, commit.message
                ));
                push_files(&mut prompt, &commit.changed_files);
            }
        }

        // Pull requests
        if !activity.pull_requests.is_empty() {
            prompt.push_str(&format!("\n### Pull Requests ({})\n", activity.pull_requests.len()));
            for pr in &activity.pull_requests {
                prompt.push_str(&format!(
                    "- **#{}** {} ({}) by {}{}\n",
                    pr.number,
                    pr.title,
                    pr.state,
                    pr.author,
                    priority_marker(settings, &pr.labels)
                ));
                push_details(&mut prompt, pr.body.as_deref(), &pr.labels);
                push_files(&mut prompt, &pr.changed_files);
            }
        }

        // Issues
        if !activity.issues.is_empty() {
            prompt.push_str(&format!("\n### Issues ({})\n", activity.issues.len()));
            for issue in &activity.issues {
                prompt.push_str(&format!(
                    "- **#{}** {} ({}) by {}{}\n",
                    issue.number,
                    issue.title,
                    issue.state,
                    issue.author,
                    priority_marker(settings, &issue.labels)
                ));
                push_details(&mut prompt, issue.body.as_deref(), &issue.labels);
                if issue.comment_count > 0 {
                    prompt.push_str(&format!("  Comments: {}\n", issue.comment_count));
                }
            }
        }
    }

    prompt.push_str("\n\n");
    match settings.instructions.as_deref() {
        Some(instructions) if !instructions.trim().is_empty() => {
            prompt.push_str(instructions.trim_end());
            prompt.push('\n');
        }
        _ => prompt.push_str(&default_instructions(settings, window)),
    }

    if let Some(suffix) = settings.suffix.as_deref().map(str::trim) {
        if !suffix.is_empty() {
            prompt.push('\n');
            prompt.push_str(suffix);
            prompt.push('\n');
        }
    }

    prompt
}

fn push_details(prompt: &mut String, body: Option<&str>, labels: &[String]) {
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        prompt.push_str(&format!("  Description: {}\n", truncate_chars(body, BODY_CHAR_LIMIT)));
    }
    if !labels.is_empty() {
        prompt.push_str(&format!("  Labels: {}\n", labels.join(", ")));
    }
}

fn push_files(prompt: &mut String, files: &[String]) {
    if !files.is_empty() {
        prompt.push_str(&format!("  Files: {}\n", file_list(files)));
    }
}

fn priority_marker(settings: &PromptSettings, labels: &[String]) -> &'static str {
    if settings.is_priority(labels) {
        " **[PRIORITY]**"
    } else {
        ""
    }
}

/// First `limit` characters of `text`, with an ellipsis when anything was cut
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// First five paths joined by commas, with an ellipsis when more exist
pub fn file_list(files: &[String]) -> String {
    let shown = files
        .iter()
        .take(FILE_LIST_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if files.len() > FILE_LIST_LIMIT {
        format!("{}{}", shown, ELLIPSIS)
    } else {
        shown
    }
}

fn default_instructions(settings: &PromptSettings, window: &ActivityWindow) -> String {
    let label = &settings.label;
    let period = &settings.period_name;
    let span = window.span_description();

    format!(
        r#"TASK: Create a "{label}" digest with the title "{label}: [Date] - {period} Summary" that includes:

1. **Executive Summary** - High-level overview of the most significant changes in the past {span}
2. **Repository Breakdown** - Detailed summary for each repository with recent activity
3. **Key Insights** - Important patterns, achievements, or concerns identified from the activity
4. **Next Steps** - Recommended actions based on the recent activity
5. **Technical Highlights** - Notable technical changes or improvements from the past {span}

FORMAT REQUIREMENTS:
- Start with the title "{label}: [Current Date] - {period} Summary"
- Use proper markdown formatting
- Include emojis for visual appeal and quick scanning
- Group related changes logically
- Highlight critical items with bold text
- Keep it professional but engaging
- Focus on business impact and technical progress
- Extract actionable insights from commit messages and PR descriptions
- Identify potential TODOs or follow-up items

STYLE: Write in a clear, professional tone suitable for leadership review. Focus on what matters most for business and technical progress.
"#
    )
}
