use crate::error::{DigestError, Result};
use crate::github::{InvalidEntry, RepoName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest accepted activity window, in days
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest label used in titles, file names and commit messages
    pub label: String,

    /// Period wording in the title ("Daily", "Monthly", ...)
    pub period_name: String,

    /// Length of the activity window in days
    pub window_days: u32,

    /// Directory the digest files are written to
    pub output_dir: PathBuf,

    /// File name slug; derived from the label when unset
    pub file_slug: Option<String>,

    /// Keep repositories with no activity in the window
    pub include_idle_repositories: bool,

    /// Maximum commits kept per repository
    pub max_commits_per_repo: usize,

    /// Maximum pull requests kept per repository
    pub max_prs_per_repo: usize,

    /// Maximum issues kept per repository
    pub max_issues_per_repo: usize,

    /// Maximum listing records examined per repository and resource type
    pub max_scanned_per_repo: usize,

    /// Fetch changed-file lists for commits and pull requests
    pub include_file_changes: bool,

    /// GitHub REST API root
    pub github_api_url: String,

    /// Gemini API root
    pub gemini_api_url: String,

    /// Gemini model name
    pub gemini_model: String,

    /// Timeout for each GitHub request, in seconds
    pub request_timeout_secs: u64,

    /// Timeout for the Gemini request, in seconds
    pub gemini_timeout_secs: u64,

    /// Text placed before the activity data in the prompt
    pub prompt_preamble: Option<String>,

    /// Replaces the generated task instructions at the end of the prompt
    pub prompt_instructions: Option<String>,

    /// Extra instructions appended after the task instructions
    pub prompt_suffix: Option<String>,

    /// Labels that mark a pull request or issue as priority
    pub priority_labels: Vec<String>,

    /// Per-repository descriptions overriding the GitHub description
    pub repository_descriptions: BTreeMap<String, String>,

    /// Commit and push the digest file
    pub publish: bool,

    /// Git remote to push to
    pub git_remote: String,

    /// Committer name passed to git (uses git config when unset)
    pub git_user_name: Option<String>,

    /// Committer email passed to git (uses git config when unset)
    pub git_user_email: Option<String>,

    /// Commit message with `{label}`, `{date}` and `{time}` placeholders
    pub commit_message_format: String,

    /// Log level filter (overridden by RUST_LOG)
    pub log_level: String,

    /// Log line format
    pub log_format: LogFormat,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
}

impl Config {
    /// Load configuration from the default location (~/.config/pulse-digest/config.toml)
    /// or fall back to defaults when no file exists there
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DigestError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DigestError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("pulse-digest").join("config.toml"))
    }

    /// Write a default configuration file to `path`
    pub fn create_default_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(path, toml_string)?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(DigestError::config("label must not be empty"));
        }

        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(DigestError::config(format!(
                "window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }

        if self.max_commits_per_repo == 0
            || self.max_prs_per_repo == 0
            || self.max_issues_per_repo == 0
        {
            return Err(DigestError::config("per-repository caps must be > 0"));
        }

        if self.max_scanned_per_repo == 0 {
            return Err(DigestError::config("max_scanned_per_repo must be > 0"));
        }

        if self.request_timeout_secs == 0 || self.gemini_timeout_secs == 0 {
            return Err(DigestError::config("timeouts must be > 0"));
        }

        if self.commit_message_format.trim().is_empty() {
            return Err(DigestError::config("commit_message_format must not be empty"));
        }

        Ok(())
    }

    /// Slug used in digest file names, e.g. `pulse-ai`
    pub fn file_slug(&self) -> String {
        match &self.file_slug {
            Some(slug) if !slug.trim().is_empty() => slugify(slug),
            _ => slugify(&self.label),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            label: String::from("Pulse AI"),
            period_name: String::from("Daily"),
            window_days: 1,
            output_dir: PathBuf::from("digests"),
            file_slug: None,
            include_idle_repositories: false,
            max_commits_per_repo: 100,
            max_prs_per_repo: 50,
            max_issues_per_repo: 50,
            max_scanned_per_repo: 500,
            include_file_changes: true,
            github_api_url: crate::github::client::DEFAULT_API_URL.to_string(),
            gemini_api_url: crate::ai::gemini::DEFAULT_API_URL.to_string(),
            gemini_model: crate::ai::gemini::DEFAULT_MODEL.to_string(),
            request_timeout_secs: 30,
            gemini_timeout_secs: 120,
            prompt_preamble: None,
            prompt_instructions: None,
            prompt_suffix: None,
            priority_labels: default_priority_labels(),
            repository_descriptions: BTreeMap::new(),
            publish: true,
            git_remote: String::from("origin"),
            git_user_name: None,
            git_user_email: None,
            commit_message_format: String::from("🤖 Add {label} for {date} ({time} UTC)"),
            log_level: String::from("info"),
            log_format: LogFormat::Compact,
        }
    }
}

fn default_priority_labels() -> Vec<String> {
    ["high-priority", "critical", "urgent", "blocker"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Lower-case, with runs of non-alphanumerics collapsed to a single `-`
fn slugify(input: &str) -> String {
    let mut slug = String::new();
    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Secrets and the repository list, sourced from the environment
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
    pub gemini_api_key: String,
    pub repositories: Vec<RepoName>,
    /// List entries that are not repository identifiers, reported as failed repositories
    pub invalid_repositories: Vec<InvalidEntry>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .field("repositories", &self.repositories)
            .field("invalid_repositories", &self.invalid_repositories)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env(repos_override: Option<&str>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), repos_override)
    }

    /// Read credentials through `lookup`; every value is required
    pub fn from_lookup<F>(lookup: F, repos_override: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github_token = Self::github_token_from(&lookup)?;

        let gemini_api_key = first_non_blank(&lookup, &["GEMINI_API_KEY"])
            .ok_or_else(|| DigestError::MissingConfig("GEMINI_API_KEY environment variable is required".to_string()))?;

        let repo_list = match repos_override {
            Some(list) => Some(list.to_string()),
            None => first_non_blank(&lookup, &["REPO_LIST", "GITHUB_REPOS"]),
        }
        .ok_or_else(|| DigestError::MissingConfig("REPO_LIST environment variable is required".to_string()))?;

        let list = RepoName::parse_list(&repo_list);
        if list.valid.is_empty() {
            return Err(DigestError::MissingConfig(
                "REPO_LIST does not name any valid repository".to_string(),
            ));
        }

        Ok(Self {
            github_token,
            gemini_api_key,
            repositories: list.valid,
            invalid_repositories: list.invalid,
        })
    }

    /// Read only the GitHub token (`PAT_TOKEN`, then `GITHUB_TOKEN`)
    pub fn github_token_from<F>(lookup: &F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        first_non_blank(lookup, &["PAT_TOKEN", "GITHUB_TOKEN"]).ok_or_else(|| {
            DigestError::MissingConfig("PAT_TOKEN environment variable is required".to_string())
        })
    }
}

fn first_non_blank<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
