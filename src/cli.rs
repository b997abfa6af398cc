use crate::config::{Config, MAX_WINDOW_DAYS};
use crate::github::RepoName;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pulse-digest")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "AI-written activity digests for a list of GitHub repositories",
    long_about = "pulse-digest collects recent commits, pull requests and issues from a fixed \
                  list of GitHub repositories, asks Gemini for a markdown digest (falling back \
                  to a plain summary when that fails), writes it to a dated file and commits \
                  and pushes the file with git."
)]
pub struct Cli {
    /// Path to config file (default: ~/.config/pulse-digest/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Length of the activity window in days
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Digest label used in titles and file names, e.g. "AI Digest"
    #[arg(long)]
    pub label: Option<String>,

    /// Period name used in titles, e.g. "Monthly"
    #[arg(long, value_name = "NAME")]
    pub period_name: Option<String>,

    /// Directory the digest file is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated repositories (owner/repo), replaces REPO_LIST
    #[arg(long, env = "REPO_LIST", hide_env_values = true)]
    pub repos: Option<String>,

    /// Print the prompt that would be sent, without summarizing, writing or publishing
    #[arg(long)]
    pub dry_run: bool,

    /// Write the digest but skip git add/commit/push
    #[arg(long)]
    pub no_publish: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Show the latest commits of one repository
    Commits {
        /// Repository as owner/repo or a GitHub URL
        repo: RepoName,

        /// Number of commits to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(days) = self.days {
            if days == 0 || days > MAX_WINDOW_DAYS {
                return Err(format!("--days must be between 1 and {}", MAX_WINDOW_DAYS));
            }
        }

        if matches!(&self.label, Some(label) if label.trim().is_empty()) {
            return Err("--label must not be empty".to_string());
        }

        if let Some(Commands::Commits { limit: 0, .. }) = &self.command {
            return Err("--limit must be at least 1".to_string());
        }

        if self.dry_run && self.command.is_some() {
            return Err("--dry-run cannot be combined with a subcommand".to_string());
        }

        Ok(())
    }

    /// Apply command-line overrides on top of file configuration
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(days) = self.days {
            config.window_days = days;
        }

        if let Some(label) = &self.label {
            config.label = label.clone();
        }

        if let Some(period_name) = &self.period_name {
            config.period_name = period_name.clone();
        }

        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }

        if self.no_publish {
            config.publish = false;
        }

        config
    }
}
