mod ai;
mod cli;
mod config;
mod digest;
mod error;
mod github;
mod logging;
mod orchestrator;
mod publish;

use ai::gemini::GeminiClient;
use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use config::{Config, Credentials, LogFormat};
use github::client::GitHubClient;
use github::{HostingApi, RepoName};
use logging::LogSettings;
use orchestrator::Orchestrator;
use publish::GitPublisher;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // A broken config file must not stop `init`, so the error is kept until a command needs it
    let config = load_config(&cli);
    let settings = match &config {
        Ok(config) => LogSettings::new(&config.log_level, config.log_format, cli.verbose),
        Err(_) => LogSettings::new("info", LogFormat::default(), cli.verbose),
    };
    let _log_guard = settings.install();

    if let Err(e) = execute(&cli, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Defaults, then the config file, then command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => Config::load().context("Failed to load config file")?,
    };

    let config = cli.apply_overrides(config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn execute(cli: &Cli, config: anyhow::Result<Config>) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init { force }) => init_config(cli.config.clone(), *force),
        Some(Commands::Config) => {
            let toml_str = toml::to_string_pretty(&config?).context("Failed to render configuration")?;
            println!("Current configuration:\n");
            println!("{}", toml_str);
            Ok(())
        }
        Some(Commands::Commits { repo, limit }) => show_commits(&config?, repo, *limit).await,
        None => run_digest(cli, config?).await,
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    if config_path.exists() && !force {
        bail!(
            "Config file already exists at: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    Config::create_default_at(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("✓ Created config file at: {}", config_path.display());
    println!("\nCredentials are read from the environment:");
    println!("  PAT_TOKEN       GitHub token (GITHUB_TOKEN also accepted)");
    println!("  GEMINI_API_KEY  Gemini API key");
    println!("  REPO_LIST       comma-separated owner/repo list (or --repos)");
    Ok(())
}

fn github_client(config: &Config, token: String) -> anyhow::Result<GitHubClient> {
    Ok(GitHubClient::new(token, Duration::from_secs(config.request_timeout_secs))
        .context("Failed to build GitHub client")?
        .with_base_url(config.github_api_url.clone()))
}

async fn run_digest(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let credentials = Credentials::from_env(cli.repos.as_deref())
        .context("Missing required environment configuration")?;
    info!(
        repositories = credentials.repositories.len(),
        invalid = credentials.invalid_repositories.len(),
        window_days = config.window_days,
        "Starting {} run",
        config.label
    );

    let hosting = github_client(&config, credentials.github_token.clone())?;
    let summarizer = GeminiClient::new(
        credentials.gemini_api_key.clone(),
        Duration::from_secs(config.gemini_timeout_secs),
    )
    .context("Failed to build Gemini client")?
    .with_model(config.gemini_model.clone())
    .with_base_url(config.gemini_api_url.clone());

    let publisher = config
        .publish
        .then(|| GitPublisher::from_config(".", &config));

    let mut orchestrator = Orchestrator::new(config, Box::new(hosting), Box::new(summarizer))
        .with_invalid_entries(credentials.invalid_repositories.clone());
    if let Some(publisher) = publisher {
        orchestrator = orchestrator.with_publisher(Box::new(publisher));
    }

    let now = Utc::now();

    if cli.dry_run {
        let prompt = orchestrator.preview(&credentials.repositories, now).await;
        println!("{}", prompt);
        return Ok(());
    }

    let report = orchestrator
        .run(&credentials.repositories, now)
        .await
        .context("Digest run failed")?;

    println!("✓ Digest written to: {}", report.path.display());
    println!(
        "  {} repositories summarized, {} failed, {} without activity ({:?} digest)",
        report.collected, report.failed, report.skipped_idle, report.source
    );
    Ok(())
}

async fn show_commits(config: &Config, repo: &RepoName, limit: usize) -> anyhow::Result<()> {
    let token = Credentials::github_token_from(&|key: &str| std::env::var(key).ok())
        .context("Missing required environment configuration")?;
    let client = github_client(config, token)?;

    let mut commits = Vec::new();
    let mut page = Some(1);
    while let Some(number) = page {
        if commits.len() >= limit {
            break;
        }
        let result = client
            .commits(repo, None, None, number)
            .await
            .with_context(|| format!("Failed to list commits for {}", repo))?;
        commits.extend(result.items.into_iter().filter_map(|c| c.into_record()));
        page = result.next;
    }
    commits.truncate(limit);

    println!("Latest commits in {}:\n", repo);
    for commit in &commits {
        let subject = commit.message.lines().next().unwrap_or_default();
        println!(
            "{} {} {}: {}",
            commit.short_sha,
            commit.authored_at.format("%Y-%m-%d %H:%M"),
            commit.author_name,
            subject
        );
    }
    if commits.is_empty() {
        println!("No commits found.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_replaces_broken_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "window_days = \"not a number\"").unwrap();
        let path_arg = path.to_str().unwrap();

        let cli = Cli::parse_from(vec!["pulse-digest", "--config", path_arg, "init", "--force"]);
        let config = load_config(&cli);
        assert!(config.is_err());

        execute(&cli, config).await.unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "label = \"Keep me\"").unwrap();
        let path_arg = path.to_str().unwrap();

        let cli = Cli::parse_from(vec!["pulse-digest", "--config", path_arg, "init"]);
        let config = load_config(&cli);
        assert!(execute(&cli, config).await.is_err());
        assert_eq!(Config::load_from(&path).unwrap().label, "Keep me");
    }

    #[tokio::test]
    async fn test_config_error_surfaces_for_other_commands() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");
        let path_arg = path.to_str().unwrap();

        let cli = Cli::parse_from(vec!["pulse-digest", "--config", path_arg, "config"]);
        let config = load_config(&cli);
        let err = execute(&cli, config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load config file"));
    }
}
