use crate::config::Config;
use crate::error::{DigestError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Records a written digest in version control
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, path: &Path, message: &str) -> Result<()>;
}

/// Stages, commits and pushes with the `git` command line tool
pub struct GitPublisher {
    workdir: PathBuf,
    remote: String,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl GitPublisher {
    pub fn new(workdir: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: remote.into(),
            user_name: None,
            user_email: None,
        }
    }

    pub fn from_config(workdir: impl Into<PathBuf>, config: &Config) -> Self {
        let mut publisher = Self::new(workdir, config.git_remote.clone());
        publisher.user_name = config.git_user_name.clone();
        publisher.user_email = config.git_user_email.clone();
        publisher
    }

    /// Identity overrides passed as `-c` options
    fn identity_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(name) = &self.user_name {
            args.push("-c".to_string());
            args.push(format!("user.name={}", name));
        }
        if let Some(email) = &self.user_email {
            args.push("-c".to_string());
            args.push(format!("user.email={}", email));
        }
        args
    }

    async fn git(&self, step: &str, args: &[String]) -> Result<()> {
        debug!(?args, "Running git {}", step);

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| DigestError::git(step, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(DigestError::git(step, detail));
        }

        Ok(())
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, path: &Path, message: &str) -> Result<()> {
        let file = path.to_string_lossy().to_string();

        self.git("add", &["add".to_string(), "--".to_string(), file])
            .await?;

        let mut commit = self.identity_args();
        commit.extend(["commit".to_string(), "-m".to_string(), message.to_string()]);
        self.git("commit", &commit).await?;

        self.git(
            "push",
            &["push".to_string(), self.remote.clone(), "HEAD".to_string()],
        )
        .await?;

        info!(path = %path.display(), "Successfully committed and pushed digest");
        Ok(())
    }
}

/// Fill `{label}`, `{date}` and `{time}` in the commit message format
pub fn commit_message(format: &str, label: &str, at: &DateTime<Utc>) -> String {
    format
        .replace("{label}", label)
        .replace("{date}", &at.format("%Y-%m-%d").to_string())
        .replace("{time}", &at.format("%H:%M").to_string())
}
