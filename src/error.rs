use thiserror::Error;

/// Main error type for pulse-digest
#[derive(Error, Debug)]
pub enum DigestError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the GitHub API
    #[error("GitHub API error ({status}): {message}")]
    GitHubApi { status: u16, message: String },

    /// Gemini API errors
    #[error("Gemini API error: {0}")]
    Gemini(String),

    /// Repository identifier that is not `owner/repo`
    #[error("Invalid repository identifier: {0}")]
    InvalidRepository(String),

    /// A git subprocess exited unsuccessfully
    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },

    /// Regex errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for pulse-digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

impl DigestError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Gemini API error
    pub fn gemini<S: Into<String>>(msg: S) -> Self {
        Self::Gemini(msg.into())
    }

    /// Create a new git command error
    pub fn git<C: Into<String>, D: Into<String>>(command: C, detail: D) -> Self {
        Self::Git {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_api_error_display() {
        let err = DigestError::GitHubApi {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "GitHub API error (404): Not Found");
    }

    #[test]
    fn test_git_error_display() {
        let err = DigestError::git("push", "rejected");
        assert_eq!(err.to_string(), "git push failed: rejected");
    }
}
