use crate::error::{DigestError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// A GitHub repository identifier (`owner/repo`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    /// Repository owner/organization
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoName {
    /// Parse `owner/repo` or a GitHub remote URL
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        // Accepted forms:
        // - owner/repo
        // - https://github.com/owner/repo(.git)
        // - git@github.com:owner/repo(.git)
        // - git://github.com/owner/repo(.git)
        let patterns = [
            r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$",
            r"^https://github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$",
            r"^git@github\.com:([^/]+)/([^/]+?)(?:\.git)?$",
            r"^git://github\.com/([^/]+)/([^/]+?)(?:\.git)?$",
        ];

        for pattern in patterns {
            let re = Regex::new(pattern)?;
            if let Some(captures) = re.captures(input) {
                let owner = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                let repo = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
                if !owner.is_empty() && !repo.is_empty() {
                    return Ok(Self {
                        owner: owner.to_string(),
                        repo: repo.to_string(),
                    });
                }
            }
        }

        Err(DigestError::InvalidRepository(input.to_string()))
    }

    /// Parse a comma-separated list, skipping blank entries.
    ///
    /// Entries that do not parse are kept aside with their error instead of
    /// failing the whole list.
    pub fn parse_list(input: &str) -> RepoList {
        let mut list = RepoList::default();
        for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match Self::parse(entry) {
                Ok(name) => list.valid.push(name),
                Err(e) => list.invalid.push(InvalidEntry {
                    entry: entry.to_string(),
                    error: e.to_string(),
                }),
            }
        }
        list
    }
}

/// Outcome of parsing a repository list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoList {
    pub valid: Vec<RepoName>,
    pub invalid: Vec<InvalidEntry>,
}

/// A list entry that is not a repository identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    pub entry: String,
    pub error: String,
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoName {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let name = RepoName::parse(" BlueprintLabs/TagPilot ").unwrap();
        assert_eq!(name.owner, "BlueprintLabs");
        assert_eq!(name.repo, "TagPilot");
        assert_eq!(name.to_string(), "BlueprintLabs/TagPilot");
    }

    #[test]
    fn test_parse_https_url() {
        let name = RepoName::parse("https://github.com/rust-lang/rust.git").unwrap();
        assert_eq!(name.to_string(), "rust-lang/rust");

        let name = RepoName::parse("https://github.com/rust-lang/rust").unwrap();
        assert_eq!(name.to_string(), "rust-lang/rust");
    }

    #[test]
    fn test_parse_ssh_and_git_protocol() {
        let name = RepoName::parse("git@github.com:rust-lang/rust.git").unwrap();
        assert_eq!(name.to_string(), "rust-lang/rust");

        let name = RepoName::parse("git://github.com/rust-lang/rust.git").unwrap();
        assert_eq!(name.to_string(), "rust-lang/rust");
    }

    #[test]
    fn test_parse_dotted_repo_name() {
        let name = RepoName::parse("owner/site.github.io").unwrap();
        assert_eq!(name.repo, "site.github.io");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(RepoName::parse("https://gitlab.com/owner/repo").is_err());
        assert!(RepoName::parse("not a repo").is_err());
        assert!(RepoName::parse("").is_err());
        assert!(RepoName::parse("a/b/c").is_err());
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        let repos = RepoName::parse_list("a/one, ,b/two,");
        assert_eq!(repos.valid.len(), 2);
        assert_eq!(repos.valid[1].to_string(), "b/two");
        assert!(repos.invalid.is_empty());

        assert_eq!(RepoName::parse_list(" , "), RepoList::default());
    }

    #[test]
    fn test_parse_list_keeps_invalid_entries_aside() {
        let repos = RepoName::parse_list("octo/good, typo, https://gitlab.com/a/b");
        assert_eq!(repos.valid, vec![RepoName::parse("octo/good").unwrap()]);
        assert_eq!(
            repos.invalid,
            vec![
                InvalidEntry {
                    entry: "typo".to_string(),
                    error: "Invalid repository identifier: typo".to_string(),
                },
                InvalidEntry {
                    entry: "https://gitlab.com/a/b".to_string(),
                    error: "Invalid repository identifier: https://gitlab.com/a/b".to_string(),
                },
            ]
        );
    }
}
