//! Core types for pr-policy

use crate::error::{Error, Result};
use crate::value::{Mapping, Value};
use serde::{Deserialize, Serialize};
use url::Url;

/// A GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl Repository {
    /// Create a repository reference
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse `owner/repo`, an HTTPS URL, or an SSH remote
    /// (`git@host:owner/repo.git`).
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('/');
        let invalid = || Error::InvalidRepository(input.to_string());

        let path = if trimmed.contains("://") {
            let url = Url::parse(trimmed).map_err(|_| invalid())?;
            url.path().trim_matches('/').to_string()
        } else if let Some((_, path)) = trimmed.split_once(':').filter(|(h, _)| h.contains('@')) {
            path.to_string()
        } else {
            trimmed.to_string()
        };

        let path = path.strip_suffix(".git").unwrap_or(&path);
        match path.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(*owner, *repo))
            }
            _ => Err(invalid()),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Attribute values of one pull request at evaluation time
///
/// Attribute names are free-form (`author`, `label`, `approved-reviews-by`,
/// ...). Values may be scalars, lists or nested mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestSnapshot {
    attributes: Mapping,
}

impl PullRequestSnapshot {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Read an attribute
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The full attribute bag
    pub const fn attributes(&self) -> &Mapping {
        &self.attributes
    }
}

impl From<Mapping> for PullRequestSnapshot {
    fn from(attributes: Mapping) -> Self {
        Self { attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_repo() {
        assert_eq!(Repository::parse("acme/widgets").unwrap(), Repository::new("acme", "widgets"));
    }

    #[test]
    fn test_parse_https_url() {
        let repo = Repository::parse("https://github.com/acme/widgets.git/").unwrap();
        assert_eq!(repo, Repository::new("acme", "widgets"));
    }

    #[test]
    fn test_parse_ssh_remote() {
        let repo = Repository::parse("git@github.com:acme/widgets.git").unwrap();
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["widgets", "a/b/c", "/widgets", "https://github.com/acme"] {
            assert!(
                matches!(Repository::parse(bad), Err(Error::InvalidRepository(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_snapshot_builder() {
        let pr = PullRequestSnapshot::new()
            .with("author", "alice")
            .with("label", vec!["lgtm"]);
        assert_eq!(pr.get("author"), Some(&Value::from("alice")));
        assert_eq!(pr.attributes().len(), 2);
    }
}
