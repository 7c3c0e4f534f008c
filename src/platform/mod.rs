//! Source-control host access
//!
//! The policy core only needs two things from the host: the raw bytes of the
//! policy document at a ref, and a snapshot of a pull request's attributes.

mod github;

pub use github::{DEFAULT_POLICY_PATH, GitHubService, latest_reviews};

use crate::error::Result;
use crate::types::{PullRequestSnapshot, Repository};
use async_trait::async_trait;

/// Where policy documents come from
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Raw bytes of the policy document at `git_ref` (default branch when
    /// `None`).
    ///
    /// Fails with [`Error::NoRules`](crate::error::Error::NoRules) when the
    /// document does not exist.
    async fn fetch_policy(&self, repository: &Repository, git_ref: Option<&str>)
    -> Result<Vec<u8>>;
}

/// Where pull request attributes come from
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Attribute snapshot of pull request `number`
    async fn pull_request_snapshot(
        &self,
        repository: &Repository,
        number: u64,
    ) -> Result<PullRequestSnapshot>;
}
