//! Authentication for GitHub
//!
//! Supports environment variables and CLI-based auth (gh).

mod github;

pub use github::{GitHubAuthConfig, get_github_auth, token_from_env};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh)
    Cli,
    /// Token from environment variable
    EnvVar,
}
