//! Error types for pr-policy

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, resolving or matching policies
#[derive(Debug, Error)]
pub enum Error {
    /// No policy document exists at the requested ref
    #[error("policy file is missing")]
    NoRules,

    /// The policy document failed to parse or validate
    #[error("policy is invalid: {0}")]
    InvalidPolicy(String),

    /// A condition expression could not be compiled
    #[error("invalid condition '{expression}': {message}")]
    InvalidCondition {
        /// The offending expression
        expression: String,
        /// Parser diagnostic
        message: String,
    },

    /// The merged policy is missing required fields.
    ///
    /// User documents are merged over the bundled default, so this points at
    /// an incomplete default rather than at user input.
    #[error("merged policy is incomplete: {0}")]
    IncompletePolicy(String),

    /// GitHub API or transport failure
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// No usable credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Configuration file problem
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository identifier could not be parsed
    #[error("invalid repository: {0}")]
    InvalidRepository(String),

    /// I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

impl Error {
    /// Whether this error was caused by the repository's policy content
    /// (as opposed to transport, auth, or internal failures).
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NoRules | Self::InvalidPolicy(_) | Self::InvalidCondition { .. }
        )
    }
}
