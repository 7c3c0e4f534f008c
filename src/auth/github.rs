//! GitHub token discovery

use super::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// A resolved GitHub token
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// The token
    pub token: String,
    /// Where it came from
    pub source: AuthSource,
}

/// First non-empty token among `GITHUB_TOKEN` and `GH_TOKEN`
pub fn token_from_env() -> Option<String> {
    TOKEN_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Find a GitHub token: environment first, then `gh auth token`.
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(token) = token_from_env() {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd.output().await.map_err(|e| {
        Error::Auth(format!(
            "no GITHUB_TOKEN or GH_TOKEN set and gh CLI unavailable: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(Error::Auth(format!(
            "gh auth token failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("gh auth token returned no token".to_string()));
    }

    debug!("using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}
