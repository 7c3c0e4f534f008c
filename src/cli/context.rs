//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by resolve, check, and show commands.

use anyhow::Context;
use pr_policy::auth::get_github_auth;
use pr_policy::config::{Config, default_config_path, load_config};
use pr_policy::error::Result;
use pr_policy::platform::GitHubService;
use pr_policy::policy::{PolicyDocument, PolicyResolver};
use std::path::Path;
use tracing::debug;

/// Shared context for CLI commands
///
/// Holds the loaded configuration and the policy resolver. The GitHub
/// service is only built by commands that talk to GitHub, since it needs a
/// token.
pub struct CommandContext {
    /// Effective configuration (file, then env, then flags)
    pub config: Config,
    /// Resolver with the built-in action registry
    pub resolver: PolicyResolver,
}

impl CommandContext {
    /// Load configuration and apply overrides
    pub fn new(config_path: Option<&Path>, host: Option<&str>) -> Result<Self> {
        let mut config = match config_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                load_config(&path)?
            }
            None => Config::default(),
        }
        .with_process_env();

        if let Some(h) = host {
            config.host = Some(h.to_string());
        }

        Ok(Self {
            config,
            resolver: PolicyResolver::default(),
        })
    }

    /// Parse and validate a local policy file
    pub fn read_policy(&self, path: &Path) -> anyhow::Result<PolicyDocument> {
        let content =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.resolver.parse(&content)?)
    }

    /// Authenticate and build the GitHub service
    pub async fn github(&self) -> Result<GitHubService> {
        let auth = get_github_auth(self.config.host.as_deref()).await?;
        debug!(source = ?auth.source, "authenticated");

        let service = match &self.config.api_url {
            Some(url) => GitHubService::with_api_url(&auth.token, url)?,
            None => GitHubService::new(&auth.token, self.config.host.as_deref())?,
        };
        Ok(service.with_policy_path(self.config.policy_path.clone()))
    }
}
