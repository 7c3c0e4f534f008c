//! Configuration file handling
//!
//! Settings live in `<config dir>/pr-policy/config.toml`. A missing file
//! means defaults; environment variables override whatever the file says.

use crate::error::{Error, Result};
use crate::platform::DEFAULT_POLICY_PATH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config dir.
const CONFIG_DIR: &str = "pr-policy";

/// Filename for the configuration.
const CONFIG_FILE: &str = "config.toml";

/// Env var overriding [`Config::host`]
pub const ENV_HOST: &str = "PR_POLICY_HOST";
/// Env var overriding [`Config::policy_path`]
pub const ENV_POLICY_PATH: &str = "PR_POLICY_PATH";
/// Env var overriding [`Config::api_url`]
pub const ENV_API_URL: &str = "PR_POLICY_API_URL";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// GitHub Enterprise host (None for github.com)
    pub host: Option<String>,
    /// Explicit API base URL; wins over `host`
    pub api_url: Option<String>,
    /// Location of the policy document inside repositories
    pub policy_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            api_url: None,
            policy_path: DEFAULT_POLICY_PATH.to_string(),
        }
    }
}

impl Config {
    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(host) = get(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(api_url) = get(ENV_API_URL) {
            self.api_url = Some(api_url);
        }
        if let Some(path) = get(ENV_POLICY_PATH) {
            self.policy_path = path;
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }
}

/// Default configuration file location, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from disk.
///
/// Returns the default `Config` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}
