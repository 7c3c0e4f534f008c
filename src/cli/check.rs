//! Check command - match pull request rules against a pull request

use crate::cli::{CommandContext, print_matches};
use anyhow::{Context, bail};
use pr_policy::platform::PullRequestSource;
use pr_policy::policy::PolicyDocument;
use pr_policy::types::{PullRequestSnapshot, Repository};
use std::path::{Path, PathBuf};

/// Where the pull request comes from
#[derive(Debug, Clone)]
pub enum PullRequestInput {
    /// JSON or YAML attribute file
    File(PathBuf),
    /// Live pull request on GitHub
    Remote {
        /// Repository
        repository: Repository,
        /// Pull request number
        number: u64,
    },
}

/// Read a snapshot file: JSON for `.json`, YAML otherwise
pub fn read_snapshot(path: &Path) -> anyhow::Result<PullRequestSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(anyhow::Error::from)
    } else {
        serde_yaml::from_str(&content).map_err(anyhow::Error::from)
    };
    parsed.with_context(|| format!("failed to parse pull request snapshot {}", path.display()))
}

/// Run the check command
pub async fn run_check(
    ctx: &CommandContext,
    file: &Path,
    input: PullRequestInput,
) -> anyhow::Result<()> {
    let PolicyDocument::PullRequestRules(rules) = ctx.read_policy(file)? else {
        bail!(
            "{} has no pull_request_rules; use `resolve` for branch policies",
            file.display()
        );
    };

    let snapshot = match input {
        PullRequestInput::File(path) => read_snapshot(&path)?,
        PullRequestInput::Remote { repository, number } => {
            ctx.github()
                .await?
                .pull_request_snapshot(&repository, number)
                .await?
        }
    };

    print_matches(&rules.matching(&snapshot));
    Ok(())
}
