//! Show command - fetch and validate a repository's policy from GitHub

use crate::cli::style::{Stylize, check};
use crate::cli::{CommandContext, print_branch_policy};
use anstream::{print, println};
use pr_policy::policy::{PolicyDocument, get_branch_rule};
use pr_policy::types::Repository;

/// Run the show command
pub async fn run_show(
    ctx: &CommandContext,
    repository: &Repository,
    git_ref: Option<&str>,
    branch: Option<&str>,
) -> anyhow::Result<()> {
    let github = ctx.github().await?;
    let document = ctx.resolver.load(&github, repository, git_ref).await?;

    println!(
        "{} {} {}",
        check(),
        github.policy_path().accent(),
        "is valid".success()
    );
    println!();

    match &document {
        PolicyDocument::PullRequestRules(rules) => {
            println!("{} ({})", "Pull request rules".emphasis(), rules.len());
            print!("{}", serde_yaml::to_string(&rules.to_value())?);
        }
        PolicyDocument::Branches(policies) => {
            let patterns: Vec<&str> = policies.branches.keys().map(String::as_str).collect();
            println!(
                "{} {}",
                "Branch patterns:".emphasis(),
                if patterns.is_empty() {
                    "(none)".muted()
                } else {
                    patterns.join(", ")
                }
            );
            if let Some(branch) = branch {
                println!();
                print_branch_policy(branch, get_branch_rule(&document, branch)?.as_ref())?;
            }
        }
    }
    Ok(())
}
