//! CLI commands

pub mod check;
mod context;
pub mod resolve;
pub mod show;
pub mod style;

pub use context::CommandContext;

use crate::cli::style::{Stylize, arrow, check, pending};
use anstream::{print, println};
use pr_policy::policy::BranchPolicy;
use pr_policy::rules::RuleMatch;

/// Print an effective branch policy, or note that automation is off
pub(crate) fn print_branch_policy(branch: &str, policy: Option<&BranchPolicy>) -> anyhow::Result<()> {
    match policy {
        Some(policy) => {
            println!("{} {}", "Effective policy for".emphasis(), branch.accent());
            println!();
            print!("{}", serde_yaml::to_string(policy)?);
        }
        None => {
            println!(
                "{} {}",
                "Automation disabled for branch".muted(),
                branch.accent()
            );
        }
    }
    Ok(())
}

/// Print rule matches, ready ones marked with a check
pub(crate) fn print_matches(matches: &[RuleMatch<'_>]) {
    if matches.is_empty() {
        println!("{}", "No rules match this pull request".muted());
        return;
    }

    for m in matches {
        if m.is_ready() {
            println!("{} {}", check(), m.rule.name.emphasis());
        } else {
            println!(
                "{} {} {}",
                pending(),
                m.rule.name.emphasis(),
                "(waiting)".warning()
            );
            for condition in &m.pending {
                println!("    {} {}", arrow(), condition.accent());
            }
        }
        let actions: Vec<&str> = m.rule.actions.keys().map(String::as_str).collect();
        if !actions.is_empty() {
            println!("    {} {}", "actions:".muted(), actions.join(", "));
        }
    }
}
