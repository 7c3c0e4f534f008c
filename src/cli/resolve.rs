//! Resolve command - effective branch policy from a local file

use crate::cli::{CommandContext, print_branch_policy};
use pr_policy::policy::get_branch_rule;
use std::path::Path;

/// Run the resolve command
pub fn run_resolve(ctx: &CommandContext, file: &Path, branch: &str) -> anyhow::Result<()> {
    let document = ctx.read_policy(file)?;
    let policy = get_branch_rule(&document, branch)?;
    print_branch_policy(branch, policy.as_ref())
}
