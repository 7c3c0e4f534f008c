//! Branch policy resolution
//!
//! Picks the branch override that applies to a branch and layers it over the
//! repository default, which is itself layered over the bundled default.

use super::{BranchOverride, BranchPolicies, Scope};
use crate::value::Value;
use std::sync::LazyLock;
use tracing::debug;

static DEFAULT_POLICY: LazyLock<Value> = LazyLock::new(|| {
    serde_yaml::from_str(include_str!("../../data/default_policy.yml"))
        .expect("bundled default policy is valid YAML")
});

/// Fresh copy of the bundled default policy
pub fn default_policy() -> Value {
    DEFAULT_POLICY.clone()
}

/// Find the branch override that applies to `branch`.
///
/// Patterns are tried in sorted order and the first hit wins. A pattern
/// starting with `^` is a regular expression matched at the start of the
/// branch name; anything else must equal the branch name exactly.
pub fn select_branch_pattern<'a>(
    policies: &'a BranchPolicies,
    branch: &str,
) -> Option<(&'a str, &'a BranchOverride)> {
    policies
        .branches
        .iter()
        .find(|(pattern, entry)| {
            entry
                .regex
                .as_ref()
                .map_or(pattern.as_str() == branch, |re| re.is_match(branch))
        })
        .map(|(pattern, entry)| (pattern.as_str(), entry))
}

/// Bundled default with the repository default merged on top.
///
/// A disabled repository default contributes nothing here.
pub fn baseline(policies: &BranchPolicies) -> Value {
    let mut base = default_policy();
    if let Some(Scope::Policy(default)) = &policies.default {
        base.deep_merge(default);
    }
    base
}

/// Policy for branches without an override, or `None` when the repository
/// default is explicitly disabled.
pub fn merge_default(policies: &BranchPolicies) -> Option<Value> {
    match policies.default {
        Some(Scope::Disabled) => None,
        _ => Some(baseline(policies)),
    }
}

/// Layer an override onto a base policy. The override is only read.
pub fn merge_override(mut base: Value, overrides: &Value) -> Value {
    base.deep_merge(overrides);
    base
}

/// Merged, not yet validated, policy for `branch`.
///
/// `None` means automation is disabled for the branch.
pub fn build_branch_rule(policies: &BranchPolicies, branch: &str) -> Option<Value> {
    if let Some((pattern, entry)) = select_branch_pattern(policies, branch) {
        debug!(branch, pattern, "branch override selected");
        return match &entry.scope {
            Scope::Disabled => None,
            Scope::Policy(overrides) => Some(merge_override(baseline(policies), overrides)),
        };
    }
    merge_default(policies)
}
