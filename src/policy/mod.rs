//! Policy documents
//!
//! A repository policy comes in one of two shapes:
//!
//! - branch policies: `{default: Policy|null, branches: {pattern: Policy|null}}`
//! - rule list: `{pull_request_rules: [Rule, ...]}`
//!
//! Exactly one shape must be present. Within the branch shape, a `null`
//! policy disables automation for its scope, while a missing key simply
//! falls through to the next layer.

mod resolve;
mod schema;

pub use resolve::{
    baseline, build_branch_rule, default_policy, merge_default, merge_override,
    select_branch_pattern,
};
pub use schema::{
    BranchPolicy, MAX_APPROVING_REVIEWS, MIN_APPROVING_REVIEWS, MergeStrategy,
    PartialBranchPolicy, PartialMergeStrategy, PartialProtection, PartialRequiredReviews,
    Protection, RequiredReviews, RequiredStatusChecks, Restrictions, StrategyFallback,
    StrategyMethod,
};

use crate::error::{Error, Result};
use crate::platform::PolicySource;
use crate::rules::{ActionRegistry, PullRequestRules};
use crate::types::Repository;
use crate::value::{Mapping, Value};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info};

const DEFAULT_KEY: &str = "default";
const BRANCHES_KEY: &str = "branches";
const RULES_KEY: &str = "pull_request_rules";

/// A policy for one scope (the default, or one branch pattern)
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// Written as `null`: automation is off for this scope
    Disabled,
    /// Partial policy to merge over the layer below
    Policy(Value),
}

/// One entry under `branches`
#[derive(Debug, Clone)]
pub struct BranchOverride {
    /// Compiled pattern, when the key starts with `^`
    pub regex: Option<Regex>,
    /// What the entry says for matching branches
    pub scope: Scope,
}

/// Branch-policy shaped document
#[derive(Debug, Clone, Default)]
pub struct BranchPolicies {
    /// `default` entry; `None` when the key is absent
    pub default: Option<Scope>,
    /// `branches` entries, keyed (and therefore ordered) by pattern
    pub branches: BTreeMap<String, BranchOverride>,
}

impl BranchPolicies {
    fn from_mapping(root: &Mapping) -> Result<Self> {
        let default = root
            .get(DEFAULT_KEY)
            .map(|v| Scope::from_value(v, DEFAULT_KEY))
            .transpose()?;

        let branches = match root.get(BRANCHES_KEY) {
            None => BTreeMap::new(),
            Some(Value::Mapping(entries)) => entries
                .iter()
                .map(|(pattern, v)| -> Result<(String, BranchOverride)> {
                    // Anchored at the start of the branch name only, so an
                    // alternation cannot match in the middle of a name.
                    let regex = if pattern.starts_with('^') {
                        Some(Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                            Error::InvalidPolicy(format!("invalid branch pattern '{pattern}': {e}"))
                        })?)
                    } else {
                        None
                    };
                    let scope = Scope::from_value(v, &format!("{BRANCHES_KEY}['{pattern}']"))?;
                    Ok((pattern.clone(), BranchOverride { regex, scope }))
                })
                .collect::<Result<_>>()?,
            Some(_) => {
                return Err(Error::InvalidPolicy(format!(
                    "'{BRANCHES_KEY}' must be a mapping of branch pattern to policy"
                )));
            }
        };

        Ok(Self { default, branches })
    }
}

impl Scope {
    fn from_value(value: &Value, location: &str) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::Disabled);
        }
        let partial: PartialBranchPolicy = from_tree(value)
            .map_err(|e| Error::InvalidPolicy(format!("{location}: {e}")))?;
        partial
            .check_ranges()
            .map_err(|e| Error::InvalidPolicy(format!("{location}: {e}")))?;
        let normalized = with_user_defaults(value, &partial)
            .map_err(|e| Error::InvalidPolicy(format!("{location}: {e}")))?;
        Ok(Self::Policy(normalized))
    }
}

/// Fill the defaults of the `required_status_checks` and `restrictions`
/// blocks a user wrote, so the merge replaces the layer below with a complete
/// block instead of inheriting its values.
fn with_user_defaults(
    value: &Value,
    partial: &PartialBranchPolicy,
) -> std::result::Result<Value, String> {
    let Some(protection) = &partial.protection else {
        return Ok(value.clone());
    };

    let mut filled = Value::mapping();
    if let Some(checks) = &protection.required_status_checks {
        filled.insert("required_status_checks", to_tree(checks)?);
    }
    if let Some(restrictions) = &protection.restrictions {
        filled.insert("restrictions", to_tree(restrictions)?);
    }

    let mut overlay = Value::mapping();
    overlay.insert("protection", filled);
    let mut normalized = value.clone();
    normalized.deep_merge(&overlay);
    Ok(normalized)
}

/// A validated policy document
#[derive(Debug, Clone)]
pub enum PolicyDocument {
    /// `default` / `branches` shape
    Branches(BranchPolicies),
    /// `pull_request_rules` shape
    PullRequestRules(PullRequestRules),
}

/// What applies to a branch once a document has been resolved
#[derive(Debug, Clone)]
pub enum EffectivePolicy {
    /// Merged and validated branch policy
    Branch(BranchPolicy),
    /// Pull request rules to match against each pull request
    PullRequestRules(PullRequestRules),
}

fn from_tree<T: serde::de::DeserializeOwned>(value: &Value) -> std::result::Result<T, String> {
    let yaml = serde_yaml::to_value(value).map_err(|e| e.to_string())?;
    serde_yaml::from_value(yaml).map_err(|e| e.to_string())
}

fn to_tree<T: serde::Serialize>(typed: &T) -> std::result::Result<Value, String> {
    let yaml = serde_yaml::to_value(typed).map_err(|e| e.to_string())?;
    serde_yaml::from_value(yaml).map_err(|e| e.to_string())
}

/// Parse raw policy bytes into a tree.
///
/// Syntax errors report `position (line:column)` when the parser knows it.
pub fn parse_policy(content: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(content)
        .map_err(|e| Error::InvalidPolicy(format!("policy is not valid UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|e| {
        Error::InvalidPolicy(e.location().map_or_else(
            || e.to_string(),
            |loc| format!("position ({}:{})", loc.line(), loc.column()),
        ))
    })
}

/// Check a parsed user document and work out which shape it has
pub fn validate_user_policy(raw: &Value, registry: &ActionRegistry) -> Result<PolicyDocument> {
    let Value::Mapping(root) = raw else {
        return Err(Error::InvalidPolicy(
            "expected a mapping at the top level".to_string(),
        ));
    };

    if let Some(key) = root
        .keys()
        .find(|k| ![DEFAULT_KEY, BRANCHES_KEY, RULES_KEY].contains(&k.as_str()))
    {
        return Err(Error::InvalidPolicy(format!(
            "extra keys not allowed @ data['{key}']"
        )));
    }

    let legacy = root.contains_key(DEFAULT_KEY) || root.contains_key(BRANCHES_KEY);
    match (legacy, root.get(RULES_KEY)) {
        (true, Some(_)) => Err(Error::InvalidPolicy(format!(
            "'{RULES_KEY}' cannot be combined with '{DEFAULT_KEY}' or '{BRANCHES_KEY}'"
        ))),
        (false, None) => Err(Error::InvalidPolicy(format!(
            "expected '{RULES_KEY}' or '{DEFAULT_KEY}'/'{BRANCHES_KEY}'"
        ))),
        (false, Some(rules)) => {
            PullRequestRules::from_value(rules, registry).map(PolicyDocument::PullRequestRules)
        }
        (true, None) => BranchPolicies::from_mapping(root).map(PolicyDocument::Branches),
    }
}

/// Check a merged policy with every field required.
///
/// Failure here means the bundled default left something unset.
pub fn validate_effective_policy(merged: &Value) -> Result<BranchPolicy> {
    let policy: BranchPolicy = from_tree(merged).map_err(Error::IncompletePolicy)?;
    policy.check_ranges().map_err(Error::IncompletePolicy)?;
    Ok(policy)
}

/// Effective policy for `branch`, or `None` if automation is disabled there.
///
/// Rule-list documents carry no branch settings, so they resolve to the
/// bundled default.
///
/// A merged policy that still lacks a required key fails with
/// [`Error::IncompletePolicy`], not [`Error::InvalidPolicy`]. Callers
/// reporting policy problems should handle both.
pub fn get_branch_rule(document: &PolicyDocument, branch: &str) -> Result<Option<BranchPolicy>> {
    let empty = BranchPolicies::default();
    let policies = match document {
        PolicyDocument::Branches(policies) => policies,
        PolicyDocument::PullRequestRules(_) => &empty,
    };

    let Some(merged) = build_branch_rule(policies, branch) else {
        debug!(branch, "automation disabled for branch");
        return Ok(None);
    };

    let rule = validate_effective_policy(&merged)?;
    info!(branch, rule = ?rule, "resolved branch policy");
    Ok(Some(rule))
}

/// Parses, validates and resolves policy documents.
///
/// Holds the action registry used to validate rule actions.
#[derive(Debug, Clone)]
pub struct PolicyResolver {
    registry: ActionRegistry,
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(ActionRegistry::builtin())
    }
}

impl PolicyResolver {
    /// Resolver validating actions against `registry`
    pub const fn new(registry: ActionRegistry) -> Self {
        Self { registry }
    }

    /// The action registry in use
    pub const fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Parse and validate raw policy bytes
    pub fn parse(&self, content: &[u8]) -> Result<PolicyDocument> {
        validate_user_policy(&parse_policy(content)?, &self.registry)
    }

    /// Fetch and validate the policy document at `git_ref`
    pub async fn load(
        &self,
        source: &dyn PolicySource,
        repository: &Repository,
        git_ref: Option<&str>,
    ) -> Result<PolicyDocument> {
        debug!(%repository, git_ref, "loading policy");
        let content = source.fetch_policy(repository, git_ref).await?;
        self.parse(&content)
    }

    /// Fetch, validate and resolve the policy that applies to `branch`.
    ///
    /// The document is read from `branch` itself.
    pub async fn effective_policy(
        &self,
        source: &dyn PolicySource,
        repository: &Repository,
        branch: &str,
    ) -> Result<Option<EffectivePolicy>> {
        match self.load(source, repository, Some(branch)).await? {
            PolicyDocument::PullRequestRules(rules) => {
                Ok(Some(EffectivePolicy::PullRequestRules(rules)))
            }
            document => Ok(get_branch_rule(&document, branch)?.map(EffectivePolicy::Branch)),
        }
    }
}
