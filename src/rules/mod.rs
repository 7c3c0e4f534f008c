//! Pull request rules
//!
//! A rule pairs a list of conditions with the actions to run once they all
//! hold. Matching is pure: the caller gathers a [`PullRequestSnapshot`] up
//! front and [`match_rules`] only reads it, which keeps the matcher easy to
//! unit test.

mod actions;
mod condition;

pub use actions::{
    ActionConfig, ActionKind, ActionRegistry, BackportAction, CloseAction, Coercer,
    CommentAction, DeleteHeadBranchAction, LabelAction, MergeAction, MergeMethod, RebaseFallback,
};
pub use condition::Condition;

use crate::error::{Error, Result};
use crate::types::PullRequestSnapshot;
use crate::value::{Mapping, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Attributes describing what a pull request is, rather than where it stands.
///
/// A failing condition on one of these disqualifies the rule instead of
/// leaving it pending.
pub const BASE_ATTRIBUTES: &[&str] = &[
    "head",
    "base",
    "author",
    "merged_by",
    "body",
    "title",
    "files",
];

/// A single pull request rule
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Display name (not necessarily unique)
    pub name: String,
    /// Conditions, in declared order
    pub conditions: Vec<Condition>,
    /// Actions keyed by kind name
    pub actions: BTreeMap<String, ActionConfig>,
}

/// Raw rule as written in the policy document
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    name: String,
    conditions: Vec<String>,
    actions: BTreeMap<String, Value>,
}

impl Rule {
    /// Build a rule from condition expressions and pre-validated actions
    pub fn new(
        name: impl Into<String>,
        conditions: &[&str],
        actions: BTreeMap<String, ActionConfig>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            conditions: conditions
                .iter()
                .map(|c| Condition::compile(c))
                .collect::<Result<_>>()?,
            actions,
        })
    }

    fn to_value(&self) -> Value {
        let mut rule = Value::mapping();
        rule.insert("name", self.name.as_str());
        rule.insert(
            "conditions",
            self.conditions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        );
        let actions: Mapping = self
            .actions
            .iter()
            .map(|(name, action)| (name.clone(), action.config.clone()))
            .collect();
        rule.insert("actions", actions);
        rule
    }
}

/// Ordered rule list. Earlier rules take priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullRequestRules {
    rules: Vec<Rule>,
}

/// A rule that currently applies to a pull request
#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    /// The matching rule
    pub rule: &'a Rule,
    /// Conditions not yet satisfied, in declared order
    pub pending: Vec<&'a Condition>,
}

impl RuleMatch<'_> {
    /// Whether every condition holds and the actions can run now
    pub fn is_ready(&self) -> bool {
        self.pending.is_empty()
    }
}

impl PullRequestRules {
    /// Wrap an already-built rule list
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Validate the raw `pull_request_rules` list.
    ///
    /// Any bad condition or action rejects the whole list.
    pub fn from_value(raw: &Value, registry: &ActionRegistry) -> Result<Self> {
        let yaml = serde_yaml::to_value(raw).map_err(|e| Error::InvalidPolicy(e.to_string()))?;
        let raw_rules: Vec<RawRule> = serde_yaml::from_value(yaml)
            .map_err(|e| Error::InvalidPolicy(format!("pull_request_rules: {e}")))?;

        let rules = raw_rules
            .into_iter()
            .map(|raw| -> Result<Rule> {
                let conditions = raw
                    .conditions
                    .iter()
                    .map(|c| Condition::compile(c))
                    .collect::<Result<Vec<_>>>()
                    .map_err(|e| match e {
                        Error::InvalidCondition {
                            expression,
                            message,
                        } => Error::InvalidPolicy(format!(
                            "Invalid condition '{expression}'. {message}"
                        )),
                        other => other,
                    })?;
                let actions = raw
                    .actions
                    .iter()
                    .map(|(kind, config)| {
                        registry
                            .coerce(kind, config)
                            .map(|action| (kind.clone(), action))
                            .map_err(|e| Error::InvalidPolicy(format!("rule '{}': {e}", raw.name)))
                    })
                    .collect::<Result<_>>()?;
                Ok(Rule {
                    name: raw.name,
                    conditions,
                    actions,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self { rules })
    }

    /// The rules, in priority order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serializable projection: `{rules: [{name, conditions, actions}]}`
    pub fn to_value(&self) -> Value {
        let mut root = Value::mapping();
        root.insert(
            "rules",
            Value::Sequence(self.rules.iter().map(Rule::to_value).collect()),
        );
        root
    }

    /// Rules that currently apply to `pull_request`
    pub fn matching<'a>(&'a self, pull_request: &PullRequestSnapshot) -> Vec<RuleMatch<'a>> {
        match_rules(&self.rules, pull_request)
    }
}

/// Compute which rules apply to a pull request.
///
/// Rules are visited in order. A failing condition on a base attribute drops
/// the rule; any other failing condition is recorded as pending. Returned
/// matches keep the input order.
pub fn match_rules<'a>(rules: &'a [Rule], pull_request: &PullRequestSnapshot) -> Vec<RuleMatch<'a>> {
    let attributes = pull_request.attributes();
    let mut matches = Vec::new();

    'rules: for rule in rules {
        let mut pending = Vec::new();
        for condition in &rule.conditions {
            if condition.matches(attributes) {
                continue;
            }
            if BASE_ATTRIBUTES.contains(&condition.attribute_name()) {
                debug!(rule = %rule.name, %condition, "rule disqualified");
                continue 'rules;
            }
            pending.push(condition);
        }
        matches.push(RuleMatch { rule, pending });
    }

    matches
}
