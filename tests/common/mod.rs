//! Shared test helpers

#![allow(dead_code)]

mod mock_source;

pub use mock_source::MockPolicySource;

use pr_policy::policy::{BranchPolicies, PolicyDocument, PolicyResolver};
use pr_policy::rules::PullRequestRules;
use pr_policy::value::Value;

/// Parse a YAML snippet into a tree
pub fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).expect("test YAML should parse")
}

/// Parse and validate a policy document
pub fn document(s: &str) -> PolicyDocument {
    PolicyResolver::default()
        .parse(s.as_bytes())
        .expect("test policy should validate")
}

/// Parse a branch-policy document
pub fn branch_policies(s: &str) -> BranchPolicies {
    match document(s) {
        PolicyDocument::Branches(policies) => policies,
        PolicyDocument::PullRequestRules(_) => panic!("expected a branch policy document"),
    }
}

/// Parse a rule-list document
pub fn pull_request_rules(s: &str) -> PullRequestRules {
    match document(s) {
        PolicyDocument::PullRequestRules(rules) => rules,
        PolicyDocument::Branches(_) => panic!("expected a pull_request_rules document"),
    }
}
