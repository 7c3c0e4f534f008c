//! pr-policy: branch policy resolution and pull request rule matching
//!
//! Given a repository's policy document, this crate works out which policy
//! applies to a target branch (a default layered with branch overrides) and
//! which pull request rules currently apply to a pull request.
//!
//! # Modules
//!
//! - [`rules`] - Condition compiler, rule matching, action registry
//! - [`policy`] - Policy documents, validation, branch resolution
//! - [`value`] - Generic policy tree with deep merge
//! - [`platform`] - GitHub access (policy fetch, pull request snapshots)
//! - [`auth`] - GitHub token discovery
//! - [`config`] - Configuration file handling

pub mod auth;
pub mod config;
pub mod error;
pub mod platform;
pub mod policy;
pub mod rules;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use policy::{EffectivePolicy, PolicyDocument, PolicyResolver, get_branch_rule};
pub use rules::{Condition, PullRequestRules, Rule, RuleMatch, match_rules};
pub use types::{PullRequestSnapshot, Repository};
pub use value::Value;
