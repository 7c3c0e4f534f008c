//! Branch policy schema
//!
//! [`BranchPolicy`] is the effective, fully-populated form: every key must be
//! present, even those whose value may be `null`. [`PartialBranchPolicy`] is
//! what users write: any key may be left out, but what is there must be well
//! typed.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Smallest accepted `required_approving_review_count`
pub const MIN_APPROVING_REVIEWS: u32 = 1;
/// Largest accepted `required_approving_review_count`
pub const MAX_APPROVING_REVIEWS: u32 = 6;

/// Deserialize a nullable field without making it optional.
///
/// Fields using `deserialize_with` and no `default` are required by serde,
/// so the key must be written even when its value is `null`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Deserialize an optional field that must not be `null` when present
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Effective policy for one branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchPolicy {
    /// Branch protection settings pushed to GitHub
    pub protection: Protection,
    /// Label required before automation acts, if any
    #[serde(deserialize_with = "nullable")]
    pub enabling_label: Option<String>,
    /// Label that turns automation off for a pull request
    pub disabling_label: String,
    /// Files whose modification turns automation off
    pub disabling_files: Vec<String>,
    /// How pull requests get merged
    pub merge_strategy: MergeStrategy,
    /// Label to target-branch mapping for automatic backports
    #[serde(deserialize_with = "nullable")]
    pub automated_backport_labels: Option<BTreeMap<String, String>>,
}

impl BranchPolicy {
    /// Range checks serde cannot express
    pub fn check_ranges(&self) -> Result<(), String> {
        if let Some(reviews) = &self.protection.required_pull_request_reviews {
            check_review_count(Some(reviews.required_approving_review_count))?;
        }
        Ok(())
    }
}

fn check_review_count(count: Option<u32>) -> Result<(), String> {
    match count {
        Some(n) if !(MIN_APPROVING_REVIEWS..=MAX_APPROVING_REVIEWS).contains(&n) => Err(format!(
            "required_approving_review_count must be between {MIN_APPROVING_REVIEWS} and {MAX_APPROVING_REVIEWS}, got {n}"
        )),
        _ => Ok(()),
    }
}

/// Branch protection block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Protection {
    /// Status checks that must pass
    #[serde(deserialize_with = "nullable")]
    pub required_status_checks: Option<RequiredStatusChecks>,
    /// Review requirements
    #[serde(deserialize_with = "nullable")]
    pub required_pull_request_reviews: Option<RequiredReviews>,
    /// Push restrictions
    #[serde(deserialize_with = "nullable")]
    pub restrictions: Option<Restrictions>,
    /// Whether admins are subject to protection
    #[serde(deserialize_with = "nullable")]
    pub enforce_admins: Option<bool>,
}

/// Required status checks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequiredStatusChecks {
    /// Require branches to be up to date
    #[serde(default)]
    pub strict: bool,
    /// Status contexts that must pass
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Pull request review requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequiredReviews {
    /// Dismiss approvals when new commits are pushed
    pub dismiss_stale_reviews: bool,
    /// Require review from code owners
    pub require_code_owner_reviews: bool,
    /// Number of approvals required
    pub required_approving_review_count: u32,
}

/// Push restrictions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Restrictions {
    /// Teams allowed to push
    #[serde(default)]
    pub teams: Vec<String>,
    /// Users allowed to push
    #[serde(default)]
    pub users: Vec<String>,
}

/// Merge method for the legacy branch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMethod {
    /// Rebase commits onto the base branch
    Rebase,
    /// Create a merge commit
    Merge,
    /// Squash all commits into one
    Squash,
}

/// What to do when a rebase merge is not possible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyFallback {
    /// Create a merge commit
    Merge,
    /// Squash all commits into one
    Squash,
    /// Do not merge
    None,
}

/// Merge strategy block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeStrategy {
    /// Merge method
    pub method: StrategyMethod,
    /// Fallback for rebase merges
    pub rebase_fallback: StrategyFallback,
}

/// User-written branch policy: every key optional, types still enforced
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialBranchPolicy {
    /// See [`BranchPolicy::protection`]
    #[serde(default, deserialize_with = "non_null")]
    pub protection: Option<PartialProtection>,
    /// See [`BranchPolicy::enabling_label`]
    #[serde(default)]
    pub enabling_label: Option<String>,
    /// See [`BranchPolicy::disabling_label`]
    #[serde(default, deserialize_with = "non_null")]
    pub disabling_label: Option<String>,
    /// See [`BranchPolicy::disabling_files`]
    #[serde(default, deserialize_with = "non_null")]
    pub disabling_files: Option<Vec<String>>,
    /// See [`BranchPolicy::merge_strategy`]
    #[serde(default, deserialize_with = "non_null")]
    pub merge_strategy: Option<PartialMergeStrategy>,
    /// See [`BranchPolicy::automated_backport_labels`]
    #[serde(default)]
    pub automated_backport_labels: Option<BTreeMap<String, String>>,
}

impl PartialBranchPolicy {
    /// Range checks serde cannot express
    pub fn check_ranges(&self) -> Result<(), String> {
        let count = self
            .protection
            .as_ref()
            .and_then(|p| p.required_pull_request_reviews.as_ref())
            .and_then(|r| r.required_approving_review_count);
        check_review_count(count)
    }
}

/// User-written protection block
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialProtection {
    /// See [`Protection::required_status_checks`]
    #[serde(default)]
    pub required_status_checks: Option<RequiredStatusChecks>,
    /// See [`Protection::required_pull_request_reviews`]
    #[serde(default)]
    pub required_pull_request_reviews: Option<PartialRequiredReviews>,
    /// See [`Protection::restrictions`]
    #[serde(default)]
    pub restrictions: Option<Restrictions>,
    /// See [`Protection::enforce_admins`]
    #[serde(default)]
    pub enforce_admins: Option<bool>,
}

/// User-written review requirements. Keys may be left out but not set to
/// `null`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialRequiredReviews {
    /// See [`RequiredReviews::dismiss_stale_reviews`]
    #[serde(default, deserialize_with = "non_null")]
    pub dismiss_stale_reviews: Option<bool>,
    /// See [`RequiredReviews::require_code_owner_reviews`]
    #[serde(default, deserialize_with = "non_null")]
    pub require_code_owner_reviews: Option<bool>,
    /// See [`RequiredReviews::required_approving_review_count`]
    #[serde(default, deserialize_with = "non_null")]
    pub required_approving_review_count: Option<u32>,
}

/// User-written merge strategy block
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialMergeStrategy {
    /// See [`MergeStrategy::method`]
    #[serde(default, deserialize_with = "non_null")]
    pub method: Option<StrategyMethod>,
    /// See [`MergeStrategy::rebase_fallback`]
    #[serde(default, deserialize_with = "non_null")]
    pub rebase_fallback: Option<StrategyFallback>,
}
