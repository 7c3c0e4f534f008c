//! Action registry
//!
//! Rules name the actions to run by kind (`merge`, `comment`, ...). Each kind
//! is registered with a coercer that validates a raw configuration and fills
//! in defaults. The registry is an explicit value handed to the policy
//! loader, so callers can extend or replace the built-in set.

use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Validates a raw action configuration and returns the normalized form
pub type Coercer = fn(&Value) -> std::result::Result<Value, String>;

/// A registered action kind
#[derive(Clone, Copy)]
pub struct ActionKind {
    /// Name used as the key under a rule's `actions`
    pub name: &'static str,
    /// Validator and normalizer for this kind's configuration
    pub coerce: Coercer,
}

impl ActionKind {
    /// Action kind whose configuration is described by a serde type `C`
    pub fn typed<C: Serialize + DeserializeOwned>(name: &'static str) -> Self {
        Self {
            name,
            coerce: coerce_typed::<C>,
        }
    }
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionKind").field("name", &self.name).finish()
    }
}

/// A validated action configuration attached to a rule
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfig {
    /// Action kind name
    pub kind: String,
    /// Normalized configuration
    pub config: Value,
}

/// Lookup table of action kinds
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    kinds: BTreeMap<&'static str, ActionKind>,
}

impl ActionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in action kinds
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ActionKind::typed::<MergeAction>("merge"));
        registry.register(ActionKind::typed::<CommentAction>("comment"));
        registry.register(ActionKind::typed::<LabelAction>("label"));
        registry.register(ActionKind::typed::<CloseAction>("close"));
        registry.register(ActionKind::typed::<BackportAction>("backport"));
        registry.register(ActionKind::typed::<DeleteHeadBranchAction>("delete_head_branch"));
        registry
    }

    /// Add or replace an action kind
    pub fn register(&mut self, kind: ActionKind) {
        self.kinds.insert(kind.name, kind);
    }

    /// Registered kind names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    /// Validate `config` for action `name`
    pub fn coerce(&self, name: &str, config: &Value) -> std::result::Result<ActionConfig, String> {
        let kind = self
            .kinds
            .get(name)
            .ok_or_else(|| format!("unknown action '{name}'"))?;
        let config = (kind.coerce)(config).map_err(|e| format!("action '{name}': {e}"))?;
        Ok(ActionConfig {
            kind: name.to_string(),
            config,
        })
    }
}

fn coerce_typed<C: Serialize + DeserializeOwned>(
    raw: &Value,
) -> std::result::Result<Value, String> {
    // `delete_head_branch:` with no body is written as null in YAML
    let raw = if raw.is_null() { Value::mapping() } else { raw.clone() };
    let yaml = serde_yaml::to_value(&raw).map_err(|e| e.to_string())?;
    let typed: C = serde_yaml::from_value(yaml).map_err(|e| e.to_string())?;
    let normalized = serde_yaml::to_value(&typed).map_err(|e| e.to_string())?;
    serde_yaml::from_value(normalized).map_err(|e| e.to_string())
}

/// How the merge action merges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto the base branch
    Rebase,
}

/// Fallback when a rebase merge is impossible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebaseFallback {
    /// Fall back to a merge commit
    #[default]
    Merge,
    /// Fall back to squashing
    Squash,
    /// Do not merge
    None,
}

/// `merge` action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeAction {
    /// Merge method
    #[serde(default)]
    pub method: MergeMethod,
    /// Fallback for rebase merges
    #[serde(default)]
    pub rebase_fallback: RebaseFallback,
    /// Bring the head branch up to date before merging
    #[serde(default)]
    pub strict: bool,
}

/// `comment` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentAction {
    /// Comment body
    pub message: String,
}

/// `label` action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelAction {
    /// Labels to add
    #[serde(default)]
    pub add: Vec<String>,
    /// Labels to remove
    #[serde(default)]
    pub remove: Vec<String>,
}

/// `close` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloseAction {
    /// Comment posted when closing
    #[serde(default = "default_close_message")]
    pub message: String,
}

fn default_close_message() -> String {
    "This pull request has been automatically closed.".to_string()
}

/// `backport` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackportAction {
    /// Branches to backport to
    pub branches: Vec<String>,
}

/// `delete_head_branch` action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteHeadBranchAction {}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_merge_defaults_filled() {
        let registry = ActionRegistry::builtin();
        let action = registry.coerce("merge", &yaml("method: squash")).unwrap();
        assert_eq!(action.kind, "merge");
        assert_eq!(
            action.config,
            yaml("method: squash\nrebase_fallback: merge\nstrict: false\n")
        );
    }

    #[test]
    fn test_coerce_is_idempotent() {
        let registry = ActionRegistry::builtin();
        for (name, raw) in [
            ("merge", "{}"),
            ("comment", "message: hi"),
            ("label", "add: [ready]"),
            ("close", "{}"),
            ("backport", "branches: [stable]"),
            ("delete_head_branch", "null"),
        ] {
            let once = registry.coerce(name, &yaml(raw)).unwrap();
            let twice = registry.coerce(name, &once.config).unwrap();
            assert_eq!(once, twice, "{name}");
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = ActionRegistry::builtin()
            .coerce("explode", &Value::mapping())
            .unwrap_err();
        assert!(err.contains("unknown action 'explode'"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = ActionRegistry::builtin();
        assert!(registry.coerce("merge", &yaml("method: yolo")).is_err());
        assert!(registry.coerce("comment", &Value::mapping()).is_err());
        assert!(registry.coerce("label", &yaml("colour: red")).is_err());
    }

    #[test]
    fn test_custom_kind_registration() {
        let mut registry = ActionRegistry::new();
        assert_eq!(registry.names().count(), 0);
        registry.register(ActionKind::typed::<CommentAction>("notify"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["notify"]);
        assert!(registry.coerce("notify", &yaml("message: hey")).is_ok());
        assert!(registry.coerce("comment", &yaml("message: hey")).is_err());
    }
}
