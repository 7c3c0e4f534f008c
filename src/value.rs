//! Generic policy tree
//!
//! Policy documents and pull request attributes are both carried as a
//! [`Value`] tree. Keeping the tree explicit (rather than deserializing
//! straight into typed structs) is what lets the resolver tell a key that is
//! absent apart from a key that is present with `null`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping node of a [`Value`] tree. Keys iterate in sorted order.
pub type Mapping = BTreeMap<String, Value>;

/// A node in a policy document or attribute bag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit `null`
    #[default]
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Integer(i64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    String(String),
    /// Ordered list
    Sequence(Vec<Self>),
    /// String-keyed mapping
    Mapping(Mapping),
}

impl Value {
    /// Empty mapping
    pub const fn mapping() -> Self {
        Self::Mapping(BTreeMap::new())
    }

    /// Whether this is an explicit `null`
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String contents, if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Mapping contents, if this is a mapping
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Sequence contents, if this is a sequence
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in a mapping node
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Insert into a mapping node. No-op on any other node.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Self>) {
        if let Self::Mapping(m) = self {
            m.insert(key.into(), value.into());
        }
    }

    /// Follow a dotted path (`base.ref`) through nested mappings
    pub fn lookup(&self, path: &str) -> Option<&Self> {
        path.split('.').try_fold(self, |node, segment| node.get(segment))
    }

    /// Length of a string, sequence or mapping
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Sequence(items) => Some(items.len()),
            Self::Mapping(m) => Some(m.len()),
            _ => None,
        }
    }

    /// Truthiness used by bare-attribute conditions
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Sequence(items) => !items.is_empty(),
            Self::Mapping(m) => !m.is_empty(),
        }
    }

    /// Recursively merge `other` into `self`.
    ///
    /// Where both sides hold a mapping at the same key the mappings are merged
    /// key by key; any other override value (including sequences) replaces the
    /// base value wholesale. `other` is only read.
    pub fn deep_merge(&mut self, other: &Self) -> &mut Self {
        match (&mut *self, other) {
            (Self::Mapping(base), Self::Mapping(overrides)) => {
                for (key, value) in overrides {
                    match (base.get_mut(key), value) {
                        (Some(existing @ Self::Mapping(_)), Self::Mapping(_)) => {
                            existing.deep_merge(value);
                        }
                        _ => {
                            base.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            (base, value) => *base = value.clone(),
        }
        self
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or(Self::Float(i as f64), Self::Integer)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_scalars_and_null() {
        let v = yaml("a: 1\nb: true\nc: null\nd: text\ne: 1.5\nf: [x, y]\n");
        assert_eq!(v.get("a"), Some(&Value::Integer(1)));
        assert_eq!(v.get("b"), Some(&Value::Bool(true)));
        assert_eq!(v.get("c"), Some(&Value::Null));
        assert_eq!(v.get("d"), Some(&Value::from("text")));
        assert_eq!(v.get("e"), Some(&Value::Float(1.5)));
        assert_eq!(v.get("f"), Some(&Value::from(vec!["x", "y"])));
        assert_eq!(v.get("missing"), None);
    }

    #[test]
    fn test_lookup_dotted_path() {
        let v = yaml("base:\n  ref: main\n  repo:\n    name: r\n");
        assert_eq!(v.lookup("base.ref"), Some(&Value::from("main")));
        assert_eq!(v.lookup("base.repo.name"), Some(&Value::from("r")));
        assert_eq!(v.lookup("base.nope"), None);
        assert_eq!(v.lookup("base.ref.deeper"), None);
    }

    #[test]
    fn test_deep_merge_nested_mappings() {
        let mut base = yaml("a:\n  x: 1\n  y: 2\nb: keep\n");
        let overrides = yaml("a:\n  y: 3\n  z: 4\n");
        base.deep_merge(&overrides);
        assert_eq!(base, yaml("a:\n  x: 1\n  y: 3\n  z: 4\nb: keep\n"));
    }

    #[test]
    fn test_deep_merge_replaces_lists() {
        let mut base = yaml("files: [a, b]\n");
        base.deep_merge(&yaml("files: [c]\n"));
        assert_eq!(base.get("files"), Some(&Value::from(vec!["c"])));
    }

    #[test]
    fn test_deep_merge_null_replaces_mapping() {
        let mut base = yaml("protection:\n  enforce_admins: true\n");
        base.deep_merge(&yaml("protection: null\n"));
        assert_eq!(base.get("protection"), Some(&Value::Null));
    }

    #[test]
    fn test_deep_merge_mapping_replaces_scalar() {
        let mut base = yaml("restrictions: null\n");
        base.deep_merge(&yaml("restrictions:\n  teams: [core]\n"));
        assert_eq!(base.lookup("restrictions.teams"), Some(&Value::from(vec!["core"])));
    }

    #[test]
    fn test_deep_merge_leaves_override_untouched() {
        let mut base = yaml("a:\n  x: 1\n");
        let overrides = yaml("a:\n  y: 2\n");
        let snapshot = overrides.clone();
        base.deep_merge(&overrides);
        assert_eq!(overrides, snapshot);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Sequence(vec![]).is_truthy());
        assert!(Value::from(vec!["x"]).is_truthy());
        assert!(Value::Integer(3).is_truthy());
    }
}
