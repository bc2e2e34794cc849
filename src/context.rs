//! Context mappings and subset containment.
//!
//! A context qualifies under which conditions a stored value applies, e.g.
//! `{"region": "EU", "tier": "gold"}`. Resolution matches a stored context
//! against a requested one by containment: the stored context matches when
//! every one of its key-value pairs appears, with an equal value, in the
//! request. The empty context is the default/unqualified slot and matches
//! only requests that supply no context at all.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A key-value mapping qualifying when a value applies.
///
/// Backed by an ordered map so two contexts with the same pairs always
/// compare equal and serialize identically, which makes the exact-context
/// identity key (see [`Context::canonical_key`]) stable.
///
/// # Examples
///
/// ```
/// use varstore::Context;
/// use serde_json::json;
///
/// let stored: Context = [("region", json!("EU"))].into_iter().collect();
/// let request: Context = [("region", json!("EU")), ("tier", json!("gold"))]
///     .into_iter()
///     .collect();
///
/// assert!(stored.is_subset_of(&request));
/// assert!(!request.is_subset_of(&stored));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, serde_json::Value>);

impl Context {
    /// Creates an empty context (the default/unqualified slot).
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns true if this context carries no qualifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of qualifier keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Adds or replaces a qualifier.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    /// Looks up a qualifier value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Iterates over qualifiers in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Containment test: every key in `self` exists in `requested` with an
    /// equal value.
    ///
    /// This is the matching rule of value resolution (the explicit form of a
    /// JSONB `@>` containment query). The empty context is a subset of every
    /// request, including the empty one.
    #[must_use]
    pub fn is_subset_of(&self, requested: &Self) -> bool {
        self.0
            .iter()
            .all(|(key, value)| requested.0.get(key) == Some(value))
    }

    /// Deterministic identity key for exact-context uniqueness.
    ///
    /// Two contexts produce the same key iff they hold the same pairs, so the
    /// value store can keep at most one row per exact context.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        // BTreeMap ordering (and serde_json's default sorted object map)
        // makes this serialization canonical.
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}

impl From<BTreeMap<String, serde_json::Value>> for Context {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(pairs: &[(&str, serde_json::Value)]) -> Context {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn test_empty_is_subset_of_everything() {
        let empty = Context::new();
        let request = ctx(&[("region", json!("EU"))]);
        assert!(empty.is_subset_of(&request));
        assert!(empty.is_subset_of(&Context::new()));
    }

    #[test]
    fn test_subset_requires_equal_values() {
        let stored = ctx(&[("region", json!("EU"))]);
        assert!(stored.is_subset_of(&ctx(&[("region", json!("EU")), ("tier", json!("gold"))])));
        assert!(!stored.is_subset_of(&ctx(&[("region", json!("US"))])));
        assert!(!stored.is_subset_of(&ctx(&[("tier", json!("gold"))])));
        assert!(!stored.is_subset_of(&Context::new()));
    }

    #[test]
    fn test_subset_with_nested_values() {
        let stored = ctx(&[("flags", json!({"beta": true}))]);
        // Nested values compare by full equality, not recursive containment.
        assert!(stored.is_subset_of(&ctx(&[("flags", json!({"beta": true}))])));
        assert!(!stored.is_subset_of(&ctx(&[("flags", json!({"beta": true, "x": 1}))])));
    }

    #[test]
    fn test_canonical_key_is_order_insensitive() {
        let a = ctx(&[("region", json!("EU")), ("tier", json!("gold"))]);
        let b = ctx(&[("tier", json!("gold")), ("region", json!("EU"))]);
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_key_distinguishes_values() {
        let a = ctx(&[("region", json!("EU"))]);
        let b = ctx(&[("region", json!("US"))]);
        assert_ne!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_empty_canonical_key() {
        assert_eq!(Context::new().canonical_key(), "{}");
    }

    #[test]
    fn test_context_serde_transparent() {
        let c = ctx(&[("region", json!("EU"))]);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"region":"EU"}"#);
        let back: Context = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
