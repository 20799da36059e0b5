//! Per-execution response cache.
//!
//! The cache is a mapping of mappings, kind → key → resolved value, covering
//! exactly one execution. It starts empty (or seeded by the caller), grows
//! monotonically as rounds complete, and is handed back from
//! [`execute`](crate::execute) so callers can inspect or carry it into a
//! follow-up execution.
//!
//! # Immutability
//!
//! A `Cache` is never mutated: [`Cache::merge`] returns a new cache holding
//! the union of the old entries and a round's responses. Rounds therefore
//! never observe each other's writes mid-flight, and a reference to any
//! round's cache stays valid and consistent for as long as the caller keeps
//! it. Entries are never evicted; a `(kind, key)` cached in round N is
//! retrievable with the same value in every later round.
//!
//! # Seeding
//!
//! Callers can pre-load values to short-circuit fetches entirely:
//!
//! ```rust
//! use muster::Cache;
//! use serde_json::json;
//!
//! let cache = Cache::new().seed("friends", [("3".to_string(), json!([0, 1, 2]))]);
//! assert_eq!(cache.get("friends", "3"), Some(&json!([0, 1, 2])));
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::core::source::{Key, Kind};

/// One execution's worth of fetched responses, grouped by kind.
///
/// This is also the shape a round's dispatch produces and the shape
/// [`Cache::merge`] consumes.
pub type Responses<V> = HashMap<Kind, HashMap<Key, V>>;

/// Immutable kind → key → value store for resolved fetches.
///
/// Serializes (when `V` does) to the plain nested-map shape, so a finished
/// execution's cache can be logged or persisted by the caller.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent, bound(serialize = "V: Serialize"))]
pub struct Cache<V> {
    entries: Responses<V>,
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Cache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates a cache from already-resolved responses.
    #[must_use]
    pub fn from_entries(entries: Responses<V>) -> Self {
        Self { entries }
    }

    /// Adds pre-resolved entries for one kind, consuming and returning the
    /// cache builder-style.
    #[must_use]
    pub fn seed(mut self, kind: Kind, entries: impl IntoIterator<Item = (Key, V)>) -> Self {
        self.entries.entry(kind).or_default().extend(entries);
        self
    }

    /// Looks up the cached value for `(kind, key)`.
    pub fn get(&self, kind: Kind, key: &str) -> Option<&V> {
        self.entries.get(kind)?.get(key)
    }

    /// Whether `(kind, key)` has been resolved.
    pub fn contains(&self, kind: Kind, key: &str) -> bool {
        self.get(kind, key).is_some()
    }

    /// Total number of cached `(kind, key)` entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }

    /// Read access to the underlying nested maps.
    pub fn entries(&self) -> &Responses<V> {
        &self.entries
    }
}

impl<V: Clone> Cache<V> {
    /// Returns a new cache holding the union of this cache and a round's
    /// responses.
    ///
    /// Per-kind maps are unioned; on a conflicting key the new entry wins.
    /// Conflicts do not arise in practice: a cached key resolves during
    /// injection and is never dispatched again, so only misses reach a
    /// round's response set. Existing entries are never removed.
    #[must_use]
    pub fn merge(&self, responses: Responses<V>) -> Self {
        let mut merged = self.entries.clone();
        for (kind, entries) in responses {
            merged.entry(kind).or_default().extend(entries);
        }
        Self { entries: merged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn responses(kind: Kind, entries: &[(&str, Value)]) -> Responses<Value> {
        let mut by_key = HashMap::new();
        for (key, value) in entries {
            by_key.insert((*key).to_string(), value.clone());
        }
        HashMap::from([(kind, by_key)])
    }

    #[test]
    fn test_empty_cache_misses() {
        let cache: Cache<Value> = Cache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("friends", "1"), None);
        assert!(!cache.contains("friends", "1"));
    }

    #[test]
    fn test_merge_returns_new_cache_and_keeps_old() {
        let original = Cache::new().seed("friends", [("1".to_string(), json!([0]))]);
        let merged = original.merge(responses("activity", &[("1", json!(2))]));

        // the original is untouched
        assert_eq!(original.len(), 1);
        assert_eq!(original.get("activity", "1"), None);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("friends", "1"), Some(&json!([0])));
        assert_eq!(merged.get("activity", "1"), Some(&json!(2)));
    }

    #[test]
    fn test_merge_is_monotonic_across_rounds() {
        let mut cache = Cache::new();
        for round in 0..4 {
            let key = round.to_string();
            cache = cache.merge(responses("activity", &[(key.as_str(), json!(round + 1))]));
        }
        assert_eq!(cache.len(), 4);
        for round in 0..4 {
            assert_eq!(cache.get("activity", &round.to_string()), Some(&json!(round + 1)));
        }
    }

    #[test]
    fn test_merge_new_entry_wins_on_conflict() {
        let cache = Cache::new().seed("pet", [("2".to_string(), json!("CAT"))]);
        let merged = cache.merge(responses("pet", &[("2", json!("DOG"))]));
        assert_eq!(merged.get("pet", "2"), Some(&json!("DOG")));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_same_key_under_distinct_kinds() {
        let cache = Cache::new()
            .seed("friends", [("1".to_string(), json!([0]))])
            .seed("activity", [("1".to_string(), json!(2))]);
        assert_eq!(cache.get("friends", "1"), Some(&json!([0])));
        assert_eq!(cache.get("activity", "1"), Some(&json!(2)));
    }

    #[test]
    fn test_serializes_to_nested_maps() {
        let cache = Cache::new().seed("pet", [("0".to_string(), json!("DOG"))]);
        let serialized = serde_json::to_value(&cache).unwrap();
        assert_eq!(serialized, json!({"pet": {"0": "DOG"}}));
    }
}
