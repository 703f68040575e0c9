//! Stable references for change detection.
//!
//! A [`StableSlot`] holds the last accepted value for one logical input slot
//! (the query, or the variables). On each evaluation the candidate value is
//! compared to the stored one by a canonical structural key; when they match,
//! the *stored* value is returned unchanged. Downstream change detection can
//! then compare by cheap reference identity ([`Arc::ptr_eq`]) even though the
//! caller constructs a fresh, equal value every evaluation.
//!
//! Replacement is deferred: a changed candidate is recorded as pending and
//! only promoted by [`StableSlot::commit`] once the evaluation cycle is over,
//! so all comparisons within one cycle see the previous cycle's accepted
//! value.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::{Map, Value};

/// Canonical comparison key for a stabilizable input value.
///
/// The key must reflect structural equality, not identity: two independently
/// constructed equal values must produce the same key. Returning `None`
/// declares the value non-comparable; the slot then degrades to reference
/// equality and every fresh candidate is treated as changed. This is an
/// explicit known limitation, not an error.
pub trait StableKey {
    /// Computes the canonical comparison key, or `None` if the value cannot
    /// be canonically compared.
    fn stable_key(&self) -> Option<u64>;
}

impl StableKey for Value {
    fn stable_key(&self) -> Option<u64> {
        let mut hasher = DefaultHasher::new();
        hash_value(self, &mut hasher);
        Some(hasher.finish())
    }
}

impl StableKey for Map<String, Value> {
    fn stable_key(&self) -> Option<u64> {
        let mut hasher = DefaultHasher::new();
        hash_object(self, &mut hasher);
        Some(hasher.finish())
    }
}

impl StableKey for String {
    fn stable_key(&self) -> Option<u64> {
        self.as_str().stable_key()
    }
}

impl StableKey for &str {
    fn stable_key(&self) -> Option<u64> {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        Some(hasher.finish())
    }
}

/// Structural hash over a JSON value, insensitive to object key order.
///
/// Each variant is tagged so that e.g. `"1"` and `1` cannot collide through
/// identical payload bytes.
fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(flag) => {
            1u8.hash(hasher);
            flag.hash(hasher);
        }
        Value::Number(number) => {
            2u8.hash(hasher);
            number.hash(hasher);
        }
        Value::String(text) => {
            3u8.hash(hasher);
            text.hash(hasher);
        }
        Value::Array(items) => {
            4u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(map) => {
            5u8.hash(hasher);
            hash_object(map, hasher);
        }
    }
}

fn hash_object<H: Hasher>(map: &Map<String, Value>, hasher: &mut H) {
    map.len().hash(hasher);
    // Sort keys so insertion order never affects the key.
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_unstable();
    for key in keys {
        key.hash(hasher);
        hash_value(&map[key.as_str()], hasher);
    }
}

struct Entry<T> {
    key: Option<u64>,
    value: Arc<T>,
}

/// The stable-reference cache for one logical input slot.
pub struct StableSlot<T> {
    accepted: Option<Entry<T>>,
    pending: Option<Entry<T>>,
}

impl<T: StableKey> StableSlot<T> {
    /// Creates an empty slot; the first candidate is always accepted.
    pub fn new() -> Self {
        Self {
            accepted: None,
            pending: None,
        }
    }

    /// Resolves a candidate against the stored value.
    ///
    /// Returns the stored `Arc` when the candidate's canonical key matches
    /// the accepted entry's, preserving reference stability. Otherwise the
    /// candidate is wrapped in a fresh `Arc`, recorded as pending, and
    /// returned. The pending entry does not become the comparison baseline
    /// until [`commit`](Self::commit) runs.
    pub fn stabilize(&mut self, candidate: T) -> Arc<T> {
        let key = candidate.stable_key();
        if let (Some(entry), Some(k)) = (&self.accepted, key) {
            if entry.key == Some(k) {
                return entry.value.clone();
            }
        }
        let value = Arc::new(candidate);
        self.pending = Some(Entry {
            key,
            value: value.clone(),
        });
        value
    }

    /// Promotes a pending replacement to the accepted entry.
    ///
    /// Called once per evaluation cycle, after all `stabilize` calls of that
    /// cycle have run.
    pub fn commit(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.accepted = Some(pending);
        }
    }
}

impl<T: StableKey> Default for StableSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
