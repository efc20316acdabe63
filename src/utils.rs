//! Normalization helpers for the platform's loosely-shaped id values.
//!
//! Reference fields in record payloads carry either bare id strings or
//! populated objects with an `_id`/`id` field, and may be scalar or array.
//! Everything here compares by id equality after normalizing both shapes.

use std::collections::HashSet;

use serde_json::Value;

/// Extract the id from a value that is either a bare string or an object
/// carrying an `_id`/`id` field. Empty strings count as no id.
pub fn id_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id),
        Value::Object(map) => map
            .get("_id")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty()),
        _ => None,
    }
}

/// Collect the ids referenced by a value: arrays yield every usable element
/// id, scalars yield at most one. Unusable elements are skipped.
pub fn normalized_ids(value: &Value) -> HashSet<&str> {
    match value {
        Value::Array(items) => items.iter().filter_map(id_of).collect(),
        other => id_of(other).into_iter().collect(),
    }
}

/// Whether a value (bare id, id object, or array of either) references
/// `target`.
pub fn contains_id(value: &Value, target: &str) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| id_of(item) == Some(target)),
        other => id_of(other) == Some(target),
    }
}

/// Whether two id sets share at least one element.
pub fn sets_overlap(a: &HashSet<&str>, b: &HashSet<&str>) -> bool {
    !a.is_disjoint(b)
}
