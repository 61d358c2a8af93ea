//! Entity equality for 409 conflict reconciliation.
//!
//! Both sides are reduced to the same flat shape before comparing: the
//! `data` payload (or the entity itself when already flat) minus the
//! server-managed `id`, `version` and `created` fields. Arrays compare as
//! multisets, so element order never makes two entities different.

use serde_json::{Map, Value};

/// Fields the server assigns that must not influence equality.
pub const MANAGED_FIELDS: [&str; 3] = ["id", "version", "created"];

/// Reduce an entity to its comparable payload.
///
/// If `data` is an object it *is* the payload and sibling fields are
/// dropped; otherwise the entity is already flat. Managed fields are removed
/// either way.
#[must_use]
pub fn normalize_entity(entity: &Value) -> Value {
    let payload = match entity.get("data") {
        Some(Value::Object(data)) => data,
        _ => match entity.as_object() {
            Some(obj) => obj,
            None => return entity.clone(),
        },
    };

    let mut flat: Map<String, Value> = payload.clone();
    for field in MANAGED_FIELDS {
        flat.remove(field);
    }
    Value::Object(flat)
}

/// True if `existing` and `incoming` describe the same entity.
#[must_use]
pub fn compare_entity_data(existing: &Value, incoming: &Value) -> bool {
    canonicalize(&normalize_entity(existing)) == canonicalize(&normalize_entity(incoming))
}

/// Recursively sort arrays by their serialized form.
///
/// Object keys need no work: `serde_json::Map` is ordered by key.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(canonicalize).collect();
            items.sort_by_cached_key(Value::to_string);
            Value::Array(items)
        }
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
