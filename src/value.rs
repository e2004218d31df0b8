//! Structural helpers over `serde_json::Value` trees.
//!
//! `deep_merge` follows the layering rule used everywhere in this crate: when
//! both sides hold a map for the same key, recurse; otherwise the overlay's
//! value wins. Arrays are atomic.

use serde_json::{Map, Number, Value};

use crate::types::MergeStrategy;

/// Structural equality. Numbers compare by value, so `1` equals `1.0`.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| deep_equal(l, r)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Recursive copy. `Value` owns its children, so this is `Clone`.
pub fn deep_clone(value: &Value) -> Value {
    value.clone()
}

/// Deep-merge `source` on top of `target`.
///
/// If both are maps, keys recurse; otherwise `source` replaces `target`.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            merge_maps(&mut base, overlay);
            Value::Object(base)
        }
        (_, source) => source,
    }
}

/// In-place form of [`deep_merge`] for two maps. Existing keys keep their position.
pub fn merge_maps(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, overlay_val) in overlay {
        if let Value::Object(overlay_tbl) = overlay_val {
            if let Some(Value::Object(base_tbl)) = base.get_mut(&key) {
                merge_maps(base_tbl, overlay_tbl);
                continue;
            }
            base.insert(key, Value::Object(overlay_tbl));
        } else {
            base.insert(key, overlay_val);
        }
    }
}

/// Fold a whole imported value into a current one.
///
/// Non-map inputs count as empty maps for `Shallow` and `FieldSelect`.
pub fn combine(current: &Value, imported: &Value, strategy: &MergeStrategy) -> Value {
    match strategy {
        MergeStrategy::Shallow => {
            let mut result = as_map(current);
            if let Value::Object(overlay) = imported {
                for (key, value) in overlay {
                    result.insert(key.clone(), value.clone());
                }
            }
            Value::Object(result)
        }
        MergeStrategy::Deep => deep_merge(current.clone(), imported.clone()),
        MergeStrategy::FieldSelect(fields) => {
            let mut result = as_map(current);
            for field in fields {
                match imported.get(field) {
                    Some(value) => {
                        result.insert(field.clone(), value.clone());
                    }
                    None => {
                        result.shift_remove(field);
                    }
                }
            }
            Value::Object(result)
        }
    }
}

fn as_map(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

/// Arrays and maps.
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// True when two present values disagree on shape: container vs scalar, or
/// array vs map.
pub fn shape_conflict(a: &Value, b: &Value) -> bool {
    is_container(a) != is_container(b) || a.is_array() != b.is_array()
}

/// Field names of an option set in insertion order. Non-maps have none.
pub fn field_names(value: Option<&Value>) -> impl Iterator<Item = &String> {
    value
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.keys())
}
