//! Display-oriented views of a decided entry list.

use serde_json::{Map, Value, json};

use crate::types::{ChangeClass, Decision, DiffEntry, Status};

/// Suffix of the one-level group keys in a display tree.
pub const DISPLAY_GROUP_SUFFIX: &str = ":group:";
/// Field carrying `{status, decision}` on every display node.
pub const META_FIELD: &str = "_meta";

/// Build a one-level display tree.
///
/// Grouped entries land under `"<a/b>:group:"`; each node holds the entry's
/// resolved config (the imported side for `replace`, else the current side)
/// plus a `_meta` tag.
pub fn build_display_tree(entries: &[DiffEntry]) -> Map<String, Value> {
    let mut tree = Map::new();

    for entry in entries {
        let config = match entry.decision {
            Some(Decision::Replace) => entry.imported.as_ref(),
            _ => entry.current.as_ref(),
        };
        let mut node = spread(config);
        node.insert(
            META_FIELD.into(),
            json!({ "status": entry.status, "decision": entry.decision }),
        );

        let key = entry.key();
        match entry.original_group() {
            None => {
                tree.insert(key, Value::Object(node));
            }
            Some(group) => {
                let slot = tree
                    .entry(format!("{group}{DISPLAY_GROUP_SUFFIX}"))
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(group_map) = slot {
                    group_map.insert(key, Value::Object(node));
                }
            }
        }
    }

    tree
}

/// Fields of a display node before `_meta` is added. Maps are copied; arrays
/// and strings are keyed by element index; other values contribute nothing.
fn spread(config: Option<&Value>) -> Map<String, Value> {
    match config {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Some(Value::String(s)) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Map::new(),
    }
}

/// Coarse change category for a status/decision pair. Defaults to `Unchanged`.
pub fn classify(status: Status, decision: Option<Decision>) -> ChangeClass {
    match (status, decision) {
        (Status::Added, Some(Decision::Add)) => ChangeClass::Added,
        (Status::Deleted, Some(Decision::Remove)) => ChangeClass::Removed,
        (Status::Modified, Some(Decision::Replace | Decision::Merge)) => ChangeClass::Modified,
        _ => ChangeClass::Unchanged,
    }
}
