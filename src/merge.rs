//! Rebuild a grouped tree from decided diff entries.
//!
//! Each entry is first tested for inclusion, then its option set is resolved
//! from its decision, then it is written back under its group path. The
//! function is total: inconsistent decisions simply exclude the entry. Use
//! [`validate_decisions`](crate::validate::validate_decisions) first to refuse
//! them instead.

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::key;
use crate::types::{
    Decision, DiffEntry, FieldDecision, FieldDiff, GroupSegment, Priority, Status,
};

/// Whether an entry with this status and decision ends up in the merged tree.
pub fn should_include(status: Status, decision: Option<Decision>) -> bool {
    match status {
        Status::Added => decision == Some(Decision::Add),
        Status::Deleted => decision == Some(Decision::Keep),
        Status::Modified | Status::Conflict => matches!(
            decision,
            Some(Decision::Keep | Decision::Replace | Decision::Merge | Decision::Smart)
        ),
        Status::Unchanged => true,
    }
}

/// Merge decided entries into a new tree.
pub fn merge(entries: &[DiffEntry], priority: Priority) -> Map<String, Value> {
    let mut merged = Map::new();
    let mut written = 0usize;

    for entry in entries {
        if !should_include(entry.status, entry.decision) {
            trace!(
                id = %entry.id,
                status = %entry.status,
                decision = ?entry.decision,
                "entry excluded"
            );
            continue;
        }
        let options = resolve_options(entry, priority).unwrap_or(Value::Null);
        place(&mut merged, &entry.group_path, entry.key(), options);
        written += 1;
    }

    debug!(entries = entries.len(), written, ?priority, "merged entries");
    merged
}

/// The option set an included entry is written with.
///
/// `replace` takes the imported side; `merge` (or any entry in advanced mode)
/// merges field by field; `smart` merges recursively by priority; anything
/// else keeps the current side. When the chosen side is absent the other side
/// is used, so an `add` of an imported-only entry carries its options.
pub fn resolve_options(entry: &DiffEntry, priority: Priority) -> Option<Value> {
    let current = entry.current.as_ref();
    let imported = entry.imported.as_ref();

    match entry.decision {
        Some(Decision::Replace) => imported.or(current).cloned(),
        Some(Decision::Merge) => merge_by_fields(current, imported, &entry.field_diffs),
        _ if entry.advanced_mode => merge_by_fields(current, imported, &entry.field_diffs),
        Some(Decision::Smart) => smart_merge(current, imported, priority),
        _ => current.or(imported).cloned(),
    }
}

/// Field-level merge: start from current and pull in every field marked
/// `use-imported`. A field missing on the imported side is removed.
///
/// With no current option set (absent or null) the imported side is taken whole.
pub fn merge_by_fields(
    current: Option<&Value>,
    imported: Option<&Value>,
    field_diffs: &[FieldDiff],
) -> Option<Value> {
    let base = match current {
        None | Some(Value::Null) => return imported.or(current).cloned(),
        Some(Value::Object(map)) => map,
        Some(other) => return Some(other.clone()),
    };

    let mut result = base.clone();
    for diff in field_diffs {
        if diff.decision != Some(FieldDecision::UseImported) {
            continue;
        }
        match &diff.imported_value {
            Some(value) => {
                result.insert(diff.field.clone(), value.clone());
            }
            None => {
                result.shift_remove(&diff.field);
            }
        }
    }
    Some(Value::Object(result))
}

/// Recursive merge that keeps fields from both sides and settles leaf
/// conflicts by `priority`.
///
/// An absent (or null) side yields a copy of the other. Two maps merge key by
/// key; any other pairing is a leaf conflict.
pub fn smart_merge(
    current: Option<&Value>,
    imported: Option<&Value>,
    priority: Priority,
) -> Option<Value> {
    match (current, imported) {
        (None | Some(Value::Null), other) => other.or(current).cloned(),
        (Some(cur), None | Some(Value::Null)) => Some(cur.clone()),
        (Some(Value::Object(cur)), Some(Value::Object(imp))) => {
            Some(Value::Object(smart_merge_maps(cur, imp, priority)))
        }
        (Some(cur), Some(imp)) => Some(pick(cur, imp, priority).clone()),
    }
}

fn smart_merge_maps(
    current: &Map<String, Value>,
    imported: &Map<String, Value>,
    priority: Priority,
) -> Map<String, Value> {
    let mut result = current.clone();
    for (field, iv) in imported {
        let merged = match (current.get(field), iv) {
            (None, _) => iv.clone(),
            (Some(Value::Object(c)), Value::Object(i)) => {
                Value::Object(smart_merge_maps(c, i, priority))
            }
            (Some(cv), _) => pick(cv, iv, priority).clone(),
        };
        result.insert(field.clone(), merged);
    }
    result
}

fn pick<'a>(current: &'a Value, imported: &'a Value, priority: Priority) -> &'a Value {
    match priority {
        Priority::Local => current,
        Priority::Import => imported,
    }
}

/// Write `value` under `key` at `path`, creating group nodes as needed. A new
/// group node starts with the segment's metadata.
fn place(tree: &mut Map<String, Value>, path: &[GroupSegment], key: String, value: Value) {
    let mut target = tree;
    for segment in path {
        target = group_node(target, segment);
    }
    if target.insert(key.clone(), value).is_some() {
        warn!(%key, "merged entry replaced an earlier entry with the same key");
    }
}

fn group_node<'a>(
    tree: &'a mut Map<String, Value>,
    segment: &GroupSegment,
) -> &'a mut Map<String, Value> {
    let node = tree
        .entry(key::group_key(&segment.id))
        .or_insert_with(|| Value::Object(segment.meta.clone()));
    if !node.is_object() {
        warn!(group = %segment.id, "replacing non-map value at group key");
        *node = Value::Object(segment.meta.clone());
    }
    node.as_object_mut()
        .expect("hereditas: group node was just made a map")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::fixtures::test::{current_tree, imported_tree, tree};
    use crate::value::deep_equal;
    use serde_json::json;

    fn keep_all(mut entries: Vec<DiffEntry>) -> Vec<DiffEntry> {
        for entry in &mut entries {
            entry.decision = Some(Decision::Keep);
        }
        entries
    }

    fn single(current: Value, imported: Value, decision: Decision) -> Map<String, Value> {
        let entries = diff(&tree(json!({"foo": current})), &tree(json!({"foo": imported})));
        let entries: Vec<DiffEntry> = entries
            .into_iter()
            .map(|e| e.with_decision(decision))
            .collect();
        merge(&entries, Priority::Local)
    }

    #[test]
    fn replace_takes_imported() {
        let merged = single(json!({"a": 1}), json!({"a": 2}), Decision::Replace);
        assert_eq!(Value::Object(merged), json!({"foo": {"a": 2}}));
    }

    #[test]
    fn keep_takes_current() {
        let merged = single(json!({"a": 1}), json!({"a": 2}), Decision::Keep);
        assert_eq!(Value::Object(merged), json!({"foo": {"a": 1}}));
    }

    #[test]
    fn skip_excludes_modified() {
        let merged = single(json!({"a": 1}), json!({"a": 2}), Decision::Skip);
        assert!(merged.is_empty());
    }

    #[test]
    fn smart_merge_priority() {
        let cur = json!({"a": 1});
        let imp = json!({"a": 2});
        assert_eq!(
            smart_merge(Some(&cur), Some(&imp), Priority::Local),
            Some(json!({"a": 1}))
        );
        assert_eq!(
            smart_merge(Some(&cur), Some(&imp), Priority::Import),
            Some(json!({"a": 2}))
        );
    }

    #[test]
    fn smart_merge_keeps_both_sides_and_recurses() {
        let cur = json!({"a": 1, "nested": {"x": 1, "y": 1}, "list": [1]});
        let imp = json!({"b": 2, "nested": {"y": 2, "z": 2}, "list": [2, 3]});
        let merged = smart_merge(Some(&cur), Some(&imp), Priority::Import).unwrap();
        assert_eq!(
            merged,
            json!({"a": 1, "nested": {"x": 1, "y": 2, "z": 2}, "list": [2, 3], "b": 2})
        );
    }

    #[test]
    fn smart_merge_type_mismatch_uses_priority() {
        let cur = json!({"a": {"x": 1}});
        let imp = json!({"a": [1]});
        assert_eq!(
            smart_merge(Some(&cur), Some(&imp), Priority::Local),
            Some(json!({"a": {"x": 1}}))
        );
        assert_eq!(
            smart_merge(Some(&cur), Some(&imp), Priority::Import),
            Some(json!({"a": [1]}))
        );
    }

    #[test]
    fn smart_merge_one_side_absent() {
        let v = json!({"a": 1});
        assert_eq!(smart_merge(None, Some(&v), Priority::Local), Some(v.clone()));
        assert_eq!(smart_merge(Some(&v), None, Priority::Import), Some(v.clone()));
        assert_eq!(smart_merge(None, None, Priority::Local), None);
    }

    #[test]
    fn field_merge_uses_per_field_decisions() {
        let mut entries = diff(
            &tree(json!({"foo": {"a": 1, "b": 1, "c": 1}})),
            &tree(json!({"foo": {"a": 2, "b": 2, "d": 2}})),
        );
        let entry = &mut entries[0];
        entry.decision = Some(Decision::Merge);
        assert!(entry.set_field_decision("a", FieldDecision::UseImported));
        assert!(entry.set_field_decision("b", FieldDecision::Keep));
        assert!(entry.set_field_decision("c", FieldDecision::UseImported));
        assert!(entry.set_field_decision("d", FieldDecision::UseImported));

        let merged = merge(&entries, Priority::Local);
        assert_eq!(Value::Object(merged), json!({"foo": {"a": 2, "b": 1, "d": 2}}));
    }

    #[test]
    fn field_merge_without_current_takes_imported() {
        let imp = json!({"a": 1});
        assert_eq!(merge_by_fields(None, Some(&imp), &[]), Some(imp.clone()));
        assert_eq!(
            merge_by_fields(Some(&Value::Null), Some(&imp), &[]),
            Some(imp.clone())
        );
    }

    #[test]
    fn advanced_mode_forces_field_merge() {
        let mut entries = diff(
            &tree(json!({"foo": {"a": 1, "b": 1}})),
            &tree(json!({"foo": {"a": 2, "b": 2}})),
        );
        let entry = &mut entries[0];
        entry.decision = Some(Decision::Smart);
        entry.advanced_mode = true;
        entry.set_field_decision("b", FieldDecision::UseImported);

        let merged = merge(&entries, Priority::Import);
        assert_eq!(Value::Object(merged), json!({"foo": {"a": 1, "b": 2}}));
    }

    #[test]
    fn inclusion_table() {
        use Decision::*;
        assert!(should_include(Status::Added, Some(Add)));
        assert!(!should_include(Status::Added, Some(Skip)));
        assert!(!should_include(Status::Added, None));
        assert!(should_include(Status::Deleted, Some(Keep)));
        assert!(!should_include(Status::Deleted, Some(Remove)));
        for d in [Keep, Replace, Merge, Smart] {
            assert!(should_include(Status::Modified, Some(d)));
            assert!(should_include(Status::Conflict, Some(d)));
        }
        assert!(!should_include(Status::Modified, Some(Skip)));
        assert!(should_include(Status::Unchanged, None));
        assert!(should_include(Status::Unchanged, Some(Remove)));
    }

    #[test]
    fn added_entry_carries_imported_options() {
        let entries: Vec<DiffEntry> = diff(&tree(json!({})), &tree(json!({"bar": {"x": 1}})))
            .into_iter()
            .map(|e| e.with_decision(Decision::Add))
            .collect();
        let merged = merge(&entries, Priority::Local);
        assert_eq!(Value::Object(merged), json!({"bar": {"x": 1}}));
    }

    #[test]
    fn grouped_round_trip() {
        let original = tree(json!({"group:g1": {"foo": {"a": 1}}}));
        let merged = merge(&keep_all(diff(&original, &original)), Priority::Local);
        assert_eq!(merged, original);
    }

    #[test]
    fn fixture_round_trip_restores_labels_and_disabled_keys() {
        let original = current_tree();
        let merged = merge(&keep_all(diff(&original, &original)), Priority::Local);

        let mut expected = original.clone();
        expected.shift_remove("$theme");
        assert!(deep_equal(&Value::Object(merged.clone()), &Value::Object(expected)));
        assert_eq!(merged["group:basic"]["$label"], json!("Basic"));
        assert!(merged["group:basic"].get("~sudo").is_some());
    }

    #[test]
    fn fixture_merge_with_mixed_decisions() {
        let mut entries = diff(&current_tree(), &imported_tree());
        for entry in &mut entries {
            entry.decision = Some(match entry.name.as_str() {
                "help" => Decision::Smart,
                "sudo" => Decision::Remove,
                "echo" => Decision::Replace,
                "adapter-qq" => Decision::Smart,
                "dice" => Decision::Add,
                _ => Decision::Keep,
            });
        }
        let merged = merge(&entries, Priority::Import);

        assert_eq!(merged["console"], json!({"port": 5140}));
        assert_eq!(
            merged["group:basic"]["help"],
            json!({"shortcut": false, "verbose": true})
        );
        assert!(merged["group:basic"].get("~sudo").is_none());
        assert_eq!(merged["group:chat"]["echo:a1"]["aliases"], json!("say"));
        assert_eq!(
            merged["group:chat"]["group:adapters"]["adapter-qq"],
            json!({"token": "new", "retry": {"times": 5, "delay": 100}})
        );
        assert_eq!(merged["dice"], json!({"sides": 20}));
    }

    #[test]
    fn same_key_last_write_wins() {
        let a = diff(&tree(json!({"foo": {"v": 1}})), &tree(json!({"foo": {"v": 1}})));
        let b = diff(&tree(json!({"foo": {"v": 2}})), &tree(json!({"foo": {"v": 2}})));
        let entries: Vec<DiffEntry> = a.into_iter().chain(b).collect();
        let merged = merge(&entries, Priority::Local);
        assert_eq!(merged["foo"], json!({"v": 2}));
    }

    fn through_json(entries: &[DiffEntry]) -> Vec<DiffEntry> {
        let wire = serde_json::to_string(entries).unwrap();
        serde_json::from_str(&wire).unwrap()
    }

    #[test]
    fn kept_null_options_survive_json_entry_list() {
        let entries = keep_all(diff(
            &tree(json!({"foo": null})),
            &tree(json!({"foo": {"a": 1}})),
        ));
        let direct = merge(&entries, Priority::Local);
        assert_eq!(Value::Object(direct.clone()), json!({"foo": null}));
        assert_eq!(merge(&through_json(&entries), Priority::Local), direct);
    }

    #[test]
    fn imported_null_field_survives_json_entry_list() {
        let mut entries = diff(
            &tree(json!({"foo": {"a": 1}})),
            &tree(json!({"foo": {"a": null}})),
        );
        entries[0].decision = Some(Decision::Merge);
        entries[0].set_field_decision("a", FieldDecision::UseImported);

        let direct = merge(&entries, Priority::Local);
        assert_eq!(Value::Object(direct.clone()), json!({"foo": {"a": null}}));
        assert_eq!(merge(&through_json(&entries), Priority::Local), direct);
    }

    #[test]
    fn final_enabled_controls_output_key() {
        let mut entries = keep_all(diff(&tree(json!({"foo": {}})), &tree(json!({"foo": {}}))));
        entries[0].final_enabled = Some(false);
        let merged = merge(&entries, Priority::Local);
        assert!(merged.contains_key("~foo"));
        assert!(!merged.contains_key("foo"));
    }
}
