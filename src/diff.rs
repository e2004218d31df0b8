//! Pair the instances of two trees by name and classify what changed.
//!
//! Pairing is by name only: the first instance of a name on each side wins and
//! later ones are dropped with a warning. Entries come out in current-side
//! order, followed by names that only exist in the imported tree.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::flatten::flatten;
use crate::key;
use crate::types::{DiffEntry, FieldDiff, FieldStatus, PluginInstance, Status};
use crate::value::{deep_equal, field_names, shape_conflict};

/// Diff a current tree against an imported one.
pub fn diff(current: &Map<String, Value>, imported: &Map<String, Value>) -> Vec<DiffEntry> {
    let current = index_by_name(flatten(current), "current");
    let mut imported = index_by_name(flatten(imported), "imported");

    let mut entries = Vec::with_capacity(current.len() + imported.len());
    for (name, curr) in current {
        match imported.shift_remove(&name) {
            Some(imp) => entries.push(paired(curr, imp)),
            None => entries.push(deleted(curr)),
        }
    }
    entries.extend(imported.into_values().map(added));

    debug!(entries = entries.len(), "diffed configuration trees");
    entries
}

fn index_by_name(
    instances: Vec<PluginInstance>,
    side: &'static str,
) -> IndexMap<String, PluginInstance> {
    let mut map = IndexMap::with_capacity(instances.len());
    for instance in instances {
        match map.entry(instance.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(instance);
            }
            Entry::Occupied(kept) => {
                let kept: &PluginInstance = kept.get();
                warn!(
                    side,
                    name = %instance.name,
                    kept = %kept.id,
                    dropped = %instance.id,
                    "duplicate instance name, keeping the first occurrence"
                );
            }
        }
    }
    map
}

fn added(imp: PluginInstance) -> DiffEntry {
    let field_diffs = build_field_diffs(None, imp.options.as_ref());
    DiffEntry {
        id: imp.id,
        name: imp.name,
        instance_id: imp.instance_id,
        enabled: imp.enabled,
        imported_enabled: Some(imp.enabled),
        final_enabled: None,
        current: None,
        imported: imp.options,
        group_path: imp.group_path.clone(),
        imported_group_path: imp.group_path,
        status: Status::Added,
        decision: None,
        field_diffs,
        advanced_mode: false,
    }
}

fn deleted(curr: PluginInstance) -> DiffEntry {
    let field_diffs = build_field_diffs(curr.options.as_ref(), None);
    DiffEntry {
        id: curr.id,
        name: curr.name,
        instance_id: curr.instance_id,
        enabled: curr.enabled,
        imported_enabled: None,
        final_enabled: None,
        current: curr.options,
        imported: None,
        group_path: curr.group_path,
        imported_group_path: Vec::new(),
        status: Status::Deleted,
        decision: None,
        field_diffs,
        advanced_mode: false,
    }
}

fn paired(curr: PluginInstance, imp: PluginInstance) -> DiffEntry {
    let field_diffs = build_field_diffs(curr.options.as_ref(), imp.options.as_ref());
    let status = determine_status(&field_diffs);

    let group_path = if curr.group_path.is_empty() {
        imp.group_path.clone()
    } else {
        curr.group_path
    };
    let instance_id = if curr.instance_id.is_empty() {
        imp.instance_id
    } else {
        curr.instance_id
    };

    DiffEntry {
        id: key::encode(&curr.name, &instance_id, true),
        name: curr.name,
        instance_id,
        enabled: curr.enabled,
        imported_enabled: Some(imp.enabled),
        final_enabled: None,
        current: curr.options,
        imported: imp.options,
        group_path,
        imported_group_path: imp.group_path,
        status,
        decision: None,
        field_diffs,
        advanced_mode: false,
    }
}

/// Compare two option sets field by field.
///
/// Fields come in current-side order, then imported-only fields. An option set
/// that is absent or not a map contributes no fields.
pub fn build_field_diffs(current: Option<&Value>, imported: Option<&Value>) -> Vec<FieldDiff> {
    let mut fields: Vec<&String> = field_names(current).collect();
    let current_map = current.and_then(Value::as_object);
    fields.extend(
        field_names(imported).filter(|f| !current_map.is_some_and(|m| m.contains_key(*f))),
    );

    fields
        .into_iter()
        .map(|field| {
            let current_value = current.and_then(|c| c.get(field)).cloned();
            let imported_value = imported.and_then(|i| i.get(field)).cloned();
            let status = match (&current_value, &imported_value) {
                (None, _) => FieldStatus::Added,
                (_, None) => FieldStatus::Removed,
                (Some(c), Some(i)) if deep_equal(c, i) => FieldStatus::Unchanged,
                _ => FieldStatus::Modified,
            };
            FieldDiff {
                field: field.clone(),
                current_value,
                imported_value,
                status,
                decision: None,
            }
        })
        .collect()
}

/// Entry status of a paired entry from its field diffs.
///
/// `Unchanged` iff every field is unchanged (including no fields at all);
/// `Conflict` if any field present on both sides changes shape; else `Modified`.
pub fn determine_status(field_diffs: &[FieldDiff]) -> Status {
    if field_diffs
        .iter()
        .all(|d| d.status == FieldStatus::Unchanged)
    {
        return Status::Unchanged;
    }

    let conflict = field_diffs.iter().any(|d| match (&d.current_value, &d.imported_value) {
        (Some(c), Some(i)) => shape_conflict(c, i),
        _ => false,
    });

    if conflict {
        Status::Conflict
    } else {
        Status::Modified
    }
}
