//! Flatten a grouped configuration tree into addressable plugin instances.
//!
//! `group:<id>` keys are walked recursively and contribute one
//! [`GroupSegment`] to the path of everything beneath them. `$`-prefixed keys
//! are metadata and never become instances. Every other key is decoded with
//! the key codec and emitted as one instance, in key insertion order.
//!
//! ```text
//! { "group:a1": { "$label": "chat", "echo": {...}, "~foo:2": {...} } }
//!   → echo   (group path [chat])
//!   → foo:2  (group path [chat], disabled)
//! ```

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::key::{self, EntryKey};
use crate::types::{GroupSegment, PluginInstance};

/// Flatten `tree` into instances, preserving key order.
pub fn flatten(tree: &Map<String, Value>) -> Vec<PluginInstance> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    flatten_into(tree, &mut path, &mut out);
    debug!(instances = out.len(), "flattened configuration tree");
    out
}

fn flatten_into(
    tree: &Map<String, Value>,
    path: &mut Vec<GroupSegment>,
    out: &mut Vec<PluginInstance>,
) {
    for (raw_key, value) in tree {
        if key::is_meta(raw_key) {
            continue;
        }

        if let Some(id) = key::group_id(raw_key) {
            let Value::Object(group) = value else {
                trace!(key = %raw_key, "skipping group node that is not a map");
                continue;
            };
            path.push(GroupSegment {
                id: id.to_string(),
                meta: group_meta(group),
            });
            flatten_into(group, path, out);
            path.pop();
            continue;
        }

        let EntryKey {
            name,
            instance_id,
            enabled,
        } = key::decode(raw_key);
        out.push(PluginInstance {
            id: key::encode(&name, &instance_id, true),
            name,
            instance_id,
            enabled,
            group_path: path.clone(),
            options: Some(value.clone()),
        });
    }
}

fn group_meta(group: &Map<String, Value>) -> Map<String, Value> {
    group
        .iter()
        .filter(|(k, _)| key::is_meta(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
