//! Entry key codec: `[~]name[:instanceId]`.
//!
//! A leading `~` marks the instance disabled. The last `:`-separated segment is
//! the instance id, unless it is the literal `group`: that word is reserved for
//! group nodes, so `foo:group` decodes to name `foo:group` with the default
//! instance. Encoding an instance id of `group` therefore does not round-trip.

use serde::{Deserialize, Serialize};

/// Prefix of keys holding a nested group.
pub const GROUP_PREFIX: &str = "group:";
/// Prefix of metadata keys; never an instance or a group.
pub const META_PREFIX: char = '$';
/// Metadata field naming a group for display.
pub const LABEL_FIELD: &str = "$label";
/// Leading marker of a disabled instance.
pub const DISABLED_MARKER: char = '~';
/// Separates the name from the instance id.
pub const SEPARATOR: char = ':';
/// Instance id meaning "no suffix".
pub const DEFAULT_INSTANCE: &str = "default";
/// Final segment that is never read as an instance id.
pub const RESERVED_SEGMENT: &str = "group";

/// The three attributes encoded in an entry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryKey {
    pub name: String,
    pub instance_id: String,
    pub enabled: bool,
}

impl EntryKey {
    pub fn new(name: impl Into<String>, instance_id: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            instance_id: instance_id.into(),
            enabled,
        }
    }

    pub fn parse(key: &str) -> Self {
        decode(key)
    }

    pub fn encode(&self) -> String {
        encode(&self.name, &self.instance_id, self.enabled)
    }

    /// `name[:instanceId]` without the disable marker.
    pub fn id(&self) -> String {
        encode(&self.name, &self.instance_id, true)
    }

    /// True when the instance id collides with the reserved group segment and
    /// would decode differently after encoding.
    pub fn is_reserved_instance(&self) -> bool {
        self.instance_id == RESERVED_SEGMENT
    }
}

/// Split a raw key into name, instance id and enabled flag. Never fails.
pub fn decode(key: &str) -> EntryKey {
    let (enabled, rest) = match key.strip_prefix(DISABLED_MARKER) {
        Some(rest) => (false, rest),
        None => (true, key),
    };

    match rest.rsplit_once(SEPARATOR) {
        Some((name, instance_id)) if instance_id != RESERVED_SEGMENT => {
            EntryKey::new(name, instance_id, enabled)
        }
        _ => EntryKey::new(rest, DEFAULT_INSTANCE, enabled),
    }
}

/// Build the key for an instance.
pub fn encode(name: &str, instance_id: &str, enabled: bool) -> String {
    let mut key = String::with_capacity(name.len() + instance_id.len() + 2);
    if !enabled {
        key.push(DISABLED_MARKER);
    }
    key.push_str(name);
    if instance_id != DEFAULT_INSTANCE {
        key.push(SEPARATOR);
        key.push_str(instance_id);
    }
    key
}

/// The group id carried by a `group:<id>` key, if it is one.
pub fn group_id(key: &str) -> Option<&str> {
    key.strip_prefix(GROUP_PREFIX)
}

/// Key of the group node for `id`.
pub fn group_key(id: &str) -> String {
    format!("{GROUP_PREFIX}{id}")
}

pub fn is_meta(key: &str) -> bool {
    key.starts_with(META_PREFIX)
}
