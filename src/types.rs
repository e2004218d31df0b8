//! Value types shared by the flattener, differ, merger and presentation adapter.
//!
//! Everything here is plain data. Entries serialize with camelCase field names
//! so a UI collaborator can round-trip a decided entry list as JSON.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::key::{self, LABEL_FIELD};

/// Classification of one entry after pairing the two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Present only in the imported tree.
    Added,
    /// Present only in the current tree.
    Deleted,
    /// Present in both, with scalar-compatible field changes.
    Modified,
    /// Present in both, with at least one field changing container shape.
    Conflict,
    /// Present in both with identical options.
    Unchanged,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Added => "added",
            Status::Deleted => "deleted",
            Status::Modified => "modified",
            Status::Conflict => "conflict",
            Status::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally supplied instruction for an entry. The core never infers one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Keep,
    Replace,
    Merge,
    Smart,
    Add,
    Skip,
    Remove,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Keep => "keep",
            Decision::Replace => "replace",
            Decision::Merge => "merge",
            Decision::Smart => "smart",
            Decision::Add => "add",
            Decision::Skip => "skip",
            Decision::Remove => "remove",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one option field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    /// Absent on the current side.
    Added,
    /// Absent on the imported side.
    Removed,
    Modified,
    Unchanged,
}

/// Per-field choice, honoured only by field-level merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldDecision {
    Keep,
    UseImported,
}

/// Which side wins a leaf conflict during a smart merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Local,
    Import,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Local => "local",
            Priority::Import => "import",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse change category shown by a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeClass {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl fmt::Display for ChangeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeClass::Added => "added",
            ChangeClass::Removed => "removed",
            ChangeClass::Modified => "modified",
            ChangeClass::Unchanged => "unchanged",
        })
    }
}

/// How [`combine`](crate::value::combine) folds an imported value into a current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Overlay imported top-level keys on current.
    Shallow,
    /// Recursive [`deep_merge`](crate::value::deep_merge).
    Deep,
    /// Copy only the named top-level fields from imported.
    FieldSelect(Vec<String>),
}

/// One level of grouping. `id` is the raw key suffix after `group:`; `meta`
/// holds the group node's `$`-prefixed fields (such as `$label`).
///
/// Deserializes from `{"id", "meta"}` or from a bare group name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SegmentRepr")]
pub struct GroupSegment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Name(String),
    Full {
        id: String,
        #[serde(default)]
        meta: Map<String, Value>,
    },
}

impl From<SegmentRepr> for GroupSegment {
    fn from(repr: SegmentRepr) -> Self {
        match repr {
            SegmentRepr::Name(id) => GroupSegment::new(id),
            SegmentRepr::Full { id, meta } => GroupSegment { id, meta },
        }
    }
}

impl GroupSegment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            meta: Map::new(),
        }
    }

    /// The `$label` field, when it is a non-empty string.
    pub fn label(&self) -> Option<&str> {
        self.meta
            .get(LABEL_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Display name: the label if set, else the raw id.
    pub fn name(&self) -> &str {
        self.label().unwrap_or(&self.id)
    }
}

/// Join a group path into its `a/b/c` display form. `None` when ungrouped.
pub fn display_group(path: &[GroupSegment]) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let names: Vec<&str> = path.iter().map(GroupSegment::name).collect();
    Some(names.join("/"))
}

/// A field that is present deserializes to `Some`, even when it is `null`.
/// Missing fields fall back to `None` through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A single addressable instance produced by flattening one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInstance {
    /// `name[:instanceId]` without the disable marker. Display only.
    pub id: String,
    pub name: String,
    pub instance_id: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_path: Vec<GroupSegment>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub options: Option<Value>,
}

/// One option field compared across the two sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_value: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub imported_value: Option<Value>,
    pub status: FieldStatus,
    #[serde(default)]
    pub decision: Option<FieldDecision>,
}

/// The unit carried from the differ, through the decision step, into the merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub id: String,
    pub name: String,
    pub instance_id: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_enabled: Option<bool>,
    /// Overrides `enabled` when the merged key is encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_enabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub current: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub imported: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_path: Vec<GroupSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imported_group_path: Vec<GroupSegment>,
    pub status: Status,
    #[serde(default)]
    pub decision: Option<Decision>,
    #[serde(default)]
    pub field_diffs: Vec<FieldDiff>,
    #[serde(default)]
    pub advanced_mode: bool,
}

impl DiffEntry {
    /// Builder-style decision setter.
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Set the per-field decision for `field`. Returns `false` if no such field diff.
    pub fn set_field_decision(&mut self, field: &str, decision: FieldDecision) -> bool {
        match self.field_diffs.iter_mut().find(|d| d.field == field) {
            Some(diff) => {
                diff.decision = Some(decision);
                true
            }
            None => false,
        }
    }

    pub fn effective_enabled(&self) -> bool {
        self.final_enabled.unwrap_or(self.enabled)
    }

    /// The key this entry is written under in a merged tree.
    pub fn key(&self) -> String {
        key::encode(&self.name, &self.instance_id, self.effective_enabled())
    }

    pub fn original_group(&self) -> Option<String> {
        display_group(&self.group_path)
    }

    pub fn imported_group(&self) -> Option<String> {
        display_group(&self.imported_group_path)
    }
}

/// Where to look for settings files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// A file-backed reconcile operation, independent of any CLI framework.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Print a per-entry summary of the differences.
    Diff { current: PathBuf, imported: PathBuf },
    /// Diff, decide every entry by policy, and merge.
    Merge {
        current: PathBuf,
        imported: PathBuf,
        output: Option<PathBuf>,
    },
    /// Merge an already-decided entry list (JSON).
    Apply {
        entries: PathBuf,
        output: Option<PathBuf>,
    },
    /// Render the display tree for a decided entry list (JSON).
    Show { entries: PathBuf },
    /// Generate a commented settings file.
    Template { output: Option<PathBuf> },
}
