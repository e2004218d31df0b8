//! Reconciler settings and their layered resolution.
//!
//! Operates on pre-loaded data ([`SettingsInput`]) with no I/O. Layers, lowest
//! priority first:
//!
//! 1. Compiled defaults (`#[config(default = ...)]`)
//! 2. Settings files, in search order (later overrides earlier)
//! 3. `HEREDITAS__*` environment variables
//! 4. Programmatic overrides from the builder
//!
//! Every layer is sparse and deep-merged onto the one below.

use std::path::PathBuf;

use confique::Config;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::env;
use crate::error::HereditasError;
use crate::types::{Decision, DiffEntry, Priority, Status};
use crate::validate;
use crate::value::deep_merge;

/// Settings for diffing and merging.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Side that wins leaf conflicts in a smart merge: "local" or "import".
    #[config(default = "local")]
    pub priority: Priority,

    /// Refuse to merge entry lists whose decisions do not fit their status.
    #[config(default = true)]
    pub strict: bool,

    /// Merge every entry field by field, whatever its decision.
    #[config(default = false)]
    pub advanced: bool,

    /// Decisions given to undecided entries by the policy step.
    #[config(nested)]
    pub policy: PolicySettings,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PolicySettings {
    /// Decision for entries only present in the imported tree.
    #[config(default = "add")]
    pub added: Decision,

    /// Decision for entries only present in the current tree.
    #[config(default = "keep")]
    pub deleted: Decision,

    /// Decision for entries whose fields changed.
    #[config(default = "smart")]
    pub modified: Decision,

    /// Decision for entries whose fields changed shape.
    #[config(default = "keep")]
    pub conflict: Decision,
}

impl PolicySettings {
    /// Policy decision for `status`. Unchanged entries get none.
    pub fn decision_for(&self, status: Status) -> Option<Decision> {
        match status {
            Status::Added => Some(self.added),
            Status::Deleted => Some(self.deleted),
            Status::Modified => Some(self.modified),
            Status::Conflict => Some(self.conflict),
            Status::Unchanged => None,
        }
    }

    /// Fill in every undecided entry. Existing decisions are left alone.
    pub fn apply(&self, entries: &mut [DiffEntry]) {
        let mut decided = 0usize;
        for entry in entries.iter_mut().filter(|e| e.decision.is_none()) {
            entry.decision = self.decision_for(entry.status);
            decided += usize::from(entry.decision.is_some());
        }
        debug!(decided, "applied decision policy");
    }
}

/// All pre-loaded data needed to resolve settings.
pub struct SettingsInput {
    /// Settings file contents, lowest priority first.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix (e.g. `"HEREDITAS"`). `None` disables env loading.
    pub env_prefix: Option<String>,
    /// Highest-priority layer, already nested.
    pub overrides: Map<String, Value>,
    /// Reject unknown keys in settings files.
    pub reject_unknown: bool,
}

/// Resolve settings from pre-loaded inputs.
pub fn resolve_settings(input: SettingsInput) -> Result<Settings, HereditasError> {
    let mut merged = Value::Object(Map::new());

    for (path, content) in &input.files {
        if input.reject_unknown {
            validate::validate_unknown_keys::<Settings>(content, path)?;
        }
        let layer: Value = toml::from_str(content).map_err(|e| HereditasError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        merged = deep_merge(merged, layer);
    }

    if let Some(prefix) = &input.env_prefix {
        let env_layer = env::env_to_map(prefix, input.env_vars);
        merged = deep_merge(merged, Value::Object(env_layer));
    }

    if !input.overrides.is_empty() {
        merged = deep_merge(merged, Value::Object(input.overrides));
    }

    let layer: <Settings as Config>::Layer =
        serde_json::from_value(merged).map_err(|e| HereditasError::InvalidValue {
            key: "<settings>".into(),
            reason: e.to_string(),
        })?;

    let settings = Settings::builder().preloaded(layer).load()?;
    debug!(?settings, "resolved settings");
    Ok(settings)
}
