//! Boundary checks.
//!
//! [`validate_decisions`] checks a decided entry list before it is merged: each
//! decision must make sense for its entry's status, no entry may use the
//! reserved instance id, and no two included entries may land on the same key.
//! [`validate_unknown_keys`] rejects settings files with keys the settings
//! struct does not know, reporting file path and best-effort line number.

use std::collections::HashSet;
use std::path::Path;

use confique::Config;
use serde::Deserialize;

use crate::error::HereditasError;
use crate::key::RESERVED_SEGMENT;
use crate::merge::should_include;
use crate::types::{Decision, DiffEntry, Status};

/// Decisions a caller may attach to an entry of `status`. Unchanged entries
/// may also stay undecided.
pub fn allowed_decisions(status: Status) -> &'static [Decision] {
    match status {
        Status::Added => &[Decision::Add, Decision::Skip],
        Status::Deleted => &[Decision::Keep, Decision::Remove],
        Status::Modified | Status::Conflict => &[
            Decision::Keep,
            Decision::Replace,
            Decision::Merge,
            Decision::Smart,
            Decision::Skip,
        ],
        Status::Unchanged => &[Decision::Keep],
    }
}

/// Check every entry and collect all failures into
/// [`HereditasError::InvalidEntries`].
pub fn validate_decisions(entries: &[DiffEntry]) -> Result<(), HereditasError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<(Vec<&str>, String)> = HashSet::new();

    for entry in entries {
        match entry.decision {
            None if entry.status != Status::Unchanged => {
                errors.push(HereditasError::UndecidedEntry {
                    id: entry.id.clone(),
                    status: entry.status,
                });
            }
            Some(decision) if !allowed_decisions(entry.status).contains(&decision) => {
                errors.push(HereditasError::InvalidDecision {
                    id: entry.id.clone(),
                    status: entry.status,
                    decision,
                });
            }
            _ => {}
        }

        if entry.instance_id == RESERVED_SEGMENT {
            errors.push(HereditasError::ReservedInstanceId {
                id: entry.id.clone(),
            });
        }

        if should_include(entry.status, entry.decision) {
            let path: Vec<&str> = entry.group_path.iter().map(|s| s.id.as_str()).collect();
            let key = entry.key();
            if !seen.insert((path, key.clone())) {
                errors.push(HereditasError::DuplicateKey {
                    key,
                    group: entry.original_group().unwrap_or_else(|| "the root".into()),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(HereditasError::InvalidEntries(errors))
    }
}

/// Validate that a TOML settings file contains no keys unknown to `C`.
///
/// Deserializes into `C::Layer` (all fields optional) through `serde_ignored`;
/// any key the layer does not consume is unknown.
pub fn validate_unknown_keys<C: Config>(content: &str, path: &Path) -> Result<(), HereditasError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut unknown_keys: Vec<String> = Vec::new();

    let deserializer = toml::Deserializer::new(content);
    let _layer: C::Layer = serde_ignored::deserialize(deserializer, |ignored| {
        unknown_keys.push(ignored.to_string());
    })
    .map_err(|e| HereditasError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if unknown_keys.is_empty() {
        return Ok(());
    }

    let errors = unknown_keys
        .into_iter()
        .map(|key| HereditasError::UnknownKey {
            line: find_key_line(content, &key),
            key,
            path: path.to_path_buf(),
        })
        .collect();

    Err(HereditasError::UnknownKeys(errors))
}

/// 1-indexed line of a dotted key, tracking `[section]` headers. Returns 0
/// when the key cannot be located. Quoted keys and inline tables are not handled.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (section, leaf),
        None => ("", dotted_key),
    };
    let mut current = String::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[')
            && !header.starts_with('[')
        {
            current = header
                .trim_end_matches(']')
                .split('.')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(".");
            continue;
        }
        if current == section
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
