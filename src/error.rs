use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Decision, Status};

#[derive(Debug, Error)]
pub enum HereditasError {
    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in settings file")]
    UnknownKeys(Vec<HereditasError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("{path} has no configuration tree at its root")]
    NotATree { path: PathBuf },

    #[error("Unsupported file type for {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Decision '{decision}' is not valid for {status} entry '{id}'")]
    InvalidDecision {
        id: String,
        status: Status,
        decision: Decision,
    },

    #[error("Entry '{id}' is {status} but has no decision")]
    UndecidedEntry { id: String, status: Status },

    #[error("Entry '{id}' uses the reserved instance id 'group'")]
    ReservedInstanceId { id: String },

    #[error("Several entries merge into '{key}' in {group}")]
    DuplicateKey { key: String, group: String },

    #[error("Entry list failed validation")]
    InvalidEntries(Vec<HereditasError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_formats_correctly() {
        let err = HereditasError::UnknownKey {
            key: "priorty".into(),
            path: "/home/user/.config/hereditas/hereditas.toml".into(),
            line: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("priorty"));
        assert!(msg.contains("hereditas.toml"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn invalid_decision_names_everything() {
        let err = HereditasError::InvalidDecision {
            id: "foo:2".into(),
            status: Status::Added,
            decision: Decision::Keep,
        };
        assert_eq!(
            err.to_string(),
            "Decision 'keep' is not valid for added entry 'foo:2'"
        );
    }

    #[test]
    fn undecided_entry_formats() {
        let err = HereditasError::UndecidedEntry {
            id: "foo".into(),
            status: Status::Conflict,
        };
        assert!(err.to_string().contains("conflict"));
    }
}
