//! Reconcile operations: summaries, settings template, and result types.
//!
//! Provides the logic behind `diff`, `merge`, `apply`, `show` and `template`,
//! and the `ReconcileResult` enum that callers use to display results.

use std::fmt;
use std::path::PathBuf;

use confique::Config;
use serde_json::{Map, Value};

use crate::display::classify;
use crate::types::{ChangeClass, Decision, DiffEntry, FieldStatus, Status};

/// Result of a reconcile operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileResult {
    /// One row per diff entry.
    Summary { rows: Vec<SummaryRow> },
    /// A merged or display tree, printed as JSON.
    Tree(Map<String, Value>),
    /// Confirmation that a merged tree was written to a file.
    TreeWritten { path: PathBuf, entries: usize },
    /// A generated settings template.
    Template(String),
    /// Confirmation that a settings template was written to a file.
    TemplateWritten { path: PathBuf },
}

/// Condensed view of one [`DiffEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub id: String,
    pub group: Option<String>,
    pub status: Status,
    pub decision: Option<Decision>,
    pub change: ChangeClass,
    /// Fields whose status is not unchanged, in diff order.
    pub fields: Vec<(String, FieldStatus)>,
}

impl SummaryRow {
    fn marker(&self) -> char {
        match self.status {
            Status::Added => '+',
            Status::Deleted => '-',
            Status::Modified => '~',
            Status::Conflict => '!',
            Status::Unchanged => '=',
        }
    }
}

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.marker(), self.id)?;
        if let Some(group) = &self.group {
            write!(f, " ({group})")?;
        }
        write!(f, " [{}", self.status)?;
        if let Some(decision) = self.decision {
            write!(f, " -> {decision}, {}", self.change)?;
        }
        write!(f, "]")?;
        for (i, (field, status)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            let sign = match status {
                FieldStatus::Added => "+",
                FieldStatus::Removed => "-",
                FieldStatus::Modified => "~",
                FieldStatus::Unchanged => "",
            };
            write!(f, "{sep}{sign}{field}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ReconcileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileResult::Summary { rows } => {
                if rows.is_empty() {
                    return write!(f, "No plugin instances");
                }
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{row}")?;
                }
                Ok(())
            }
            ReconcileResult::Tree(tree) => {
                let json = serde_json::to_string_pretty(tree).map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
            ReconcileResult::TreeWritten { path, entries } => {
                write!(f, "Merged {entries} entries into {}", path.display())
            }
            ReconcileResult::Template(t) => write!(f, "{t}"),
            ReconcileResult::TemplateWritten { path } => {
                write!(f, "Settings template written to {}", path.display())
            }
        }
    }
}

/// Summarize a diff, one row per entry, in entry order.
pub fn summarize(entries: &[DiffEntry]) -> Vec<SummaryRow> {
    entries
        .iter()
        .map(|entry| SummaryRow {
            id: entry.id.clone(),
            group: entry.original_group(),
            status: entry.status,
            decision: entry.decision,
            change: classify(entry.status, entry.decision),
            fields: entry
                .field_diffs
                .iter()
                .filter(|d| d.status != FieldStatus::Unchanged)
                .map(|d| (d.field.clone(), d.status))
                .collect(),
        })
        .collect()
}

/// Generate a commented TOML template from the settings struct's doc comments.
pub fn generate_template<C: Config>() -> String {
    confique::toml::template::<C>(confique::toml::FormatOptions::default())
}
