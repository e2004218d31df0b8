//! The [`Reconciler`] facade: resolved settings applied to the core functions,
//! plus the file-backed [`Action`] handlers.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::diff;
use crate::display;
use crate::error::HereditasError;
use crate::file;
use crate::merge;
use crate::ops::{self, ReconcileResult};
use crate::settings::Settings;
use crate::types::{Action, DiffEntry};
use crate::validate;

/// Diffs and merges configuration trees under one set of [`Settings`].
#[derive(Debug, Clone)]
pub struct Reconciler {
    settings: Settings,
}

impl Reconciler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Diff two trees. With `advanced` set every entry is put in advanced mode.
    pub fn diff(&self, current: &Map<String, Value>, imported: &Map<String, Value>) -> Vec<DiffEntry> {
        let mut entries = diff::diff(current, imported);
        if self.settings.advanced {
            for entry in &mut entries {
                entry.advanced_mode = true;
            }
        }
        entries
    }

    /// Decide every undecided entry from the configured policy.
    pub fn apply_policy(&self, entries: &mut [DiffEntry]) {
        self.settings.policy.apply(entries);
    }

    /// Merge decided entries. In strict mode the entries are validated first
    /// and nothing is merged if any fails.
    pub fn merge(&self, entries: &[DiffEntry]) -> Result<Map<String, Value>, HereditasError> {
        if self.settings.strict {
            validate::validate_decisions(entries)?;
        }
        Ok(merge::merge(entries, self.settings.priority))
    }

    pub fn display(&self, entries: &[DiffEntry]) -> Map<String, Value> {
        display::build_display_tree(entries)
    }

    /// Handle an [`Action`] and print the result to stdout.
    pub fn handle_and_print(&self, action: &Action) -> Result<(), HereditasError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle an [`Action`] (diff / merge / apply / show / template).
    pub fn handle(&self, action: &Action) -> Result<ReconcileResult, HereditasError> {
        debug!(?action, "handling action");
        match action {
            Action::Diff { current, imported } => {
                let mut entries = self.diff_files(current, imported)?;
                self.apply_policy(&mut entries);
                Ok(ReconcileResult::Summary {
                    rows: ops::summarize(&entries),
                })
            }
            Action::Merge {
                current,
                imported,
                output,
            } => {
                let mut entries = self.diff_files(current, imported)?;
                self.apply_policy(&mut entries);
                self.merge_to(&entries, output.as_deref())
            }
            Action::Apply { entries, output } => {
                let entries = file::load_entries(entries)?;
                self.merge_to(&entries, output.as_deref())
            }
            Action::Show { entries } => {
                let entries = file::load_entries(entries)?;
                Ok(ReconcileResult::Tree(self.display(&entries)))
            }
            Action::Template { output } => {
                let template = ops::generate_template::<Settings>();
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent()
                            && !parent.as_os_str().is_empty()
                        {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                HereditasError::IoError {
                                    path: parent.to_path_buf(),
                                    source: e,
                                }
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| HereditasError::IoError {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ReconcileResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ReconcileResult::Template(template)),
                }
            }
        }
    }

    fn diff_files(&self, current: &Path, imported: &Path) -> Result<Vec<DiffEntry>, HereditasError> {
        let current = file::load_tree(current)?;
        let imported = file::load_tree(imported)?;
        Ok(self.diff(&current, &imported))
    }

    fn merge_to(
        &self,
        entries: &[DiffEntry],
        output: Option<&Path>,
    ) -> Result<ReconcileResult, HereditasError> {
        let merged = self.merge(entries)?;
        match output {
            Some(path) => {
                file::write_tree(path, &merged)?;
                let written = entries
                    .iter()
                    .filter(|e| merge::should_include(e.status, e.decision))
                    .count();
                Ok(ReconcileResult::TreeWritten {
                    path: path.to_path_buf(),
                    entries: written,
                })
            }
            None => Ok(ReconcileResult::Tree(merged)),
        }
    }
}
