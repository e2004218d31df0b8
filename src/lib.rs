//! Reconcile two hierarchical plugin configuration trees.
//!
//! A bot framework stores its plugin configuration as a tree: keys name
//! plugin instances (`name`, `name:instance`, `~name` when disabled) and
//! `group:<id>` keys nest further trees. Hereditas flattens two such trees
//! (the one in use and one to import), pairs their instances by name,
//! classifies every difference, and rebuilds a single grouped tree from the
//! decisions a caller attaches to each entry.
//!
//! ```ignore
//! let reconciler = Hereditas::builder().build()?;
//! let mut entries = reconciler.diff(&current, &imported);
//! reconciler.apply_policy(&mut entries);
//! let merged = reconciler.merge(&entries)?;
//! ```
//!
//! # Pipeline
//!
//! ```text
//! tree ──flatten──▶ instances ─┐
//!                              ├─diff──▶ entries ──decide──▶ merge ──▶ tree
//! tree ──flatten──▶ instances ─┘                  └────────▶ display tree
//! ```
//!
//! - [`flatten`] walks one tree into [`PluginInstance`]s, recording each
//!   instance's group path and skipping `$`-prefixed metadata keys.
//! - [`diff`] pairs the two instance lists by plugin name and produces one
//!   [`DiffEntry`] per name, with a [`Status`] and per-field [`FieldDiff`]s.
//! - Decisions are external input. A UI sets them, or
//!   [`Reconciler::apply_policy`] fills them from the configured policy.
//! - [`merge`] rebuilds the tree. `replace`, `merge` (field by field) and
//!   `smart` (recursive, ties broken by [`Priority`]) decide each entry's
//!   options; `skip`, `remove` and undecided changes leave the entry out.
//! - [`build_display_tree`] and [`classify`] give a UI a flat view with
//!   status tags.
//!
//! The core functions are total: they never fail and never touch the file
//! system. Degenerate input resolves by fallback.
//!
//! # Settings
//!
//! [`Settings`] is a confique struct: merge priority, strict validation,
//! advanced mode, and the decision policy per status. It resolves through
//! layers:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Settings files        hereditas.toml in each search path, later wins
//!        ↑ overridden by
//! Environment vars      HEREDITAS__KEY, double underscore for nesting
//!        ↑ overridden by
//! Overrides             .override_setting() / CLI flags
//! ```
//!
//! # Strict mode
//!
//! With `strict = true` (the default), [`Reconciler::merge`] refuses entry
//! lists whose decisions do not fit their status, that use the reserved
//! instance id `group`, or whose included entries would collide on one key.
//! All failures are reported together in [`HereditasError::InvalidEntries`].
//! Unknown keys in settings files are rejected with file and line.
//!
//! # CLI
//!
//! The `cli` module, behind the `clap` feature (on by default), provides
//! [`ReconcileArgs`] with `diff`, `merge`, `apply`, `show` and `template`
//! subcommands. Without clap, build an [`Action`] directly and pass it to
//! [`Reconciler::handle`].

pub mod error;
pub mod key;
pub mod types;
pub mod value;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod diff;
mod display;
mod env;
mod file;
mod flatten;
mod merge;
mod ops;
mod reconcile;
mod settings;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Hereditas, HereditasBuilder};
#[cfg(feature = "clap")]
pub use cli::{ReconcileArgs, ReconcileSubcommand};
pub use diff::{build_field_diffs, determine_status, diff};
pub use display::{DISPLAY_GROUP_SUFFIX, META_FIELD, build_display_tree, classify};
pub use error::HereditasError;
pub use file::{TreeFormat, load_entries, load_tree, write_tree};
pub use flatten::flatten;
pub use merge::{merge, merge_by_fields, resolve_options, should_include, smart_merge};
pub use ops::{ReconcileResult, SummaryRow, summarize};
pub use reconcile::Reconciler;
pub use settings::{PolicySettings, Settings};
pub use types::{
    Action, ChangeClass, Decision, DiffEntry, FieldDecision, FieldDiff, FieldStatus,
    GroupSegment, MergeStrategy, PluginInstance, Priority, SearchPath, Status,
};
pub use validate::{allowed_decisions, validate_decisions};
