//! Clap adapter.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Provides
//! [`ReconcileArgs`] and [`ReconcileSubcommand`] for embedding in a clap
//! `#[derive(Parser)]` struct. The only bridge to the core is
//! [`ReconcileArgs::into_action()`], which yields a framework-agnostic
//! [`Action`](crate::Action) for [`Reconciler::handle()`](crate::Reconciler::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::builder::HereditasBuilder;
use crate::types::{Action, Priority};

/// Clap-derived args for the reconcile subcommands.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     reconcile: ReconcileArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Side that wins leaf conflicts in a smart merge.
    #[arg(long, global = true, value_enum)]
    pub priority: Option<Priority>,

    /// Merge every entry field by field.
    #[arg(long, global = true)]
    pub advanced: bool,

    /// Merge entries even when their decisions do not fit their status.
    #[arg(long, global = true)]
    pub lenient: bool,

    #[command(subcommand)]
    pub action: ReconcileSubcommand,
}

/// Available reconcile subcommands.
#[derive(Debug, Subcommand)]
pub enum ReconcileSubcommand {
    /// Summarize the differences between two trees.
    Diff {
        /// Tree currently in use (.json or .toml).
        current: PathBuf,
        /// Tree to import.
        imported: PathBuf,
    },
    /// Diff two trees, decide by policy, and merge.
    Merge {
        current: PathBuf,
        imported: PathBuf,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge a decided entry list (JSON).
    Apply {
        entries: PathBuf,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the display tree for an entry list (JSON).
    Show { entries: PathBuf },
    /// Generate a commented settings file.
    Template {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl ReconcileArgs {
    /// Apply the global flags as setting overrides. Unset flags leave the
    /// lower layers alone.
    pub fn configure(&self, builder: HereditasBuilder) -> HereditasBuilder {
        builder
            .override_setting("priority", self.priority.map(Priority::as_str))
            .override_setting("advanced", self.advanced.then_some(true))
            .override_setting("strict", self.lenient.then_some(false))
    }

    /// Convert clap-parsed args into a framework-agnostic [`Action`].
    pub fn into_action(self) -> Action {
        match self.action {
            ReconcileSubcommand::Diff { current, imported } => Action::Diff { current, imported },
            ReconcileSubcommand::Merge {
                current,
                imported,
                output,
            } => Action::Merge {
                current,
                imported,
                output,
            },
            ReconcileSubcommand::Apply { entries, output } => Action::Apply { entries, output },
            ReconcileSubcommand::Show { entries } => Action::Show { entries },
            ReconcileSubcommand::Template { output } => Action::Template { output },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Hereditas;
    use clap::Parser;
    use tempfile::TempDir;

    /// Wrapper so we can use `try_parse_from` on the args.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        reconcile: ReconcileArgs,
    }

    fn parse(args: &[&str]) -> ReconcileArgs {
        TestCli::try_parse_from(args).unwrap().reconcile
    }

    #[test]
    fn parse_diff() {
        let action = parse(&["test", "diff", "a.json", "b.toml"]).into_action();
        assert_eq!(
            action,
            Action::Diff {
                current: "a.json".into(),
                imported: "b.toml".into(),
            }
        );
    }

    #[test]
    fn parse_merge_with_output() {
        let action = parse(&["test", "merge", "a.json", "b.json", "-o", "out.json"]).into_action();
        assert_eq!(
            action,
            Action::Merge {
                current: "a.json".into(),
                imported: "b.json".into(),
                output: Some("out.json".into()),
            }
        );
    }

    #[test]
    fn parse_apply_long_output() {
        let action = parse(&["test", "apply", "e.json", "--output", "/tmp/k.toml"]).into_action();
        assert_eq!(
            action,
            Action::Apply {
                entries: "e.json".into(),
                output: Some("/tmp/k.toml".into()),
            }
        );
    }

    #[test]
    fn parse_show() {
        let action = parse(&["test", "show", "e.json"]).into_action();
        assert_eq!(
            action,
            Action::Show {
                entries: "e.json".into()
            }
        );
    }

    #[test]
    fn parse_template() {
        let action = parse(&["test", "template"]).into_action();
        assert_eq!(action, Action::Template { output: None });
    }

    #[test]
    fn missing_subcommand_errors() {
        assert!(TestCli::try_parse_from(["test"]).is_err());
        assert!(TestCli::try_parse_from(["test", "nope"]).is_err());
    }

    #[test]
    fn merge_requires_both_trees() {
        assert!(TestCli::try_parse_from(["test", "merge", "a.json"]).is_err());
    }

    #[test]
    fn global_flags_before_or_after_subcommand() {
        let args = parse(&["test", "--priority", "import", "diff", "a.json", "b.json"]);
        assert_eq!(args.priority, Some(Priority::Import));
        let args = parse(&["test", "diff", "a.json", "b.json", "--advanced", "--lenient"]);
        assert!(args.advanced);
        assert!(args.lenient);
        assert_eq!(args.priority, None);
    }

    #[test]
    fn bad_priority_errors() {
        let result = TestCli::try_parse_from(["test", "--priority", "remote", "template"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_settings() {
        let dir = TempDir::new().unwrap();
        let args = parse(&["test", "--priority", "import", "--lenient", "template"]);
        let settings = args
            .configure(
                Hereditas::builder()
                    .search_paths(vec![crate::types::SearchPath::Path(
                        dir.path().to_path_buf(),
                    )])
                    .no_env(),
            )
            .load_settings()
            .unwrap();
        assert_eq!(settings.priority, Priority::Import);
        assert!(!settings.strict);
        assert!(!settings.advanced);
    }
}
