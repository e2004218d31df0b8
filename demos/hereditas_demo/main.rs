//! # hereditas demo application
//!
//! A small CLI that reconciles two plugin configuration trees with
//! [hereditas](https://docs.rs/hereditas). Sample trees live next to this
//! file.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example hereditas_demo -- diff demos/hereditas_demo/current.json demos/hereditas_demo/imported.toml
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                    |
//! |-------------------------|-----------------------------------------------------------------------|
//! | Diff summary            | `diff current.json imported.toml`                                     |
//! | Policy merge to stdout  | `merge current.json imported.toml`                                    |
//! | Merge to a file         | `merge current.json imported.toml -o merged.toml`                     |
//! | Import priority         | `--priority import merge current.json imported.toml`                  |
//! | Advanced mode           | `--advanced merge current.json imported.toml`                         |
//! | Settings file           | Create `hereditas.toml` in cwd (see `template`)                       |
//! | Env var override        | `HEREDITAS__POLICY__CONFLICT=replace ... merge current.json imported.toml` |
//! | Decided entry list      | `apply entries.json` / `show entries.json`                            |
//! | Settings template       | `template`                                                            |
//! | Logging                 | `HEREDITAS_LOG=debug ...`                                             |

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hereditas::{Hereditas, ReconcileArgs};

/// hereditas demo: diff and merge plugin configuration trees.
#[derive(Parser, Debug)]
#[command(name = "hereditas-demo")]
struct Cli {
    #[command(flatten)]
    reconcile: ReconcileArgs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HEREDITAS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        if let hereditas::HereditasError::InvalidEntries(errors)
        | hereditas::HereditasError::UnknownKeys(errors) = &e
        {
            for err in errors {
                eprintln!("  {err}");
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), hereditas::HereditasError> {
    let reconciler = cli.reconcile.configure(Hereditas::builder()).build()?;
    let action = cli.reconcile.into_action();
    reconciler.handle_and_print(&action)
}
