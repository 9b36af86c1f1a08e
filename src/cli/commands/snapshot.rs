//! `ergo snapshot` command - JSON snapshot of the session

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::session::flush_active;
use crate::cli::helpers::{self, open_workspace, Active};
use crate::cli::GlobalOpts;
use crate::core::autosave::AutoSave;
use crate::core::session::SessionContext;
use crate::core::Config;
use crate::persist::snapshot;

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Write the active session as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Make a snapshot the active session (the current one is saved first)
    Import {
        file: PathBuf,
    },
}

pub fn run(cmd: SnapshotCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SnapshotCommands::Export { output } => {
            let active = Active::open(global)?;
            let doc = snapshot::export(&active.ctx.meta, &active.ctx.store);
            let json = snapshot::to_json(&doc).map_err(|e| miette::miette!("{}", e))?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).into_diagnostic()?;
                    helpers::done(
                        global,
                        format!("Snapshot written to {}", style(path.display()).cyan()),
                    );
                }
                None => println!("{}", json),
            }
            Ok(())
        }
        SnapshotCommands::Import { file } => {
            let workspace = open_workspace(global)?;
            let config = Config::for_workspace(&workspace);

            let text = std::fs::read_to_string(&file).into_diagnostic()?;
            let doc = snapshot::from_json(&text).map_err(|e| miette::miette!("{}", e))?;
            let outcome = snapshot::import(&doc).map_err(|e| miette::miette!("{}", e))?;
            for warning in &outcome.warnings {
                eprintln!("{} {}", style("!").yellow(), warning);
            }

            flush_active(&workspace, &config, global)?;
            let ctx = SessionContext::resume(
                outcome.meta,
                outcome.store,
                AutoSave::new(config.autosave_secs()),
            );
            workspace
                .save_draft(&ctx)
                .map_err(|e| miette::miette!("{}", e))?;
            helpers::done(
                global,
                format!("Imported session {}", style(&ctx.meta.session_id).cyan()),
            );
            Ok(())
        }
    }
}
