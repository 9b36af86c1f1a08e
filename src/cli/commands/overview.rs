//! `ergo overview` command - Workplace overview (사업장개요)

use clap::Subcommand;
use miette::Result;

use crate::cli::helpers::{self, pairs_table, print_table, Active};
use crate::cli::GlobalOpts;
use crate::core::key::ValueKey;
use crate::entities::overview;

#[derive(Subcommand, Debug)]
pub enum OverviewCommands {
    /// Show the overview
    Show,

    /// Set one overview field
    Set {
        /// Field (사업장명, 소재지, 업종, 예비조사, 본조사, 수행기관, 성명 or English name)
        field: String,

        /// New value
        value: String,
    },
}

pub fn run(cmd: OverviewCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OverviewCommands::Show => {
            let active = Active::open(global)?;
            let rows = overview::rows(&active.ctx.store);
            print_table(&pairs_table(&rows), global)
        }
        OverviewCommands::Set { field, value } => {
            let mut active = Active::open(global)?;
            let id = overview::parse_field(&field)
                .ok_or_else(|| miette::miette!("unknown overview field '{}'", field))?;
            let label = overview::label(&id);
            active
                .ctx
                .store
                .set_scalar(ValueKey::global(id), value.trim());
            active.commit(global)?;
            helpers::done(global, format!("{} = {}", label, value.trim()));
            Ok(())
        }
    }
}
