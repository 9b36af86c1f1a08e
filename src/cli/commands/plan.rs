//! `ergo plan` command - Work environment improvement plan (개선계획서)

use clap::Subcommand;
use miette::Result;

use crate::cli::helpers::{self, print_table, row_index, Active};
use crate::cli::GlobalOpts;
use crate::entities::improvement;

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Show the plan
    Show,

    /// Append a blank row
    AddRow,

    /// Remove the last row
    PopRow,

    /// Set one cell
    Set {
        /// Row number (1-based)
        row: usize,

        /// Column (회사명, 소속, 반, 단위작업명, 개선방안, ...)
        column: String,

        value: String,
    },
}

pub fn run(cmd: PlanCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PlanCommands::Show => {
            let active = Active::open(global)?;
            print_table(&improvement::table(&active.ctx.store), global)
        }
        PlanCommands::AddRow => {
            let mut active = Active::open(global)?;
            let index = improvement::add_row(&mut active.ctx.store);
            active.commit(global)?;
            helpers::done(global, format!("Added row {}", index + 1));
            Ok(())
        }
        PlanCommands::PopRow => {
            let mut active = Active::open(global)?;
            improvement::pop_row(&mut active.ctx.store).map_err(helpers::warning)?;
            active.commit(global)?;
            helpers::done(global, "Removed the last row");
            Ok(())
        }
        PlanCommands::Set { row, column, value } => {
            let mut active = Active::open(global)?;
            improvement::set_cell(&mut active.ctx.store, row_index(row)?, column.trim(), &value)
                .map_err(helpers::warning)?;
            active.commit(global)?;
            helpers::done(global, format!("row {} / {} = {}", row, column.trim(), value));
            Ok(())
        }
    }
}
