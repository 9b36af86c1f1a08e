//! `ergo hazard` command - Cause analysis (원인분석)

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{self, print_table, row_index, Active};
use crate::cli::GlobalOpts;
use crate::entities::hazard::{self, HazardType, COL_BURDEN, COL_NOTE, COL_TASK, COL_TYPE};

#[derive(Subcommand, Debug)]
pub enum HazardCommands {
    /// List a unit's cause-analysis entries
    List {
        /// Unit (반)
        unit: String,
    },

    /// Append a blank entry
    Add {
        /// Unit (반)
        unit: String,
    },

    /// Remove the last entry
    Pop {
        /// Unit (반)
        unit: String,
    },

    /// Set one column of an entry
    Set {
        /// Unit (반)
        unit: String,

        /// Entry number (1-based)
        row: usize,

        /// Column: task, type, burden, note, or a measurement label
        column: String,

        /// New value
        value: String,
    },
}

pub fn run(cmd: HazardCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        HazardCommands::List { unit } => run_list(&unit, global),
        HazardCommands::Add { unit } => {
            let mut active = Active::open(global)?;
            active.require_unit(&unit)?;
            let index = hazard::add(&mut active.ctx.store, &unit);
            active.commit(global)?;
            helpers::done(global, format!("Added entry {} to {}", index + 1, unit));
            Ok(())
        }
        HazardCommands::Pop { unit } => {
            let mut active = Active::open(global)?;
            active.require_unit(&unit)?;
            let removed = hazard::pop(&mut active.ctx.store, &unit).map_err(helpers::warning)?;
            active.commit(global)?;
            let label = if removed.unit_task.is_empty() {
                "(빈 항목)".to_string()
            } else {
                removed.unit_task
            };
            helpers::done(global, format!("Removed last entry of {}: {}", unit, label));
            Ok(())
        }
        HazardCommands::Set {
            unit,
            row,
            column,
            value,
        } => run_set(&unit, row, &column, &value, global),
    }
}

fn column_name(input: &str) -> &str {
    match input.trim().to_lowercase().as_str() {
        "task" => COL_TASK,
        "type" => COL_TYPE,
        "burden" => COL_BURDEN,
        "note" => COL_NOTE,
        _ => input.trim(),
    }
}

fn run_list(unit: &str, global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    active.require_unit(unit)?;
    let entries = hazard::entries(&active.ctx.store, unit);
    print_table(&hazard::to_table(&entries).without_blank_rows(), global)?;

    if global.quiet {
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        let hints = entry.hints();
        if hints.is_empty() {
            continue;
        }
        println!();
        println!("{} {}", style(format!("#{}", i + 1)).bold(), entry.unit_task);
        for hint in hints {
            println!("  {}", style(hint).dim());
        }
        if let Some(kind) = entry.detail.hazard_type() {
            println!("  부담작업 선택지: {}", kind.burden_options().join(", "));
        }
    }
    let types: Vec<&str> = HazardType::ALL.iter().map(|t| t.label()).collect();
    println!();
    println!("유형: {}", types.join(", "));
    Ok(())
}

fn run_set(unit: &str, row: usize, column: &str, value: &str, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    active.require_unit(unit)?;
    let index = row_index(row)?;
    let column = column_name(column);

    hazard::set_field(&mut active.ctx.store, unit, index, column, value.trim())
        .map_err(helpers::warning)?;
    active.commit(global)?;
    helpers::done(global, format!("{} #{} / {} = {}", unit, row, column, value.trim()));
    Ok(())
}
