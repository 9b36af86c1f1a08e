//! `ergo condition` command - Work conditions and scores (작업조건조사)

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{self, print_table, row_index, Active};
use crate::cli::GlobalOpts;
use crate::entities::work_condition::{
    self, extract_code, COL_BURDEN, COL_TASK, FREQUENCY_OPTIONS, WORKLOAD_OPTIONS,
};

#[derive(Subcommand, Debug)]
pub enum ConditionCommands {
    /// Show a unit's work-condition table
    Show {
        /// Unit (반)
        unit: String,
    },

    /// Rate workload and frequency of one row
    Rate {
        /// Unit (반)
        unit: String,

        /// Row number (1-based)
        row: usize,

        /// Workload (A): label such as "힘듦(4)" or its code 1-5
        #[arg(long, short = 'w')]
        workload: Option<String>,

        /// Frequency (B): label such as "자주(3)" or its code 1-5
        #[arg(long, short = 'r')]
        frequency: Option<String>,
    },

    /// Edit the task name or burden text of a row (one past the end appends)
    Set {
        /// Unit (반)
        unit: String,

        /// Row number (1-based)
        row: usize,

        /// Column: task (단위작업명) or burden (부담작업(호))
        column: String,

        /// New value
        value: String,
    },
}

pub fn run(cmd: ConditionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConditionCommands::Show { unit } => run_show(&unit, global),
        ConditionCommands::Rate {
            unit,
            row,
            workload,
            frequency,
        } => run_rate(&unit, row, workload.as_deref(), frequency.as_deref(), global),
        ConditionCommands::Set {
            unit,
            row,
            column,
            value,
        } => run_set(&unit, row, &column, &value, global),
    }
}

/// Accept a full option label or the bare code inside its parentheses
fn resolve_option<'a>(input: &str, options: &[&'a str]) -> Option<&'a str> {
    let input = input.trim();
    if let Ok(code) = input.parse::<u32>() {
        if let Some(label) = options.iter().find(|o| extract_code(o) == code) {
            return Some(label);
        }
    }
    options.iter().find(|o| **o == input).copied()
}

fn column_name(input: &str) -> &str {
    match input.trim().to_lowercase().as_str() {
        "task" => COL_TASK,
        "burden" => COL_BURDEN,
        _ => input.trim(),
    }
}

fn run_show(unit: &str, global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    active.require_unit(unit)?;
    let rows = work_condition::rows(&active.ctx.store, unit);
    print_table(&work_condition::to_table(&rows), global)?;

    let hints = work_condition::burden_hints(&rows);
    if !hints.is_empty() && !global.quiet {
        println!();
        println!("{}", style("부담작업 참고").bold());
        for (task, burden) in hints {
            println!("  {} {}: {}", style("•").dim(), task, burden);
        }
    }
    Ok(())
}

fn run_rate(
    unit: &str,
    row: usize,
    workload: Option<&str>,
    frequency: Option<&str>,
    global: &GlobalOpts,
) -> Result<()> {
    if workload.is_none() && frequency.is_none() {
        return Err(miette::miette!("nothing to rate; pass --workload and/or --frequency"));
    }
    let mut active = Active::open(global)?;
    active.require_unit(unit)?;
    let index = row_index(row)?;

    // Unresolvable input is passed through as-is so validation names it
    let workload = workload.map(|w| resolve_option(w, &WORKLOAD_OPTIONS).unwrap_or(w));
    let frequency = frequency.map(|f| resolve_option(f, &FREQUENCY_OPTIONS).unwrap_or(f));

    let total = work_condition::rate(&mut active.ctx.store, unit, index, workload, frequency)
        .map_err(helpers::warning)?;
    active.commit(global)?;
    helpers::done(global, format!("{} row {}: 총점 {}", unit, row, style(total).cyan()));
    Ok(())
}

fn run_set(unit: &str, row: usize, column: &str, value: &str, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    active.require_unit(unit)?;
    let index = row_index(row)?;
    let column = column_name(column);

    work_condition::set_text(&mut active.ctx.store, unit, index, column, value)
        .map_err(helpers::warning)?;
    active.commit(global)?;
    helpers::done(global, format!("{} row {} / {} = {}", unit, row, column, value));
    Ok(())
}
