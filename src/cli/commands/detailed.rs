//! `ergo detailed` command - Detailed investigations (정밀조사)

use clap::Subcommand;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{self, print_table, row_index, Active};
use crate::cli::GlobalOpts;
use crate::core::key::FieldId;
use crate::entities::detailed::{self, DetailedSurvey, ANALYSIS_COLUMNS};

#[derive(Subcommand, Debug)]
pub enum DetailedCommands {
    /// List investigations, or show one
    List {
        /// Investigation to show
        name: Option<String>,
    },

    /// Add an investigation
    Add {
        /// Name (default: next 정밀조사_N)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove an investigation and everything entered for it
    Remove {
        name: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Set a header field or an analysis cell
    Set {
        name: String,

        /// process, job, or an analysis column (tool, result, score)
        field: String,

        /// New value
        value: String,

        /// Analysis row (1-based, one past the end appends)
        #[arg(long)]
        row: Option<usize>,
    },
}

pub fn run(cmd: DetailedCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DetailedCommands::List { name: None } => run_list(global),
        DetailedCommands::List { name: Some(name) } => run_show(&name, global),
        DetailedCommands::Add { name } => run_add(name.as_deref(), global),
        DetailedCommands::Remove { name, yes } => run_remove(&name, yes, global),
        DetailedCommands::Set {
            name,
            field,
            value,
            row,
        } => run_set(&name, &field, &value, row, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    let names = detailed::list(&active.ctx.store);
    if names.is_empty() {
        if !global.quiet {
            println!("No detailed investigations. Add one with {}", style("ergo detailed add").yellow());
        }
        return Ok(());
    }
    for name in names {
        let survey = DetailedSurvey::read(&active.ctx.store, &name);
        println!(
            "{}  {} / {}",
            style(&name).cyan(),
            survey.process_name,
            survey.job_name
        );
    }
    Ok(())
}

fn run_show(name: &str, global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    if !detailed::list(&active.ctx.store).iter().any(|n| n == name) {
        return Err(miette::miette!("unknown detailed investigation '{}'", name));
    }
    let survey = DetailedSurvey::read(&active.ctx.store, name);
    print_table(
        &helpers::pairs_table(&[
            ("작업공정명", survey.process_name.clone()),
            ("작업명", survey.job_name.clone()),
        ]),
        global,
    )?;
    println!();
    print_table(&survey.analysis, global)
}

fn run_add(name: Option<&str>, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let added = match name {
        Some(name) => detailed::add_named(&mut active.ctx.store, name).map_err(helpers::warning)?,
        None => detailed::add(&mut active.ctx.store),
    };
    active.commit(global)?;
    helpers::done(global, format!("Added {}", style(added).cyan()));
    Ok(())
}

fn run_remove(name: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    if !yes {
        if !Term::stdout().is_term() {
            return Err(miette::miette!("refusing to remove '{}' without --yes", name));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Remove {} and all of its data?", name))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = detailed::remove(&mut active.ctx.store, name).map_err(helpers::warning)?;
    active.commit(global)?;
    helpers::done(global, format!("Removed {} ({} values)", name, removed));
    Ok(())
}

fn analysis_column(input: &str) -> Option<&'static str> {
    match input.trim().to_lowercase().as_str() {
        "tool" => Some(ANALYSIS_COLUMNS[0]),
        "result" => Some(ANALYSIS_COLUMNS[1]),
        "score" => Some(ANALYSIS_COLUMNS[2]),
        other => ANALYSIS_COLUMNS.iter().find(|c| **c == other).copied(),
    }
}

fn run_set(name: &str, field: &str, value: &str, row: Option<usize>, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let store = &mut active.ctx.store;

    let header = match field.trim().to_lowercase().as_str() {
        "process" | "작업공정명" => Some(FieldId::DetailedProcess),
        "job" | "작업명" => Some(FieldId::DetailedJob),
        _ => None,
    };
    match (header, analysis_column(field)) {
        (Some(id), _) => detailed::set_header(store, name, id, value).map_err(helpers::warning)?,
        (None, Some(column)) => {
            let row = row.ok_or_else(|| miette::miette!("analysis cells need --row"))?;
            detailed::set_analysis(store, name, row_index(row)?, column, value)
                .map_err(helpers::warning)?;
        }
        (None, None) => return Err(miette::miette!("unknown field '{}'", field)),
    }

    active.commit(global)?;
    helpers::done(global, format!("{} / {} = {}", name, field, value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_column_aliases() {
        assert_eq!(analysis_column("Score"), Some("만점"));
        assert_eq!(analysis_column("분석결과"), Some("분석결과"));
        assert_eq!(analysis_column("process"), None);
    }
}
