//! `ergo checklist` command - Burden-task checklist (체크리스트)

use clap::Subcommand;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::helpers::{self, print_table, truncate_str, Active};
use crate::cli::GlobalOpts;
use crate::core::hierarchy::{list_distinct, HierarchyColumn};
use crate::core::identity::RowId;
use crate::core::value::Table;
use crate::entities::checklist::{
    criterion_description, criterion_label, ChecklistRow, ChecklistTable, CriterionState,
    CRITERIA_COUNT,
};
use crate::persist::book::{Sheet, SheetBook};
use crate::persist::{upload, xlsx};

#[derive(Subcommand, Debug)]
pub enum ChecklistCommands {
    /// List checklist rows
    List {
        /// Only rows of this company
        #[arg(long)]
        company: Option<String>,

        /// Only rows of this department
        #[arg(long)]
        department: Option<String>,

        /// Only rows of this unit (반)
        #[arg(long)]
        unit: Option<String>,

        /// Show every criterion column instead of the burden summary
        #[arg(long)]
        full: bool,
    },

    /// Add a row
    Add {
        company: String,
        department: String,
        unit: String,
        task: String,

        /// Criterion marks, e.g. --mark 1=O --mark 3=△
        #[arg(long, short = 'm', value_name = "N=STATE")]
        mark: Vec<String>,
    },

    /// Edit a row
    Set {
        /// Row number (1-based) or id prefix
        row: String,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        task: Option<String>,

        /// Criterion marks, e.g. --mark 2=X
        #[arg(long, short = 'm', value_name = "N=STATE")]
        mark: Vec<String>,
    },

    /// Remove rows
    Remove {
        /// Row numbers (1-based) or id prefixes
        #[arg(required = true)]
        rows: Vec<String>,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Merge rows into one task
    Merge {
        /// Row numbers (1-based) or id prefixes
        #[arg(required = true)]
        rows: Vec<String>,

        /// Name of the merged task
        #[arg(long, short = 'n')]
        name: String,
    },

    /// Replace the checklist with an upload (.xlsx or .csv)
    Import {
        file: PathBuf,
    },

    /// Write the sample template, or load it into the session
    Template {
        /// Write the template to this file (.xlsx or .csv)
        #[arg(long, short = 'o', conflicts_with = "load")]
        output: Option<PathBuf>,

        /// Replace the session checklist with the sample rows
        #[arg(long)]
        load: bool,
    },

    /// Show the company → department → unit → task hierarchy
    Tree,

    /// Describe the criteria 1호..12호
    Criteria,
}

pub fn run(cmd: ChecklistCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ChecklistCommands::List {
            company,
            department,
            unit,
            full,
        } => run_list(company, department, unit, full, global),
        ChecklistCommands::Add {
            company,
            department,
            unit,
            task,
            mark,
        } => run_add(company, department, unit, task, &mark, global),
        ChecklistCommands::Set {
            row,
            company,
            department,
            unit,
            task,
            mark,
        } => run_set(
            &row,
            Identity {
                company,
                department,
                unit,
                task,
            },
            &mark,
            global,
        ),
        ChecklistCommands::Remove { rows, yes } => run_remove(&rows, yes, global),
        ChecklistCommands::Merge { rows, name } => run_merge(&rows, &name, global),
        ChecklistCommands::Import { file } => run_import(&file, global),
        ChecklistCommands::Template { output, load } => run_template(output, load, global),
        ChecklistCommands::Tree => run_tree(global),
        ChecklistCommands::Criteria => run_criteria(global),
    }
}

/// Optional replacements for the identity columns of a row
struct Identity {
    company: Option<String>,
    department: Option<String>,
    unit: Option<String>,
    task: Option<String>,
}

/// Parse `N=STATE` (`3=O`, `5=△`, `11=X`)
fn parse_mark(input: &str) -> Result<(usize, CriterionState)> {
    let (number, state) = input
        .split_once('=')
        .ok_or_else(|| miette::miette!("invalid mark '{}' (expected N=STATE, e.g. 3=O)", input))?;
    let number = number.trim().trim_end_matches('호');
    let number: usize = number
        .parse()
        .map_err(|_| miette::miette!("invalid criterion number in '{}'", input))?;
    if !(1..=CRITERIA_COUNT).contains(&number) {
        return Err(miette::miette!(
            "criterion {} out of range (1..{})",
            number,
            CRITERIA_COUNT
        ));
    }
    let state = CriterionState::parse_input(state)
        .ok_or_else(|| miette::miette!("invalid state in '{}' (use O, △ or X)", input))?;
    Ok((number, state))
}

/// Resolve a 1-based row number or an id prefix
fn resolve_row(table: &ChecklistTable, query: &str) -> Result<RowId> {
    if let Ok(number) = query.trim().parse::<usize>() {
        let index = helpers::row_index(number)?;
        return table
            .rows()
            .get(index)
            .map(|r| r.id)
            .ok_or_else(|| miette::miette!("row {} out of range ({} rows)", number, table.len()));
    }
    table
        .resolve(query.trim())
        .ok_or_else(|| miette::miette!("no single row matches '{}'", query))
}

fn resolve_rows(table: &ChecklistTable, queries: &[String]) -> Result<Vec<RowId>> {
    queries.iter().map(|q| resolve_row(table, q)).collect()
}

fn row_cells(row: &ChecklistRow, full: bool) -> Vec<String> {
    let mut cells = vec![
        row.id.short(),
        row.company.clone(),
        row.department.clone(),
        row.unit.clone(),
        truncate_str(&row.task_name, 30),
    ];
    if full {
        cells.extend(row.criteria.iter().map(|s| s.label().to_string()));
    } else {
        cells.push(row.burden_summary());
    }
    cells
}

fn run_list(
    company: Option<String>,
    department: Option<String>,
    unit: Option<String>,
    full: bool,
    global: &GlobalOpts,
) -> Result<()> {
    let active = Active::open(global)?;
    let matches = |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);

    let mut columns: Vec<String> = ["ID", "회사명", "소속", "반", "단위작업명"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if full {
        columns.extend((1..=CRITERIA_COUNT).map(criterion_label));
    } else {
        columns.push("부담작업".to_string());
    }

    let rows = active
        .ctx
        .store
        .checklist
        .rows()
        .iter()
        .filter(|r| {
            matches(&company, &r.company)
                && matches(&department, &r.department)
                && matches(&unit, &r.unit)
        })
        .map(|r| row_cells(r, full))
        .collect();
    print_table(&Table::with_rows(columns, rows), global)
}

fn run_add(
    company: String,
    department: String,
    unit: String,
    task: String,
    marks: &[String],
    global: &GlobalOpts,
) -> Result<()> {
    let mut active = Active::open(global)?;
    let mut row = ChecklistRow::new(
        company.trim(),
        department.trim(),
        unit.trim(),
        task.trim(),
    );
    for mark in marks {
        let (number, state) = parse_mark(mark)?;
        row = row.with_criterion(number, state);
    }
    if !row.identity_complete() {
        return Err(miette::miette!("company, department, unit and task must all be filled in"));
    }

    let summary = row.burden_summary();
    let id = active.ctx.store.checklist.push(row);
    active.commit(global)?;
    helpers::done(
        global,
        format!("Added {} {} ({})", style(id.short()).cyan(), task.trim(), summary),
    );
    Ok(())
}

fn run_set(row: &str, identity: Identity, marks: &[String], global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let id = resolve_row(&active.ctx.store.checklist, row)?;
    let marks: Vec<(usize, CriterionState)> = marks
        .iter()
        .map(|m| parse_mark(m))
        .collect::<Result<_>>()?;

    let purged = active
        .ctx
        .edit_row(id, |row| {
            let replace = |slot: &mut String, value: Option<String>| {
                if let Some(value) = value {
                    *slot = value.trim().to_string();
                }
            };
            replace(&mut row.company, identity.company);
            replace(&mut row.department, identity.department);
            replace(&mut row.unit, identity.unit);
            replace(&mut row.task_name, identity.task);
            for (number, state) in marks {
                if let Some(slot) = row.criteria.get_mut(number - 1) {
                    *slot = state;
                }
            }
        })
        .map_err(helpers::warning)?;
    active.commit(global)?;

    helpers::done(global, format!("Updated {}", style(id.short()).cyan()));
    report_purged(&purged, global);
    Ok(())
}

fn report_purged(units: &[String], global: &GlobalOpts) {
    if units.is_empty() || global.quiet {
        return;
    }
    println!(
        "   {} Discarded the forms of units no longer on the checklist: {}",
        style("!").yellow(),
        units.join(", ")
    );
}

fn run_remove(rows: &[String], yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let ids = resolve_rows(&active.ctx.store.checklist, rows)?;

    if !yes {
        if !Term::stdout().is_term() {
            return Err(miette::miette!("refusing to remove rows without --yes"));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Remove {} row(s)?", ids.len()))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removal = active.ctx.remove_rows(&ids).map_err(helpers::warning)?;
    active.commit(global)?;
    helpers::done(global, format!("Removed {} row(s)", removal.rows.len()));
    report_purged(&removal.purged_units, global);
    Ok(())
}

fn run_merge(rows: &[String], name: &str, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let ids = resolve_rows(&active.ctx.store.checklist, rows)?;
    let id = active.ctx.merge_rows(&ids, name).map_err(helpers::warning)?;

    let summary = active
        .ctx
        .store
        .checklist
        .get(id)
        .map(ChecklistRow::burden_summary)
        .unwrap_or_default();
    active.commit(global)?;
    helpers::done(
        global,
        format!(
            "Merged {} rows into {} {} ({})",
            ids.len(),
            style(id.short()).cyan(),
            name.trim(),
            summary
        ),
    );
    Ok(())
}

fn run_import(file: &Path, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let table = upload::load_checklist(file).map_err(|e| miette::miette!("{}", e))?;
    let count = table.len();
    let purged = active.ctx.replace_checklist(table);
    active.commit(global)?;
    helpers::done(global, format!("Loaded {} row(s) from {}", count, file.display()));
    report_purged(&purged, global);
    Ok(())
}

/// Upload layout of the sample: identity columns then 1호..12호
fn template_records() -> Vec<Vec<String>> {
    let table = ChecklistTable::sample().to_table();
    let width = 4 + CRITERIA_COUNT;
    std::iter::once(table.columns())
        .chain(table.rows().iter().map(Vec::as_slice))
        .map(|row| row.iter().take(width).cloned().collect())
        .collect()
}

fn write_template(path: &Path) -> Result<()> {
    let records = template_records();
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let bytes = if is_csv {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &records {
            writer.write_record(record).into_diagnostic()?;
        }
        writer.into_inner().into_diagnostic()?
    } else {
        let mut sheet = Sheet::new("체크리스트");
        for record in records {
            sheet.push(record);
        }
        let mut book = SheetBook::new();
        book.add(sheet);
        xlsx::write_book(&book).map_err(|e| miette::miette!("{}", e))?
    };
    std::fs::write(path, bytes).into_diagnostic()
}

fn run_template(output: Option<PathBuf>, load: bool, global: &GlobalOpts) -> Result<()> {
    if let Some(path) = output {
        write_template(&path)?;
        helpers::done(global, format!("Wrote checklist template to {}", path.display()));
        return Ok(());
    }
    if !load {
        return Err(miette::miette!("pass --output <file> or --load"));
    }

    let mut active = Active::open(global)?;
    let purged = active.ctx.replace_checklist(ChecklistTable::sample());
    active.commit(global)?;
    helpers::done(global, "Loaded the sample checklist");
    report_purged(&purged, global);
    Ok(())
}

fn run_tree(global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    let table = &active.ctx.store.checklist;
    if table.is_empty() {
        if !global.quiet {
            println!("The checklist is empty.");
        }
        return Ok(());
    }

    for company in list_distinct(table, HierarchyColumn::Company, &[]) {
        println!("{}", style(&company).bold());
        let by_company = [(HierarchyColumn::Company, company.as_str())];
        for department in list_distinct(table, HierarchyColumn::Department, &by_company) {
            println!("  {}", department);
            let by_department = [
                (HierarchyColumn::Company, company.as_str()),
                (HierarchyColumn::Department, department.as_str()),
            ];
            for unit in list_distinct(table, HierarchyColumn::Unit, &by_department) {
                println!("    {}", style(&unit).cyan());
                let by_unit = [
                    (HierarchyColumn::Company, company.as_str()),
                    (HierarchyColumn::Department, department.as_str()),
                    (HierarchyColumn::Unit, unit.as_str()),
                ];
                for task in list_distinct(table, HierarchyColumn::TaskName, &by_unit) {
                    println!("      {} {}", style("•").dim(), task);
                }
            }
        }
    }
    Ok(())
}

fn run_criteria(global: &GlobalOpts) -> Result<()> {
    let rows = (1..=CRITERIA_COUNT)
        .map(|n| {
            vec![
                criterion_label(n),
                criterion_description(n).unwrap_or_default().to_string(),
            ]
        })
        .collect();
    print_table(&Table::with_rows(["호", "내용"], rows), global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mark() {
        assert_eq!(parse_mark("3=O").unwrap(), (3, CriterionState::Applicable));
        assert_eq!(parse_mark("5호=△").unwrap(), (5, CriterionState::PotentialRisk));
        assert!(parse_mark("13=O").is_err());
        assert!(parse_mark("3").is_err());
        assert!(parse_mark("3=maybe").is_err());
    }

    #[test]
    fn test_resolve_row_by_number_and_prefix() {
        let table = ChecklistTable::sample();
        let second = table.rows()[1].id;
        assert_eq!(resolve_row(&table, "2").unwrap(), second);
        assert_eq!(resolve_row(&table, &second.to_string()).unwrap(), second);
        assert!(resolve_row(&table, "0").is_err());
        assert!(resolve_row(&table, "6").is_err());
    }

    #[test]
    fn test_template_records_are_positional() {
        let records = template_records();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].len(), 4 + CRITERIA_COUNT);
        let reparsed = ChecklistTable::from_upload(&records).unwrap();
        assert_eq!(reparsed.len(), 5);
        assert_eq!(reparsed.rows()[0].burden_summary(), "1호, 3호(잠재), 11호");
    }
}
