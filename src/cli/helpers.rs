//! Shared helper functions for CLI commands
//!
//! Every editing command follows the same cycle: open the active session
//! from the workspace draft, apply one edit, then [`Active::commit`] which
//! runs the auto-save check and writes the draft back.

use chrono::{Local, NaiveDateTime};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value as JsonValue};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::autosave::AutosaveOutcome;
use crate::core::session::SessionContext;
use crate::core::value::Table;
use crate::core::{Config, ValidationWarning, Workspace};
use crate::persist::PersistenceAdapter;

/// Wall-clock time used for ids, saves and auto-save checks
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Locate the workspace from `--workspace` or the current directory
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let found = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

/// Map a blocked action to a CLI error
pub fn warning(w: ValidationWarning) -> miette::Report {
    miette::miette!("{}", w)
}

/// Workspace, configuration and the session being edited
pub struct Active {
    pub workspace: Workspace,
    pub config: Config,
    pub ctx: SessionContext,
}

impl Active {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = open_workspace(global)?;
        let config = Config::for_workspace(&workspace);
        let ctx = workspace.load_draft().map_err(|e| miette::miette!("{}", e))?;
        Ok(Self {
            workspace,
            config,
            ctx,
        })
    }

    pub fn adapter(&self) -> Box<dyn PersistenceAdapter> {
        self.workspace.adapter(self.config.backend())
    }

    /// Fail unless `unit` is a unit of the checklist
    pub fn require_unit(&self, unit: &str) -> Result<()> {
        if self.ctx.store.checklist.units().iter().any(|u| u == unit) {
            Ok(())
        } else {
            Err(warning(ValidationWarning::UnknownUnit(unit.to_string())))
        }
    }

    /// Finish an interaction: auto-save when due, then write the draft
    pub fn commit(mut self, global: &GlobalOpts) -> Result<()> {
        self.ctx.autosave.set_threshold(self.config.autosave_secs());
        let adapter = self.adapter();
        let outcome = self.ctx.interaction_cycle(adapter.as_ref(), now());
        self.workspace
            .save_draft(&self.ctx)
            .map_err(|e| miette::miette!("{}", e))?;

        match outcome {
            AutosaveOutcome::Saved(at) if !global.quiet => {
                println!(
                    "{} Auto-saved {} at {}",
                    style("✓").green(),
                    style(&self.ctx.meta.session_id).cyan(),
                    at.format("%H:%M:%S")
                );
            }
            AutosaveOutcome::Failed(reason) => {
                eprintln!("{} Auto-save failed: {}", style("!").yellow(), reason);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Convert a 1-based row number from the command line
pub fn row_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| miette::miette!("row numbers start at 1"))
}

/// Print a success line unless quiet
pub fn done(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Render a table in the requested format
pub fn render_table(table: &Table, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Auto | OutputFormat::Md => {
            let mut builder = Builder::default();
            let mut header = vec!["#".to_string()];
            header.extend(table.columns().iter().cloned());
            builder.push_record(header);
            for (i, row) in table.rows().iter().enumerate() {
                let mut record = vec![(i + 1).to_string()];
                record.extend(row.iter().map(|cell| cell.replace('\n', " ")));
                builder.push_record(record);
            }
            let mut rendered = builder.build();
            if format == OutputFormat::Md {
                rendered.with(Style::markdown());
            } else {
                rendered.with(Style::psql());
            }
            Ok(rendered.to_string())
        }
        OutputFormat::Tsv => {
            let mut out = table.columns().join("\t");
            for row in table.rows() {
                out.push('\n');
                out.push_str(&row.join("\t"));
            }
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(table.columns()).into_diagnostic()?;
            for row in table.rows() {
                writer.write_record(row).into_diagnostic()?;
            }
            let bytes = writer.into_inner().into_diagnostic()?;
            let text = String::from_utf8(bytes).into_diagnostic()?;
            Ok(text.trim_end().to_string())
        }
        OutputFormat::Json => {
            let records: Vec<JsonValue> = table
                .records()
                .into_iter()
                .map(|record| {
                    let object: Map<String, JsonValue> = record
                        .into_iter()
                        .map(|(col, cell)| (col.to_string(), JsonValue::String(cell.to_string())))
                        .collect();
                    JsonValue::Object(object)
                })
                .collect();
            serde_json::to_string_pretty(&records).into_diagnostic()
        }
    }
}

pub fn print_table(table: &Table, global: &GlobalOpts) -> Result<()> {
    println!("{}", render_table(table, global.format)?);
    Ok(())
}

/// Label/value pairs as a two-column table
pub fn pairs_table(pairs: &[(&str, String)]) -> Table {
    Table::with_rows(
        ["항목", "내용"],
        pairs
            .iter()
            .map(|(label, value)| vec![label.to_string(), value.clone()])
            .collect(),
    )
}

/// Truncate to `max_chars` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
