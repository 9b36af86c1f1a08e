//! `ergo symptom` command - Symptom survey aggregates (증상조사)

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{self, print_table, row_index, Active};
use crate::cli::GlobalOpts;
use crate::entities::symptom::{self, SymptomSection};

#[derive(Subcommand, Debug)]
pub enum SymptomCommands {
    /// Show one section, or all of them
    Show {
        /// Section (기초현황, 작업기간, 육체적부담, 통증호소자)
        section: Option<String>,
    },

    /// Set one cell (one past the last row appends)
    Set {
        section: String,

        /// Row number (1-based)
        row: usize,

        column: String,

        value: String,
    },
}

fn parse_section(input: &str) -> Result<SymptomSection> {
    SymptomSection::parse_input(input).ok_or_else(|| {
        let labels: Vec<&str> = SymptomSection::ALL.iter().map(|s| s.label()).collect();
        miette::miette!("unknown section '{}' (expected one of {})", input, labels.join(", "))
    })
}

pub fn run(cmd: SymptomCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SymptomCommands::Show { section } => {
            let active = Active::open(global)?;
            let sections = match section {
                Some(s) => vec![parse_section(&s)?],
                None => SymptomSection::ALL.to_vec(),
            };
            for (i, section) in sections.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", style(section.title()).bold());
                print_table(&symptom::table(&active.ctx.store, section), global)?;
            }
            Ok(())
        }
        SymptomCommands::Set {
            section,
            row,
            column,
            value,
        } => {
            let section = parse_section(&section)?;
            let mut active = Active::open(global)?;
            symptom::set_cell(&mut active.ctx.store, section, row_index(row)?, column.trim(), &value)
                .map_err(helpers::warning)?;
            active.commit(global)?;
            helpers::done(
                global,
                format!("{} row {} / {} = {}", section.label(), row, column.trim(), value),
            );
            Ok(())
        }
    }
}
