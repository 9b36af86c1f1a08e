//! `ergo form` command - Per-unit survey form (유해요인 조사표)

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{self, print_table, Active};
use crate::cli::GlobalOpts;
use crate::core::key::{FieldId, ValueKey};
use crate::core::value::Table;
use crate::entities::survey_form::{self, SituationItem, SurveyForm};

#[derive(Subcommand, Debug)]
pub enum FormCommands {
    /// Show a unit's survey form
    Show {
        /// Unit (반)
        unit: String,
    },

    /// Set an overview field of a unit's form
    Set {
        /// Unit (반)
        unit: String,

        /// Field (조사일시, 부서명, 조사자, 작업공정명, 작업명 or English name)
        field: String,

        /// New value
        value: String,
    },

    /// Record a workplace situation change
    Situation {
        /// Unit (반)
        unit: String,

        /// Item (작업설비, 작업량, 작업속도, 업무변화)
        item: String,

        /// Status (변화없음, 감소, 증가, 기타)
        status: String,

        /// Details of the change
        #[arg(long)]
        detail: Option<String>,
    },
}

pub fn run(cmd: FormCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FormCommands::Show { unit } => run_show(&unit, global),
        FormCommands::Set { unit, field, value } => run_set(&unit, &field, &value, global),
        FormCommands::Situation {
            unit,
            item,
            status,
            detail,
        } => run_situation(&unit, &item, &status, detail.as_deref(), global),
    }
}

fn run_show(unit: &str, global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    active.require_unit(unit)?;
    let form = SurveyForm::read(&active.ctx.store, unit);

    let overview: Vec<(&str, String)> = form
        .overview_rows()
        .into_iter()
        .map(|(label, value)| (label, value.to_string()))
        .collect();
    print_table(&helpers::pairs_table(&overview), global)?;
    println!();

    let rows = form
        .situations
        .iter()
        .map(|s| {
            vec![
                s.item.label().to_string(),
                s.change.label().to_string(),
                s.effective_detail().to_string(),
            ]
        })
        .collect();
    print_table(&Table::with_rows(["항목", "상태", "세부사항"], rows), global)
}

/// New forms carry the configured surveyor until one is entered
fn fill_surveyor(active: &mut Active, unit: &str) {
    let key = ValueKey::unit(FieldId::Surveyor, unit);
    if !active.ctx.store.contains(&key) {
        let surveyor = active.config.surveyor();
        if !surveyor.trim().is_empty() {
            active.ctx.store.set_scalar(key, surveyor);
        }
    }
}

fn run_set(unit: &str, field: &str, value: &str, global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    active.require_unit(unit)?;
    let id = survey_form::parse_field(field)
        .ok_or_else(|| miette::miette!("unknown form field '{}'", field))?;
    let label = survey_form::overview_label(&id);

    fill_surveyor(&mut active, unit);
    active
        .ctx
        .store
        .set_scalar(ValueKey::unit(id, unit), value.trim());
    active.commit(global)?;
    helpers::done(global, format!("{} / {} = {}", unit, label, value.trim()));
    Ok(())
}

fn run_situation(
    unit: &str,
    item: &str,
    status: &str,
    detail: Option<&str>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut active = Active::open(global)?;
    active.require_unit(unit)?;
    let item = SituationItem::parse_input(item)
        .ok_or_else(|| miette::miette!("unknown situation item '{}'", item))?;

    fill_surveyor(&mut active, unit);
    let change = survey_form::set_situation(&mut active.ctx.store, unit, item, status.trim(), detail)
        .map_err(helpers::warning)?;
    active.commit(global)?;

    helpers::done(global, format!("{} / {} = {}", unit, item.label(), change.label()));
    if let (Some(prompt), None) = (change.detail_prompt(), detail) {
        if !global.quiet {
            println!("   {} {}", style("→").dim(), prompt);
        }
    }
    Ok(())
}
