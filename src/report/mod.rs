//! Deliverable reports
//!
//! [`layout`] turns the store into an ordered list of report pages. The
//! same pages are rendered as an xlsx workbook ([`workbook::export`]) or
//! as a paginated Markdown document ([`document::render`]).

pub mod document;
pub mod workbook;

use chrono::NaiveDate;
use miette::Diagnostic;
use thiserror::Error;

use crate::core::key::FieldId;
use crate::core::session::SessionMeta;
use crate::core::store::ValueStore;
use crate::core::value::Table;
use crate::entities::checklist::{criterion_label, ChecklistTable, CRITERIA_COUNT};
use crate::entities::survey_form::SurveyForm;
use crate::entities::symptom::{self, SymptomSection};
use crate::entities::{detailed, hazard, improvement, overview, work_condition, DetailedSurvey};

pub use document::render;
pub use workbook::export;

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("failed to build report workbook: {0}")]
    #[diagnostic(code(ergo::report::workbook))]
    Workbook(String),

    #[error("failed to write report to {path}: {reason}")]
    #[diagnostic(
        code(ergo::report::write),
        help("check that the output directory exists and is writable")
    )]
    Write { path: String, reason: String },
}

/// Default report file name for a workplace and date
pub fn file_name(workplace: &str, date: NaiveDate) -> String {
    let workplace = if workplace.trim().is_empty() {
        "사업장"
    } else {
        workplace.trim()
    };
    format!(
        "근골격계_유해요인조사_{}_{}.xlsx",
        workplace.replace(['/', '\\'], "_"),
        date.format("%Y%m%d")
    )
}

/// One building block of a report page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Section heading
    Title(String),
    /// Label/value rows without a header
    Pairs(Vec<(String, String)>),
    /// A table with a header row
    Table(Table),
}

/// One report page (a worksheet, or a page of the document)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub name: String,
    pub blocks: Vec<Block>,
}

impl Page {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
        }
    }

    fn with(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

fn checklist_table(checklist: &ChecklistTable) -> Table {
    let mut columns = vec!["회사명".to_string(), "소속".into(), "반".into(), "단위작업명".into()];
    columns.extend((1..=CRITERIA_COUNT).map(criterion_label));
    columns.push("부담작업".into());

    let rows = checklist
        .rows()
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.company.clone(),
                row.department.clone(),
                row.unit.clone(),
                row.task_name.clone(),
            ];
            cells.extend(row.criteria.iter().map(|c| c.label().to_string()));
            cells.push(row.burden_summary());
            cells
        })
        .collect();
    Table::with_rows(columns, rows)
}

fn survey_page(store: &ValueStore, unit: &str) -> Page {
    let form = SurveyForm::read(store, unit);
    let pairs = form
        .overview_rows()
        .into_iter()
        .map(|(label, value)| (label.to_string(), value.to_string()))
        .collect();

    let mut situations = Table::new(["항목", "상태", "세부사항"]);
    for situation in &form.situations {
        situations.push_row(vec![
            situation.item.label().to_string(),
            situation.change.label().to_string(),
            situation.effective_detail().to_string(),
        ]);
    }

    Page::new(format!("유해요인_{}", unit))
        .with(Block::Title("조사개요".into()))
        .with(Block::Pairs(pairs))
        .with(Block::Title("작업장 상황조사".into()))
        .with(Block::Table(situations))
}

/// Report pages in delivery order
pub fn layout(store: &ValueStore, meta: &SessionMeta) -> Vec<Page> {
    let mut pages = Vec::new();

    let mut summary = Table::new(["항목", "내용"]);
    for (label, value) in overview::rows(store) {
        let value = if value.is_empty() && label == overview::label(&FieldId::WorkplaceName) {
            meta.workplace.clone()
        } else {
            value
        };
        summary.push_row(vec![label.to_string(), value]);
    }
    pages.push(Page::new("사업장개요").with(Block::Table(summary)));
    pages.push(Page::new("체크리스트").with(Block::Table(checklist_table(&store.checklist))));

    let units = store.checklist.units();
    for unit in &units {
        pages.push(survey_page(store, unit));
    }
    for unit in &units {
        let rows = work_condition::rows(store, unit);
        pages.push(
            Page::new(format!("작업조건_{}", unit))
                .with(Block::Table(work_condition::to_table(&rows))),
        );
    }
    for unit in &units {
        let entries = hazard::entries(store, unit);
        pages.push(
            Page::new(format!("원인분석_{}", unit)).with(Block::Table(hazard::to_table(&entries))),
        );
    }

    for name in detailed::list(store) {
        let survey = DetailedSurvey::read(store, &name);
        pages.push(
            Page::new(format!("정밀_{}", name))
                .with(Block::Pairs(vec![
                    ("작업공정명".into(), survey.process_name),
                    ("작업명".into(), survey.job_name),
                ]))
                .with(Block::Table(survey.analysis.without_blank_rows())),
        );
    }

    for section in SymptomSection::ALL {
        pages.push(
            Page::new(format!("증상_{}", section.label()))
                .with(Block::Title(section.title().into()))
                .with(Block::Table(symptom::table(store, section))),
        );
    }

    let plan = improvement::table(store).without_blank_rows();
    pages.push(Page::new("개선계획서").with(Block::Table(plan)));

    tracing::debug!(pages = pages.len(), "laid out report");
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::survey_form::{set_situation, SituationItem};

    fn store() -> ValueStore {
        let mut store = ValueStore::new();
        store.checklist = ChecklistTable::sample();
        store
    }

    fn meta() -> SessionMeta {
        SessionMeta::new("A_20240501_000000", "A사업장")
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(file_name("A사업장", date), "근골격계_유해요인조사_A사업장_20240501.xlsx");
        assert_eq!(file_name(" ", date), "근골격계_유해요인조사_사업장_20240501.xlsx");
    }

    #[test]
    fn test_page_order() {
        let pages = layout(&store(), &meta());
        let names: Vec<&str> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[0], "사업장개요");
        assert_eq!(names[1], "체크리스트");
        assert_eq!(names[2], "유해요인_조립1반");
        // four units in the sample
        assert_eq!(names[6], "작업조건_조립1반");
        assert_eq!(names[10], "원인분석_조립1반");
        assert_eq!(*names.last().unwrap(), "개선계획서");
    }

    #[test]
    fn test_overview_falls_back_to_session_workplace() {
        let pages = layout(&ValueStore::new(), &meta());
        let Block::Table(summary) = &pages[0].blocks[0] else {
            panic!("overview page should be a table");
        };
        assert_eq!(summary.cell(0, "내용"), Some("A사업장"));
    }

    #[test]
    fn test_situation_detail_hidden_when_unchanged() {
        let mut store = store();
        set_situation(&mut store, "포장반", SituationItem::Volume, "증가", Some("주문 증가")).unwrap();
        let page = survey_page(&store, "포장반");
        let Block::Table(situations) = &page.blocks[3] else {
            panic!("situation block should be a table");
        };
        assert_eq!(situations.cell(1, "상태"), Some("증가"));
        assert_eq!(situations.cell(1, "세부사항"), Some("주문 증가"));
        assert_eq!(situations.cell(0, "상태"), Some("변화없음"));
    }

    #[test]
    fn test_plan_drops_blank_rows() {
        let pages = layout(&store(), &meta());
        let Some(Block::Table(plan)) = pages.last().and_then(|p| p.blocks.first()) else {
            panic!("plan page should be a table");
        };
        // Every sample row with a burden is fully identified
        assert_eq!(plan.len(), 5);
    }
}
