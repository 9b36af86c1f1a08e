//! Work-condition survey (작업조건조사): workload and frequency ratings per
//! unit task, and the derived total score

use crate::core::key::{FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;
use crate::core::value::Table;
use crate::entities::checklist::ChecklistTable;

pub const COL_TASK: &str = "단위작업명";
pub const COL_BURDEN: &str = "부담작업(호)";
pub const COL_WORKLOAD: &str = "작업부하(A)";
pub const COL_FREQUENCY: &str = "작업빈도(B)";
pub const COL_TOTAL: &str = "총점";

pub const COLUMNS: [&str; 5] = [COL_TASK, COL_BURDEN, COL_WORKLOAD, COL_FREQUENCY, COL_TOTAL];

/// Workload rating options (A); the empty label means unrated
pub const WORKLOAD_OPTIONS: [&str; 6] = [
    "",
    "매우쉬움(1)",
    "쉬움(2)",
    "약간 힘듦(3)",
    "힘듦(4)",
    "매우 힘듦(5)",
];

/// Frequency rating options (B); the empty label means unrated
pub const FREQUENCY_OPTIONS: [&str; 6] = [
    "",
    "3개월마다(1)",
    "가끔(2)",
    "자주(3)",
    "계속(4)",
    "초과근무(5)",
];

/// Rows shown when a unit has no named tasks on the checklist
const BLANK_ROWS: usize = 3;

/// Ordinal code embedded in a label like `자주(3)`
///
/// Takes the text between the first `(` and the `)` that follows it.
/// A missing parenthetical or a non-numeric code yields 0.
pub fn extract_code(label: &str) -> u32 {
    label
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .and_then(|(code, _)| code.trim().parse().ok())
        .unwrap_or(0)
}

/// Total score: workload code × frequency code
///
/// An unrated side scores 0, which is indistinguishable from a product
/// that happens to be 0.
pub fn score(workload_label: &str, frequency_label: &str) -> u32 {
    extract_code(workload_label) * extract_code(frequency_label)
}

/// One row of the work-condition table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkConditionRow {
    pub unit_task: String,
    pub matched_criteria: String,
    pub workload: String,
    pub frequency: String,
}

impl WorkConditionRow {
    /// Always recomputed from the two ratings
    pub fn total_score(&self) -> u32 {
        score(&self.workload, &self.frequency)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.unit_task.clone(),
            self.matched_criteria.clone(),
            self.workload.clone(),
            self.frequency.clone(),
            self.total_score().to_string(),
        ]
    }
}

/// Initial rows for a unit: one per named task on the checklist, or a few
/// blank rows when there are none
pub fn seed_rows(checklist: &ChecklistTable, unit: &str) -> Vec<WorkConditionRow> {
    let rows: Vec<WorkConditionRow> = checklist
        .rows_for_unit(unit)
        .filter(|r| !r.task_name.trim().is_empty())
        .map(|r| WorkConditionRow {
            unit_task: r.task_name.clone(),
            matched_criteria: r.burden_summary(),
            ..Default::default()
        })
        .collect();

    if rows.is_empty() {
        vec![WorkConditionRow::default(); BLANK_ROWS]
    } else {
        rows
    }
}

/// Table form with freshly computed totals
pub fn to_table(rows: &[WorkConditionRow]) -> Table {
    Table::with_rows(COLUMNS, rows.iter().map(WorkConditionRow::cells).collect())
}

/// Parse table rows; any stored total is ignored
pub fn from_table(table: &Table) -> Vec<WorkConditionRow> {
    (0..table.len())
        .map(|i| {
            let text = |col: &str| table.cell(i, col).unwrap_or_default().to_string();
            WorkConditionRow {
                unit_task: text(COL_TASK),
                matched_criteria: text(COL_BURDEN),
                workload: text(COL_WORKLOAD),
                frequency: text(COL_FREQUENCY),
            }
        })
        .collect()
}

fn key(unit: &str) -> ValueKey {
    ValueKey::unit(FieldId::WorkConditions, unit)
}

/// Current rows for a unit without touching the store
pub fn rows(store: &ValueStore, unit: &str) -> Vec<WorkConditionRow> {
    match store.table(&key(unit)) {
        Some(table) => from_table(table),
        None => seed_rows(&store.checklist, unit),
    }
}

/// The unit's table, seeding it from the checklist on first access
pub fn ensure<'a>(store: &'a mut ValueStore, unit: &str) -> &'a mut Table {
    let seeded = to_table(&seed_rows(&store.checklist, unit));
    store.table_or_insert_with(key(unit), || seeded)
}

fn check_option(field: &str, value: &str, options: &[&str]) -> Result<(), ValidationWarning> {
    if options.contains(&value) {
        Ok(())
    } else {
        Err(ValidationWarning::invalid_option(field, value, options))
    }
}

/// Rate one row; returns the recomputed total
pub fn rate(
    store: &mut ValueStore,
    unit: &str,
    index: usize,
    workload: Option<&str>,
    frequency: Option<&str>,
) -> Result<u32, ValidationWarning> {
    if let Some(w) = workload {
        check_option(COL_WORKLOAD, w, &WORKLOAD_OPTIONS)?;
    }
    if let Some(f) = frequency {
        check_option(COL_FREQUENCY, f, &FREQUENCY_OPTIONS)?;
    }

    let table = ensure(store, unit);
    if index >= table.len() {
        return Err(ValidationWarning::RowOutOfRange {
            index,
            len: table.len(),
        });
    }
    if let Some(w) = workload {
        table.set_cell(index, COL_WORKLOAD, w);
    }
    if let Some(f) = frequency {
        table.set_cell(index, COL_FREQUENCY, f);
    }

    let rows = from_table(table);
    let total = rows[index].total_score();
    table.set_cell(index, COL_TOTAL, total.to_string());
    Ok(total)
}

/// Overwrite the task name or burden text of a row, or append a row
pub fn set_text(
    store: &mut ValueStore,
    unit: &str,
    index: usize,
    column: &str,
    value: &str,
) -> Result<(), ValidationWarning> {
    if column != COL_TASK && column != COL_BURDEN {
        return Err(ValidationWarning::UnknownColumn(column.to_string()));
    }
    let table = ensure(store, unit);
    if index == table.len() {
        table.push_blank();
        table.set_cell(index, COL_TOTAL, "0");
    }
    if !table.set_cell(index, column, value) {
        return Err(ValidationWarning::RowOutOfRange {
            index,
            len: table.len(),
        });
    }
    Ok(())
}

/// Task name → burden summary for rows that carry a burden
pub fn burden_hints(rows: &[WorkConditionRow]) -> Vec<(String, String)> {
    rows.iter()
        .filter(|r| {
            !r.unit_task.trim().is_empty()
                && !r.matched_criteria.trim().is_empty()
                && r.matched_criteria != "미해당"
        })
        .map(|r| (r.unit_task.clone(), r.matched_criteria.clone()))
        .collect()
}
