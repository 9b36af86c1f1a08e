//! Work environment improvement plan (작업환경개선계획서)

use crate::core::key::{FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;
use crate::core::value::Table;
use crate::entities::checklist::ChecklistTable;

pub const COLUMNS: [&str; 10] = [
    "회사명",
    "소속",
    "반",
    "단위작업명",
    "문제점(유해요인의 원인)",
    "근로자의견",
    "개선방안",
    "추진일정",
    "개선비용",
    "개선우선순위",
];

const BLANK_ROWS: usize = 5;

fn key() -> ValueKey {
    ValueKey::global(FieldId::ImprovementPlan)
}

/// One plan row per fully identified checklist task with a burden, or
/// five blank rows when there are none
pub fn seed(checklist: &ChecklistTable) -> Table {
    let mut table = Table::new(COLUMNS);
    for row in checklist
        .rows()
        .iter()
        .filter(|r| r.identity_complete() && r.has_burden())
    {
        table.push_row(vec![
            row.company.clone(),
            row.department.clone(),
            row.unit.clone(),
            row.task_name.clone(),
        ]);
    }
    if table.is_empty() {
        for _ in 0..BLANK_ROWS {
            table.push_blank();
        }
    }
    table
}

/// Current plan without touching the store
pub fn table(store: &ValueStore) -> Table {
    store
        .table(&key())
        .cloned()
        .unwrap_or_else(|| seed(&store.checklist))
}

fn ensure(store: &mut ValueStore) -> &mut Table {
    let seeded = seed(&store.checklist);
    store.table_or_insert_with(key(), || seeded)
}

/// Append a blank row; returns its index
pub fn add_row(store: &mut ValueStore) -> usize {
    let table = ensure(store);
    table.push_blank();
    table.len() - 1
}

/// Remove the last row
pub fn pop_row(store: &mut ValueStore) -> Result<Vec<String>, ValidationWarning> {
    ensure(store)
        .pop_row()
        .ok_or_else(|| ValidationWarning::NothingToRemove("개선계획서".to_string()))
}

pub fn set_cell(
    store: &mut ValueStore,
    row: usize,
    column: &str,
    value: &str,
) -> Result<(), ValidationWarning> {
    if !COLUMNS.contains(&column) {
        return Err(ValidationWarning::UnknownColumn(column.to_string()));
    }
    let table = ensure(store);
    if table.set_cell(row, column, value) {
        Ok(())
    } else {
        Err(ValidationWarning::RowOutOfRange {
            index: row,
            len: table.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::{ChecklistRow, CriterionState};

    #[test]
    fn test_seed_from_burdened_rows() {
        let mut checklist = ChecklistTable::new();
        checklist.push(ChecklistRow::new("A", "d", "u", "t1").with_criterion(4, CriterionState::PotentialRisk));
        checklist.push(ChecklistRow::new("A", "d", "u", "t2"));
        checklist.push(ChecklistRow::new("A", "", "u", "t3").with_criterion(1, CriterionState::Applicable));

        let table = seed(&checklist);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "단위작업명"), Some("t1"));
        assert_eq!(table.cell(0, "개선방안"), Some(""));
    }

    #[test]
    fn test_seed_blank_rows_when_nothing_qualifies() {
        let table = seed(&ChecklistTable::new());
        assert_eq!(table.len(), 5);
        assert_eq!(table.columns().len(), 10);
    }

    #[test]
    fn test_add_pop_and_edit() {
        let mut store = ValueStore::new();
        assert_eq!(add_row(&mut store), 5);
        set_cell(&mut store, 5, "개선방안", "리프트 설치").unwrap();
        assert_eq!(table(&store).cell(5, "개선방안"), Some("리프트 설치"));
        let popped = pop_row(&mut store).unwrap();
        assert_eq!(popped[6], "리프트 설치");
        assert!(set_cell(&mut store, 0, "비용", "x").is_err());
    }
}
