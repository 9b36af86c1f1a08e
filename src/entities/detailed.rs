//! Detailed investigations (정밀조사)

use crate::core::key::{ContextId, FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;
use crate::core::value::{Table, Value};

pub const NAME_PREFIX: &str = "정밀조사_";

pub const ANALYSIS_COLUMNS: [&str; 3] = ["작업분석 및 평가도구", "분석결과", "만점"];

const ANALYSIS_ROWS: usize = 7;

fn list_key() -> ValueKey {
    ValueKey::global(FieldId::DetailedList)
}

/// Investigation names in creation order
pub fn list(store: &ValueStore) -> Vec<String> {
    store.list(&list_key()).to_vec()
}

/// Blank analysis table for a new investigation
pub fn blank_analysis() -> Table {
    let mut table = Table::new(ANALYSIS_COLUMNS);
    for _ in 0..ANALYSIS_ROWS {
        table.push_blank();
    }
    table
}

/// Add an investigation under the next unused `정밀조사_N` name
pub fn add(store: &mut ValueStore) -> String {
    let names = list(store);
    let mut n = names.len() + 1;
    while names.contains(&format!("{}{}", NAME_PREFIX, n)) {
        n += 1;
    }
    let name = format!("{}{}", NAME_PREFIX, n);
    insert(store, names, name.clone());
    name
}

/// Add an investigation with an explicit name
pub fn add_named(store: &mut ValueStore, name: &str) -> Result<String, ValidationWarning> {
    let name = name.trim();
    let names = list(store);
    if name.is_empty() || names.iter().any(|n| n == name) {
        return Err(ValidationWarning::invalid_option(
            "정밀조사명",
            name,
            &["a new, non-empty name"],
        ));
    }
    insert(store, names, name.to_string());
    Ok(name.to_string())
}

fn insert(store: &mut ValueStore, mut names: Vec<String>, name: String) {
    store.set(
        ValueKey::investigation(FieldId::DetailedAnalysis, &name),
        Value::Table(blank_analysis()),
    );
    names.push(name);
    store.set_list(list_key(), names);
}

/// Remove an investigation and every value it owns
pub fn remove(store: &mut ValueStore, name: &str) -> Result<usize, ValidationWarning> {
    let mut names = list(store);
    let Some(pos) = names.iter().position(|n| n == name) else {
        return Err(ValidationWarning::NothingToRemove(name.to_string()));
    };
    names.remove(pos);
    store.set_list(list_key(), names);
    Ok(store.remove_context(&ContextId::investigation(name)))
}

fn require(store: &ValueStore, name: &str) -> Result<(), ValidationWarning> {
    if list(store).iter().any(|n| n == name) {
        Ok(())
    } else {
        let names = list(store);
        let allowed: Vec<&str> = names.iter().map(String::as_str).collect();
        Err(ValidationWarning::invalid_option("정밀조사명", name, &allowed))
    }
}

/// Set the process or job name of an investigation
pub fn set_header(
    store: &mut ValueStore,
    name: &str,
    field: FieldId,
    value: &str,
) -> Result<(), ValidationWarning> {
    require(store, name)?;
    if !matches!(field, FieldId::DetailedProcess | FieldId::DetailedJob) {
        return Err(ValidationWarning::UnknownColumn(field.code()));
    }
    store.set_scalar(ValueKey::investigation(field, name), value);
    Ok(())
}

/// Write one analysis cell; `row == len` appends a row
pub fn set_analysis(
    store: &mut ValueStore,
    name: &str,
    row: usize,
    column: &str,
    value: &str,
) -> Result<(), ValidationWarning> {
    require(store, name)?;
    if !ANALYSIS_COLUMNS.contains(&column) {
        return Err(ValidationWarning::UnknownColumn(column.to_string()));
    }
    let table = store.table_or_insert_with(
        ValueKey::investigation(FieldId::DetailedAnalysis, name),
        blank_analysis,
    );
    if row == table.len() {
        table.push_blank();
    }
    if table.set_cell(row, column, value) {
        Ok(())
    } else {
        Err(ValidationWarning::RowOutOfRange {
            index: row,
            len: table.len(),
        })
    }
}

/// Read view of one investigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedSurvey {
    pub name: String,
    pub process_name: String,
    pub job_name: String,
    pub analysis: Table,
}

impl DetailedSurvey {
    pub fn read(store: &ValueStore, name: &str) -> Self {
        Self {
            name: name.to_string(),
            process_name: store.text(&ValueKey::investigation(FieldId::DetailedProcess, name)),
            job_name: store.text(&ValueKey::investigation(FieldId::DetailedJob, name)),
            analysis: store
                .table(&ValueKey::investigation(FieldId::DetailedAnalysis, name))
                .cloned()
                .unwrap_or_else(blank_analysis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_uses_sequential_names() {
        let mut store = ValueStore::new();
        assert_eq!(add(&mut store), "정밀조사_1");
        assert_eq!(add(&mut store), "정밀조사_2");
        assert_eq!(list(&store), vec!["정밀조사_1", "정밀조사_2"]);
    }

    #[test]
    fn test_add_after_remove_does_not_collide() {
        let mut store = ValueStore::new();
        add(&mut store);
        add(&mut store);
        remove(&mut store, "정밀조사_1").unwrap();
        assert_eq!(add(&mut store), "정밀조사_3");
    }

    #[test]
    fn test_remove_purges_context() {
        let mut store = ValueStore::new();
        let name = add(&mut store);
        set_header(&mut store, &name, FieldId::DetailedJob, "운반").unwrap();
        assert_eq!(remove(&mut store, &name), Ok(2));
        assert!(list(&store).is_empty());
        assert_eq!(store.len(), 1); // the (now empty) list itself
    }

    #[test]
    fn test_new_investigation_has_seven_blank_rows() {
        let mut store = ValueStore::new();
        let name = add(&mut store);
        let survey = DetailedSurvey::read(&store, &name);
        assert_eq!(survey.analysis.len(), 7);
        assert_eq!(survey.analysis.columns(), ANALYSIS_COLUMNS);
    }

    #[test]
    fn test_set_analysis_validates() {
        let mut store = ValueStore::new();
        let name = add(&mut store);
        set_analysis(&mut store, &name, 0, "분석결과", "RULA 7점").unwrap();
        set_analysis(&mut store, &name, 7, "만점", "7").unwrap();
        assert_eq!(DetailedSurvey::read(&store, &name).analysis.len(), 8);
        assert!(set_analysis(&mut store, &name, 0, "점수", "1").is_err());
        assert!(set_analysis(&mut store, "없음", 0, "만점", "1").is_err());
    }

    #[test]
    fn test_add_named_rejects_duplicates() {
        let mut store = ValueStore::new();
        add_named(&mut store, "허리부담").unwrap();
        assert!(add_named(&mut store, "허리부담").is_err());
        assert!(add_named(&mut store, "  ").is_err());
    }
}
