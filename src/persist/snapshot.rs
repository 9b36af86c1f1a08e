//! JSON snapshot of a whole session
//!
//! The snapshot is a single document holding the session metadata, the
//! checklist and every store entry. Tables are written as lists of
//! objects so the file stays readable by other tools. Import is lenient:
//! lists of objects become tables, lists of strings become lists and
//! anything else becomes a scalar.

use chrono::NaiveDateTime;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::core::key::{ContextId, FieldId, ValueKey};
use crate::core::session::SessionMeta;
use crate::core::store::ValueStore;
use crate::core::value::{Scalar, Table, Value, TIMESTAMP_FORMAT};
use crate::entities::checklist::ChecklistTable;
use crate::entities::{detailed, hazard, improvement, work_condition};
use crate::persist::LoadOutcome;

pub const FORMAT: &str = "ergo-survey-snapshot";
pub const VERSION: u32 = 1;

#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    #[error("invalid snapshot: {0}")]
    #[diagnostic(code(ergo::snapshot::parse))]
    Parse(String),

    #[error("not a session snapshot (format '{0}')")]
    #[diagnostic(
        code(ergo::snapshot::format),
        help("snapshots are produced by `ergo snapshot export`")
    )]
    UnsupportedFormat(String),

    #[error("snapshot version {0} is newer than this tool supports")]
    #[diagnostic(code(ergo::snapshot::version))]
    UnsupportedVersion(u32),
}

/// One store entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub field: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    pub value: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub format: String,
    pub version: u32,
    pub session_id: String,
    pub workplace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub checklist: Vec<Map<String, JsonValue>>,
    #[serde(default)]
    pub entries: Vec<SnapshotEntry>,
}

fn table_to_json(table: &Table) -> JsonValue {
    JsonValue::Array(
        table
            .records()
            .into_iter()
            .map(|record| {
                JsonValue::Object(
                    record
                        .into_iter()
                        .map(|(col, cell)| (col.to_string(), JsonValue::String(cell.to_string())))
                        .collect(),
                )
            })
            .collect(),
    )
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Scalar(Scalar::Text(s)) => JsonValue::String(s.clone()),
        Value::Scalar(Scalar::Integer(n)) => JsonValue::from(*n),
        Value::Scalar(Scalar::Flag(b)) => JsonValue::Bool(*b),
        Value::Scalar(Scalar::Timestamp(ts)) => JsonValue::String(ts.format(TIMESTAMP_FORMAT).to_string()),
        Value::List(items) => JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect()),
        Value::Table(table) => table_to_json(table),
    }
}

/// Build the snapshot of a session
pub fn export(meta: &SessionMeta, store: &ValueStore) -> SnapshotDocument {
    let checklist = match table_to_json(&store.checklist.to_table()) {
        JsonValue::Array(rows) => rows
            .into_iter()
            .filter_map(|row| match row {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    SnapshotDocument {
        format: FORMAT.to_string(),
        version: VERSION,
        session_id: meta.session_id.clone(),
        workplace: meta.workplace.clone(),
        saved_at: meta.saved_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
        checklist,
        entries: store
            .entries()
            .map(|(key, value)| SnapshotEntry {
                field: key.field.code(),
                context: key.context.to_string(),
                value: value_to_json(value),
            })
            .collect(),
    }
}

pub fn to_json(doc: &SnapshotDocument) -> Result<String, SnapshotError> {
    serde_json::to_string_pretty(doc).map_err(|e| SnapshotError::Parse(e.to_string()))
}

pub fn from_json(text: &str) -> Result<SnapshotDocument, SnapshotError> {
    serde_json::from_str(text).map_err(|e| SnapshotError::Parse(e.to_string()))
}

fn owned(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

/// Columns a table field starts with, used when a snapshot holds an
/// empty list for it
fn default_columns(field: &FieldId) -> Option<Vec<String>> {
    match field {
        FieldId::WorkConditions => Some(owned(&work_condition::COLUMNS)),
        FieldId::HazardEntries => Some(hazard::columns()),
        FieldId::DetailedAnalysis => Some(owned(&detailed::ANALYSIS_COLUMNS)),
        FieldId::Symptom(section) => Some(owned(&section.columns())),
        FieldId::ImprovementPlan => Some(owned(&improvement::COLUMNS)),
        _ => None,
    }
}

fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Table from a list of objects; columns in first-seen order
fn table_from_objects(objects: &[&Map<String, JsonValue>]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for object in objects {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let rows = objects
        .iter()
        .map(|object| {
            columns
                .iter()
                .map(|c| object.get(c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();
    Table::with_rows(columns, rows)
}

fn value_from_json(field: &FieldId, value: &JsonValue) -> Result<Value, String> {
    Ok(match value {
        JsonValue::String(s) => Value::Scalar(Scalar::from_text(s)),
        JsonValue::Bool(b) => Value::Scalar(Scalar::Flag(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Scalar(Scalar::Integer(i)),
            None => Value::Scalar(Scalar::Text(n.to_string())),
        },
        JsonValue::Null => Value::text(""),
        JsonValue::Array(items) if items.is_empty() => match default_columns(field) {
            Some(columns) => Value::Table(Table::new(columns)),
            None => Value::List(Vec::new()),
        },
        JsonValue::Array(items) => {
            if let Some(objects) = items.iter().map(JsonValue::as_object).collect::<Option<Vec<_>>>() {
                Value::Table(table_from_objects(&objects))
            } else if let Some(strings) = items.iter().map(JsonValue::as_str).collect::<Option<Vec<_>>>() {
                Value::List(strings.into_iter().map(str::to_string).collect())
            } else {
                return Err("arrays must hold only objects or only strings".to_string());
            }
        }
        JsonValue::Object(_) => return Err("objects are not a supported value".to_string()),
    })
}

/// Rebuild a session from a snapshot
///
/// Entries that cannot be interpreted are skipped and reported.
pub fn import(doc: &SnapshotDocument) -> Result<LoadOutcome, SnapshotError> {
    if doc.format != FORMAT {
        return Err(SnapshotError::UnsupportedFormat(doc.format.clone()));
    }
    if doc.version > VERSION {
        return Err(SnapshotError::UnsupportedVersion(doc.version));
    }
    if doc.session_id.trim().is_empty() {
        return Err(SnapshotError::Parse("missing session_id".to_string()));
    }

    let mut warnings = Vec::new();
    let saved_at = match doc.saved_at.as_deref() {
        None | Some("") => None,
        Some(text) => match NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warnings.push(format!("saved_at '{}': {}", text, e));
                None
            }
        },
    };

    let mut store = ValueStore::new();
    if !doc.checklist.is_empty() {
        let objects: Vec<&Map<String, JsonValue>> = doc.checklist.iter().collect();
        store.checklist = ChecklistTable::from_table(&table_from_objects(&objects));
    }

    for (i, entry) in doc.entries.iter().enumerate() {
        let context: ContextId = match entry.context.parse() {
            Ok(c) => c,
            Err(e) => {
                warnings.push(format!("entry {} ({}): {}", i + 1, entry.field, e));
                continue;
            }
        };
        let field = FieldId::from_code(&entry.field);
        match value_from_json(&field, &entry.value) {
            Ok(value) => store.set(ValueKey::new(field, context), value),
            Err(e) => warnings.push(format!("entry {} ({}): {}", i + 1, entry.field, e)),
        }
    }

    Ok(LoadOutcome {
        meta: SessionMeta {
            session_id: doc.session_id.clone(),
            workplace: doc.workplace.clone(),
            saved_at,
        },
        store,
        warnings,
    })
}
