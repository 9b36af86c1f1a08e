//! Mapping between the value store and a [`SheetBook`]
//!
//! Layout of a saved session:
//!
//! | Sheet | Content |
//! |---|---|
//! | `메타데이터` | session id, workplace, save time, overview fields |
//! | `체크리스트` | the checklist, including row ids |
//! | `조사표_<unit>` | survey form fields of a unit (codes, then values) |
//! | `작업조건_<unit>` | work-condition table of a unit |
//! | `원인분석_<unit>` | cause-analysis table of a unit |
//! | `정밀_<name>` | investigation header fields, a blank row, then its analysis table |
//! | `증상_<section>` | one symptom aggregate table |
//! | `개선계획서` | improvement plan |
//! | `기타입력` | every other value as `field, context, kind, value` |
//! | `시트색인` | `sheet, kind, context, rows` for every data sheet |
//!
//! Sheet names are sanitized, so the index is what maps a sheet back to
//! its exact unit or investigation name. Sheets without an index entry
//! fall back to stripping the prefix from the sheet name.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::key::{ContextId, FieldId, ValueKey};
use crate::core::session::SessionMeta;
use crate::core::store::ValueStore;
use crate::core::value::{Scalar, Table, Value, TIMESTAMP_FORMAT};
use crate::entities::checklist::ChecklistTable;
use crate::entities::survey_form::form_fields;
use crate::entities::symptom::SymptomSection;
use crate::persist::book::{Sheet, SheetBook};
use crate::persist::LoadOutcome;

pub const METADATA_SHEET: &str = "메타데이터";
pub const CHECKLIST_SHEET: &str = "체크리스트";
pub const PLAN_SHEET: &str = "개선계획서";
pub const OTHER_SHEET: &str = "기타입력";
pub const INDEX_SHEET: &str = "시트색인";

const META_SESSION_ID: &str = "session_id";
const META_WORKPLACE: &str = "workplace";
const META_SAVED_AT: &str = "saved_at";

/// First row of the analysis table in a `정밀_` sheet
const DETAILED_TABLE_ROW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetKind {
    Checklist,
    Form,
    Conditions,
    Hazards,
    Detailed,
    Symptom,
    Plan,
}

impl SheetKind {
    const PREFIXED: [SheetKind; 5] = [
        SheetKind::Form,
        SheetKind::Conditions,
        SheetKind::Hazards,
        SheetKind::Detailed,
        SheetKind::Symptom,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Checklist => "checklist",
            SheetKind::Form => "form",
            SheetKind::Conditions => "conditions",
            SheetKind::Hazards => "hazards",
            SheetKind::Detailed => "detailed",
            SheetKind::Symptom => "symptom",
            SheetKind::Plan => "plan",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        [
            SheetKind::Checklist,
            SheetKind::Form,
            SheetKind::Conditions,
            SheetKind::Hazards,
            SheetKind::Detailed,
            SheetKind::Symptom,
            SheetKind::Plan,
        ]
        .into_iter()
        .find(|k| k.as_str() == s)
    }

    fn prefix(&self) -> &'static str {
        match self {
            SheetKind::Form => "조사표_",
            SheetKind::Conditions => "작업조건_",
            SheetKind::Hazards => "원인분석_",
            SheetKind::Detailed => "정밀_",
            SheetKind::Symptom => "증상_",
            SheetKind::Checklist | SheetKind::Plan => "",
        }
    }

    /// Guess the kind and context of a sheet from its name alone
    fn from_sheet_name(name: &str) -> Option<(Self, String)> {
        match name {
            CHECKLIST_SHEET => return Some((SheetKind::Checklist, String::new())),
            PLAN_SHEET => return Some((SheetKind::Plan, String::new())),
            _ => {}
        }
        Self::PREFIXED.into_iter().find_map(|kind| {
            name.strip_prefix(kind.prefix())
                .map(|context| (kind, context.to_string()))
        })
    }
}

/// Where one data sheet came from
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    kind: SheetKind,
    context: String,
    rows: usize,
}

/// Table payload inside `기타입력`
#[derive(Serialize, Deserialize)]
struct TableDump {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A scalar that survives being written as text and re-read
fn textual(scalar: &Scalar) -> bool {
    Scalar::from_text(&scalar.as_text()) == *scalar
}

/// A table whose header can be recovered from a sheet
fn tabular(table: &Table) -> bool {
    !table.columns().is_empty() && table.columns().iter().all(|c| !c.trim().is_empty())
}

fn table_rows(table: &Table) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(table.len() + 1);
    rows.push(table.columns().to_vec());
    rows.extend(table.rows().iter().cloned());
    rows
}

#[derive(Default)]
struct DetailedParts<'a> {
    header: Vec<(String, String)>,
    analysis: Option<&'a Table>,
}

/// Encode a session into sheets
pub fn encode(meta: &SessionMeta, store: &ValueStore) -> SheetBook {
    let form_fields = form_fields();
    let overview_fields = FieldId::overview();

    let mut overview: Vec<(String, String)> = Vec::new();
    let mut forms: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
    let mut conditions: BTreeMap<&str, &Table> = BTreeMap::new();
    let mut hazards: BTreeMap<&str, &Table> = BTreeMap::new();
    let mut detailed: BTreeMap<&str, DetailedParts> = BTreeMap::new();
    let mut symptoms: Vec<(SymptomSection, &Table)> = Vec::new();
    let mut plan: Option<&Table> = None;
    let mut other = Sheet::new(OTHER_SHEET);

    for (key, value) in store.entries() {
        match (&key.context, &key.field, value) {
            (ContextId::Global, field, Value::Scalar(s))
                if overview_fields.contains(field) && textual(s) =>
            {
                overview.push((field.code(), s.as_text()));
            }
            (ContextId::Unit(unit), field, Value::Scalar(s))
                if form_fields.contains(field) && textual(s) =>
            {
                forms
                    .entry(unit.as_str())
                    .or_default()
                    .push((field.code(), s.as_text()));
            }
            (ContextId::Unit(unit), FieldId::WorkConditions, Value::Table(t)) if tabular(t) => {
                conditions.insert(unit.as_str(), t);
            }
            (ContextId::Unit(unit), FieldId::HazardEntries, Value::Table(t)) if tabular(t) => {
                hazards.insert(unit.as_str(), t);
            }
            (
                ContextId::Investigation(name),
                field @ (FieldId::DetailedProcess | FieldId::DetailedJob),
                Value::Scalar(s),
            ) if textual(s) => {
                detailed
                    .entry(name.as_str())
                    .or_default()
                    .header
                    .push((field.code(), s.as_text()));
            }
            (ContextId::Investigation(name), FieldId::DetailedAnalysis, Value::Table(t))
                if tabular(t) =>
            {
                detailed.entry(name.as_str()).or_default().analysis = Some(t);
            }
            (ContextId::Global, FieldId::Symptom(section), Value::Table(t)) if tabular(t) => {
                symptoms.push((*section, t));
            }
            (ContextId::Global, FieldId::ImprovementPlan, Value::Table(t)) if tabular(t) => {
                plan = Some(t);
            }
            _ => other.push(other_row(key, value)),
        }
    }

    let mut book = SheetBook::new();
    let mut index: Vec<(String, IndexEntry)> = Vec::new();
    let mut add = |book: &mut SheetBook, sheet: Sheet, kind: SheetKind, context: &str, rows: usize| {
        let name = book.add(sheet);
        index.push((
            name,
            IndexEntry {
                kind,
                context: context.to_string(),
                rows,
            },
        ));
    };

    // Metadata
    let mut header = vec![
        META_SESSION_ID.to_string(),
        META_WORKPLACE.to_string(),
        META_SAVED_AT.to_string(),
    ];
    let mut values = vec![
        meta.session_id.clone(),
        meta.workplace.clone(),
        meta.saved_at
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default(),
    ];
    for (code, value) in overview {
        header.push(code);
        values.push(value);
    }
    book.add(Sheet {
        name: METADATA_SHEET.to_string(),
        rows: vec![header, values],
    });

    if !store.checklist.is_empty() {
        let table = store.checklist.to_table();
        let sheet = Sheet {
            name: CHECKLIST_SHEET.to_string(),
            rows: table_rows(&table),
        };
        add(&mut book, sheet, SheetKind::Checklist, "", table.len());
    }

    for (unit, fields) in forms {
        let (codes, values): (Vec<String>, Vec<String>) = fields.into_iter().unzip();
        let sheet = Sheet {
            name: format!("{}{}", SheetKind::Form.prefix(), unit),
            rows: vec![codes, values],
        };
        add(&mut book, sheet, SheetKind::Form, unit, 1);
    }

    for (kind, tables) in [(SheetKind::Conditions, &conditions), (SheetKind::Hazards, &hazards)] {
        for (&unit, &table) in tables.iter() {
            let sheet = Sheet {
                name: format!("{}{}", kind.prefix(), unit),
                rows: table_rows(table),
            };
            add(&mut book, sheet, kind, unit, table.len());
        }
    }

    for (name, parts) in detailed {
        let (codes, values): (Vec<String>, Vec<String>) = parts.header.into_iter().unzip();
        let mut rows = vec![codes, values, Vec::new()];
        let mut count = 0;
        if let Some(table) = parts.analysis {
            rows.extend(table_rows(table));
            count = table.len();
        }
        let sheet = Sheet {
            name: format!("{}{}", SheetKind::Detailed.prefix(), name),
            rows,
        };
        add(&mut book, sheet, SheetKind::Detailed, name, count);
    }

    for (section, table) in symptoms {
        let sheet = Sheet {
            name: format!("{}{}", SheetKind::Symptom.prefix(), section.label()),
            rows: table_rows(table),
        };
        add(&mut book, sheet, SheetKind::Symptom, section.label(), table.len());
    }

    if let Some(table) = plan {
        let sheet = Sheet {
            name: PLAN_SHEET.to_string(),
            rows: table_rows(table),
        };
        add(&mut book, sheet, SheetKind::Plan, "", table.len());
    }

    if !other.rows.is_empty() {
        book.add(other);
    }

    let mut index_sheet = Sheet::new(INDEX_SHEET);
    for (name, entry) in index {
        index_sheet.push(vec![
            name,
            entry.kind.as_str().to_string(),
            entry.context,
            entry.rows.to_string(),
        ]);
    }
    book.add(index_sheet);

    book
}

fn other_row(key: &ValueKey, value: &Value) -> Vec<String> {
    let (kind, text) = match value {
        Value::Scalar(Scalar::Text(s)) => ("text", s.clone()),
        Value::Scalar(Scalar::Integer(n)) => ("integer", n.to_string()),
        Value::Scalar(Scalar::Flag(b)) => ("flag", b.to_string()),
        Value::Scalar(Scalar::Timestamp(ts)) => ("timestamp", ts.format(TIMESTAMP_FORMAT).to_string()),
        // Serializing plain strings into JSON cannot fail
        Value::List(items) => ("list", serde_json::to_string(items).unwrap_or_default()),
        Value::Table(table) => {
            let dump = TableDump {
                columns: table.columns().to_vec(),
                rows: table.rows().to_vec(),
            };
            ("table", serde_json::to_string(&dump).unwrap_or_default())
        }
    };
    vec![
        key.field.code(),
        key.context.to_string(),
        kind.to_string(),
        text,
    ]
}

fn parse_other_row(row: &[String]) -> Result<(ValueKey, Value), String> {
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
    let field = cell(0);
    if field.is_empty() {
        return Err("row without a field code".to_string());
    }
    let context: ContextId = cell(1).parse()?;
    let text = cell(3);

    let value = match cell(2) {
        "text" => Value::Scalar(Scalar::Text(text.to_string())),
        "integer" => Value::Scalar(Scalar::Integer(
            text.parse().map_err(|e| format!("{}: {}", field, e))?,
        )),
        "flag" => Value::Scalar(Scalar::Flag(
            text.parse().map_err(|e| format!("{}: {}", field, e))?,
        )),
        "timestamp" => Value::Scalar(Scalar::Timestamp(
            NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
                .map_err(|e| format!("{}: {}", field, e))?,
        )),
        "list" => Value::List(serde_json::from_str(text).map_err(|e| format!("{}: {}", field, e))?),
        "table" => {
            let dump: TableDump =
                serde_json::from_str(text).map_err(|e| format!("{}: {}", field, e))?;
            Value::Table(Table::with_rows(dump.columns, dump.rows))
        }
        other => return Err(format!("{}: unknown value kind '{}'", field, other)),
    };
    Ok((ValueKey::new(FieldId::from_code(field), context), value))
}

/// Header/value pairs from a two-row sheet segment, skipping blank codes
fn pairs(rows: &[Vec<String>], at: usize) -> Vec<(String, String)> {
    let Some(codes) = rows.get(at) else {
        return Vec::new();
    };
    let values = rows.get(at + 1);
    codes
        .iter()
        .enumerate()
        .filter(|(_, code)| !code.trim().is_empty())
        .map(|(i, code)| {
            let value = values.and_then(|v| v.get(i)).cloned().unwrap_or_default();
            (code.clone(), value)
        })
        .collect()
}

/// Read a table whose header is at row `start`, padding to `rows` data rows
fn read_table(rows: &[Vec<String>], start: usize, count: Option<usize>) -> Result<Table, String> {
    let mut header = rows
        .get(start)
        .cloned()
        .ok_or_else(|| "missing header row".to_string())?;
    while header.last().is_some_and(|c| c.trim().is_empty()) {
        header.pop();
    }
    if header.is_empty() {
        return Err("empty header row".to_string());
    }

    let mut data: Vec<Vec<String>> = rows.iter().skip(start + 1).cloned().collect();
    if let Some(count) = count {
        // Trailing blank rows are not stored in the workbook
        while data.len() < count {
            data.push(Vec::new());
        }
    }
    Ok(Table::with_rows(header, data))
}

fn parse_index(sheet: &Sheet, warnings: &mut Vec<String>) -> HashMap<String, IndexEntry> {
    let mut index = HashMap::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        let cell = |c: usize| row.get(c).map(String::as_str).unwrap_or("");
        let Some(kind) = SheetKind::parse(cell(1)) else {
            warnings.push(format!("{} row {}: unknown sheet kind '{}'", INDEX_SHEET, i + 1, cell(1)));
            continue;
        };
        let rows = cell(3).parse().unwrap_or(0);
        index.insert(
            cell(0).to_string(),
            IndexEntry {
                kind,
                context: cell(2).to_string(),
                rows,
            },
        );
    }
    index
}

fn decode_metadata(sheet: &Sheet, store: &mut ValueStore) -> Result<(SessionMeta, Vec<String>), String> {
    let fields = pairs(&sheet.rows, 0);
    let lookup = |name: &str| {
        fields
            .iter()
            .find(|(code, _)| code == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let session_id = lookup(META_SESSION_ID);
    if session_id.trim().is_empty() {
        return Err(format!("{} has no session id", METADATA_SHEET));
    }

    let mut warnings = Vec::new();
    let saved_at = match lookup(META_SAVED_AT).trim() {
        "" => None,
        text => match NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warnings.push(format!("{}: invalid saved_at '{}': {}", METADATA_SHEET, text, e));
                None
            }
        },
    };

    for (code, value) in &fields {
        if [META_SESSION_ID, META_WORKPLACE, META_SAVED_AT].contains(&code.as_str()) {
            continue;
        }
        store.set(
            ValueKey::global(FieldId::from_code(code)),
            Value::Scalar(Scalar::from_text(value)),
        );
    }

    let meta = SessionMeta {
        session_id,
        workplace: lookup(META_WORKPLACE),
        saved_at,
    };
    Ok((meta, warnings))
}

/// Read only the session metadata of a book (used for listings)
pub fn decode_meta(book: &SheetBook) -> Result<SessionMeta, String> {
    let sheet = book
        .get(METADATA_SHEET)
        .ok_or_else(|| format!("missing {} sheet", METADATA_SHEET))?;
    let mut scratch = ValueStore::new();
    decode_metadata(sheet, &mut scratch).map(|(meta, _)| meta)
}

fn decode_sheet(sheet: &Sheet, entry: &IndexEntry, store: &mut ValueStore) -> Result<(), String> {
    let context = entry.context.as_str();
    let count = Some(entry.rows);

    match entry.kind {
        SheetKind::Checklist => {
            store.checklist = ChecklistTable::from_table(&read_table(&sheet.rows, 0, count)?);
        }
        SheetKind::Form => {
            for (code, value) in pairs(&sheet.rows, 0) {
                store.set(
                    ValueKey::unit(FieldId::from_code(&code), context),
                    Value::Scalar(Scalar::from_text(&value)),
                );
            }
        }
        SheetKind::Conditions => {
            let table = read_table(&sheet.rows, 0, count)?;
            store.set(ValueKey::unit(FieldId::WorkConditions, context), Value::Table(table));
        }
        SheetKind::Hazards => {
            let table = read_table(&sheet.rows, 0, count)?;
            store.set(ValueKey::unit(FieldId::HazardEntries, context), Value::Table(table));
        }
        SheetKind::Detailed => {
            for (code, value) in pairs(&sheet.rows, 0) {
                store.set(
                    ValueKey::investigation(FieldId::from_code(&code), context),
                    Value::Scalar(Scalar::from_text(&value)),
                );
            }
            if sheet.rows.len() > DETAILED_TABLE_ROW {
                let table = read_table(&sheet.rows, DETAILED_TABLE_ROW, count)?;
                store.set(
                    ValueKey::investigation(FieldId::DetailedAnalysis, context),
                    Value::Table(table),
                );
            }
        }
        SheetKind::Symptom => {
            let section = SymptomSection::from_label(context)
                .ok_or_else(|| format!("unknown symptom section '{}'", context))?;
            let table = read_table(&sheet.rows, 0, count)?;
            store.set(ValueKey::global(FieldId::Symptom(section)), Value::Table(table));
        }
        SheetKind::Plan => {
            let table = read_table(&sheet.rows, 0, count)?;
            store.set(ValueKey::global(FieldId::ImprovementPlan), Value::Table(table));
        }
    }
    Ok(())
}

/// Decode a session from sheets
///
/// A missing or unreadable metadata sheet is fatal. Any other sheet that
/// fails to decode is reported in the warnings and skipped; sheets this
/// layout does not know are ignored.
pub fn decode(book: &SheetBook) -> Result<LoadOutcome, String> {
    let mut store = ValueStore::new();
    let metadata = book
        .get(METADATA_SHEET)
        .ok_or_else(|| format!("missing {} sheet", METADATA_SHEET))?;
    let (meta, mut warnings) = decode_metadata(metadata, &mut store)?;

    let index = match book.get(INDEX_SHEET) {
        Some(sheet) => parse_index(sheet, &mut warnings),
        None => HashMap::new(),
    };

    for sheet in book.sheets() {
        if [METADATA_SHEET, INDEX_SHEET, OTHER_SHEET].contains(&sheet.name.as_str()) {
            continue;
        }
        let entry = match index.get(&sheet.name) {
            Some(entry) => entry.clone(),
            None => match SheetKind::from_sheet_name(&sheet.name) {
                Some((kind, context)) => IndexEntry {
                    kind,
                    context,
                    rows: 0,
                },
                None => {
                    tracing::debug!(sheet = %sheet.name, "ignoring unknown sheet");
                    continue;
                }
            },
        };
        if let Err(e) = decode_sheet(sheet, &entry, &mut store) {
            tracing::warn!(sheet = %sheet.name, error = %e, "skipping unreadable sheet");
            warnings.push(format!("{}: {}", sheet.name, e));
        }
    }

    if let Some(sheet) = book.get(OTHER_SHEET) {
        for (i, row) in sheet.rows.iter().enumerate() {
            if !Table::row_has_content(row) {
                continue;
            }
            match parse_other_row(row) {
                Ok((key, value)) => store.set(key, value),
                Err(e) => warnings.push(format!("{} row {}: {}", OTHER_SHEET, i + 1, e)),
            }
        }
    }

    Ok(LoadOutcome {
        meta,
        store,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::{ChecklistRow, CriterionState};
    use crate::entities::survey_form::SituationItem;
    use crate::entities::{detailed, hazard, improvement, work_condition};
    use chrono::NaiveDate;

    fn sample_meta() -> SessionMeta {
        SessionMeta {
            session_id: "A사업장_20240501_143000".into(),
            workplace: "A사업장".into(),
            saved_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(14, 30, 0),
        }
    }

    fn sample_store() -> ValueStore {
        let mut store = ValueStore::new();
        store.checklist = ChecklistTable::sample();
        store.checklist.push(
            ChecklistRow::new("A", "B", "조립/1반", "볼트 체결")
                .with_criterion(2, CriterionState::PotentialRisk),
        );
        store.set_scalar(ValueKey::global(FieldId::WorkplaceName), "A사업장");
        store.set_scalar(ValueKey::global(FieldId::Location), "서울");
        store.set_scalar(ValueKey::unit(FieldId::Surveyor, "조립/1반"), "홍길동");
        store.set_scalar(
            ValueKey::unit(FieldId::SituationStatus(SituationItem::Speed), "조립/1반"),
            "증가",
        );
        store.set_scalar(ValueKey::unit(FieldId::SurveyDate, "조립/1반"), Scalar::from_text("2024-05-01 09:00:00"));
        store.set_scalar(ValueKey::unit(FieldId::PhotoCount, "조립/1반"), 3i64);
        store.set(
            ValueKey::unit(FieldId::StageOneContent, "조립/1반"),
            Value::Scalar(Scalar::Flag(true)),
        );
        work_condition::rate(&mut store, "조립/1반", 0, Some("쉬움(2)"), Some("자주(3)")).unwrap();
        hazard::add(&mut store, "조립/1반");
        let name = detailed::add(&mut store);
        detailed::set_header(&mut store, &name, FieldId::DetailedJob, "운반").unwrap();
        improvement::add_row(&mut store);
        store
    }

    #[test]
    fn test_roundtrip_preserves_store() {
        let store = sample_store();
        let book = encode(&sample_meta(), &store);
        let outcome = decode(&book).unwrap();
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.meta, sample_meta());
        assert_eq!(outcome.store, store);
    }

    #[test]
    fn test_roundtrip_of_empty_store() {
        let store = ValueStore::new();
        let outcome = decode(&encode(&sample_meta(), &store)).unwrap();
        assert_eq!(outcome.store, store);
    }

    #[test]
    fn test_sheet_names_are_sanitized() {
        let book = encode(&sample_meta(), &sample_store());
        assert!(book.get("조사표_조립_1반").is_some());
        assert!(book.get("작업조건_조립_1반").is_some());
        assert!(book.get("정밀_정밀조사_1").is_some());
    }

    #[test]
    fn test_text_that_looks_like_a_timestamp_stays_text() {
        let mut store = ValueStore::new();
        let key = ValueKey::global(FieldId::Industry);
        store.set(key, Value::text("2024-01-01 00:00:00"));
        let outcome = decode(&encode(&sample_meta(), &store)).unwrap();
        assert_eq!(outcome.store, store);
    }

    #[test]
    fn test_missing_metadata_is_fatal() {
        let mut book = SheetBook::new();
        book.add(Sheet::new(CHECKLIST_SHEET));
        assert!(decode(&book).is_err());
    }

    #[test]
    fn test_bad_sheet_becomes_warning() {
        let mut book = encode(&sample_meta(), &sample_store());
        book.push_raw(Sheet {
            name: "작업조건_빈시트".into(),
            rows: Vec::new(),
        });
        book.push_raw(Sheet {
            name: "낯선시트".into(),
            rows: vec![vec!["x".into()]],
        });
        let outcome = decode(&book).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("작업조건_빈시트"));
        assert_eq!(outcome.store.checklist.len(), 6);
    }

    #[test]
    fn test_sheets_without_index_use_prefix() {
        let mut book = SheetBook::new();
        book.add(Sheet {
            name: METADATA_SHEET.into(),
            rows: vec![
                vec![META_SESSION_ID.into(), META_WORKPLACE.into()],
                vec!["s1".into(), "W".into()],
            ],
        });
        book.add(Sheet {
            name: "조사표_포장반".into(),
            rows: vec![vec!["조사자".into()], vec!["김".into()]],
        });
        let outcome = decode(&book).unwrap();
        assert_eq!(outcome.meta.workplace, "W");
        assert_eq!(
            outcome.store.text(&ValueKey::unit(FieldId::Surveyor, "포장반")),
            "김"
        );
    }

    #[test]
    fn test_trailing_blank_rows_survive() {
        let mut store = ValueStore::new();
        // Seeded plan has five blank rows
        improvement::add_row(&mut store);
        let mut book = encode(&sample_meta(), &store);

        // Simulate a reader that drops trailing blank rows
        let mut trimmed = SheetBook::new();
        for sheet in book.sheets() {
            let mut sheet = sheet.clone();
            while sheet.rows.last().is_some_and(|r| !Table::row_has_content(r)) {
                sheet.rows.pop();
            }
            trimmed.push_raw(sheet);
        }
        book = trimmed;

        let outcome = decode(&book).unwrap();
        assert_eq!(improvement::table(&outcome.store).len(), 6);
    }
}
