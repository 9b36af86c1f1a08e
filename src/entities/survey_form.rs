//! Per-unit hazard survey form (유해요인조사표)
//!
//! The form has an overview block and four workplace-situation items, each
//! with a change status and a detail that only applies when the status is
//! not "unchanged".

use serde::{Deserialize, Serialize};

use crate::core::key::{FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;

/// Workplace situation items surveyed per unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SituationItem {
    Equipment,
    Volume,
    Speed,
    Workflow,
}

impl SituationItem {
    pub const ALL: [SituationItem; 4] = [
        SituationItem::Equipment,
        SituationItem::Volume,
        SituationItem::Speed,
        SituationItem::Workflow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SituationItem::Equipment => "작업설비",
            SituationItem::Volume => "작업량",
            SituationItem::Speed => "작업속도",
            SituationItem::Workflow => "업무변화",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.label() == label)
    }

    /// Accepts the Korean label or an English name
    pub fn parse_input(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "equipment" => Some(SituationItem::Equipment),
            "volume" => Some(SituationItem::Volume),
            "speed" => Some(SituationItem::Speed),
            "workflow" => Some(SituationItem::Workflow),
            other => Self::from_label(other),
        }
    }
}

/// Change status of a situation item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SituationChange {
    #[default]
    Unchanged,
    Decreased,
    Increased,
    Other,
}

impl SituationChange {
    pub const ALL: [SituationChange; 4] = [
        SituationChange::Unchanged,
        SituationChange::Decreased,
        SituationChange::Increased,
        SituationChange::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SituationChange::Unchanged => "변화없음",
            SituationChange::Decreased => "감소",
            SituationChange::Increased => "증가",
            SituationChange::Other => "기타",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }

    /// Prompt for the detail field, if this status takes one
    pub fn detail_prompt(&self) -> Option<&'static str> {
        match self {
            SituationChange::Unchanged => None,
            SituationChange::Decreased | SituationChange::Increased => Some("언제부터"),
            SituationChange::Other => Some("내용"),
        }
    }
}

impl std::fmt::Display for SituationChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One situation item as entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Situation {
    pub item: SituationItem,
    pub change: SituationChange,
    pub detail: String,
}

impl Situation {
    /// Detail text that is relevant for the current status
    pub fn effective_detail(&self) -> &str {
        match self.change {
            SituationChange::Unchanged => "",
            _ => &self.detail,
        }
    }
}

/// Editable overview fields of the survey form, in display order
pub const OVERVIEW_FIELDS: [FieldId; 5] = [
    FieldId::SurveyDate,
    FieldId::Department,
    FieldId::Surveyor,
    FieldId::ProcessName,
    FieldId::JobName,
];

/// Display label of an overview field
pub fn overview_label(field: &FieldId) -> &'static str {
    match field {
        FieldId::SurveyDate => "조사일시",
        FieldId::Department => "부서명",
        FieldId::Surveyor => "조사자",
        FieldId::ProcessName => "작업공정명",
        FieldId::JobName => "작업명(반)",
        _ => "",
    }
}

/// Resolve a user-supplied overview field name (Korean label or English)
pub fn parse_field(input: &str) -> Option<FieldId> {
    let field = match input.trim().to_lowercase().as_str() {
        "date" | "survey_date" | "조사일시" => FieldId::SurveyDate,
        "department" | "부서명" => FieldId::Department,
        "surveyor" | "조사자" => FieldId::Surveyor,
        "process" | "작업공정명" => FieldId::ProcessName,
        "job" | "작업명" | "작업명(반)" => FieldId::JobName,
        _ => return None,
    };
    Some(field)
}

/// Every field that belongs to the form sheet of a unit
pub fn form_fields() -> Vec<FieldId> {
    let mut fields = OVERVIEW_FIELDS.to_vec();
    for item in SituationItem::ALL {
        fields.push(FieldId::SituationStatus(item));
        fields.push(FieldId::SituationDetail(item));
    }
    fields
}

/// Read view of one unit's survey form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyForm {
    pub unit: String,
    pub survey_date: String,
    pub department: String,
    pub surveyor: String,
    pub process_name: String,
    pub job_name: String,
    pub situations: Vec<Situation>,
}

impl SurveyForm {
    /// Collect the form for `unit`
    ///
    /// Unset department falls back to the unit's department on the
    /// checklist; unset process and job names fall back to the unit name.
    pub fn read(store: &ValueStore, unit: &str) -> Self {
        let text = |field: FieldId| store.text(&ValueKey::unit(field, unit));
        let or = |value: String, fallback: &str| {
            if value.trim().is_empty() {
                fallback.to_string()
            } else {
                value
            }
        };
        let default_department = store
            .checklist
            .rows_for_unit(unit)
            .map(|r| r.department.clone())
            .next()
            .unwrap_or_default();

        let situations = SituationItem::ALL
            .into_iter()
            .map(|item| Situation {
                item,
                change: SituationChange::from_label(&text(FieldId::SituationStatus(item)))
                    .unwrap_or_default(),
                detail: text(FieldId::SituationDetail(item)),
            })
            .collect();

        Self {
            unit: unit.to_string(),
            survey_date: text(FieldId::SurveyDate),
            department: or(text(FieldId::Department), &default_department),
            surveyor: text(FieldId::Surveyor),
            process_name: or(text(FieldId::ProcessName), unit),
            job_name: or(text(FieldId::JobName), unit),
            situations,
        }
    }

    /// Overview rows as (label, value)
    pub fn overview_rows(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("조사일시", self.survey_date.as_str()),
            ("부서명", self.department.as_str()),
            ("조사자", self.surveyor.as_str()),
            ("작업공정명", self.process_name.as_str()),
            ("작업명(반)", self.job_name.as_str()),
        ]
    }
}

/// Set a situation item's status and optional detail
pub fn set_situation(
    store: &mut ValueStore,
    unit: &str,
    item: SituationItem,
    status: &str,
    detail: Option<&str>,
) -> Result<SituationChange, ValidationWarning> {
    let change = SituationChange::from_label(status).ok_or_else(|| {
        let allowed: Vec<&str> = SituationChange::ALL.iter().map(|c| c.label()).collect();
        ValidationWarning::invalid_option(item.label(), status, &allowed)
    })?;

    store.set_scalar(
        ValueKey::unit(FieldId::SituationStatus(item), unit),
        change.label(),
    );
    match (change, detail) {
        (SituationChange::Unchanged, _) => {
            store.remove(&ValueKey::unit(FieldId::SituationDetail(item), unit));
        }
        (_, Some(detail)) => {
            store.set_scalar(ValueKey::unit(FieldId::SituationDetail(item), unit), detail);
        }
        (_, None) => {}
    }
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::ChecklistTable;

    #[test]
    fn test_read_applies_defaults() {
        let mut store = ValueStore::new();
        store.checklist = ChecklistTable::sample();
        let form = SurveyForm::read(&store, "포장반");
        assert_eq!(form.department, "생산2팀");
        assert_eq!(form.process_name, "포장반");
        assert_eq!(form.job_name, "포장반");
        assert!(form
            .situations
            .iter()
            .all(|s| s.change == SituationChange::Unchanged));
    }

    #[test]
    fn test_parse_field_accepts_both_languages() {
        assert_eq!(parse_field("surveyor"), Some(FieldId::Surveyor));
        assert_eq!(parse_field("작업명(반)"), Some(FieldId::JobName));
        assert_eq!(parse_field("소재지"), None);
    }

    #[test]
    fn test_set_situation_with_detail() {
        let mut store = ValueStore::new();
        set_situation(&mut store, "u", SituationItem::Speed, "증가", Some("2024년 3월")).unwrap();
        let form = SurveyForm::read(&store, "u");
        let speed = &form.situations[2];
        assert_eq!(speed.change, SituationChange::Increased);
        assert_eq!(speed.effective_detail(), "2024년 3월");
    }

    #[test]
    fn test_unchanged_clears_detail() {
        let mut store = ValueStore::new();
        set_situation(&mut store, "u", SituationItem::Volume, "기타", Some("설비 교체")).unwrap();
        set_situation(&mut store, "u", SituationItem::Volume, "변화없음", None).unwrap();
        let key = ValueKey::unit(FieldId::SituationDetail(SituationItem::Volume), "u");
        assert!(!store.contains(&key));
    }

    #[test]
    fn test_invalid_status_is_warning() {
        let mut store = ValueStore::new();
        let err = set_situation(&mut store, "u", SituationItem::Equipment, "많음", None).unwrap_err();
        assert!(matches!(err, ValidationWarning::InvalidOption { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_form_fields_cover_situations() {
        assert_eq!(form_fields().len(), 13);
    }
}
