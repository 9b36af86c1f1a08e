//! Hazard cause analysis (유해요인 원인분석)
//!
//! Each unit keeps a list of analysis entries. The list is seeded once from
//! the unit's work-condition rows that carry a burden, then edited freely;
//! later checklist edits never flow back into it.

use crate::core::key::{FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;
use crate::core::value::Table;
use crate::entities::checklist::{criterion_description, criterion_label, criterion_number};
use crate::entities::work_condition;

pub const COL_TASK: &str = "단위작업명";
pub const COL_MATCHED: &str = "부담작업호";
pub const COL_TYPE: &str = "유형";
pub const COL_BURDEN: &str = "부담작업";
pub const COL_NOTE: &str = "비고";

/// Hazard category of an analysis entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardType {
    Repetitive,
    AwkwardPosture,
    ExcessiveForce,
    ContactOrOther,
}

impl HazardType {
    pub const ALL: [HazardType; 4] = [
        HazardType::Repetitive,
        HazardType::AwkwardPosture,
        HazardType::ExcessiveForce,
        HazardType::ContactOrOther,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HazardType::Repetitive => "반복동작",
            HazardType::AwkwardPosture => "부자연스러운 자세",
            HazardType::ExcessiveForce => "과도한 힘",
            HazardType::ContactOrOther => "접촉스트레스 또는 기타(진동, 밀고 당기기 등)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label.trim())
    }

    /// Accepts the full label, a short English name, or a unique label prefix
    pub fn parse_input(input: &str) -> Option<Self> {
        let input = input.trim();
        match input.to_lowercase().as_str() {
            "repetitive" => return Some(HazardType::Repetitive),
            "posture" | "awkward-posture" => return Some(HazardType::AwkwardPosture),
            "force" | "excessive-force" => return Some(HazardType::ExcessiveForce),
            "contact" | "other" => return Some(HazardType::ContactOrOther),
            _ => {}
        }
        if input.is_empty() {
            return None;
        }
        let mut matches = Self::ALL.into_iter().filter(|t| t.label().starts_with(input));
        match (matches.next(), matches.next()) {
            (Some(t), None) => Some(t),
            _ => None,
        }
    }

    /// Criterion numbers associated with this category
    pub fn criteria(&self) -> &'static [usize] {
        match self {
            HazardType::Repetitive => &[1, 2, 6, 7, 10],
            HazardType::AwkwardPosture => &[3, 4, 5],
            HazardType::ExcessiveForce => &[8, 9],
            HazardType::ContactOrOther => &[11, 12],
        }
    }

    /// Burden task choices for this category (`1호`, `2호`, ...)
    pub fn burden_options(&self) -> Vec<String> {
        self.criteria().iter().map(|n| criterion_label(*n)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepetitiveMotion {
    pub tool: String,
    pub tool_weight: String,
    pub repetitions: String,
    pub total_minutes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostureLoad {
    pub posture: String,
    pub hold_seconds: String,
    pub total_minutes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForceLoad {
    pub load_name: String,
    pub load_weight: String,
    pub handling_count: String,
    pub handling_method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactLoad {
    pub contact_part: String,
    pub vibration_tool: String,
    pub usage_minutes: String,
    pub description: String,
}

/// Type-specific measurements; only the selected category's fields exist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HazardDetail {
    #[default]
    Unselected,
    Repetitive(RepetitiveMotion),
    AwkwardPosture(PostureLoad),
    ExcessiveForce(ForceLoad),
    ContactOrOther(ContactLoad),
}

impl HazardDetail {
    pub fn new(kind: HazardType) -> Self {
        match kind {
            HazardType::Repetitive => HazardDetail::Repetitive(RepetitiveMotion::default()),
            HazardType::AwkwardPosture => HazardDetail::AwkwardPosture(PostureLoad::default()),
            HazardType::ExcessiveForce => HazardDetail::ExcessiveForce(ForceLoad::default()),
            HazardType::ContactOrOther => HazardDetail::ContactOrOther(ContactLoad::default()),
        }
    }

    pub fn hazard_type(&self) -> Option<HazardType> {
        match self {
            HazardDetail::Unselected => None,
            HazardDetail::Repetitive(_) => Some(HazardType::Repetitive),
            HazardDetail::AwkwardPosture(_) => Some(HazardType::AwkwardPosture),
            HazardDetail::ExcessiveForce(_) => Some(HazardType::ExcessiveForce),
            HazardDetail::ContactOrOther(_) => Some(HazardType::ContactOrOther),
        }
    }

    /// Field labels for a category, in display order
    pub fn labels(kind: HazardType) -> &'static [&'static str] {
        match kind {
            HazardType::Repetitive => &["수공구 종류", "수공구 무게(kg)", "반복횟수(회/일)", "총 작업시간(분)"],
            HazardType::AwkwardPosture => &["작업자세", "자세 유지시간(초)", "총 작업시간(분)"],
            HazardType::ExcessiveForce => &["중량물 명칭", "중량물 무게(kg)", "취급횟수(회/일)", "취급방법"],
            HazardType::ContactOrOther => &["접촉부위", "진동공구 명칭", "사용시간(분)", "기타 내용"],
        }
    }

    /// Every detail column across categories, without duplicates
    pub fn all_labels() -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = Vec::new();
        for kind in HazardType::ALL {
            for &label in Self::labels(kind) {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
        labels
    }

    fn slots(&self) -> Vec<&String> {
        match self {
            HazardDetail::Unselected => vec![],
            HazardDetail::Repetitive(d) => {
                vec![&d.tool, &d.tool_weight, &d.repetitions, &d.total_minutes]
            }
            HazardDetail::AwkwardPosture(d) => vec![&d.posture, &d.hold_seconds, &d.total_minutes],
            HazardDetail::ExcessiveForce(d) => {
                vec![&d.load_name, &d.load_weight, &d.handling_count, &d.handling_method]
            }
            HazardDetail::ContactOrOther(d) => {
                vec![&d.contact_part, &d.vibration_tool, &d.usage_minutes, &d.description]
            }
        }
    }

    fn slots_mut(&mut self) -> Vec<&mut String> {
        match self {
            HazardDetail::Unselected => vec![],
            HazardDetail::Repetitive(d) => vec![
                &mut d.tool,
                &mut d.tool_weight,
                &mut d.repetitions,
                &mut d.total_minutes,
            ],
            HazardDetail::AwkwardPosture(d) => {
                vec![&mut d.posture, &mut d.hold_seconds, &mut d.total_minutes]
            }
            HazardDetail::ExcessiveForce(d) => vec![
                &mut d.load_name,
                &mut d.load_weight,
                &mut d.handling_count,
                &mut d.handling_method,
            ],
            HazardDetail::ContactOrOther(d) => vec![
                &mut d.contact_part,
                &mut d.vibration_tool,
                &mut d.usage_minutes,
                &mut d.description,
            ],
        }
    }

    /// (label, value) pairs of the selected category
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self.hazard_type() {
            Some(kind) => Self::labels(kind)
                .iter()
                .copied()
                .zip(self.slots().into_iter().map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Set a measurement by label; false if the category has no such field
    pub fn set_field(&mut self, label: &str, value: &str) -> bool {
        let Some(kind) = self.hazard_type() else {
            return false;
        };
        let Some(pos) = Self::labels(kind).iter().position(|l| *l == label) else {
            return false;
        };
        match self.slots_mut().into_iter().nth(pos) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }
}

/// One cause-analysis entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HazardEntry {
    pub unit_task: String,
    /// Burden summary copied from the work-condition row when seeded
    pub matched_criteria: String,
    pub burden_task: String,
    pub note: String,
    pub detail: HazardDetail,
}

impl HazardEntry {
    /// Readable hints for the matched criteria, e.g. `[해당] 1호: 키보드/마우스 4시간 이상`
    pub fn hints(&self) -> Vec<String> {
        self.matched_criteria
            .split(',')
            .map(str::trim)
            .filter_map(|item| {
                let number = criterion_number(item)?;
                let description = criterion_description(number)?;
                let tag = if item.contains("(잠재)") { "[잠재]" } else { "[해당]" };
                Some(format!("{} {}: {}", tag, criterion_label(number), description))
            })
            .collect()
    }

    /// Switch category; measurements of the old category are discarded
    pub fn set_type(&mut self, kind: Option<HazardType>) {
        if self.detail.hazard_type() == kind {
            return;
        }
        self.detail = kind.map(HazardDetail::new).unwrap_or_default();
        self.burden_task.clear();
    }

    fn set_burden_task(&mut self, value: &str) -> Result<(), ValidationWarning> {
        let options = self
            .detail
            .hazard_type()
            .map(|t| t.burden_options())
            .unwrap_or_default();
        if value.is_empty() || options.iter().any(|o| o == value) {
            self.burden_task = value.to_string();
            Ok(())
        } else {
            let allowed: Vec<&str> = options.iter().map(String::as_str).collect();
            Err(ValidationWarning::invalid_option(COL_BURDEN, value, &allowed))
        }
    }

    /// Set a common column or a measurement of the selected category
    pub fn set_field(&mut self, column: &str, value: &str) -> Result<(), ValidationWarning> {
        match column {
            COL_TASK => self.unit_task = value.to_string(),
            COL_NOTE => self.note = value.to_string(),
            COL_BURDEN => self.set_burden_task(value)?,
            COL_TYPE => {
                let kind = if value.trim().is_empty() {
                    None
                } else {
                    let allowed: Vec<&str> = HazardType::ALL.iter().map(|t| t.label()).collect();
                    Some(HazardType::parse_input(value).ok_or_else(|| {
                        ValidationWarning::invalid_option(COL_TYPE, value, &allowed)
                    })?)
                };
                self.set_type(kind);
            }
            other => {
                if !self.detail.set_field(other, value) {
                    return Err(ValidationWarning::UnknownColumn(other.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Sheet columns: common fields, then every category's measurements
pub fn columns() -> Vec<String> {
    [COL_TASK, COL_MATCHED, COL_TYPE, COL_BURDEN, COL_NOTE]
        .into_iter()
        .chain(HazardDetail::all_labels())
        .map(str::to_string)
        .collect()
}

pub fn to_table(entries: &[HazardEntry]) -> Table {
    let cols = columns();
    let rows = entries
        .iter()
        .map(|e| {
            let fields = e.detail.fields();
            cols.iter()
                .map(|col| match col.as_str() {
                    COL_TASK => e.unit_task.clone(),
                    COL_MATCHED => e.matched_criteria.clone(),
                    COL_TYPE => e
                        .detail
                        .hazard_type()
                        .map(|t| t.label().to_string())
                        .unwrap_or_default(),
                    COL_BURDEN => e.burden_task.clone(),
                    COL_NOTE => e.note.clone(),
                    other => fields
                        .iter()
                        .find(|(label, _)| *label == other)
                        .map(|(_, v)| v.to_string())
                        .unwrap_or_default(),
                })
                .collect()
        })
        .collect();
    Table::with_rows(cols, rows)
}

/// Parse entries; measurement columns are read only for the tagged category
pub fn from_table(table: &Table) -> Vec<HazardEntry> {
    (0..table.len())
        .map(|i| {
            let text = |col: &str| table.cell(i, col).unwrap_or_default().to_string();
            let mut detail = HazardType::from_label(&text(COL_TYPE))
                .map(HazardDetail::new)
                .unwrap_or_default();
            if let Some(kind) = detail.hazard_type() {
                for &label in HazardDetail::labels(kind) {
                    detail.set_field(label, &text(label));
                }
            }
            HazardEntry {
                unit_task: text(COL_TASK),
                matched_criteria: text(COL_MATCHED),
                burden_task: text(COL_BURDEN),
                note: text(COL_NOTE),
                detail,
            }
        })
        .collect()
}

fn key(unit: &str) -> ValueKey {
    ValueKey::unit(FieldId::HazardEntries, unit)
}

/// Initial entries: one per work-condition row with a burden
pub fn seed_entries(store: &ValueStore, unit: &str) -> Vec<HazardEntry> {
    work_condition::burden_hints(&work_condition::rows(store, unit))
        .into_iter()
        .map(|(task, burden)| HazardEntry {
            unit_task: task,
            matched_criteria: burden,
            ..Default::default()
        })
        .collect()
}

/// Current entries without touching the store
pub fn entries(store: &ValueStore, unit: &str) -> Vec<HazardEntry> {
    match store.table(&key(unit)) {
        Some(table) => from_table(table),
        None => seed_entries(store, unit),
    }
}

/// Write the entries back for a unit
pub fn save(store: &mut ValueStore, unit: &str, entries: &[HazardEntry]) {
    store.set(key(unit), crate::core::value::Value::Table(to_table(entries)));
}

/// Append a blank entry; returns its index
pub fn add(store: &mut ValueStore, unit: &str) -> usize {
    let mut list = entries(store, unit);
    list.push(HazardEntry::default());
    save(store, unit, &list);
    list.len() - 1
}

/// Drop the last entry
pub fn pop(store: &mut ValueStore, unit: &str) -> Result<HazardEntry, ValidationWarning> {
    let mut list = entries(store, unit);
    let removed = list
        .pop()
        .ok_or_else(|| ValidationWarning::NothingToRemove(format!("원인분석 {}", unit)))?;
    save(store, unit, &list);
    Ok(removed)
}

/// Edit one column of one entry
pub fn set_field(
    store: &mut ValueStore,
    unit: &str,
    index: usize,
    column: &str,
    value: &str,
) -> Result<(), ValidationWarning> {
    let mut list = entries(store, unit);
    let len = list.len();
    let entry = list
        .get_mut(index)
        .ok_or(ValidationWarning::RowOutOfRange { index, len })?;
    entry.set_field(column, value)?;
    save(store, unit, &list);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::{ChecklistRow, ChecklistTable, CriterionState};

    fn store_with_burdens() -> ValueStore {
        let mut store = ValueStore::new();
        let mut checklist = ChecklistTable::new();
        checklist.push(
            ChecklistRow::new("A", "d", "u", "조립")
                .with_criterion(1, CriterionState::Applicable)
                .with_criterion(3, CriterionState::PotentialRisk),
        );
        checklist.push(ChecklistRow::new("A", "d", "u", "검사"));
        store.checklist = checklist;
        store
    }

    #[test]
    fn test_type_mapping_covers_all_criteria_once() {
        let mut all: Vec<usize> = HazardType::ALL
            .iter()
            .flat_map(|t| t.criteria().iter().copied())
            .collect();
        all.sort();
        assert_eq!(all, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_only_burdened_tasks() {
        let store = store_with_burdens();
        let list = entries(&store, "u");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].unit_task, "조립");
        assert_eq!(list[0].matched_criteria, "1호, 3호(잠재)");
    }

    #[test]
    fn test_hints_describe_criteria() {
        let entry = HazardEntry {
            matched_criteria: "1호, 3호(잠재)".into(),
            ..Default::default()
        };
        assert_eq!(
            entry.hints(),
            vec![
                "[해당] 1호: 키보드/마우스 4시간 이상".to_string(),
                "[잠재] 3호: 팔 위/옆으로 2시간 이상".to_string(),
            ]
        );
    }

    #[test]
    fn test_seeded_list_is_not_resynced() {
        let mut store = store_with_burdens();
        add(&mut store, "u");
        store.checklist.push(
            ChecklistRow::new("A", "d", "u", "포장").with_criterion(8, CriterionState::Applicable),
        );
        assert_eq!(entries(&store, "u").len(), 2);
    }

    #[test]
    fn test_detail_fields_follow_type() {
        let mut entry = HazardEntry::default();
        assert!(entry.set_field("중량물 무게(kg)", "20").is_err());

        entry.set_field(COL_TYPE, "과도한 힘").unwrap();
        entry.set_field("중량물 무게(kg)", "20").unwrap();
        entry.set_field(COL_BURDEN, "8호").unwrap();
        assert!(entry.set_field(COL_BURDEN, "1호").is_err());
        assert!(entry.set_field("작업자세", "구부림").is_err());

        assert_eq!(entry.detail.fields()[1], ("중량물 무게(kg)", "20"));

        // Switching category drops the old measurements
        entry.set_field(COL_TYPE, "posture").unwrap();
        assert_eq!(entry.detail.hazard_type(), Some(HazardType::AwkwardPosture));
        assert!(entry.burden_task.is_empty());
        assert!(entry.detail.fields().iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_table_roundtrip_keeps_only_tagged_fields() {
        let mut entry = HazardEntry {
            unit_task: "조립".into(),
            note: "메모".into(),
            ..Default::default()
        };
        entry.set_field(COL_TYPE, "반복동작").unwrap();
        entry.set_field("반복횟수(회/일)", "1200").unwrap();
        entry.set_field("총 작업시간(분)", "240").unwrap();

        let table = to_table(std::slice::from_ref(&entry));
        assert_eq!(from_table(&table), vec![entry]);
    }

    #[test]
    fn test_pop_empty_is_warning() {
        let mut store = ValueStore::new();
        assert!(matches!(
            pop(&mut store, "u"),
            Err(ValidationWarning::NothingToRemove(_))
        ));
    }

    #[test]
    fn test_parse_input_prefix() {
        assert_eq!(HazardType::parse_input("접촉"), Some(HazardType::ContactOrOther));
        assert_eq!(HazardType::parse_input("force"), Some(HazardType::ExcessiveForce));
        assert_eq!(HazardType::parse_input("없음"), None);
    }
}
