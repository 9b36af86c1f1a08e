//! Checklist entity: one row per unit task, assessed against the twelve
//! burden-task criteria (부담작업 1호 ~ 12호)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::core::identity::RowId;
use crate::core::validation::ValidationWarning;
use crate::core::value::Table;

/// Number of regulatory criteria
pub const CRITERIA_COUNT: usize = 12;

/// Identity column headers, in sheet order
pub const COL_COMPANY: &str = "회사명";
pub const COL_DEPARTMENT: &str = "소속";
pub const COL_UNIT: &str = "반";
pub const COL_TASK: &str = "단위작업명";
pub const COL_ROW_ID: &str = "행ID";

/// Short descriptions of each criterion, indexed by number - 1
pub const CRITERIA_DESCRIPTIONS: [&str; CRITERIA_COUNT] = [
    "키보드/마우스 4시간 이상",
    "같은 동작 2시간 이상 반복",
    "팔 위/옆으로 2시간 이상",
    "목/허리 구부림 2시간 이상",
    "쪼그림/무릎굽힘 2시간 이상",
    "손가락 집기 2시간 이상",
    "한손 4.5kg 들기 2시간 이상",
    "25kg 이상 10회/일",
    "10kg 이상 25회/일",
    "4.5kg 이상 분당 2회",
    "손/무릎 충격 시간당 10회",
    "정적자세/진동/밀당기기",
];

/// Column label of a criterion (`3` -> `3호`)
pub fn criterion_label(number: usize) -> String {
    format!("{}호", number)
}

/// Parse a criterion label (`3호`, `3호(잠재)`) back to its number
pub fn criterion_number(label: &str) -> Option<usize> {
    let label = label.trim();
    let label = label.strip_suffix("(잠재)").unwrap_or(label).trim();
    let n: usize = label.strip_suffix('호')?.parse().ok()?;
    (1..=CRITERIA_COUNT).contains(&n).then_some(n)
}

/// Description of a criterion by number
pub fn criterion_description(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|i| CRITERIA_DESCRIPTIONS.get(i))
        .copied()
}

/// Assessment of one criterion for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CriterionState {
    #[serde(rename = "O(해당)")]
    Applicable,
    #[serde(rename = "△(잠재위험)")]
    PotentialRisk,
    #[default]
    #[serde(rename = "X(미해당)")]
    NotApplicable,
}

impl CriterionState {
    pub const ALL: [CriterionState; 3] = [
        CriterionState::Applicable,
        CriterionState::PotentialRisk,
        CriterionState::NotApplicable,
    ];

    /// Label as shown in the checklist sheet
    pub fn label(&self) -> &'static str {
        match self {
            CriterionState::Applicable => "O(해당)",
            CriterionState::PotentialRisk => "△(잠재위험)",
            CriterionState::NotApplicable => "X(미해당)",
        }
    }

    /// Merge priority; higher wins
    pub fn severity(&self) -> u8 {
        match self {
            CriterionState::Applicable => 3,
            CriterionState::PotentialRisk => 2,
            CriterionState::NotApplicable => 1,
        }
    }

    /// Exact label match
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }

    /// Label match, coercing anything unrecognized to NotApplicable
    pub fn coerce(label: &str) -> Self {
        Self::from_label(label).unwrap_or_default()
    }

    /// Lenient parse for CLI input (`O`, `△`, `X`, or full label)
    pub fn parse_input(input: &str) -> Option<Self> {
        match input.trim().to_uppercase().as_str() {
            "O" | "Y" | "APPLICABLE" => Some(CriterionState::Applicable),
            "△" | "P" | "POTENTIAL" => Some(CriterionState::PotentialRisk),
            "X" | "N" | "NA" => Some(CriterionState::NotApplicable),
            _ => Self::from_label(input),
        }
    }
}

impl std::fmt::Display for CriterionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One unit task on the checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistRow {
    pub id: RowId,
    pub company: String,
    pub department: String,
    pub unit: String,
    pub task_name: String,
    pub criteria: [CriterionState; CRITERIA_COUNT],
}

impl ChecklistRow {
    /// New row with every criterion NotApplicable
    pub fn new(
        company: impl Into<String>,
        department: impl Into<String>,
        unit: impl Into<String>,
        task_name: impl Into<String>,
    ) -> Self {
        Self {
            id: RowId::new(),
            company: company.into(),
            department: department.into(),
            unit: unit.into(),
            task_name: task_name.into(),
            criteria: [CriterionState::NotApplicable; CRITERIA_COUNT],
        }
    }

    /// Builder-style criterion assignment (1-based)
    pub fn with_criterion(mut self, number: usize, state: CriterionState) -> Self {
        if let Some(slot) = number.checked_sub(1).and_then(|i| self.criteria.get_mut(i)) {
            *slot = state;
        }
        self
    }

    /// Criterion state by 1-based number
    pub fn criterion(&self, number: usize) -> Option<CriterionState> {
        number.checked_sub(1).and_then(|i| self.criteria.get(i)).copied()
    }

    /// Burden labels for this row, e.g. `["1호", "3호(잠재)"]`
    pub fn burdens(&self) -> Vec<String> {
        self.criteria
            .iter()
            .enumerate()
            .filter_map(|(i, state)| match state {
                CriterionState::Applicable => Some(criterion_label(i + 1)),
                CriterionState::PotentialRisk => Some(format!("{}(잠재)", criterion_label(i + 1))),
                CriterionState::NotApplicable => None,
            })
            .collect()
    }

    /// `"1호, 3호(잠재)"`, or `"미해당"` when nothing applies
    pub fn burden_summary(&self) -> String {
        let burdens = self.burdens();
        if burdens.is_empty() {
            "미해당".to_string()
        } else {
            burdens.join(", ")
        }
    }

    pub fn has_burden(&self) -> bool {
        self.criteria
            .iter()
            .any(|s| *s != CriterionState::NotApplicable)
    }

    /// All four identity columns are filled in
    pub fn identity_complete(&self) -> bool {
        [&self.company, &self.department, &self.unit, &self.task_name]
            .iter()
            .all(|s| !s.trim().is_empty())
    }

    fn is_blank(&self) -> bool {
        [&self.company, &self.department, &self.unit, &self.task_name]
            .iter()
            .all(|s| s.trim().is_empty())
            && !self.has_burden()
    }
}

/// Errors from raw checklist uploads
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload needs at least 4 columns (회사명, 소속, 반, 단위작업명); found {0}")]
    TooFewColumns(usize),

    #[error("upload contains no rows")]
    Empty,

    #[error("failed to read upload: {0}")]
    Read(String),
}

/// Ordered checklist of unit tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistTable {
    rows: Vec<ChecklistRow>,
}

impl ChecklistTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<ChecklistRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ChecklistRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row and return its id
    pub fn push(&mut self, row: ChecklistRow) -> RowId {
        let id = row.id;
        self.rows.push(row);
        id
    }

    pub fn get(&self, id: RowId) -> Option<&ChecklistRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut ChecklistRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Find a row by full id, a unique id prefix, or a unique short form
    pub fn resolve(&self, query: &str) -> Option<RowId> {
        if let Ok(id) = RowId::parse(query) {
            return self.get(id).map(|r| r.id);
        }
        let query = query.to_uppercase();
        let mut matches = self.rows.iter().filter(|r| {
            let full = r.id.to_string();
            full.starts_with(&query) || full.ends_with(&query)
        });
        match (matches.next(), matches.next()) {
            (Some(row), None) => Some(row.id),
            _ => None,
        }
    }

    /// Remove rows by id, returning the removed rows in table order
    pub fn remove(&mut self, ids: &[RowId]) -> Vec<ChecklistRow> {
        let wanted: HashSet<RowId> = ids.iter().copied().collect();
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.rows.drain(..).partition(|r| wanted.contains(&r.id));
        self.rows = kept;
        removed
    }

    /// Combine the selected rows into one row named `new_name`
    ///
    /// The first selected row in table order is the template: its company,
    /// department and unit carry over. Each criterion takes the highest
    /// severity found across the selection. Selected rows are removed and
    /// the merged row, with a fresh id, is appended to the end.
    pub fn merge(&mut self, ids: &[RowId], new_name: &str) -> Result<RowId, ValidationWarning> {
        if ids.is_empty() {
            return Err(ValidationWarning::EmptySelection);
        }
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ValidationWarning::EmptyMergeName);
        }
        if let Some(missing) = ids.iter().find(|id| self.get(**id).is_none()) {
            return Err(ValidationWarning::UnknownRow(*missing));
        }

        let wanted: HashSet<RowId> = ids.iter().copied().collect();
        let selected: Vec<&ChecklistRow> =
            self.rows.iter().filter(|r| wanted.contains(&r.id)).collect();

        let template = selected[0];
        let mut merged = ChecklistRow::new(
            template.company.clone(),
            template.department.clone(),
            template.unit.clone(),
            new_name,
        );
        for (i, slot) in merged.criteria.iter_mut().enumerate() {
            *slot = selected
                .iter()
                .map(|r| r.criteria[i])
                .max_by_key(CriterionState::severity)
                .unwrap_or_default();
        }

        self.remove(ids);
        Ok(self.push(merged))
    }

    /// Rows belonging to a unit, in table order
    pub fn rows_for_unit<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = &'a ChecklistRow> + 'a {
        self.rows.iter().filter(move |r| r.unit == unit)
    }

    /// Distinct non-blank unit names in first-seen order
    pub fn units(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| !r.unit.trim().is_empty())
            .filter(|r| seen.insert(r.unit.clone()))
            .map(|r| r.unit.clone())
            .collect()
    }

    /// Sheet header: identity columns, 1호..12호, then the row id
    pub fn columns() -> Vec<String> {
        let mut cols: Vec<String> = [COL_COMPANY, COL_DEPARTMENT, COL_UNIT, COL_TASK]
            .iter()
            .map(|s| s.to_string())
            .collect();
        cols.extend((1..=CRITERIA_COUNT).map(criterion_label));
        cols.push(COL_ROW_ID.to_string());
        cols
    }

    /// Tabular form for sheets and reports
    pub fn to_table(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = vec![
                    r.company.clone(),
                    r.department.clone(),
                    r.unit.clone(),
                    r.task_name.clone(),
                ];
                cells.extend(r.criteria.iter().map(|s| s.label().to_string()));
                cells.push(r.id.to_string());
                cells
            })
            .collect();
        Table::with_rows(Self::columns(), rows)
    }

    /// Rebuild from a named-column table
    ///
    /// Missing criterion columns or unrecognized labels become NotApplicable;
    /// a missing or malformed row id gets a fresh one.
    pub fn from_table(table: &Table) -> Self {
        let rows = (0..table.len())
            .map(|i| {
                let text = |col: &str| table.cell(i, col).unwrap_or_default().to_string();
                let mut row = ChecklistRow::new(
                    text(COL_COMPANY),
                    text(COL_DEPARTMENT),
                    text(COL_UNIT),
                    text(COL_TASK),
                );
                if let Ok(id) = RowId::parse(table.cell(i, COL_ROW_ID).unwrap_or_default()) {
                    row.id = id;
                }
                for (n, slot) in row.criteria.iter_mut().enumerate() {
                    *slot = CriterionState::coerce(
                        table.cell(i, &criterion_label(n + 1)).unwrap_or_default(),
                    );
                }
                row
            })
            .collect();
        Self { rows }
    }

    /// Build from a positional upload (header row first)
    ///
    /// Columns map to company, department, unit, task name, then criteria
    /// 1호..12호 in order. Fully blank rows are skipped.
    pub fn from_upload(records: &[Vec<String>]) -> Result<Self, UploadError> {
        let width = records.iter().map(Vec::len).max().ok_or(UploadError::Empty)?;
        if width < 4 {
            return Err(UploadError::TooFewColumns(width));
        }

        let rows: Vec<ChecklistRow> = records
            .iter()
            .skip(1)
            .map(|record| {
                let cell = |i: usize| record.get(i).map(|s| s.trim()).unwrap_or_default();
                let mut row = ChecklistRow::new(cell(0), cell(1), cell(2), cell(3));
                for (n, slot) in row.criteria.iter_mut().enumerate() {
                    *slot = CriterionState::coerce(cell(4 + n));
                }
                row
            })
            .filter(|row| !row.is_blank())
            .collect();

        Ok(Self { rows })
    }

    /// Five illustrative rows for a fresh checklist
    pub fn sample() -> Self {
        use CriterionState::{Applicable as O, PotentialRisk as P};

        let rows = vec![
            ChecklistRow::new("A회사", "생산1팀", "조립1반", "부품조립")
                .with_criterion(1, O)
                .with_criterion(3, P)
                .with_criterion(11, O),
            ChecklistRow::new("A회사", "생산1팀", "조립1반", "나사체결")
                .with_criterion(2, O)
                .with_criterion(5, P),
            ChecklistRow::new("A회사", "생산2팀", "포장반", "제품포장")
                .with_criterion(3, O)
                .with_criterion(7, P),
            ChecklistRow::new("B회사", "품질팀", "검사1반", "외관검사")
                .with_criterion(1, O)
                .with_criterion(4, P)
                .with_criterion(11, O),
            ChecklistRow::new("B회사", "품질팀", "검사2반", "성능검사")
                .with_criterion(2, O)
                .with_criterion(5, O)
                .with_criterion(11, P),
        ];
        Self { rows }
    }
}
