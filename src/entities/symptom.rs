//! Musculoskeletal symptom survey aggregates (근골격계 자기증상 분석)

use serde::{Deserialize, Serialize};

use crate::core::key::{FieldId, ValueKey};
use crate::core::store::ValueStore;
use crate::core::validation::ValidationWarning;
use crate::core::value::Table;

/// Rows offered when the checklist has no units yet
const BLANK_ROWS: usize = 3;

/// Severity rows of the pain distribution table, per unit
pub const PAIN_GROUPS: [&str; 3] = ["정상", "관리대상자", "통증호소자"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymptomSection {
    /// Respondents, age, tenure and sex per unit
    Demographics,
    /// Current and previous tenure bands
    Tenure,
    /// Perceived physical burden distribution
    PhysicalBurden,
    /// Pain complaints by body part
    PainDistribution,
}

impl SymptomSection {
    pub const ALL: [SymptomSection; 4] = [
        SymptomSection::Demographics,
        SymptomSection::Tenure,
        SymptomSection::PhysicalBurden,
        SymptomSection::PainDistribution,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SymptomSection::Demographics => "기초현황",
            SymptomSection::Tenure => "작업기간",
            SymptomSection::PhysicalBurden => "육체적부담",
            SymptomSection::PainDistribution => "통증호소자",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SymptomSection::Demographics => "1. 기초현황",
            SymptomSection::Tenure => "2. 작업기간",
            SymptomSection::PhysicalBurden => "3. 육체적 부담정도",
            SymptomSection::PainDistribution => "4. 근골격계 통증 호소자 분포",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn parse_input(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "demographics" | "basic" => Some(SymptomSection::Demographics),
            "tenure" => Some(SymptomSection::Tenure),
            "burden" | "physical" => Some(SymptomSection::PhysicalBurden),
            "pain" => Some(SymptomSection::PainDistribution),
            other => Self::from_label(other),
        }
    }

    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            SymptomSection::Demographics => {
                vec!["반", "응답자(명)", "나이", "근속년수", "남자(명)", "여자(명)", "합계"]
            }
            SymptomSection::Tenure => vec![
                "반", "<1년", "<3년", "<5년", "≥5년", "무응답", "합계", "이전<1년", "이전<3년",
                "이전<5년", "이전≥5년", "이전무응답", "이전합계",
            ],
            SymptomSection::PhysicalBurden => {
                vec!["반", "전혀 힘들지 않음", "견딜만 함", "약간 힘듦", "힘듦", "매우 힘듦", "합계"]
            }
            SymptomSection::PainDistribution => vec![
                "반", "구분", "목", "어깨", "팔/팔꿈치", "손/손목/손가락", "허리", "다리/발", "전체",
            ],
        }
    }

    /// Starting rows for the given units
    pub fn seed(&self, units: &[String]) -> Table {
        let columns = self.columns();
        let width = columns.len();
        let mut table = Table::new(columns);

        let template = |unit: &str| -> Vec<String> {
            let mut row = vec![String::new(); width];
            row[0] = unit.to_string();
            if *self == SymptomSection::Demographics {
                row[2] = "평균(세)".into();
                row[3] = "평균(년)".into();
            }
            row
        };

        match self {
            SymptomSection::PainDistribution => {
                // Without units there is nothing to distribute over
                for unit in units {
                    for (i, group) in PAIN_GROUPS.iter().enumerate() {
                        let mut row = template(if i == 0 { unit.as_str() } else { "" });
                        row[1] = group.to_string();
                        table.push_row(row);
                    }
                }
            }
            _ if units.is_empty() => {
                for _ in 0..BLANK_ROWS {
                    table.push_row(template(""));
                }
            }
            _ => {
                for unit in units {
                    table.push_row(template(unit.as_str()));
                }
            }
        }
        table
    }

    fn key(&self) -> ValueKey {
        ValueKey::global(FieldId::Symptom(*self))
    }
}

/// Current table for a section without touching the store
pub fn table(store: &ValueStore, section: SymptomSection) -> Table {
    store
        .table(&section.key())
        .cloned()
        .unwrap_or_else(|| section.seed(&store.checklist.units()))
}

/// Write one cell of a section; `row == len` appends a row
pub fn set_cell(
    store: &mut ValueStore,
    section: SymptomSection,
    row: usize,
    column: &str,
    value: &str,
) -> Result<(), ValidationWarning> {
    if !section.columns().contains(&column) {
        return Err(ValidationWarning::UnknownColumn(column.to_string()));
    }
    let seeded = section.seed(&store.checklist.units());
    let table = store.table_or_insert_with(section.key(), || seeded);
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
