//! Composite keys for the session value store
//!
//! Every form value is addressed by a field and the context it belongs to
//! (the whole workplace, one unit, or one detailed investigation). Keys are
//! structured so that a unit called `a_b` can never collide with field `x_a`.

use std::fmt;
use std::str::FromStr;

use crate::entities::survey_form::SituationItem;
use crate::entities::symptom::SymptomSection;

/// The owning context of a value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextId {
    /// Workplace-wide values (overview, aggregates, plan)
    Global,
    /// A unit (반) from the checklist hierarchy
    Unit(String),
    /// A named detailed investigation (정밀조사)
    Investigation(String),
}

impl ContextId {
    pub fn unit(name: impl Into<String>) -> Self {
        ContextId::Unit(name.into())
    }

    pub fn investigation(name: impl Into<String>) -> Self {
        ContextId::Investigation(name.into())
    }

    /// The free-text name of the context, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            ContextId::Global => None,
            ContextId::Unit(n) | ContextId::Investigation(n) => Some(n),
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextId::Global => Ok(()),
            ContextId::Unit(n) => write!(f, "unit:{}", n),
            ContextId::Investigation(n) => write!(f, "inv:{}", n),
        }
    }
}

impl FromStr for ContextId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(ContextId::Global);
        }
        match s.split_once(':') {
            Some(("unit", name)) => Ok(ContextId::Unit(name.to_string())),
            Some(("inv", name)) => Ok(ContextId::Investigation(name.to_string())),
            _ => Err(format!("Unknown context: {}", s)),
        }
    }
}

/// Identifies one form field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    // Workplace overview
    WorkplaceName,
    Location,
    Industry,
    PreliminarySurvey,
    MainSurvey,
    Agency,
    Investigator,

    // Per-unit survey form
    SurveyDate,
    Department,
    Surveyor,
    ProcessName,
    JobName,
    SituationStatus(SituationItem),
    SituationDetail(SituationItem),

    // Per-unit work conditions
    StageOneProcess,
    StageOneContent,
    WorkConditions,
    StageThreeJobName,
    StageThreeWorkers,
    PhotoCount,
    PhotoCaption(u8),
    HazardEntries,

    // Detailed investigations
    DetailedList,
    DetailedProcess,
    DetailedJob,
    DetailedAnalysis,

    // Workplace aggregates
    Symptom(SymptomSection),
    ImprovementPlan,

    /// Free-form value not covered by a typed field
    Other(String),
}

impl FieldId {
    /// Stable code used when the key is persisted
    pub fn code(&self) -> String {
        match self {
            FieldId::WorkplaceName => "사업장명".into(),
            FieldId::Location => "소재지".into(),
            FieldId::Industry => "업종".into(),
            FieldId::PreliminarySurvey => "예비조사".into(),
            FieldId::MainSurvey => "본조사".into(),
            FieldId::Agency => "수행기관".into(),
            FieldId::Investigator => "성명".into(),
            FieldId::SurveyDate => "조사일시".into(),
            FieldId::Department => "부서명".into(),
            FieldId::Surveyor => "조사자".into(),
            FieldId::ProcessName => "작업공정명".into(),
            FieldId::JobName => "작업명".into(),
            FieldId::SituationStatus(item) => format!("{}_상태", item.label()),
            FieldId::SituationDetail(item) => format!("{}_세부사항", item.label()),
            FieldId::StageOneProcess => "1단계_작업공정".into(),
            FieldId::StageOneContent => "1단계_작업내용".into(),
            FieldId::WorkConditions => "작업조건_data".into(),
            FieldId::StageThreeJobName => "3단계_작업명".into(),
            FieldId::StageThreeWorkers => "3단계_근로자수".into(),
            FieldId::PhotoCount => "사진개수".into(),
            FieldId::PhotoCaption(n) => format!("사진_{}_설명", n),
            FieldId::HazardEntries => "원인분석_항목".into(),
            FieldId::DetailedList => "정밀조사_목록".into(),
            FieldId::DetailedProcess => "정밀_작업공정명".into(),
            FieldId::DetailedJob => "정밀_작업명".into(),
            FieldId::DetailedAnalysis => "정밀_원인분석_data".into(),
            FieldId::Symptom(section) => format!("{}_data_저장", section.label()),
            FieldId::ImprovementPlan => "개선계획_data_저장".into(),
            FieldId::Other(name) => name.clone(),
        }
    }

    /// Overview fields in display order
    pub fn overview() -> [FieldId; 7] {
        [
            FieldId::WorkplaceName,
            FieldId::Location,
            FieldId::Industry,
            FieldId::PreliminarySurvey,
            FieldId::MainSurvey,
            FieldId::Agency,
            FieldId::Investigator,
        ]
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for FieldId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldId::from_code(s))
    }
}

impl FieldId {
    /// Inverse of [`FieldId::code`]; unknown codes become `Other`
    pub fn from_code(s: &str) -> FieldId {
        let fixed = [
            FieldId::WorkplaceName,
            FieldId::Location,
            FieldId::Industry,
            FieldId::PreliminarySurvey,
            FieldId::MainSurvey,
            FieldId::Agency,
            FieldId::Investigator,
            FieldId::SurveyDate,
            FieldId::Department,
            FieldId::Surveyor,
            FieldId::ProcessName,
            FieldId::JobName,
            FieldId::StageOneProcess,
            FieldId::StageOneContent,
            FieldId::WorkConditions,
            FieldId::StageThreeJobName,
            FieldId::StageThreeWorkers,
            FieldId::PhotoCount,
            FieldId::HazardEntries,
            FieldId::DetailedList,
            FieldId::DetailedProcess,
            FieldId::DetailedJob,
            FieldId::DetailedAnalysis,
            FieldId::ImprovementPlan,
        ];
        if let Some(field) = fixed.into_iter().find(|f| f.code() == s) {
            return field;
        }

        if let Some(stem) = s.strip_suffix("_상태") {
            if let Some(item) = SituationItem::from_label(stem) {
                return FieldId::SituationStatus(item);
            }
        }
        if let Some(stem) = s.strip_suffix("_세부사항") {
            if let Some(item) = SituationItem::from_label(stem) {
                return FieldId::SituationDetail(item);
            }
        }
        if let Some(n) = s
            .strip_prefix("사진_")
            .and_then(|rest| rest.strip_suffix("_설명"))
            .and_then(|n| n.parse::<u8>().ok())
        {
            return FieldId::PhotoCaption(n);
        }
        if let Some(section) = s
            .strip_suffix("_data_저장")
            .and_then(SymptomSection::from_label)
        {
            return FieldId::Symptom(section);
        }

        FieldId::Other(s.to_string())
    }
}

/// A field within its context
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueKey {
    pub field: FieldId,
    pub context: ContextId,
}

impl ValueKey {
    pub fn new(field: FieldId, context: ContextId) -> Self {
        Self { field, context }
    }

    pub fn global(field: FieldId) -> Self {
        Self::new(field, ContextId::Global)
    }

    pub fn unit(field: FieldId, unit: &str) -> Self {
        Self::new(field, ContextId::unit(unit))
    }

    pub fn investigation(field: FieldId, name: &str) -> Self {
        Self::new(field, ContextId::investigation(name))
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context {
            ContextId::Global => write!(f, "{}", self.field),
            _ => write!(f, "{}@{}", self.field, self.context),
        }
    }
}
