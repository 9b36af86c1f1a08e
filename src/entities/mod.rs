//! Survey entity definitions
//!
//! **Checklist:**
//! - [`ChecklistTable`] - Unit tasks assessed against criteria 1호..12호
//!
//! **Per-unit forms:**
//! - [`SurveyForm`] - Overview and workplace situation changes
//! - [`WorkConditionRow`] - Workload × frequency ratings
//! - [`HazardEntry`] - Cause analysis with type-specific measurements
//!
//! **Workplace-wide:**
//! - [`overview`] - Workplace overview fields
//! - [`DetailedSurvey`] - Named detailed investigations
//! - [`SymptomSection`] - Symptom survey aggregates
//! - [`improvement`] - Improvement plan

pub mod checklist;
pub mod detailed;
pub mod hazard;
pub mod improvement;
pub mod overview;
pub mod survey_form;
pub mod symptom;
pub mod work_condition;

pub use checklist::{ChecklistRow, ChecklistTable, CriterionState};
pub use detailed::DetailedSurvey;
pub use hazard::{HazardDetail, HazardEntry, HazardType};
pub use survey_form::{SituationChange, SituationItem, SurveyForm};
pub use symptom::SymptomSection;
pub use work_condition::WorkConditionRow;
