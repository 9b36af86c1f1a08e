//! Workplace overview (사업장개요)

use crate::core::key::{FieldId, ValueKey};
use crate::core::store::ValueStore;

/// Display label for an overview field
pub fn label(field: &FieldId) -> &'static str {
    match field {
        FieldId::WorkplaceName => "사업장명",
        FieldId::Location => "소재지",
        FieldId::Industry => "업종",
        FieldId::PreliminarySurvey => "예비조사",
        FieldId::MainSurvey => "본조사",
        FieldId::Agency => "수행기관",
        FieldId::Investigator => "성명",
        _ => "",
    }
}

/// Resolve a user-supplied overview field name (Korean label or English)
pub fn parse_field(input: &str) -> Option<FieldId> {
    let field = match input.trim().to_lowercase().as_str() {
        "name" | "workplace" | "사업장명" => FieldId::WorkplaceName,
        "location" | "소재지" => FieldId::Location,
        "industry" | "업종" => FieldId::Industry,
        "preliminary" | "예비조사" => FieldId::PreliminarySurvey,
        "main" | "본조사" => FieldId::MainSurvey,
        "agency" | "수행기관" => FieldId::Agency,
        "investigator" | "성명" => FieldId::Investigator,
        _ => return None,
    };
    Some(field)
}

/// Overview as ordered (label, value) pairs
pub fn rows(store: &ValueStore) -> Vec<(&'static str, String)> {
    FieldId::overview()
        .iter()
        .map(|field| (label(field), store.text(&ValueKey::global(field.clone()))))
        .collect()
}
