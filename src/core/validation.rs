//! Validation warnings
//!
//! A warning blocks the single action that produced it and leaves every
//! piece of stored state unchanged. Warnings are reported, never raised
//! further than the command that triggered them.

use thiserror::Error;

use crate::core::identity::RowId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("no rows selected for merge")]
    EmptySelection,

    #[error("merged task name must not be empty")]
    EmptyMergeName,

    #[error("row {0} is not in the checklist")]
    UnknownRow(RowId),

    #[error("select or enter a workplace first")]
    MissingWorkplace,

    #[error("'{value}' is not a valid option for {field} (expected one of: {allowed})")]
    InvalidOption {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("unit '{0}' does not appear in the checklist")]
    UnknownUnit(String),

    #[error("criterion number must be between 1 and {max} (got {got})")]
    CriterionOutOfRange { got: usize, max: usize },

    #[error("row index {index} is out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("'{0}' has no entries")]
    NothingToRemove(String),
}

impl ValidationWarning {
    /// Warning for a value outside an enumerated option list
    pub fn invalid_option(field: &str, value: &str, allowed: &[&str]) -> Self {
        let allowed = allowed
            .iter()
            .map(|a| if a.is_empty() { "\"\"" } else { a })
            .collect::<Vec<_>>()
            .join(", ");
        ValidationWarning::InvalidOption {
            field: field.to_string(),
            value: value.to_string(),
            allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_lists_blank_choice() {
        let w = ValidationWarning::invalid_option("작업부하(A)", "x", &["", "쉬움(2)"]);
        assert_eq!(
            w.to_string(),
            "'x' is not a valid option for 작업부하(A) (expected one of: \"\", 쉬움(2))"
        );
    }
}
