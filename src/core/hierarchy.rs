//! Cascading company → department → unit → task selection over the checklist

use std::collections::HashSet;

use crate::entities::checklist::{ChecklistRow, ChecklistTable};

/// Hierarchy column of the checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyColumn {
    Company,
    Department,
    Unit,
    TaskName,
}

impl HierarchyColumn {
    fn value<'a>(&self, row: &'a ChecklistRow) -> &'a str {
        match self {
            HierarchyColumn::Company => &row.company,
            HierarchyColumn::Department => &row.department,
            HierarchyColumn::Unit => &row.unit,
            HierarchyColumn::TaskName => &row.task_name,
        }
    }
}

impl std::fmt::Display for HierarchyColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HierarchyColumn::Company => write!(f, "회사명"),
            HierarchyColumn::Department => write!(f, "소속"),
            HierarchyColumn::Unit => write!(f, "반"),
            HierarchyColumn::TaskName => write!(f, "단위작업명"),
        }
    }
}

/// Unique non-blank values of `column` among rows matching every filter
///
/// Values keep first-seen table order. A filter naming a value that does
/// not occur simply yields an empty list.
pub fn list_distinct(
    table: &ChecklistTable,
    column: HierarchyColumn,
    filters: &[(HierarchyColumn, &str)],
) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .rows()
        .iter()
        .filter(|row| filters.iter().all(|(col, want)| col.value(row) == *want))
        .map(|row| column.value(row))
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// A partially made cascading selection
///
/// Each level only offers options once its parent is chosen; an empty
/// option list means the dependent picker should be hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub company: Option<String>,
    pub department: Option<String>,
    pub unit: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn companies(&self, table: &ChecklistTable) -> Vec<String> {
        list_distinct(table, HierarchyColumn::Company, &[])
    }

    pub fn departments(&self, table: &ChecklistTable) -> Vec<String> {
        match &self.company {
            Some(company) => list_distinct(
                table,
                HierarchyColumn::Department,
                &[(HierarchyColumn::Company, company)],
            ),
            None => Vec::new(),
        }
    }

    pub fn units(&self, table: &ChecklistTable) -> Vec<String> {
        match (&self.company, &self.department) {
            (Some(company), Some(department)) => list_distinct(
                table,
                HierarchyColumn::Unit,
                &[
                    (HierarchyColumn::Company, company),
                    (HierarchyColumn::Department, department),
                ],
            ),
            _ => Vec::new(),
        }
    }

    pub fn tasks(&self, table: &ChecklistTable) -> Vec<String> {
        match (&self.company, &self.department, &self.unit) {
            (Some(company), Some(department), Some(unit)) => list_distinct(
                table,
                HierarchyColumn::TaskName,
                &[
                    (HierarchyColumn::Company, company),
                    (HierarchyColumn::Department, department),
                    (HierarchyColumn::Unit, unit),
                ],
            ),
            _ => Vec::new(),
        }
    }
}
