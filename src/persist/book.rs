//! In-memory workbook: named sheets of text rows

use serde::{Deserialize, Serialize};

/// Excel rejects sheet names longer than this (the format's limit is 32,
/// one of which the writer reserves)
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN: [char; 8] = ['/', '\\', '[', ']', ':', '*', '?', '\''];

/// One sheet of text rows; the first row is usually the header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }
}

/// Ordered sheets with unique, workbook-safe names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetBook {
    sheets: Vec<Sheet>,
}

impl SheetBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, sanitizing its name and resolving collisions;
    /// returns the name actually used
    pub fn add(&mut self, mut sheet: Sheet) -> String {
        let base = sanitize(&sheet.name);
        let mut name = base.clone();
        let mut n = 2;
        while self.name_taken(&name) {
            let suffix = format!("~{}", n);
            name = format!("{}{}", truncate(&base, MAX_SHEET_NAME - suffix.chars().count()), suffix);
            n += 1;
        }
        sheet.name = name.clone();
        self.sheets.push(sheet);
        name
    }

    /// Add a sheet whose name is already known to be valid and unique
    /// (e.g. read back from a workbook)
    pub fn push_raw(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    fn name_taken(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.sheets.iter().any(|s| s.name.to_lowercase() == lower)
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Replace characters workbooks reject and cap the length
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = truncate(&cleaned, MAX_SHEET_NAME);
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_forbidden_characters() {
        assert_eq!(sanitize("조사표_A/B:C*D?"), "조사표_A_B_C_D_");
        assert_eq!(sanitize("[x]'y'\\z"), "_x__y__z");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "작업조건_".to_string() + &"가".repeat(60);
        let name = sanitize(&long);
        assert_eq!(name.chars().count(), MAX_SHEET_NAME);
        assert!(name.starts_with("작업조건_"));
    }

    #[test]
    fn test_sanitized_names_never_contain_separators() {
        for input in ["a/b", "a\\b", "a:b", "a?b", "a*b", "[ab]", "'ab'"] {
            let name = sanitize(input);
            assert!(name.chars().count() <= MAX_SHEET_NAME);
            assert!(!name.chars().any(|c| FORBIDDEN.contains(&c)), "{}", name);
        }
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let mut book = SheetBook::new();
        assert_eq!(book.add(Sheet::new("조사표_A/B")), "조사표_A_B");
        assert_eq!(book.add(Sheet::new("조사표_A:B")), "조사표_A_B~2");
        assert_eq!(book.add(Sheet::new("조사표_a_b")), "조사표_a_b~3");
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_collision_suffix_respects_length_cap() {
        let mut book = SheetBook::new();
        let long = "x".repeat(40);
        book.add(Sheet::new(long.clone()));
        let second = book.add(Sheet::new(long));
        assert_eq!(second.chars().count(), MAX_SHEET_NAME);
        assert!(second.ends_with("~2"));
    }
}
