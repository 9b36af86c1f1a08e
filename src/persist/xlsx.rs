//! xlsx encoding of a [`SheetBook`]
//!
//! Cells are always written as strings, and blank cells are not written
//! at all. Reading accepts whatever a spreadsheet program may have turned
//! those strings into (numbers, dates, booleans) and renders them back to
//! text. The writer escapes control characters and `_xHHHH_` lookalikes
//! with OOXML `_xHHHH_` sequences, which the reader passes through as is, so
//! string cells are unescaped here.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};

use crate::core::value::TIMESTAMP_FORMAT;
use crate::persist::book::{Sheet, SheetBook};
use crate::persist::codec::{INDEX_SHEET, OTHER_SHEET};

/// Sheets whose first row is data, not a header
fn is_headerless(sheet: &Sheet) -> bool {
    sheet.name == OTHER_SHEET || sheet.name == INDEX_SHEET
}

/// Render a book to xlsx bytes
pub fn write_book(book: &SheetBook) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for sheet in book.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(|e| e.to_string())?;

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = u32::try_from(r).map_err(|_| format!("{}: too many rows", sheet.name))?;
            for (c, text) in row.iter().enumerate() {
                if text.is_empty() {
                    continue;
                }
                let c = u16::try_from(c).map_err(|_| format!("{}: too many columns", sheet.name))?;
                let written = if r == 0 && !is_headerless(sheet) {
                    worksheet.write_string_with_format(r, c, text, &header)
                } else {
                    worksheet.write_string(r, c, text)
                };
                written.map_err(|e| format!("{} ({}:{}): {}", sheet.name, r + 1, c + 1, e))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("failed to create workbook: {}", e))
}

/// Text rendering of one cell
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => unescape(s),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::Error(e) => format!("#{}", e),
    }
}

/// Decode `_xHHHH_` sequences; `_x005F_` is the escaped underscore
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find("_x") {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        let decoded = tail
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| tail.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Grid of text rows anchored at A1, whatever the range's origin
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    rows
}

fn open(bytes: &[u8]) -> Result<Xlsx<Cursor<&[u8]>>, String> {
    Xlsx::new(Cursor::new(bytes)).map_err(|e| format!("not a readable xlsx workbook: {}", e))
}

/// Parse xlsx bytes into a book
///
/// Sheets that cannot be read are reported and left out.
pub fn read_book(bytes: &[u8]) -> Result<(SheetBook, Vec<String>), String> {
    let mut workbook = open(bytes)?;
    let mut book = SheetBook::new();
    let mut warnings = Vec::new();

    for name in workbook.sheet_names() {
        match workbook.worksheet_range(&name) {
            Ok(range) => book.push_raw(Sheet {
                rows: range_rows(&range),
                name,
            }),
            Err(e) => warnings.push(format!("{}: {}", name, e)),
        }
    }
    Ok((book, warnings))
}

/// Rows of the first sheet only
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<String>>, String> {
    let mut workbook = open(bytes)?;
    let name = workbook
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| "workbook has no sheets".to_string())?;
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| format!("{}: {}", name, e))?;
    Ok(range_rows(&range))
}

/// Read only one named sheet
pub fn read_sheet(bytes: &[u8], name: &str) -> Result<Option<Sheet>, String> {
    let mut workbook = open(bytes)?;
    if !workbook.sheet_names().iter().any(|n| n == name) {
        return Ok(None);
    }
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| format!("{}: {}", name, e))?;
    Ok(Some(Sheet {
        name: name.to_string(),
        rows: range_rows(&range),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_book_survives_xlsx() {
        let mut book = SheetBook::new();
        book.add(Sheet {
            name: "체크리스트".into(),
            rows: vec![row(&["회사명", "소속"]), row(&["A회사", ""]), row(&["", "생산팀"])],
        });
        book.add(Sheet {
            name: OTHER_SHEET.into(),
            rows: vec![row(&["사진개수", "unit:포장반", "integer", "3"])],
        });

        let bytes = write_book(&book).unwrap();
        let (read, warnings) = read_book(&bytes).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(read.len(), 2);
        assert_eq!(read.get("체크리스트").unwrap().rows, book.sheets()[0].rows);
        assert_eq!(read.get(OTHER_SHEET).unwrap().rows[0][3], "3");
    }

    #[test]
    fn test_leading_blank_rows_keep_their_position() {
        let mut book = SheetBook::new();
        book.add(Sheet {
            name: "정밀_x".into(),
            rows: vec![Vec::new(), Vec::new(), Vec::new(), row(&["", "분석결과"])],
        });
        let (read, _) = read_book(&write_book(&book).unwrap()).unwrap();
        let rows = &read.get("정밀_x").unwrap().rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], row(&["", "분석결과"]));
    }

    #[test]
    fn test_oversized_cell_fails_to_write() {
        let mut book = SheetBook::new();
        book.add(Sheet {
            name: "big".into(),
            rows: vec![vec!["x".repeat(40_000)]],
        });
        assert!(write_book(&book).is_err());
    }

    #[test]
    fn test_garbage_is_not_a_workbook() {
        assert!(read_book(b"not a zip file").is_err());
    }

    #[test]
    fn test_escaped_strings_are_decoded() {
        let text = |s: &str| cell_text(&Data::String(s.into()));
        assert_eq!(text("a_x000D_\nb"), "a\r\nb");
        assert_eq!(text("bell_x0007_"), "bell\u{7}");
        assert_eq!(text("_x005F_x0041_"), "_x0041_");
        assert_eq!(text("_x12_ and _xZZZZ_"), "_x12_ and _xZZZZ_");
        assert_eq!(text("포장_x"), "포장_x");
    }

    #[test]
    fn test_control_characters_survive_xlsx() {
        let values = ["a\r\nb", "bell\u{7}", "_x0041_", "\tindented"];
        let mut book = SheetBook::new();
        book.add(Sheet {
            name: OTHER_SHEET.into(),
            rows: vec![values.iter().map(|v| v.to_string()).collect()],
        });
        let (read, _) = read_book(&write_book(&book).unwrap()).unwrap();
        assert_eq!(read.get(OTHER_SHEET).unwrap().rows[0], row(&values));
    }

    #[test]
    fn test_cell_text_renders_whole_floats_as_integers() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
