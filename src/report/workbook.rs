//! Report pages as a formatted xlsx workbook

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::core::session::SessionMeta;
use crate::core::store::ValueStore;
use crate::persist::book::{Sheet, SheetBook};
use crate::report::{layout, Block, Page, ReportError};

const MIN_WIDTH: f64 = 8.0;
const MAX_WIDTH: f64 = 60.0;

struct Formats {
    title: Format,
    header: Format,
    label: Format,
    cell: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(12),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0xD9E1F2)
                .set_border(FormatBorder::Thin),
            label: Format::new()
                .set_bold()
                .set_background_color(0xF2F2F2)
                .set_border(FormatBorder::Thin),
            cell: Format::new().set_border(FormatBorder::Thin).set_text_wrap(),
        }
    }
}

/// Writes blocks top to bottom, one blank row between blocks
struct PageWriter<'a> {
    sheet: &'a mut Worksheet,
    formats: &'a Formats,
    row: u32,
    widths: Vec<usize>,
}

impl PageWriter<'_> {
    fn put(&mut self, col: usize, text: &str, format: &Format) -> Result<(), ReportError> {
        let c = u16::try_from(col).map_err(|_| ReportError::Workbook("too many columns".into()))?;
        let written = if text.is_empty() {
            self.sheet.write_blank(self.row, c, format)
        } else {
            self.sheet.write_string_with_format(self.row, c, text, format)
        };
        written.map_err(|e| ReportError::Workbook(format!("{}:{}: {}", self.row + 1, col + 1, e)))?;

        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        let longest = text.lines().map(display_width).max().unwrap_or(0);
        self.widths[col] = self.widths[col].max(longest);
        Ok(())
    }

    fn next_row(&mut self) {
        self.row += 1;
    }

    fn block(&mut self, block: &Block) -> Result<(), ReportError> {
        let formats = self.formats;
        match block {
            Block::Title(text) => {
                self.put(0, text, &formats.title)?;
                self.next_row();
            }
            Block::Pairs(pairs) => {
                for (label, value) in pairs {
                    self.put(0, label, &formats.label)?;
                    self.put(1, value, &formats.cell)?;
                    self.next_row();
                }
            }
            Block::Table(table) => {
                for (c, column) in table.columns().iter().enumerate() {
                    self.put(c, column, &formats.header)?;
                }
                self.next_row();
                for row in table.rows() {
                    for (c, text) in row.iter().enumerate() {
                        self.put(c, text, &formats.cell)?;
                    }
                    self.next_row();
                }
            }
        }
        Ok(())
    }

    fn finish(self) {
        for (c, width) in self.widths.iter().enumerate() {
            let Ok(c) = u16::try_from(c) else { break };
            let width = (*width as f64 + 2.0).clamp(MIN_WIDTH, MAX_WIDTH);
            self.sheet.set_column_width(c, width).ok();
        }
    }
}

/// Column width of text in character cells; Hangul and other wide
/// characters take two
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| if (ch as u32) >= 0x1100 { 2 } else { 1 })
        .sum()
}

fn write_page(
    workbook: &mut Workbook,
    name: &str,
    page: &Page,
    formats: &Formats,
) -> Result<(), ReportError> {
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(name)
        .map_err(|e| ReportError::Workbook(format!("{}: {}", name, e)))?;

    let mut writer = PageWriter {
        sheet,
        formats,
        row: 0,
        widths: Vec::new(),
    };
    for (i, block) in page.blocks.iter().enumerate() {
        // Title blocks lead straight into their content
        if i > 0 && !matches!(page.blocks[i - 1], Block::Title(_)) {
            writer.next_row();
        }
        writer.block(block)?;
    }
    writer.finish();
    Ok(())
}

/// Render the full report workbook
pub fn export(store: &ValueStore, meta: &SessionMeta) -> Result<Vec<u8>, ReportError> {
    let pages = layout(store, meta);
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let mut names = SheetBook::new();

    for page in &pages {
        let name = names.add(Sheet::new(page.name.as_str()));
        write_page(&mut workbook, &name, page, &formats)?;
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| ReportError::Workbook(e.to_string()))?;
    tracing::info!(sheets = pages.len(), bytes = bytes.len(), "exported report workbook");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::{FieldId, ValueKey};
    use crate::core::value::Value;
    use crate::entities::checklist::ChecklistTable;
    use crate::entities::{detailed, work_condition};
    use crate::persist::xlsx;

    fn meta() -> SessionMeta {
        SessionMeta::new("A_20240501_000000", "A사업장")
    }

    fn sample_store() -> ValueStore {
        let mut store = ValueStore::new();
        store.checklist = ChecklistTable::sample();
        store.set_scalar(ValueKey::global(FieldId::Location), "울산");
        store
    }

    #[test]
    fn test_export_sheet_order() {
        let bytes = export(&sample_store(), &meta()).unwrap();
        let (book, warnings) = xlsx::read_book(&bytes).unwrap();
        assert!(warnings.is_empty());

        let names: Vec<&str> = book.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(&names[..3], &["사업장개요", "체크리스트", "유해요인_조립1반"]);
        assert!(names.contains(&"작업조건_포장반"));
        assert!(names.contains(&"원인분석_검사2반"));
        assert!(names.contains(&"증상_통증호소자"));
        assert_eq!(names.last(), Some(&"개선계획서"));
    }

    #[test]
    fn test_overview_and_checklist_content() {
        let bytes = export(&sample_store(), &meta()).unwrap();
        let (book, _) = xlsx::read_book(&bytes).unwrap();

        let overview = book.get("사업장개요").unwrap();
        assert_eq!(overview.rows[0], vec!["항목", "내용"]);
        assert_eq!(overview.rows[1], vec!["사업장명", "A사업장"]);
        assert_eq!(overview.rows[2], vec!["소재지", "울산"]);

        let checklist = book.get("체크리스트").unwrap();
        assert_eq!(checklist.rows[0].last().map(String::as_str), Some("부담작업"));
        assert_eq!(
            checklist.rows[1].last().map(String::as_str),
            Some("1호, 3호(잠재), 11호")
        );
    }

    #[test]
    fn test_survey_page_is_headerless() {
        let bytes = export(&sample_store(), &meta()).unwrap();
        let (book, _) = xlsx::read_book(&bytes).unwrap();
        let form = book.get("유해요인_포장반").unwrap();
        assert_eq!(form.rows[0][0], "조사개요");
        assert_eq!(form.rows[1][..2], ["조사일시", ""]);
        assert_eq!(form.rows[2][..2], ["부서명", "생산2팀"]);
        // blank row, then the situation survey
        assert!(form.rows[6].iter().all(String::is_empty));
        assert_eq!(form.rows[7][0], "작업장 상황조사");
        assert_eq!(form.rows[8], vec!["항목", "상태", "세부사항"]);
    }

    #[test]
    fn test_work_conditions_carry_totals() {
        let mut store = sample_store();
        work_condition::rate(&mut store, "포장반", 0, Some("약간 힘듦(3)"), Some("계속(4)")).unwrap();
        let bytes = export(&store, &meta()).unwrap();
        let (book, _) = xlsx::read_book(&bytes).unwrap();
        let sheet = book.get("작업조건_포장반").unwrap();
        assert_eq!(sheet.rows[1].last().map(String::as_str), Some("12"));
    }

    #[test]
    fn test_unsafe_unit_names_are_sanitized() {
        let mut store = ValueStore::new();
        store.checklist = ChecklistTable::from_rows(vec![
            crate::entities::ChecklistRow::new("A", "B", "조립/1반", "체결"),
        ]);
        detailed::add(&mut store);
        let bytes = export(&store, &meta()).unwrap();
        let (book, _) = xlsx::read_book(&bytes).unwrap();
        assert!(book.get("유해요인_조립_1반").is_some());
        assert!(book.get("정밀_정밀조사_1").is_some());
    }

    #[test]
    fn test_oversized_cell_is_an_error() {
        let mut store = sample_store();
        store.set(ValueKey::global(FieldId::Industry), Value::text("x".repeat(40_000)));
        assert!(matches!(export(&store, &meta()), Err(ReportError::Workbook(_))));
    }

    #[test]
    fn test_display_width_counts_hangul_twice() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("조사"), 4);
    }
}
