//! Report pages as a paginated Markdown document

use std::fmt::Write;

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::core::session::SessionMeta;
use crate::core::store::ValueStore;
use crate::core::value::Table;
use crate::report::{layout, Block, Page};

const PAGE_BREAK: &str = "\n---\n\n";

fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().map(String::as_str));
    for row in rows {
        builder.push_record(row.iter().map(|cell| cell.replace('\n', " ")));
    }
    builder.build().with(Style::markdown()).to_string()
}

fn render_table(table: &Table) -> String {
    if table.is_empty() {
        return "_(내용 없음)_".to_string();
    }
    markdown_table(table.columns(), table.rows())
}

fn render_page(output: &mut String, page: &Page) {
    writeln!(output, "## {}\n", page.name).ok();
    for block in &page.blocks {
        match block {
            Block::Title(text) => {
                writeln!(output, "### {}\n", text).ok();
            }
            Block::Pairs(pairs) => {
                let rows: Vec<Vec<String>> = pairs
                    .iter()
                    .map(|(label, value)| vec![label.clone(), value.clone()])
                    .collect();
                let header = vec!["항목".to_string(), "내용".to_string()];
                writeln!(output, "{}\n", markdown_table(&header, &rows)).ok();
            }
            Block::Table(table) => {
                writeln!(output, "{}\n", render_table(table)).ok();
            }
        }
    }
}

/// Render the full report; one page per report section, separated by
/// horizontal rules
pub fn render(store: &ValueStore, meta: &SessionMeta) -> String {
    let mut output = String::new();
    output.push_str("# 근골격계 유해요인조사 보고서\n\n");
    writeln!(output, "**사업장:** {}  ", meta.workplace).ok();
    writeln!(output, "**세션:** {}", meta.session_id).ok();

    for page in layout(store, meta) {
        output.push_str(PAGE_BREAK);
        render_page(&mut output, &page);
    }
    output
}
