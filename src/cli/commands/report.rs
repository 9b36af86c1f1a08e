//! `ergo report` command - Export the report workbook or document

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::cli::helpers::{self, now, Active};
use crate::cli::GlobalOpts;
use crate::report;

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Output file (default: report workbook in the workspace root;
    /// stdout with --document)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write a Markdown document instead of the xlsx workbook
    #[arg(long)]
    pub document: bool,
}

pub fn run(args: ReportArgs, global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    let (meta, store) = (&active.ctx.meta, &active.ctx.store);

    if args.document {
        let content = report::render(store, meta);
        return write_output(&content, args.output, global);
    }

    let bytes = report::export(store, meta).map_err(|e| miette::miette!("{}", e))?;
    let path = match args.output {
        Some(path) => path,
        None => active
            .workspace
            .root()
            .join(report::file_name(&meta.workplace, now().date())),
    };
    std::fs::write(&path, bytes).into_diagnostic()?;
    helpers::done(
        global,
        format!("Report written to {}", style(path.display()).cyan()),
    );
    Ok(())
}

fn write_output(content: &str, output_path: Option<PathBuf>, global: &GlobalOpts) -> Result<()> {
    if let Some(path) = output_path {
        let file = File::create(&path).into_diagnostic()?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes()).into_diagnostic()?;
        writer.flush().into_diagnostic()?;
        helpers::done(
            global,
            format!("Report written to {}", style(path.display()).cyan()),
        );
    } else {
        print!("{}", content);
    }
    Ok(())
}
