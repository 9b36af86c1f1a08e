//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    checklist::ChecklistCommands, completions::CompletionsArgs, condition::ConditionCommands,
    detailed::DetailedCommands, form::FormCommands, hazard::HazardCommands, init::InitArgs,
    overview::OverviewCommands, plan::PlanCommands, report::ReportArgs, session::SessionCommands,
    snapshot::SnapshotCommands, symptom::SymptomCommands,
};

#[derive(Parser)]
#[command(name = "ergo")]
#[command(author, version, about = "Musculoskeletal hazard survey toolkit")]
#[command(long_about = "Record 근골격계 유해요인조사 sessions: the burden-task checklist, per-unit survey forms, and the report workbook.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Workspace root (default: auto-detect by finding .ergo/)
    #[arg(long, global = true, env = "ERGO_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ergo workspace
    Init(InitArgs),

    /// Start, open, list and save survey sessions
    #[command(subcommand)]
    Session(SessionCommands),

    /// Workplace overview (사업장개요)
    #[command(subcommand)]
    Overview(OverviewCommands),

    /// Burden-task checklist (체크리스트)
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Per-unit survey form (유해요인 조사표)
    #[command(subcommand)]
    Form(FormCommands),

    /// Per-unit work conditions and scores (작업조건조사)
    #[command(subcommand)]
    Condition(ConditionCommands),

    /// Per-unit cause analysis (원인분석)
    #[command(subcommand)]
    Hazard(HazardCommands),

    /// Detailed investigations (정밀조사)
    #[command(subcommand)]
    Detailed(DetailedCommands),

    /// Symptom survey aggregates (증상조사)
    #[command(subcommand)]
    Symptom(SymptomCommands),

    /// Work environment improvement plan (개선계획서)
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Export the report workbook or document
    Report(ReportArgs),

    /// Export or import a JSON snapshot of the session
    #[command(subcommand)]
    Snapshot(SnapshotCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns for the terminal
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
