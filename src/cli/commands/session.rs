//! `ergo session` command - Start, open, list and save survey sessions

use clap::Subcommand;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{self, now, open_workspace, print_table, Active};
use crate::cli::GlobalOpts;
use crate::core::autosave::AutoSave;
use crate::core::session::SessionContext;
use crate::core::value::{Table, TIMESTAMP_FORMAT};
use crate::core::{Config, Workspace, WorkspaceError};
use crate::persist::{codec, xlsx, LoadOutcome};

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Start a new session (the current one is saved first)
    New(NewArgs),

    /// List saved sessions
    List,

    /// Open a saved session
    Open(OpenArgs),

    /// Show the active session
    Show,

    /// Save the active session now
    Save,

    /// Open a session workbook from another location
    Import(ImportArgs),

    /// Save and close the active session
    Close,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Workplace name (prompted when omitted)
    pub workplace: Option<String>,

    /// Append a random suffix to the session id
    #[arg(long)]
    pub suffix: bool,
}

#[derive(clap::Args, Debug)]
pub struct OpenArgs {
    /// Session id (picked interactively when omitted)
    pub id: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Session workbook (.xlsx) written by `ergo session save`
    pub file: PathBuf,
}

pub fn run(cmd: SessionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SessionCommands::New(args) => run_new(args, global),
        SessionCommands::List => run_list(global),
        SessionCommands::Open(args) => run_open(args, global),
        SessionCommands::Show => run_show(global),
        SessionCommands::Save => run_save(global),
        SessionCommands::Import(args) => run_import(args, global),
        SessionCommands::Close => run_close(global),
    }
}

/// Save the active session, if any, before another one replaces it
pub(crate) fn flush_active(workspace: &Workspace, config: &Config, global: &GlobalOpts) -> Result<()> {
    let mut ctx = match workspace.load_draft() {
        Ok(ctx) => ctx,
        Err(WorkspaceError::NoActiveSession) => return Ok(()),
        Err(e) => return Err(miette::miette!("{}", e)),
    };
    let adapter = workspace.adapter(config.backend());
    let receipt = ctx
        .save(adapter.as_ref(), now())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Saved {} to {}",
            style("✓").green(),
            style(&ctx.meta.session_id).cyan(),
            receipt.location
        );
    }
    Ok(())
}

fn activate(workspace: &Workspace, ctx: &SessionContext, global: &GlobalOpts, verb: &str) -> Result<()> {
    workspace
        .save_draft(ctx)
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::done(
        global,
        format!(
            "{} session {} ({})",
            verb,
            style(&ctx.meta.session_id).cyan(),
            ctx.meta.workplace
        ),
    );
    Ok(())
}

fn pick_workplace(config: &Config) -> Result<String> {
    if !Term::stdout().is_term() {
        return Err(miette::miette!(
            "no workplace given; pass one: ergo session new <workplace>"
        ));
    }

    let mut items = config.workplaces();
    items.push("직접 입력".to_string());
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("사업장")
        .items(&items)
        .default(0)
        .interact()
        .into_diagnostic()?;

    if selection + 1 == items.len() {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("사업장명")
            .interact_text()
            .into_diagnostic()
    } else {
        Ok(items[selection].clone())
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = Config::for_workspace(&workspace);

    let workplace = match args.workplace {
        Some(name) => name,
        None => pick_workplace(&config)?,
    };

    flush_active(&workspace, &config, global)?;

    let with_suffix = args.suffix || config.session_suffix();
    let mut ctx = SessionContext::start(&workplace, now(), with_suffix).map_err(helpers::warning)?;
    ctx.autosave = AutoSave::new(config.autosave_secs());
    activate(&workspace, &ctx, global, "Started")
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = Config::for_workspace(&workspace);
    let sessions = workspace
        .adapter(config.backend())
        .list()
        .map_err(|e| miette::miette!("{}", e))?;
    let active = workspace.load_draft().ok().map(|ctx| ctx.meta.session_id);

    if sessions.is_empty() {
        if !global.quiet {
            println!("No saved sessions.");
        }
        return Ok(());
    }

    let rows = sessions
        .iter()
        .map(|s| {
            let marker = if active.as_deref() == Some(s.session_id.as_str()) {
                "*"
            } else {
                ""
            };
            vec![
                marker.to_string(),
                s.session_id.clone(),
                s.workplace.clone(),
                s.saved_at
                    .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default(),
                s.location.clone(),
            ]
        })
        .collect();
    print_table(
        &Table::with_rows(["활성", "세션", "사업장", "저장시각", "위치"], rows),
        global,
    )
}

fn pick_session(workspace: &Workspace, config: &Config) -> Result<String> {
    let sessions = workspace
        .adapter(config.backend())
        .list()
        .map_err(|e| miette::miette!("{}", e))?;
    if sessions.is_empty() {
        return Err(miette::miette!("no saved sessions"));
    }
    if !Term::stdout().is_term() {
        return Err(miette::miette!(
            "no session id given; pass one: ergo session open <id>"
        ));
    }

    let items: Vec<String> = sessions
        .iter()
        .map(|s| format!("{} ({})", s.session_id, s.workplace))
        .collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("세션")
        .items(&items)
        .default(0)
        .interact()
        .into_diagnostic()?;
    Ok(sessions[selection].session_id.clone())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }
}

fn resume(outcome: LoadOutcome, config: &Config) -> SessionContext {
    let mut autosave = AutoSave::new(config.autosave_secs());
    if let Some(saved_at) = outcome.meta.saved_at {
        autosave.record_success(saved_at);
    }
    SessionContext::resume(outcome.meta, outcome.store, autosave)
}

fn run_open(args: OpenArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = Config::for_workspace(&workspace);

    let id = match args.id {
        Some(id) => id,
        None => pick_session(&workspace, &config)?,
    };

    let outcome = workspace
        .adapter(config.backend())
        .load(&id)
        .map_err(|e| miette::miette!("{}", e))?;
    print_warnings(&outcome.warnings);

    if let Ok(current) = workspace.load_draft() {
        if current.meta.session_id != id {
            flush_active(&workspace, &config, global)?;
        }
    }

    let ctx = resume(outcome, &config);
    activate(&workspace, &ctx, global, "Opened")
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let active = Active::open(global)?;
    let ctx = &active.ctx;
    let saved = ctx
        .meta
        .saved_at
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "저장 안 됨".to_string());

    let table = helpers::pairs_table(&[
        ("세션", ctx.meta.session_id.clone()),
        ("사업장", ctx.meta.workplace.clone()),
        ("저장시각", saved),
        ("체크리스트 행", ctx.store.checklist.len().to_string()),
        ("단위작업", ctx.store.checklist.units().join(", ")),
        ("저장 방식", format!("{:?}", active.config.backend()).to_lowercase()),
        ("자동저장 간격(초)", active.config.autosave_secs().to_string()),
    ]);
    print_table(&table, global)
}

fn run_save(global: &GlobalOpts) -> Result<()> {
    let mut active = Active::open(global)?;
    let adapter = active.adapter();
    let receipt = active
        .ctx
        .save(adapter.as_ref(), now())
        .map_err(|e| miette::miette!("{}", e))?;
    active
        .workspace
        .save_draft(&active.ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    helpers::done(
        global,
        format!(
            "Saved {} to {}",
            style(&active.ctx.meta.session_id).cyan(),
            receipt.location
        ),
    );
    if let Some(backup) = receipt.backup {
        if !global.quiet {
            println!("   Previous save kept at {}", style(backup).dim());
        }
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = Config::for_workspace(&workspace);

    let bytes = std::fs::read(&args.file).into_diagnostic()?;
    let (book, mut warnings) = xlsx::read_book(&bytes)
        .map_err(|e| miette::miette!("{}: {}", args.file.display(), e))?;
    let outcome = codec::decode(&book)
        .map_err(|e| miette::miette!("{}: {}", args.file.display(), e))?;
    warnings.extend(outcome.warnings.iter().cloned());
    print_warnings(&warnings);

    flush_active(&workspace, &config, global)?;
    let ctx = resume(outcome, &config);
    activate(&workspace, &ctx, global, "Imported")
}

fn run_close(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = Config::for_workspace(&workspace);
    if !workspace.has_draft() {
        return Err(miette::miette!("{}", WorkspaceError::NoActiveSession));
    }
    flush_active(&workspace, &config, global)?;
    workspace
        .clear_draft()
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::done(global, "Closed the active session");
    Ok(())
}
