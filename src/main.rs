use clap::Parser;
use ergo::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping to `head` or `grep -q` terminates quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.quiet, global.verbose)?;

    match cli.command {
        Commands::Init(args) => ergo::cli::commands::init::run(args),
        Commands::Session(cmd) => ergo::cli::commands::session::run(cmd, &global),
        Commands::Overview(cmd) => ergo::cli::commands::overview::run(cmd, &global),
        Commands::Checklist(cmd) => ergo::cli::commands::checklist::run(cmd, &global),
        Commands::Form(cmd) => ergo::cli::commands::form::run(cmd, &global),
        Commands::Condition(cmd) => ergo::cli::commands::condition::run(cmd, &global),
        Commands::Hazard(cmd) => ergo::cli::commands::hazard::run(cmd, &global),
        Commands::Detailed(cmd) => ergo::cli::commands::detailed::run(cmd, &global),
        Commands::Symptom(cmd) => ergo::cli::commands::symptom::run(cmd, &global),
        Commands::Plan(cmd) => ergo::cli::commands::plan::run(cmd, &global),
        Commands::Report(args) => ergo::cli::commands::report::run(args, &global),
        Commands::Snapshot(cmd) => ergo::cli::commands::snapshot::run(cmd, &global),
        Commands::Completions(args) => ergo::cli::commands::completions::run(args),
    }
}

/// Diagnostics go to stderr; `ERGO_LOG` overrides the -q/-v level
fn init_tracing(quiet: bool, verbose: u8) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("ERGO_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| miette::miette!("failed to initialize logging: {}", e))
}
