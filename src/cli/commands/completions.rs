//! Shell completions for `ergo`
//!
//! Section subcommands (`checklist`, `condition`, `hazard`, ...) and their
//! flags complete; unit names and row numbers come from the active session
//! and do not.
//!
//! ```bash
//! source <(ergo completions bash)
//! ergo completions fish > ~/.config/fish/completions/ergo.fish
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io::{self, Write};

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    write_script(args.shell, &mut io::stdout());
    Ok(())
}

/// Completion script named after the binary clap knows us as
fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_covers_section_commands() {
        let mut out = Vec::new();
        write_script(Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("ergo"));
        for command in ["session", "checklist", "condition", "snapshot"] {
            assert!(script.contains(command), "missing {}", command);
        }
    }
}
