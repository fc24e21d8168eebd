use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `mg completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the completion script for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print the completion script for `shell` to stdout.
///
/// # Errors
///
/// Never fails today; the signature matches the other command handlers.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    generate(shell, command, "mg", &mut out);
    Ok(())
}
