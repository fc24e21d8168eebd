#![forbid(unsafe_code)]

mod cmd;
mod output;
mod pipeline;

use std::env;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "mg: consistency checks and dataset generation for move dependency graphs",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run pipeline stages",
        long_about = "Run the named stages in order, or the config's `pipeline.stages` when none \
                      are given. Findings and stage outcomes go to <log_dir>/diagnostics.json.",
        after_help = "EXAMPLES:\n    # Run the stages listed in the config\n    mg run -c pipeline.toml\n\n    # Check the table, then build the graph\n    mg run -c pipeline.toml check-moves generate-graph\n\n    # Start from an empty log directory\n    mg run -c pipeline.toml --clean"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        about = "List registered stages",
        after_help = "EXAMPLES:\n    mg stages\n    mg stages --json"
    )]
    Stages,

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    mg completions bash > /etc/bash_completion.d/mg"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MOVEGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "movegraph=debug,info"
        } else {
            "movegraph=info,warn"
        })
    });

    let format = env::var("MOVEGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();
    debug!(?output, "starting");

    let result = match cli.command {
        Commands::Run(ref args) => cmd::run::run_pipeline(args, output, cli.quiet),
        Commands::Stages => cmd::stages::run_stages(output),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_parses_config_and_stages() {
        let cli = Cli::parse_from(["mg", "run", "-c", "p.toml", "check-moves", "cycles"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, std::path::PathBuf::from("p.toml"));
                assert_eq!(args.stages, vec!["check-moves", "cycles"]);
                assert!(!args.clean);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_config() {
        assert!(Cli::try_parse_from(["mg", "run", "check-moves"]).is_err());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["mg", "stages", "--json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn quiet_and_clean_flags_parse() {
        let cli = Cli::parse_from(["mg", "-q", "run", "--config", "p.toml", "--clean"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Run(ref args) if args.clean));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["mg", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
