//! keel: static ownership and borrow validator.
//!
//! Commands:
//!   keel check <FILES>...   Validate programs (exit 0 accepted, 1 rejected, 2 error)
//!   keel explain <FILE>     Replay a program and show each step
//!   keel fmt <FILE>         Print a program in canonical text syntax

mod check;
mod config;
mod explain;
mod format;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::check::CheckOpts;
use crate::config::{Config, InputFormat, OutputFormat};
use crate::source::load_program;

#[derive(Parser)]
#[command(name = "keel", version)]
#[command(about = "Static validator for single ownership and scoped borrowing.", long_about = None)]
struct Cli {
    /// Configuration file (default: keel.toml in the current directory, if present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one or more programs.
    Check(CheckArgs),
    /// Replay a program and print each operation's action and resulting state.
    Explain {
        file: PathBuf,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        #[arg(long, value_enum)]
        input: Option<InputFormat>,
    },
    /// Print a program in canonical text syntax.
    Fmt {
        file: PathBuf,
        #[arg(long, value_enum)]
        input: Option<InputFormat>,
        /// Exit with status 1 instead of printing if the file is not canonical.
        #[arg(long)]
        check: bool,
    },
}

#[derive(Args)]
struct CheckArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    #[arg(long, value_enum)]
    input: Option<InputFormat>,
    /// Reject programs that end with scopes still open.
    #[arg(long)]
    no_close_scopes: bool,
    /// Include a per-operation trace in JSON output.
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(cli.verbose, cli.quiet, config.log.level.as_deref());

    match cli.command {
        Command::Check(args) => cmd_check(args, &config),
        Command::Explain {
            file,
            format,
            input,
        } => cmd_explain(&file, format, input, &config),
        Command::Fmt { file, input, check } => cmd_fmt(&file, input, check, &config),
    }
}

/// `-v`/`--quiet` win over `RUST_LOG`, which wins over the config file.
fn init_logging(verbose: u8, quiet: bool, config_level: Option<&str>) {
    let filter = match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_level.unwrap_or("warn"))),
        (false, 1) => EnvFilter::new("info"),
        (false, 2) => EnvFilter::new("debug"),
        (false, _) => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_check(args: CheckArgs, config: &Config) -> Result<ExitCode> {
    let mut options = config.check_options();
    if args.no_close_scopes {
        options.close_open_scopes = false;
    }
    if args.trace {
        options.record_trace = true;
    }
    let opts = CheckOpts {
        files: args.files,
        format: args.format.unwrap_or(config.check.format),
        input: args.input.or(config.check.input),
        options,
    };
    Ok(ExitCode::from(check::run(&opts).exit_code()))
}

fn cmd_explain(
    file: &std::path::Path,
    format: Option<OutputFormat>,
    input: Option<InputFormat>,
    config: &Config,
) -> Result<ExitCode> {
    let program = load_program(file, input.or(config.check.input))?;
    let options = config.check_options();

    let accepted = match format.unwrap_or(config.check.format) {
        OutputFormat::Text => {
            let explanation = explain::explain(&program, &options);
            print!("{}", explanation.text);
            explanation.rejection.is_none()
        }
        OutputFormat::Json => {
            let report = explain::explain_report(&program, &options);
            println!("{}", serde_json::to_string_pretty(&report)?);
            report.is_accepted()
        }
    };
    Ok(if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_fmt(
    file: &std::path::Path,
    input: Option<InputFormat>,
    check_only: bool,
    config: &Config,
) -> Result<ExitCode> {
    let input = input.or(config.check.input);
    if check_only {
        if format::is_formatted(file, input)? {
            return Ok(ExitCode::SUCCESS);
        }
        println!("Needs formatting: {}", file.display());
        return Ok(ExitCode::from(1));
    }
    print!("{}", format::format_file(file, input)?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from([
            "keel",
            "-vv",
            "check",
            "a.keel",
            "b.json",
            "--format",
            "json",
            "--no-close-scopes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.no_close_scopes);
        assert_eq!(args.input, None);
    }

    #[test]
    fn test_check_requires_files() {
        assert!(Cli::try_parse_from(["keel", "check"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["keel", "-q", "-v", "fmt", "a.keel"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["keel", "explain", "p.keel", "--config", "ci.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
    }
}
