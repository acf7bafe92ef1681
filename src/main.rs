//! Purpose: `larder` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{error::ErrorKind as ClapErrorKind, Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::aot::Shell;
use serde_json::json;

use larder::api::{to_exit_code, Error, ErrorKind};

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "Serve recipe records from a CSV file over HTTP"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the data file and serve the HTTP API until shutdown.
    Serve(ServeArgs),
    /// Load the data file and report row count and field names.
    Check {
        /// Path to the CSV data file.
        #[arg(long, value_hint = ValueHint::FilePath)]
        data: PathBuf,
        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the version.
    Version,
}

#[derive(Args)]
struct ServeArgs {
    /// Path to the CSV data file loaded once at startup.
    #[arg(long, value_hint = ValueHint::FilePath)]
    data: PathBuf,
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    /// Default page size for list responses.
    #[arg(long, default_value_t = 10)]
    per_page: usize,
    /// Maximum accepted request body size.
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_bytes: u64,
    /// Permit binding to a non-loopback address.
    #[arg(long)]
    allow_non_loopback: bool,
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(err.to_string().trim_end().to_string())
                    .with_hint("Run with --help for usage."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command)
}

fn emit_error(err: &Error) {
    let mut body = json!({
        "kind": format!("{:?}", err.kind()),
        "message": err.message().unwrap_or("error"),
    });
    if let Some(hint) = err.hint() {
        body["hint"] = json!(hint);
    }
    if let Some(path) = err.path() {
        body["path"] = json!(path.display().to_string());
    }
    eprintln!("{}", json!({ "error": body }));
}
