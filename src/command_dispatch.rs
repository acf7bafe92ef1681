//! Purpose: Hold top-level CLI command dispatch for `larder`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command output envelopes and exit code semantics stay unchanged.

use super::*;

use larder::api::load_csv;
use larder::serve::{serve, ServeConfig};

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "larder", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            println!("larder {}", env!("CARGO_PKG_VERSION"));
            Ok(RunOutcome::ok())
        }
        Command::Check { data, json } => {
            let rows = load_csv(&data)?;
            let fields: Vec<&String> = rows.first().map(|row| row.keys().collect()).unwrap_or_default();
            if json {
                println!(
                    "{}",
                    json!({
                        "data_file": data.display().to_string(),
                        "rows": rows.len(),
                        "fields": fields,
                    })
                );
            } else {
                println!("{}: {} rows", data.display(), rows.len());
                if !fields.is_empty() {
                    let names: Vec<&str> = fields.iter().map(|name| name.as_str()).collect();
                    println!("fields: {}", names.join(", "));
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Serve(args) => {
            let config = ServeConfig {
                bind: args.bind,
                data_file: args.data,
                per_page: args.per_page,
                max_body_bytes: args.max_body_bytes,
                allow_non_loopback: args.allow_non_loopback,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve(config))?;
            Ok(RunOutcome::ok())
        }
    }
}
