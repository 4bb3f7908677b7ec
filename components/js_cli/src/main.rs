//! Corten VM CLI
//!
//! Entry point for the bytecode runner. Parses CLI arguments and
//! delegates to the Runtime for execution.

use std::process::ExitCode;

use clap::Parser;
use core_types::Value;
use js_cli::{Cli, Command, Runtime};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut runtime = Runtime::new(cli.vm_config());
    let outcome = match &cli.command {
        Command::Run { file } => runtime.run_file(file).map(|result| {
            // Print result if not undefined
            if !matches!(result, Value::Undefined) {
                println!("{}", result);
            }
        }),
        Command::Disasm { file } => runtime
            .disassemble_file(file)
            .map(|listing| print!("{}", listing)),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
