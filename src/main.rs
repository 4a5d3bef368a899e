//! Binary entry point for scanstore.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use scanstore::cli::output::{OutputFormat, format_error};
use scanstore::cli::{Cli, execute};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = OutputFormat::parse(&cli.format);
    match execute(&cli) {
        Ok(output) => print_output(&output),
        Err(e) => {
            report_error(&e, format);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG`
/// overrides `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_output(output: &str) -> ExitCode {
    if output.is_empty() {
        return ExitCode::SUCCESS;
    }
    match io::stdout().write_all(output.as_bytes()) {
        Ok(()) => ExitCode::SUCCESS,
        // `scanstore history | head`
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn report_error(error: &scanstore::Error, format: OutputFormat) {
    let message = format_error(error, format);
    match format {
        OutputFormat::Json => println!("{message}"),
        OutputFormat::Text => eprintln!("Error: {message}"),
    }
}
