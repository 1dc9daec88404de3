use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use sit_engine::{EngineError, Severity};
use tracing::Level;

mod cli;
mod commands;
mod render;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match commands::run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            exit_code(&err)
        }
    }
}

/// 1 for bad input, 2 for a broken environment.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<EngineError>().map(EngineError::severity) {
        Some(Severity::User) => ExitCode::from(1),
        _ => ExitCode::from(2),
    }
}
