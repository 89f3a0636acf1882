use std::process::ExitCode;

use clap::Parser;
use reqcheck::cli::{run_cli, Cli};
use reqcheck::logging::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{e:#}");
    }

    match run_cli(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
