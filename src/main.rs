//! xchange - convert currencies from the command line
//!
//! Parses arguments, installs the logger, runs one action and maps failures to
//! a non-zero exit code.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use xchange::app::App;
use xchange::cli::{Cli, Settings};

fn init_logger(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    init_logger(settings.log_level);

    let app = App::from_settings(
        &settings,
        Arc::new(|message: &str| eprintln!("error: {}", message)),
    )?;
    let report = app.run(&settings.action).await;

    for line in &report.lines {
        println!("{}", line);
    }

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
