// gramian_sim/src/main.rs

use std::process::ExitCode;

use clap::Parser;
use gramian_sim::cli::Cli;
use gramian_sim::config::SimConfig;
use gramian_sim::logger::init_logger;
use gramian_sim::scenarios;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger();

    // --- 1. Load Configuration ---
    let config = match SimConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load the scenario configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    match &cli.config {
        Some(path) => info!("Loaded scenario from '{}'", path.display()),
        None => info!("No scenario file given, using the built-in defaults"),
    }

    // --- 2. Run ---
    match scenarios::run(cli.command, &config, &cli.output) {
        Ok(()) => {
            info!("{} finished, results in '{}'", cli.command.name(), cli.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{} failed: {e}", cli.command.name());
            ExitCode::FAILURE
        }
    }
}
