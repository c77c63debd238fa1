//! `gameshelf` - Local game library registry
//!
//! Command-line front end: resolves the data directory, sets up logging and
//! runs one subcommand against the library.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use gameshelf::config::AppPaths;
use gameshelf::error::{GameShelfError, get_user_friendly_error};
use gameshelf::utils;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {e:#}");
            match e.downcast_ref::<GameShelfError>() {
                Some(shelf_error) => eprintln!("{}", get_user_friendly_error(shelf_error)),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = cli.data_dir.map_or_else(AppPaths::from_env, AppPaths::new);
    paths
        .ensure_root()
        .context("Failed to create data directory")?;

    let level = if cli.verbose { "debug" } else { "info" };
    utils::init_logging(&paths.log_dir(), level).context("Failed to initialize logging system")?;

    cli::execute(cli.command, paths)
}
