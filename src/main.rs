// ABOUTME: Entry point for the swapd CLI application.
// ABOUTME: Parses arguments, sets up logging and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, SettingsAction};
use swapd::error::{Error, Result};
use swapd::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        // A failed swap has already been reported in the requested format.
        if !matches!(e, Error::Swap(_)) {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Serve => commands::serve(config).await,
        Commands::Swap { image, quiet, json } => {
            let mode = if json {
                OutputMode::Json
            } else if quiet {
                OutputMode::Quiet
            } else {
                OutputMode::Normal
            };
            commands::swap(config, &image, Output::new(mode)).await
        }
        Commands::Init { force } => commands::init(force),
        Commands::Settings { action } => match action {
            SettingsAction::Get => commands::settings_get(config).await,
            SettingsAction::Set { seconds } => commands::settings_set(config, seconds).await,
        },
    }
}
