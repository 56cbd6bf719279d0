// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "swapd")]
#[command(about = "Zero-downtime container swap daemon for Docker and Podman")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: swapd.yml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP trigger daemon
    Serve,

    /// Swap the running instance to IMAGE now, in the foreground
    Swap {
        /// Image reference to deploy
        image: String,

        /// Print only the new container id
        #[arg(short, long, conflicts_with = "json")]
        quiet: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a template swapd.yml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Read or change the stabilization wait
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current swap wait in seconds
    Get,

    /// Set the swap wait in seconds
    Set {
        /// Seconds, a positive integer
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
}
