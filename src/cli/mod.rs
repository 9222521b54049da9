//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod run;
mod watch;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Sitepack - bundle, watch and serve static web assets
#[derive(Parser)]
#[command(name = "sitepack")]
#[command(about = "Sitepack - run asset pipelines, watch sources and serve with live reload")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a registered task once
    Run {
        /// Task name (defaults to the configured 'default' task)
        task: Option<String>,

        /// Path to sitepack.toml (discovered by walking up when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the output directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Start the dev server and re-run tasks on file changes
    Watch {
        /// Path to sitepack.toml (discovered by walking up when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the dev server port
        #[arg(long)]
        port: Option<u16>,

        /// Override the dev server root directory
        #[arg(long)]
        root: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { task, config, out, verbose } => {
            run::run_task(task.as_deref(), config.as_deref(), out.as_deref(), verbose)
        }
        Commands::Watch { config, port, root, verbose } => {
            watch::run_watch(config.as_deref(), port, root.as_deref(), verbose)
        }
    }
}
