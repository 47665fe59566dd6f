// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lectern::cli;
use lectern::{EngineConfig, ModuleEngine};

#[derive(Parser)]
#[command(
    name = "lectern",
    about = "Lectern — module acquisition and caching engine for the Lectern study app",
    version,
    after_help = "Run 'lectern <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Override the data directory (default ~/.lectern)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every known module with its installed state
    List,
    /// Download and install a module
    Install {
        /// Module id (see 'lectern list')
        id: String,
    },
    /// Remove a module from every storage tier and the manifest
    Uninstall {
        /// Module id
        id: String,
    },
    /// Read a module payload, optionally sliced to a unit path
    Read {
        /// Module id
        id: String,
        /// Unit path segments, e.g. 'Genesis 1' or a dictionary term
        path: Vec<String>,
    },
    /// Show manifest and storage tier status
    Status,
    /// Install the default content set (first-run setup)
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = if args.verbose { "lectern=debug" } else { "lectern=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match args.data_dir {
        Some(root) => EngineConfig::rooted_at(root),
        None => EngineConfig::default_dirs(),
    };
    let engine = ModuleEngine::new(config);

    match args.command {
        Commands::List => cli::list_cmd::run(&engine, args.json).await,
        Commands::Install { id } => cli::install_cmd::run(&engine, &id, args.quiet).await,
        Commands::Uninstall { id } => cli::uninstall_cmd::run(&engine, &id).await,
        Commands::Read { id, path } => cli::read_cmd::run(&engine, &id, &path, args.json).await,
        Commands::Status => cli::status_cmd::run(&engine, args.json).await,
        Commands::Setup => cli::setup_cmd::run(&engine).await,
    }
}
