/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! batchsign CLI - Command-line interface for batch package signing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

use config::ConfigLoader;

/// batchsign - Sign batches of package files against a remote key vault
#[derive(Parser)]
#[command(name = "batchsign")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (can also be set via BATCHSIGN_CONFIG environment variable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign every listed package file as one batch
    Sign(commands::sign::SignArgs),

    /// Show which configuration file would be loaded
    ConfigPath,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let loader = ConfigLoader::new();

    match cli.command {
        Commands::Sign(args) => {
            let config = loader.load_config(cli.config.as_deref()).context(
                "Cannot load configuration. Pass --config, set BATCHSIGN_CONFIG, or create ./batchsign.toml",
            )?;

            commands::sign::run(config, args).await?;
        }
        Commands::ConfigPath => {
            commands::config_path::run(&loader, cli.config.as_deref());
        }
    }

    Ok(())
}
