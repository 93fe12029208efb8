// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Specter Router CLI
//!
//! The `specter` binary is the operator tool for a signal router node.
//!
//! ## Commands
//!
//! - `specter config show|validate|generate` - Configuration management
//! - `specter pattern check|explain` - Try patterns against signal fields
//! - `specter route` - Offline routing dry-run against a subscriptions file

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use specter_cli::commands::{self, ConfigCommand, PatternCommand, RouteArgs};
use specter_cli::logging;
use specter_core::domain::node_config::RouterConfigManifest;

/// Specter Router - content-based signal routing
#[derive(Parser)]
#[command(name = "specter")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SPECTER_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); falls back to the manifest
    #[arg(long, global = true, env = "SPECTER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Pattern tools
    #[command(name = "pattern")]
    Pattern {
        #[command(subcommand)]
        command: PatternCommand,
    },

    /// Route one signal against a subscriptions file
    #[command(name = "route")]
    Route(RouteArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands report load errors themselves; here the manifest only tunes logging
    let manifest = RouterConfigManifest::load_or_default(cli.config.clone()).ok();
    logging::init(&logging::resolve(cli.log_level.as_deref(), manifest.as_ref()))?;

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Pattern { command }) => commands::pattern::handle_command(command).await,
        Some(Commands::Route(args)) => commands::route::handle_command(args, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}
