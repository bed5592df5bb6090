//! Allot CLI - Goal-driven budget planner
//!
//! Usage:
//!   allot profile --salary 5000                          Synthetic spending profile
//!   allot plan --salary 5000 --target 6000 --months 12   Recommend a budget
//!   allot classify "more food, less fun"                 Inspect feedback intents
//!   allot config                                         Show active configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Profile { salary, seed, json } => {
            let (config, _) = commands::load_config(config_path)?;
            commands::cmd_profile(&config, salary, seed, json)
        }
        Commands::Plan {
            salary,
            target,
            months,
            strategy,
            weights,
            feedback,
            transactions,
            seed,
            label,
            json,
        } => {
            let (config, _) = commands::load_config(config_path)?;
            let options = commands::PlanOptions {
                salary,
                target,
                months,
                strategy: commands::parse_strategy(&strategy)?,
                weights: commands::parse_weights(&weights)?,
                feedback,
                transactions,
                seed,
                label,
            };
            commands::cmd_plan(&config, &options, json)
        }
        Commands::Classify { text } => commands::cmd_classify(&text),
        Commands::Config { path } => commands::cmd_config(config_path, path),
    }
}
