//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Allot - Plan a monthly budget that reaches your savings goal
#[derive(Parser)]
#[command(name = "allot")]
#[command(about = "Goal-driven budget allocation planner", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Planner config file
    ///
    /// Overrides ~/.local/share/allot/config/planner.toml and the built-in
    /// defaults. Only the keys present in the file are changed.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a synthetic spending profile for a salary
    Profile {
        /// Monthly take-home salary
        #[arg(short, long)]
        salary: f64,

        /// Random seed (defaults to the configured seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recommend a budget for a savings goal, optionally refining it
    Plan {
        /// Monthly take-home salary
        #[arg(short, long)]
        salary: f64,

        /// Amount to save
        #[arg(short, long)]
        target: f64,

        /// Months to reach the target
        #[arg(short, long)]
        months: u32,

        /// Weight strategy: pareto, priority
        #[arg(long, default_value = "pareto")]
        strategy: String,

        /// Category priority as category=score (0-100), repeatable
        #[arg(short, long = "weight", value_name = "CATEGORY=SCORE")]
        weights: Vec<String>,

        /// Feedback to refine the plan with, applied in order (repeatable)
        #[arg(short, long)]
        feedback: Vec<String>,

        /// CSV of observed spending (category,amount[,type]) instead of a synthetic profile
        #[arg(long)]
        transactions: Option<PathBuf>,

        /// Random seed for the synthetic profile
        #[arg(long)]
        seed: Option<u64>,

        /// Name of the goal (e.g. "Emergency fund")
        #[arg(long)]
        label: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which category intents a piece of feedback contains
    Classify {
        /// Feedback text (e.g. "more food, less entertainment")
        text: String,
    },

    /// Show the active planner configuration
    Config {
        /// Only print the override file location
        #[arg(long)]
        path: bool,
    },
}
