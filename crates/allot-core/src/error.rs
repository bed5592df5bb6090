//! Error types for Allot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Infeasible budget: category minimums need ${required:.0}/month but only ${available:.0}/month is available"
    )]
    Infeasible {
        /// Sum of the per-category minimum amounts
        required: f64,
        /// Spend that was requested (or the salary, when even that is too small)
        available: f64,
        /// Timeline in months that would make the goal reachable, if any
        suggested_months: Option<u32>,
    },

    #[error("Refinement limit exceeded: at most {limit} refinements per planning session")]
    RefinementLimitExceeded { limit: u32 },

    #[error("No plan has been recommended yet")]
    NoPlan,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
