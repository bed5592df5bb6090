//! Non-fatal warnings accumulated alongside plans
//!
//! Warnings are returned with every allocation and refinement result and are
//! never raised as errors. Presentation layers can sort them by severity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Category;

/// Which side of a category's envelope was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundSide {
    Min,
    Max,
}

impl BoundSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundSide::Min => "minimum",
            BoundSide::Max => "maximum",
        }
    }
}

/// Severity level of a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Worth attention but not urgent
    Attention,
    /// The goal is at risk
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Attention => "attention",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A category could not move as far as requested because it hit a bound
    BoundClamped {
        category: Category,
        side: BoundSide,
        limit: f64,
    },
    /// Total spend ended up away from the intended total
    DriftedTotal { expected: f64, actual: f64 },
    /// Savings rate is below the configured comfort threshold
    LowSavingsRate { rate: f64, threshold: f64 },
    /// The plan saves less per month than the goal requires
    Shortfall { required: f64, achieved: f64 },
    /// Even the category minimums leave too little to reach the goal in time
    GoalInfeasible {
        required: f64,
        max_savings: f64,
        suggested_months: Option<u32>,
    },
    /// The session's refinement attempts are used up
    RefinementLimitExceeded { limit: u32 },
}

impl Warning {
    pub fn severity(&self) -> Severity {
        match self {
            Warning::BoundClamped { .. } | Warning::DriftedTotal { .. } => Severity::Info,
            Warning::LowSavingsRate { .. } | Warning::RefinementLimitExceeded { .. } => {
                Severity::Attention
            }
            Warning::Shortfall { .. } | Warning::GoalInfeasible { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::BoundClamped {
                category,
                side,
                limit,
            } => write!(
                f,
                "{}: at the {} safe level (${:.0}/month)",
                category,
                side.as_str(),
                limit
            ),
            Warning::DriftedTotal { expected, actual } => write!(
                f,
                "Total spend is ${:.0}/month instead of ${:.0}/month",
                actual, expected
            ),
            Warning::LowSavingsRate { rate, threshold } => write!(
                f,
                "Savings rate is {:.1}% (below {:.0}%). Consider cutting discretionary spending further.",
                rate * 100.0,
                threshold * 100.0
            ),
            Warning::Shortfall { required, achieved } => write!(
                f,
                "Plan saves ${:.0}/month but the goal requires ${:.0}/month. Shortfall: ${:.0}/month.",
                achieved,
                required,
                required - achieved
            ),
            Warning::GoalInfeasible {
                required,
                max_savings,
                suggested_months,
            } => {
                write!(
                    f,
                    "Goal requires ${:.0}/month but maximum feasible savings is ${:.0}/month.",
                    required, max_savings
                )?;
                match suggested_months {
                    Some(months) => write!(
                        f,
                        " Consider extending the timeline to {} months.",
                        months
                    ),
                    None => write!(f, " No timeline can reach it at this salary."),
                }
            }
            Warning::RefinementLimitExceeded { limit } => write!(
                f,
                "Too many refinements requested (limit {}). The current plan is kept.",
                limit
            ),
        }
    }
}
