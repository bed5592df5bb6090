//! Feedback refiner
//!
//! Applies directional intents ("more food", "less entertainment") to an
//! existing allocation. Each intent moves its category by a fixed step of its
//! current value; the net change is then balanced evenly across the
//! categories the user did not mention.
//!
//! When a balancing category is already at a bound, the share it cannot
//! take is dropped rather than passed on, so total spend may drift slightly.
//! The drop is reported as [`Refinement::dropped`] and as a warning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::models::{round_to_unit, Allocation, BoundAmounts, Category, Explanations};
use crate::warnings::{BoundSide, Warning};

/// Default fraction of a category's current value moved by one intent
pub const DEFAULT_STEP: f64 = 0.15;

const EPSILON: f64 = 1e-6;

/// Requested direction for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
        }
    }

    fn sign(&self) -> f64 {
        match self {
            Direction::Increase => 1.0,
            Direction::Decrease => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "increase" | "up" | "+" => Ok(Direction::Increase),
            "decrease" | "down" | "-" => Ok(Direction::Decrease),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// Category intents extracted from feedback
pub type Intents = BTreeMap<Category, Direction>;

/// Result of one refinement step
#[derive(Debug, Clone)]
pub struct Refinement {
    pub allocation: Allocation,
    pub explanations: Explanations,
    pub warnings: Vec<Warning>,
    /// Sum of the changes actually applied to intent categories
    pub net_delta: f64,
    /// Part of the balancing change no category could absorb
    pub dropped: f64,
}

/// Apply intents to a prior allocation
///
/// `prior` is left untouched; a new allocation is returned.
pub fn refine(
    prior: &Allocation,
    intents: &Intents,
    bounds: &BoundAmounts,
    step: f64,
    rounding_unit: f64,
) -> Refinement {
    let mut values: BTreeMap<Category, f64> = Category::ALL
        .into_iter()
        .map(|c| (c, prior.get(c)))
        .collect();
    let mut warnings = Vec::new();
    let mut explanations = Explanations::new();
    let mut net_delta = 0.0;

    for (category, direction) in intents {
        let current = values[category];
        let range = bounds.get(*category);
        let requested = direction.sign() * step * current;
        let updated = range.clamp(current + requested);
        let applied = updated - current;
        net_delta += applied;

        let hit_bound = (applied - requested).abs() > EPSILON;
        if hit_bound {
            let (side, limit) = match direction {
                Direction::Increase => (BoundSide::Max, range.max),
                Direction::Decrease => (BoundSide::Min, range.min),
            };
            warnings.push(Warning::BoundClamped {
                category: *category,
                side,
                limit,
            });
        }

        explanations.insert(
            *category,
            describe_intent(
                *direction,
                current,
                applied,
                updated,
                hit_bound,
                bounds.salary(),
            ),
        );
        values.insert(*category, updated);
    }

    let balancing: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|c| !intents.contains_key(c))
        .collect();

    let mut dropped = 0.0;
    if balancing.is_empty() {
        dropped = -net_delta;
    } else {
        let share = -net_delta / balancing.len() as f64;
        for category in &balancing {
            let current = values[category];
            let updated = bounds.get(*category).clamp(current + share);
            let absorbed = updated - current;
            dropped += share - absorbed;

            let text = if absorbed.abs() >= 0.5 {
                let verb = if absorbed > 0.0 { "Raised" } else { "Lowered" };
                format!(
                    "{} by ${:.0} to ${:.0} to balance your changes.",
                    verb,
                    absorbed.abs(),
                    updated
                )
            } else {
                format!("Unchanged at ${:.0}.", updated)
            };
            explanations.insert(*category, text);
            values.insert(*category, updated);
        }
    }

    let amounts = values
        .into_iter()
        .map(|(c, v)| (c, round_to_unit(v, rounding_unit)))
        .collect();
    let allocation = Allocation::from_amounts(amounts);

    let tolerance = rounding_unit.max(EPSILON) * Category::ALL.len() as f64;
    if dropped.abs() > tolerance {
        warnings.push(Warning::DriftedTotal {
            expected: prior.total(),
            actual: allocation.total(),
        });
    }

    debug!(
        intents = intents.len(),
        net_delta,
        dropped,
        "Refined allocation"
    );

    Refinement {
        allocation,
        explanations,
        warnings,
        net_delta,
        dropped,
    }
}

fn describe_intent(
    direction: Direction,
    current: f64,
    applied: f64,
    updated: f64,
    hit_bound: bool,
    salary: f64,
) -> String {
    let verb = match direction {
        Direction::Increase => "Increased",
        Direction::Decrease => "Reduced",
    };
    let level = match direction {
        Direction::Increase => "maximum",
        Direction::Decrease => "minimum",
    };

    if applied.abs() < EPSILON {
        return format!(
            "Already at the {} safe level (${:.0}/month); left unchanged.",
            level, updated
        );
    }

    let percent = if current > 0.0 {
        applied.abs() / current * 100.0
    } else {
        0.0
    };
    let mut text = format!(
        "{} by {:.0}% to ${:.0} at your request ({:.1}% of income).",
        verb,
        percent,
        updated,
        updated / salary * 100.0
    );
    if hit_bound {
        text.push_str(&format!(" Stopped at the {} safe level.", level));
    }
    text
}
