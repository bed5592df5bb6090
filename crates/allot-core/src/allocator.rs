//! Constrained allocator
//!
//! Splits a target monthly spend across categories in proportion to their
//! normalized weights while keeping every category inside its envelope.
//!
//! ## Algorithm
//!
//! 1. Ideal share per category: `target * weight`
//! 2. Clamp out-of-range categories on the side the free level has to move
//!    toward: if clamping releases more than it consumes only the categories
//!    above their maximum are pinned, otherwise only those below their minimum.
//! 3. The budget released (or consumed) by pinning is redistributed across
//!    free categories by their weight, then free categories are re-clamped.
//!    Step 3 runs at most [`MAX_REDISTRIBUTION_PASSES`] times.
//! 4. The free categories then absorb what is left in one closed-form step:
//!    the common level at which their clamped weighted shares add up to the
//!    remaining budget is read off the sorted breakpoints. Anything they
//!    cannot take (a category with no weight stays at its minimum) is absorbed
//!    by headroom.
//! 5. Values are rounded to the minor unit only at the very end.
//!
//! Pinning one side at a time keeps every pin valid for the final level, so
//! the result is the exact proportional solution and a category's allocation
//! never falls when its weight rises.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{
    round_to_unit, Allocation, BoundAmounts, Category, Explanations, SpendingProfile,
};
use crate::warnings::{BoundSide, Warning};
use crate::weights::NormalizedWeights;

/// Redistribution passes before the remaining residual is absorbed directly
pub const MAX_REDISTRIBUTION_PASSES: usize = 2;

/// Differences below this are treated as zero during allocation
const EPSILON: f64 = 1e-6;

/// Where a category ended up relative to its envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pin {
    Free,
    Min,
    Max,
}

/// Result of one allocation
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub allocation: Allocation,
    pub explanations: Explanations,
    pub pins: BTreeMap<Category, Pin>,
    pub warnings: Vec<Warning>,
    /// Redistribution passes that ran (never more than the maximum)
    pub passes: usize,
}

/// Two-pass constrained proportional allocator
#[derive(Debug, Clone)]
pub struct Allocator {
    rounding_unit: f64,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Allocator {
    pub fn new(rounding_unit: f64) -> Self {
        Self { rounding_unit }
    }

    /// Allocate `target_total_spend` across categories
    ///
    /// Fails with [`Error::Infeasible`] when the category minimums exceed the
    /// salary or the requested total.
    pub fn allocate(
        &self,
        profile: &SpendingProfile,
        weights: &NormalizedWeights,
        target_total_spend: f64,
        bounds: &BoundAmounts,
    ) -> Result<AllocationOutcome> {
        if !target_total_spend.is_finite() || target_total_spend < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Target spend must be a non-negative amount (got {})",
                target_total_spend
            )));
        }

        let total_min = bounds.total_min();
        if total_min > bounds.salary() + EPSILON {
            return Err(Error::Infeasible {
                required: total_min,
                available: bounds.salary(),
                suggested_months: None,
            });
        }
        if target_total_spend + EPSILON < total_min {
            return Err(Error::Infeasible {
                required: total_min,
                available: target_total_spend,
                suggested_months: None,
            });
        }

        let mut values: BTreeMap<Category, f64> = Category::ALL
            .into_iter()
            .map(|c| (c, target_total_spend * weights.get(c)))
            .collect();
        let mut pinned: BTreeMap<Category, bool> =
            Category::ALL.into_iter().map(|c| (c, false)).collect();

        let mut delta = clamp_free(&mut values, &mut pinned, bounds);
        let mut passes = 0;

        while delta.abs() > EPSILON && passes < MAX_REDISTRIBUTION_PASSES {
            let free: Vec<Category> = pinned
                .iter()
                .filter(|(_, is_pinned)| !**is_pinned)
                .map(|(c, _)| *c)
                .collect();
            if free.is_empty() {
                break;
            }

            let free_weight: f64 = free.iter().map(|c| weights.get(*c)).sum();
            for category in &free {
                let share = if free_weight > 0.0 {
                    weights.get(*category) / free_weight
                } else {
                    1.0 / free.len() as f64
                };
                if let Some(value) = values.get_mut(category) {
                    *value += delta * share;
                }
            }

            passes += 1;
            delta = clamp_free(&mut values, &mut pinned, bounds);
            debug!(pass = passes, delta, "Redistributed across free categories");
        }

        let free: Vec<Category> = pinned
            .iter()
            .filter(|(_, is_pinned)| !**is_pinned)
            .map(|(c, _)| *c)
            .collect();
        let free_weight: f64 = free.iter().map(|c| weights.get(*c)).sum();

        let unabsorbed = if free_weight > 0.0 {
            let remaining = target_total_spend
                - pinned
                    .iter()
                    .filter(|(_, is_pinned)| **is_pinned)
                    .map(|(c, _)| values[c])
                    .sum::<f64>();
            let leftover = fill_to_level(&mut values, &free, weights, bounds, remaining);
            // Free categories without weight sit at their minimum; they take what is left
            absorb_residual(&mut values, bounds, leftover, &Category::ALL)
        } else {
            for category in &free {
                if let Some(value) = values.get_mut(category) {
                    *value = bounds.get(*category).clamp(*value);
                }
            }
            let residual = target_total_spend - values.values().sum::<f64>();
            let leftover = absorb_residual(&mut values, bounds, residual, &free);
            absorb_residual(&mut values, bounds, leftover, &Category::ALL)
        };

        let amounts: BTreeMap<Category, f64> = values
            .iter()
            .map(|(c, v)| (*c, round_to_unit(*v, self.rounding_unit)))
            .collect();
        let allocation = Allocation::from_amounts(amounts);

        let mut warnings = Vec::new();
        let mut pins = BTreeMap::new();
        let mut explanations = Explanations::new();

        for category in Category::ALL {
            let range = bounds.get(category);
            let value = values[&category];
            let pin = if (value - range.min).abs() <= EPSILON {
                Pin::Min
            } else if (value - range.max).abs() <= EPSILON {
                Pin::Max
            } else {
                Pin::Free
            };

            match pin {
                Pin::Min => warnings.push(Warning::BoundClamped {
                    category,
                    side: BoundSide::Min,
                    limit: range.min,
                }),
                Pin::Max => warnings.push(Warning::BoundClamped {
                    category,
                    side: BoundSide::Max,
                    limit: range.max,
                }),
                Pin::Free => {}
            }

            explanations.insert(
                category,
                describe_change(
                    profile.get(category),
                    allocation.get(category),
                    bounds.salary(),
                    pin,
                    range.min,
                    range.max,
                ),
            );
            pins.insert(category, pin);
        }

        let tolerance = self.rounding_unit.max(EPSILON) * Category::ALL.len() as f64;
        if unabsorbed.abs() > EPSILON {
            warn!(
                target_spend = target_total_spend,
                unabsorbed,
                "Target spend is outside the combined category envelopes"
            );
        }
        if (allocation.total() - target_total_spend).abs() > tolerance {
            warnings.push(Warning::DriftedTotal {
                expected: target_total_spend,
                actual: allocation.total(),
            });
        }

        debug!(
            target_spend = target_total_spend,
            total = allocation.total(),
            passes,
            "Allocation complete"
        );

        Ok(AllocationOutcome {
            allocation,
            explanations,
            pins,
            warnings,
            passes,
        })
    }
}

/// Pin the free categories that are out of range on the dominant side
///
/// The side is chosen by comparing the budget released by categories above
/// their maximum with the budget consumed by categories below their minimum:
/// the free level rises when more is released, so only maximum pins hold,
/// and falls otherwise, so only minimum pins hold. Both sides are pinned when
/// the two balance. Returns the budget released by the new pins (negative
/// when they consume budget).
fn clamp_free(
    values: &mut BTreeMap<Category, f64>,
    pinned: &mut BTreeMap<Category, bool>,
    bounds: &BoundAmounts,
) -> f64 {
    let mut excess = 0.0;
    let mut shortfall = 0.0;
    for (category, value) in values.iter() {
        if pinned[category] {
            continue;
        }
        let range = bounds.get(*category);
        if *value > range.max + EPSILON {
            excess += *value - range.max;
        } else if *value < range.min - EPSILON {
            shortfall += range.min - *value;
        }
    }

    let pin_max = excess + EPSILON >= shortfall;
    let pin_min = shortfall + EPSILON >= excess;

    let mut released = 0.0;
    for (category, value) in values.iter_mut() {
        if pinned[category] {
            continue;
        }
        let range = bounds.get(*category);
        let above = *value > range.max + EPSILON;
        let below = *value < range.min - EPSILON;
        if (above && pin_max) || (below && pin_min) {
            let clamped = range.clamp(*value);
            released += *value - clamped;
            *value = clamped;
            pinned.insert(*category, true);
        }
    }
    released
}

/// Set the free categories to `clamp(level * weight)` at the level where they
/// add up to `remaining`
///
/// The clamped sum is piecewise linear in the level with breakpoints at
/// `min / weight` and `max / weight`, so the level is interpolated inside the
/// first segment that reaches `remaining`. Returns the part that could not be
/// placed (non-zero only when `remaining` lies outside the free envelopes).
fn fill_to_level(
    values: &mut BTreeMap<Category, f64>,
    free: &[Category],
    weights: &NormalizedWeights,
    bounds: &BoundAmounts,
    remaining: f64,
) -> f64 {
    let filled_at = |level: f64| -> f64 {
        free.iter()
            .map(|c| bounds.get(*c).clamp(level * weights.get(*c)))
            .sum()
    };

    let mut breakpoints: Vec<f64> = free
        .iter()
        .filter(|c| weights.get(**c) > 0.0)
        .flat_map(|c| {
            let range = bounds.get(*c);
            let weight = weights.get(*c);
            [range.min / weight, range.max / weight]
        })
        .collect();
    breakpoints.sort_by(|a, b| a.total_cmp(b));

    let mut level = 0.0;
    let mut filled = filled_at(level);
    if remaining > filled {
        for breakpoint in breakpoints {
            let next = filled_at(breakpoint);
            if next >= remaining {
                level = if next > filled {
                    level + (remaining - filled) * (breakpoint - level) / (next - filled)
                } else {
                    breakpoint
                };
                break;
            }
            level = breakpoint;
            filled = next;
        }
    }

    for category in free {
        if let Some(value) = values.get_mut(category) {
            *value = bounds.get(*category).clamp(level * weights.get(*category));
        }
    }
    let placed: f64 = free.iter().map(|c| values[c]).sum();
    debug!(level, placed, remaining, "Filled free categories to level");
    remaining - placed
}

/// Spread a residual over `among` in proportion to their room in its direction
///
/// Returns the part that could not be absorbed.
fn absorb_residual(
    values: &mut BTreeMap<Category, f64>,
    bounds: &BoundAmounts,
    residual: f64,
    among: &[Category],
) -> f64 {
    if residual.abs() <= EPSILON {
        return residual;
    }

    let room: BTreeMap<Category, f64> = among
        .iter()
        .map(|c| {
            let range = bounds.get(*c);
            let value = values[c];
            let available = if residual > 0.0 {
                range.max - value
            } else {
                value - range.min
            };
            (*c, available.max(0.0))
        })
        .collect();
    let capacity: f64 = room.values().sum();
    if capacity <= EPSILON {
        return residual;
    }

    let applied = residual.signum() * residual.abs().min(capacity);
    for (category, available) in &room {
        if let Some(value) = values.get_mut(category) {
            *value += applied * available / capacity;
        }
    }
    residual - applied
}

fn describe_change(
    current: f64,
    allocated: f64,
    salary: f64,
    pin: Pin,
    min: f64,
    max: f64,
) -> String {
    let share = allocated / salary * 100.0;
    let mut text = if current > 0.0 && (allocated - current).abs() >= 0.5 {
        let change = (allocated - current) / current * 100.0;
        let direction = if change < 0.0 { "reduced" } else { "increased" };
        format!(
            "Budget {} by {:.0}% to ${:.0} ({:.1}% of income).",
            direction,
            change.abs(),
            allocated,
            share
        )
    } else if current > 0.0 {
        format!(
            "Budget held at ${:.0} ({:.1}% of income).",
            allocated, share
        )
    } else {
        format!("Budget set to ${:.0} ({:.1}% of income).", allocated, share)
    };

    match pin {
        Pin::Min => text.push_str(&format!(
            " Already at minimum safe level (${:.0}/month).",
            min
        )),
        Pin::Max => text.push_str(&format!(
            " Capped at the recommended maximum (${:.0}/month).",
            max
        )),
        Pin::Free => {}
    }
    text
}
