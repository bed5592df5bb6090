//! Spending profile builder
//!
//! Produces a realistic starting point for planning when no transaction
//! history is available: each category starts at the middle of its envelope,
//! gets a random perturbation, and the whole profile is rescaled so that only
//! a few percent of salary is currently being saved.
//!
//! Randomness comes from an injected [`RandomSource`], so tests and repeated
//! runs with the same seed see the same profile.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ProfileConfig;
use crate::error::{Error, Result};
use crate::models::{round_to_unit, Category, CategoryBounds, SpendingProfile};

/// Source of uniformly distributed numbers in `[0, 1)`
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Deterministic PRNG (xorshift64) for reproducible profiles
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        // 53 high bits give every representable step in [0, 1)
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Builds synthetic spending profiles from a salary
pub struct ProfileBuilder {
    bounds: CategoryBounds,
    settings: ProfileConfig,
    rounding_unit: f64,
    random: Box<dyn RandomSource>,
}

impl ProfileBuilder {
    /// Create a builder seeded from the profile settings
    pub fn new(bounds: CategoryBounds, settings: ProfileConfig, rounding_unit: f64) -> Self {
        let random = Box::new(SeededRandom::new(settings.seed));
        Self {
            bounds,
            settings,
            rounding_unit,
            random,
        }
    }

    /// Replace the random source (e.g. a fixed sequence in tests)
    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Build a profile for a monthly salary
    pub fn build(&mut self, salary: f64) -> Result<SpendingProfile> {
        if !salary.is_finite() || salary <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Salary must be positive (got {})",
                salary
            )));
        }

        let mut raw = BTreeMap::new();
        for category in Category::ALL {
            let bound = self.bounds.get(category);
            let baseline = salary * (bound.min_fraction + bound.max_fraction) / 2.0;
            let factor = 1.0 + self.settings.perturbation * (2.0 * self.random.next_f64() - 1.0);
            raw.insert(category, baseline * factor);
        }

        let raw_total: f64 = raw.values().sum();
        let spread = self.settings.spend_ratio_max - self.settings.spend_ratio_min;
        let spend_ratio = self.settings.spend_ratio_min + self.random.next_f64() * spread;
        let scale = salary * spend_ratio / raw_total;

        debug!(salary, spend_ratio, "Built synthetic spending profile");

        let amounts = raw
            .into_iter()
            .map(|(c, amount)| (c, round_to_unit(amount * scale, self.rounding_unit)))
            .collect();
        SpendingProfile::new(amounts)
    }
}
