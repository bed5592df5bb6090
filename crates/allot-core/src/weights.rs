//! Category weights and the strategies that derive them
//!
//! The allocator only understands normalized weights. Two strategies feed it:
//!
//! - **Priority** - user-supplied scores (0-100 per category)
//! - **Pareto** - weights derived from current spending, trimming the
//!   categories that make up 80% of spend harder than the rest

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{Category, GoalSpec, SpendingProfile};

/// Highest priority score a category can have
pub const MAX_WEIGHT: f64 = 100.0;

/// Score used for categories the user did not rate
pub const DEFAULT_WEIGHT: f64 = 50.0;

/// Share of total spend that defines the high-impact set
const PARETO_SHARE: f64 = 0.8;

/// Required savings rate above which high-impact categories are cut harder
const AGGRESSIVE_SAVINGS_RATE: f64 = 0.3;

const HIGH_IMPACT_FACTOR: f64 = 0.85;
const HIGH_IMPACT_AGGRESSIVE_FACTOR: f64 = 0.75;
const LOW_IMPACT_FACTOR: f64 = 0.95;

/// User priority scores; higher protects a category more strongly from cuts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights")]
pub struct Weights {
    scores: BTreeMap<Category, f64>,
}

#[derive(Deserialize)]
struct RawWeights {
    scores: BTreeMap<Category, f64>,
}

impl TryFrom<RawWeights> for Weights {
    type Error = Error;

    fn try_from(raw: RawWeights) -> Result<Self> {
        Weights::new(raw.scores)
    }
}

impl Weights {
    /// Every category at the default score
    pub fn uniform() -> Self {
        Self {
            scores: Category::ALL
                .into_iter()
                .map(|c| (c, DEFAULT_WEIGHT))
                .collect(),
        }
    }

    /// Build from explicit scores; unrated categories get the default
    pub fn new(scores: BTreeMap<Category, f64>) -> Result<Self> {
        let mut weights = Self::uniform();
        for (category, score) in scores {
            weights.set(category, score)?;
        }
        Ok(weights)
    }

    pub fn set(&mut self, category: Category, score: f64) -> Result<()> {
        if !(0.0..=MAX_WEIGHT).contains(&score) {
            return Err(Error::InvalidInput(format!(
                "Weight for {} must be between 0 and {} (got {})",
                category, MAX_WEIGHT, score
            )));
        }
        self.scores.insert(category, score);
        Ok(())
    }

    pub fn get(&self, category: Category) -> f64 {
        self.scores
            .get(&category)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Divide every score by the total
    pub fn normalize(&self) -> Result<NormalizedWeights> {
        NormalizedWeights::from_raw(self.scores.clone())
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Relative weights summing to 1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedWeights {
    shares: BTreeMap<Category, f64>,
}

impl NormalizedWeights {
    /// Normalize arbitrary non-negative raw weights
    pub fn from_raw(raw: BTreeMap<Category, f64>) -> Result<Self> {
        if raw.values().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidInput(
                "Weights must be non-negative numbers".to_string(),
            ));
        }
        let total: f64 = raw.values().sum();
        if total <= 0.0 {
            return Err(Error::InvalidInput(
                "At least one category needs a positive weight".to_string(),
            ));
        }
        let shares = Category::ALL
            .into_iter()
            .map(|c| (c, raw.get(&c).copied().unwrap_or(0.0) / total))
            .collect();
        Ok(Self { shares })
    }

    pub fn get(&self, category: Category) -> f64 {
        self.shares.get(&category).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.shares.iter().map(|(c, w)| (*c, *w))
    }
}

/// Which weight derivation produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Pareto,
    Priority,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Pareto => "pareto",
            StrategyKind::Priority => "priority",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pareto" => Ok(StrategyKind::Pareto),
            "priority" | "weighted" => Ok(StrategyKind::Priority),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// How weights are derived for an allocation
#[derive(Debug, Clone, PartialEq)]
pub enum WeightStrategy {
    Pareto,
    Priority(Weights),
}

impl WeightStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            WeightStrategy::Pareto => StrategyKind::Pareto,
            WeightStrategy::Priority(_) => StrategyKind::Priority,
        }
    }

    /// Derive normalized weights for a goal and spending profile
    pub fn derive(&self, profile: &SpendingProfile, goal: &GoalSpec) -> Result<DerivedWeights> {
        match self {
            WeightStrategy::Priority(weights) => Ok(DerivedWeights {
                weights: weights.normalize()?,
                high_impact: Vec::new(),
                reduction_factor: None,
            }),
            WeightStrategy::Pareto => {
                let required_rate = goal.required_monthly_savings() / goal.salary();
                pareto_weights(profile, required_rate)
            }
        }
    }
}

/// Output of a weight strategy
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedWeights {
    pub weights: NormalizedWeights,
    /// Categories making up 80% of current spend (Pareto only)
    pub high_impact: Vec<Category>,
    /// Factor applied to high-impact categories (Pareto only)
    pub reduction_factor: Option<f64>,
}

/// Categories, largest first, until their cumulative spend reaches 80%
pub fn high_impact_categories(profile: &SpendingProfile) -> Vec<Category> {
    let total = profile.total();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut ranked: Vec<(Category, f64)> = profile.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut selected = Vec::new();
    let mut cumulative = 0.0;
    for (category, amount) in ranked {
        cumulative += amount;
        selected.push(category);
        if cumulative / total >= PARETO_SHARE {
            break;
        }
    }
    selected
}

/// Pareto weights: current spend scaled by how hard each category is cut
pub fn pareto_weights(
    profile: &SpendingProfile,
    required_savings_rate: f64,
) -> Result<DerivedWeights> {
    let high_impact = high_impact_categories(profile);
    if high_impact.is_empty() {
        // Nothing spent yet; no category stands out
        return Ok(DerivedWeights {
            weights: Weights::uniform().normalize()?,
            high_impact,
            reduction_factor: None,
        });
    }

    let factor = if required_savings_rate < AGGRESSIVE_SAVINGS_RATE {
        HIGH_IMPACT_FACTOR
    } else {
        HIGH_IMPACT_AGGRESSIVE_FACTOR
    };

    let raw = profile
        .iter()
        .map(|(c, amount)| {
            let scale = if high_impact.contains(&c) {
                factor
            } else {
                LOW_IMPACT_FACTOR
            };
            (c, amount * scale)
        })
        .collect();

    Ok(DerivedWeights {
        weights: NormalizedWeights::from_raw(raw)?,
        high_impact,
        reduction_factor: Some(factor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(amounts: &[(Category, f64)]) -> SpendingProfile {
        SpendingProfile::new(amounts.iter().copied().collect()).unwrap()
    }

    #[test]
    fn test_uniform_normalizes_evenly() {
        let normalized = Weights::uniform().normalize().unwrap();
        for (_, share) in normalized.iter() {
            assert!((share - 1.0 / 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_weights_are_relative() {
        let mut low = Weights::uniform();
        let mut high = Weights::uniform();
        for category in Category::ALL {
            low.set(category, 10.0).unwrap();
            high.set(category, 90.0).unwrap();
        }
        assert_eq!(low.normalize().unwrap(), high.normalize().unwrap());
    }

    #[test]
    fn test_weight_range_validation() {
        let mut weights = Weights::uniform();
        assert!(weights.set(Category::Food, 101.0).is_err());
        assert!(weights.set(Category::Food, -1.0).is_err());
        assert!(weights.set(Category::Food, 0.0).is_ok());
    }

    #[test]
    fn test_deserialized_weights_are_validated() {
        let weights: Weights = serde_json::from_str(r#"{"scores":{"food":80.0}}"#).unwrap();
        assert_eq!(weights.get(Category::Food), 80.0);
        assert_eq!(weights.get(Category::Housing), DEFAULT_WEIGHT);
        assert!(serde_json::from_str::<Weights>(r#"{"scores":{"food":150.0}}"#).is_err());
        assert!(serde_json::from_str::<Weights>(r#"{"scores":{"food":-1.0}}"#).is_err());
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let scores = Category::ALL.into_iter().map(|c| (c, 0.0)).collect();
        let weights = Weights::new(scores).unwrap();
        assert!(matches!(weights.normalize(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_high_impact_selection() {
        let profile = profile(&[
            (Category::Housing, 2000.0),
            (Category::Food, 1000.0),
            (Category::Transportation, 600.0),
            (Category::Entertainment, 200.0),
            (Category::Healthcare, 100.0),
            (Category::Other, 100.0),
        ]);
        // 2000/4000 = 50%, +1000 = 75%, +600 = 90%
        assert_eq!(
            high_impact_categories(&profile),
            vec![Category::Housing, Category::Food, Category::Transportation]
        );
    }

    #[test]
    fn test_pareto_factor_depends_on_savings_rate() {
        let profile = profile(&[
            (Category::Housing, 1500.0),
            (Category::Food, 400.0),
            (Category::Other, 100.0),
        ]);

        let gentle = pareto_weights(&profile, 0.1).unwrap();
        assert_eq!(gentle.reduction_factor, Some(0.85));

        let aggressive = pareto_weights(&profile, 0.4).unwrap();
        assert_eq!(aggressive.reduction_factor, Some(0.75));
        assert!(aggressive.weights.get(Category::Housing) < gentle.weights.get(Category::Housing));
    }

    #[test]
    fn test_pareto_on_empty_profile_is_uniform() {
        let profile = profile(&[]);
        let derived = pareto_weights(&profile, 0.1).unwrap();
        assert!(derived.high_impact.is_empty());
        assert_eq!(derived.weights, Weights::uniform().normalize().unwrap());
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!(
            "Pareto".parse::<StrategyKind>().unwrap(),
            StrategyKind::Pareto
        );
        assert_eq!(
            "weighted".parse::<StrategyKind>().unwrap(),
            StrategyKind::Priority
        );
        assert!("random".parse::<StrategyKind>().is_err());
    }
}
