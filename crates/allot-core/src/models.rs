//! Data models for Allot

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A fixed spending bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Housing,
    Food,
    Transportation,
    Entertainment,
    Healthcare,
    Other,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 6] = [
        Category::Housing,
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Healthcare,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Housing => "housing",
            Category::Food => "food",
            Category::Transportation => "transportation",
            Category::Entertainment => "entertainment",
            Category::Healthcare => "healthcare",
            Category::Other => "other",
        }
    }

    /// Human-readable name (e.g. "Housing")
    pub fn label(&self) -> &'static str {
        match self {
            Category::Housing => "Housing",
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
        }
    }

    /// Alternative words that refer to this category in labels and feedback
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Category::Housing => &["housing", "rent", "mortgage", "home", "utilities"],
            Category::Food => &["food", "groceries", "grocery", "dining", "restaurants", "eating"],
            Category::Transportation => &[
                "transportation",
                "transport",
                "travel",
                "commute",
                "car",
                "gas",
                "fuel",
            ],
            Category::Entertainment => &[
                "entertainment",
                "fun",
                "leisure",
                "streaming",
                "hobbies",
                "going out",
            ],
            Category::Healthcare => &["healthcare", "health", "medical", "pharmacy", "doctor"],
            Category::Other => &["other", "misc", "miscellaneous", "shopping"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.aliases().contains(&needle.as_str()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Realistic spending envelope for one category, as fractions of salary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionBound {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl FractionBound {
    pub const fn new(min_fraction: f64, max_fraction: f64) -> Self {
        Self {
            min_fraction,
            max_fraction,
        }
    }
}

/// Per-category spending envelopes
///
/// Invariants: every category is present, `0 < min < max <= 1` for each one,
/// and the minimums sum to at most 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBounds {
    bounds: BTreeMap<Category, FractionBound>,
}

impl CategoryBounds {
    /// Validate and build bounds from an explicit table
    pub fn new(bounds: BTreeMap<Category, FractionBound>) -> Result<Self> {
        for category in Category::ALL {
            let Some(bound) = bounds.get(&category) else {
                return Err(Error::InvalidInput(format!(
                    "Missing bounds for category {}",
                    category
                )));
            };
            let valid = bound.min_fraction.is_finite()
                && bound.max_fraction.is_finite()
                && bound.min_fraction > 0.0
                && bound.min_fraction < bound.max_fraction
                && bound.max_fraction <= 1.0;
            if !valid {
                return Err(Error::InvalidInput(format!(
                    "Bounds for {} must satisfy 0 < min < max <= 1 (got min={}, max={})",
                    category, bound.min_fraction, bound.max_fraction
                )));
            }
        }

        let min_sum: f64 = bounds.values().map(|b| b.min_fraction).sum();
        if min_sum > 1.0 + 1e-9 {
            return Err(Error::InvalidInput(format!(
                "Category minimums sum to {:.2} of salary; no allocation can exist",
                min_sum
            )));
        }

        Ok(Self { bounds })
    }

    pub fn get(&self, category: Category) -> FractionBound {
        self.bounds[&category]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, FractionBound)> + '_ {
        self.bounds.iter().map(|(c, b)| (*c, *b))
    }

    /// Convert fractions into monthly amounts for a salary
    pub fn amounts(&self, salary: f64) -> BoundAmounts {
        BoundAmounts {
            salary,
            ranges: self
                .bounds
                .iter()
                .map(|(c, b)| {
                    (
                        *c,
                        AmountRange {
                            min: salary * b.min_fraction,
                            max: salary * b.max_fraction,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl Default for CategoryBounds {
    fn default() -> Self {
        let bounds = [
            (Category::Housing, FractionBound::new(0.25, 0.45)),
            (Category::Food, FractionBound::new(0.10, 0.25)),
            (Category::Transportation, FractionBound::new(0.08, 0.20)),
            (Category::Entertainment, FractionBound::new(0.03, 0.20)),
            (Category::Healthcare, FractionBound::new(0.05, 0.15)),
            (Category::Other, FractionBound::new(0.05, 0.20)),
        ];
        Self {
            bounds: bounds.into_iter().collect(),
        }
    }
}

/// Allowed monthly amounts for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Bounds converted to monthly amounts for a given salary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundAmounts {
    salary: f64,
    ranges: BTreeMap<Category, AmountRange>,
}

impl BoundAmounts {
    /// Salary the amounts were computed for
    pub fn salary(&self) -> f64 {
        self.salary
    }

    pub fn get(&self, category: Category) -> AmountRange {
        self.ranges[&category]
    }

    pub fn total_min(&self) -> f64 {
        self.ranges.values().map(|r| r.min).sum()
    }

    pub fn total_max(&self) -> f64 {
        self.ranges.values().map(|r| r.max).sum()
    }
}

/// What the user is saving for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGoalSpec")]
pub struct GoalSpec {
    salary: f64,
    target_amount: f64,
    timeline_months: u32,
    label: Option<String>,
}

impl GoalSpec {
    /// Validate a goal; all values must be positive
    pub fn new(salary: f64, target_amount: f64, timeline_months: u32) -> Result<Self> {
        if !salary.is_finite() || salary <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Salary must be positive (got {})",
                salary
            )));
        }
        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Target amount must be positive (got {})",
                target_amount
            )));
        }
        if timeline_months == 0 {
            return Err(Error::InvalidInput(
                "Timeline must be at least one month".to_string(),
            ));
        }
        Ok(Self {
            salary,
            target_amount,
            timeline_months,
            label: None,
        })
    }

    /// Attach a free-text name for the goal (e.g. "Emergency fund")
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn salary(&self) -> f64 {
        self.salary
    }

    pub fn target_amount(&self) -> f64 {
        self.target_amount
    }

    pub fn timeline_months(&self) -> u32 {
        self.timeline_months
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn required_monthly_savings(&self) -> f64 {
        self.target_amount / self.timeline_months as f64
    }
}

/// Deserialized goal, checked by [`GoalSpec::new`] before use
#[derive(Deserialize)]
struct RawGoalSpec {
    salary: f64,
    target_amount: f64,
    timeline_months: u32,
    #[serde(default)]
    label: Option<String>,
}

impl TryFrom<RawGoalSpec> for GoalSpec {
    type Error = Error;

    fn try_from(raw: RawGoalSpec) -> Result<Self> {
        let goal = GoalSpec::new(raw.salary, raw.target_amount, raw.timeline_months)?;
        Ok(match raw.label {
            Some(label) => goal.with_label(label),
            None => goal,
        })
    }
}

/// Deserialized per-category amounts, shared by profiles and allocations
#[derive(Deserialize)]
struct RawAmounts {
    amounts: BTreeMap<Category, f64>,
}

/// Reject negative or non-finite amounts and fill missing categories with zero
fn complete_amounts(
    amounts: BTreeMap<Category, f64>,
    what: &str,
) -> Result<BTreeMap<Category, f64>> {
    if let Some((category, amount)) = amounts
        .iter()
        .find(|(_, a)| !a.is_finite() || **a < 0.0)
    {
        return Err(Error::InvalidInput(format!(
            "{} for {} must be a non-negative amount (got {})",
            what, category, amount
        )));
    }
    Ok(Category::ALL
        .into_iter()
        .map(|c| (c, amounts.get(&c).copied().unwrap_or(0.0)))
        .collect())
}

/// Current monthly spend per category (read-only baseline)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAmounts")]
pub struct SpendingProfile {
    amounts: BTreeMap<Category, f64>,
}

impl SpendingProfile {
    /// Build a profile from explicit amounts; missing categories count as zero
    pub fn new(amounts: BTreeMap<Category, f64>) -> Result<Self> {
        Ok(Self {
            amounts: complete_amounts(amounts, "Spending")?,
        })
    }

    pub fn get(&self, category: Category) -> f64 {
        self.amounts.get(&category).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.amounts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }
}

impl TryFrom<RawAmounts> for SpendingProfile {
    type Error = Error;

    fn try_from(raw: RawAmounts) -> Result<Self> {
        SpendingProfile::new(raw.amounts)
    }
}

/// Recommended monthly budget per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAmounts")]
pub struct Allocation {
    amounts: BTreeMap<Category, f64>,
}

impl Allocation {
    pub(crate) fn from_amounts(amounts: BTreeMap<Category, f64>) -> Self {
        Self { amounts }
    }

    pub fn get(&self, category: Category) -> f64 {
        self.amounts.get(&category).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.amounts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }
}

impl TryFrom<RawAmounts> for Allocation {
    type Error = Error;

    fn try_from(raw: RawAmounts) -> Result<Self> {
        Ok(Self {
            amounts: complete_amounts(raw.amounts, "Budget")?,
        })
    }
}

/// One human-readable justification per category
pub type Explanations = BTreeMap<Category, String>;

/// Round to the nearest multiple of `unit` (no-op for a non-positive unit)
pub fn round_to_unit(value: f64, unit: f64) -> f64 {
    if unit > 0.0 {
        (value / unit).round() * unit
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!(Category::from_str("Food").unwrap(), Category::Food);
        assert_eq!(Category::from_str(" groceries ").unwrap(), Category::Food);
        assert_eq!(
            Category::from_str("transport").unwrap(),
            Category::Transportation
        );
        assert!(Category::from_str("yachts").is_err());
    }

    #[test]
    fn test_default_bounds_are_valid() {
        let defaults = CategoryBounds::default();
        let table: BTreeMap<_, _> = defaults.iter().collect();
        let validated = CategoryBounds::new(table).unwrap();
        assert_eq!(validated, defaults);

        let amounts = defaults.amounts(3000.0);
        assert!((amounts.total_min() - 1680.0).abs() < 1e-6);
        assert!((amounts.get(Category::Housing).max - 1350.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_reject_inverted_range() {
        let mut table: BTreeMap<_, _> = CategoryBounds::default().iter().collect();
        table.insert(Category::Food, FractionBound::new(0.3, 0.2));
        assert!(matches!(
            CategoryBounds::new(table),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bounds_reject_minimums_over_salary() {
        let table: BTreeMap<_, _> = Category::ALL
            .into_iter()
            .map(|c| (c, FractionBound::new(0.2, 0.5)))
            .collect();
        assert!(CategoryBounds::new(table).is_err());
    }

    #[test]
    fn test_bounds_reject_missing_category() {
        let mut table: BTreeMap<_, _> = CategoryBounds::default().iter().collect();
        table.remove(&Category::Other);
        assert!(CategoryBounds::new(table).is_err());
    }

    #[test]
    fn test_goal_spec_validation() {
        assert!(GoalSpec::new(0.0, 6000.0, 12).is_err());
        assert!(GoalSpec::new(5000.0, -1.0, 12).is_err());
        assert!(GoalSpec::new(5000.0, 6000.0, 0).is_err());
        assert!(GoalSpec::new(f64::NAN, 6000.0, 12).is_err());

        let goal = GoalSpec::new(5000.0, 6000.0, 12)
            .unwrap()
            .with_label("Emergency fund");
        assert_eq!(goal.required_monthly_savings(), 500.0);
        assert_eq!(goal.label(), Some("Emergency fund"));
    }

    #[test]
    fn test_profile_fills_missing_categories() {
        let mut amounts = BTreeMap::new();
        amounts.insert(Category::Food, 400.0);
        let profile = SpendingProfile::new(amounts).unwrap();
        assert_eq!(profile.get(Category::Food), 400.0);
        assert_eq!(profile.get(Category::Housing), 0.0);
        assert_eq!(profile.iter().count(), Category::ALL.len());
    }

    #[test]
    fn test_profile_rejects_negative_spend() {
        let mut amounts = BTreeMap::new();
        amounts.insert(Category::Food, -1.0);
        assert!(SpendingProfile::new(amounts).is_err());
    }

    #[test]
    fn test_deserialized_goal_is_validated() {
        let json = r#"{"salary":5000.0,"target_amount":6000.0,"timeline_months":12,"label":"Car"}"#;
        let goal: GoalSpec = serde_json::from_str(json).unwrap();
        assert_eq!(goal.required_monthly_savings(), 500.0);
        assert_eq!(goal.label(), Some("Car"));

        let zero_salary = r#"{"salary":0.0,"target_amount":6000.0,"timeline_months":12}"#;
        assert!(serde_json::from_str::<GoalSpec>(zero_salary).is_err());
        let zero_months = r#"{"salary":5000.0,"target_amount":6000.0,"timeline_months":0}"#;
        assert!(serde_json::from_str::<GoalSpec>(zero_months).is_err());
    }

    #[test]
    fn test_deserialized_amounts_are_completed_and_validated() {
        let json = r#"{"amounts":{"food":400.0}}"#;
        let profile: SpendingProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.get(Category::Housing), 0.0);
        assert_eq!(profile.iter().count(), Category::ALL.len());
        let negative = r#"{"amounts":{"food":-5.0}}"#;
        assert!(serde_json::from_str::<SpendingProfile>(negative).is_err());

        let json = r#"{"amounts":{"housing":1500.0}}"#;
        let allocation: Allocation = serde_json::from_str(json).unwrap();
        assert_eq!(allocation.iter().count(), Category::ALL.len());
        assert_eq!(allocation.get(Category::Food), 0.0);
        let negative = r#"{"amounts":{"housing":-1.0}}"#;
        assert!(serde_json::from_str::<Allocation>(negative).is_err());
    }

    #[test]
    fn test_round_to_unit() {
        assert_eq!(round_to_unit(549.5, 1.0), 550.0);
        assert_eq!(round_to_unit(549.4, 1.0), 549.0);
        assert!((round_to_unit(12.346, 0.01) - 12.35).abs() < 1e-9);
        assert_eq!(round_to_unit(12.3, 0.0), 12.3);
    }
}
