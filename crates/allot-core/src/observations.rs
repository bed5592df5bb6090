//! Spending observations and budget comparison
//!
//! Observations are individual debits and credits, typically read from a CSV
//! export. They aggregate into a [`SpendingProfile`], replacing the synthetic
//! profile when real history is available.

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Allocation, Category, SpendingProfile};

/// Spend-to-budget ratio above which a category needs attention
const WARNING_RATIO: f64 = 1.1;

/// Spend-to-budget ratio above which a category is over budget
const DANGER_RATIO: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Debit,
    Credit,
}

impl ObservationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationKind::Debit => "debit",
            ObservationKind::Credit => "credit",
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObservationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "expense" | "withdrawal" | "sale" => Ok(ObservationKind::Debit),
            "credit" | "income" | "deposit" | "refund" => Ok(ObservationKind::Credit),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// A single money movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub category: Category,
    pub amount: f64,
    pub kind: ObservationKind,
}

impl Observation {
    /// Debit with a free-text category label; unknown labels count as Other
    pub fn debit(label: &str, amount: f64) -> Self {
        Self {
            category: label.parse().unwrap_or(Category::Other),
            amount,
            kind: ObservationKind::Debit,
        }
    }

    pub fn credit(amount: f64) -> Self {
        Self {
            category: Category::Other,
            amount,
            kind: ObservationKind::Credit,
        }
    }
}

impl SpendingProfile {
    /// Sum debits per category (credits are ignored, signs are dropped)
    pub fn from_observations(observations: &[Observation]) -> Result<Self> {
        let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
        for observation in observations
            .iter()
            .filter(|o| o.kind == ObservationKind::Debit)
        {
            *totals.entry(observation.category).or_insert(0.0) += observation.amount.abs();
        }
        SpendingProfile::new(totals)
    }
}

/// Read observations from CSV with a `category,amount[,type]` header
///
/// Rows without a type are debits. Amounts may carry `$`, thousands
/// separators, or accounting parentheses.
pub fn read_observations_csv<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let category_col = column("category")
        .ok_or_else(|| Error::Import("Missing category column".into()))?;
    let amount_col = column("amount")
        .ok_or_else(|| Error::Import("Missing amount column".into()))?;
    let type_col = column("type");

    let mut observations = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;

        let label = record.get(category_col).unwrap_or("");
        let amount_str = record
            .get(amount_col)
            .ok_or_else(|| Error::Import(format!("Missing amount on line {}", line)))?;
        let amount = parse_amount(amount_str)
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;

        let kind_field = type_col
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty());
        let kind = match kind_field {
            Some(value) => value
                .parse()
                .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?,
            None => ObservationKind::Debit,
        };

        observations.push(Observation {
            category: label.parse().unwrap_or(Category::Other),
            amount,
            kind,
        });
    }

    debug!("Parsed {} observations", observations.len());
    Ok(observations)
}

fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(format!("Unable to parse amount: {}", s)),
    }
}

/// Income, expenses and savings rate over a set of observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSummary {
    pub income: f64,
    pub expenses: f64,
    /// `None` when there is no income
    pub savings_rate: Option<f64>,
}

pub fn summarize(observations: &[Observation]) -> ObservationSummary {
    let total = |kind: ObservationKind| -> f64 {
        observations
            .iter()
            .filter(|o| o.kind == kind)
            .map(|o| o.amount.abs())
            .sum()
    };
    let income = total(ObservationKind::Credit);
    let expenses = total(ObservationKind::Debit);
    ObservationSummary {
        income,
        expenses,
        savings_rate: (income > 0.0).then(|| (income - expenses) / income),
    }
}

/// How current spend compares to the recommended budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Good,
    Warning,
    Danger,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Good => "good",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Danger => "danger",
        }
    }

    fn from_ratio(ratio: Option<f64>) -> Self {
        match ratio {
            None => BudgetStatus::Danger,
            Some(r) if r > DANGER_RATIO => BudgetStatus::Danger,
            Some(r) if r > WARNING_RATIO => BudgetStatus::Warning,
            Some(_) => BudgetStatus::Good,
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetComparison {
    pub category: Category,
    pub current: f64,
    pub recommended: f64,
    /// `current / recommended`; `None` when spending against a zero budget
    pub ratio: Option<f64>,
    pub status: BudgetStatus,
}

/// Compare current spend to a plan, largest current spend first
pub fn compare(profile: &SpendingProfile, allocation: &Allocation) -> Vec<BudgetComparison> {
    let mut rows: Vec<BudgetComparison> = Category::ALL
        .into_iter()
        .map(|category| {
            let current = profile.get(category);
            let recommended = allocation.get(category);
            let ratio = if recommended > 0.0 {
                Some(current / recommended)
            } else if current > 0.0 {
                None
            } else {
                Some(0.0)
            };
            BudgetComparison {
                category,
                current,
                recommended,
                ratio,
                status: BudgetStatus::from_ratio(ratio),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.current
            .partial_cmp(&a.current)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}
