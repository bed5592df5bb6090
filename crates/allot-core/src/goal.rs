//! Goal evaluation
//!
//! Scores an allocation against a savings goal. Everything here is a pure
//! function of its inputs; the "never reached" case is an explicit `None`
//! rather than an infinite month count.

use serde::Serialize;
use std::fmt;

use crate::models::{Allocation, BoundAmounts, GoalSpec};

/// Where a projection lands relative to the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// The goal is reached within the timeline
    OnTrack,
    /// The goal is reached, but later than planned
    Delayed,
    /// Nothing is saved, so the goal is never reached
    Unreachable,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::OnTrack => "on_track",
            GoalStatus::Delayed => "delayed",
            GoalStatus::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Savings outlook of one allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProjection {
    pub monthly_savings: f64,
    pub savings_rate: f64,
    pub total_by_timeline: f64,
    pub goal_amount: f64,
    pub required_monthly_savings: f64,
    pub achievable: bool,
    /// `None` when nothing is saved each month
    pub months_needed: Option<u32>,
}

impl GoalProjection {
    pub fn status(&self) -> GoalStatus {
        match (self.achievable, self.months_needed) {
            (true, _) => GoalStatus::OnTrack,
            (false, Some(_)) => GoalStatus::Delayed,
            (false, None) => GoalStatus::Unreachable,
        }
    }

    /// Monthly amount missing to stay on schedule (zero when on track)
    pub fn shortfall(&self) -> f64 {
        (self.required_monthly_savings - self.monthly_savings).max(0.0)
    }
}

/// Project savings for an allocation
pub fn evaluate(goal: &GoalSpec, allocation: &Allocation) -> GoalProjection {
    let monthly_savings = goal.salary() - allocation.total();
    let total_by_timeline = monthly_savings * goal.timeline_months() as f64;

    GoalProjection {
        monthly_savings,
        // GoalSpec guarantees a positive salary
        savings_rate: monthly_savings / goal.salary(),
        total_by_timeline,
        goal_amount: goal.target_amount(),
        required_monthly_savings: goal.required_monthly_savings(),
        achievable: monthly_savings > 0.0 && total_by_timeline >= goal.target_amount(),
        months_needed: months_to_reach(goal.target_amount(), monthly_savings),
    }
}

/// Best possible savings with every category at its minimum, and the
/// timeline that would reach the goal at that pace
pub fn extended_timeline(goal: &GoalSpec, bounds: &BoundAmounts) -> (f64, Option<u32>) {
    let max_savings = goal.salary() - bounds.total_min();
    (max_savings, months_to_reach(goal.target_amount(), max_savings))
}

fn months_to_reach(target: f64, monthly_savings: f64) -> Option<u32> {
    if monthly_savings <= 0.0 {
        return None;
    }
    let months = (target / monthly_savings).ceil();
    if months > u32::MAX as f64 {
        None
    } else {
        Some(months as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryBounds};
    use std::collections::BTreeMap;

    fn allocation(total: f64) -> Allocation {
        let mut amounts: BTreeMap<Category, f64> =
            Category::ALL.into_iter().map(|c| (c, 0.0)).collect();
        amounts.insert(Category::Housing, total);
        Allocation::from_amounts(amounts)
    }

    #[test]
    fn test_achievable_goal() {
        let goal = GoalSpec::new(5000.0, 6000.0, 12).unwrap();
        let projection = evaluate(&goal, &allocation(4350.0));

        assert_eq!(projection.monthly_savings, 650.0);
        assert_eq!(projection.required_monthly_savings, 500.0);
        assert_eq!(projection.total_by_timeline, 7800.0);
        assert!(projection.achievable);
        assert_eq!(projection.months_needed, Some(10));
        assert_eq!(projection.status(), GoalStatus::OnTrack);
        assert!((projection.savings_rate - 0.13).abs() < 1e-12);
        assert_eq!(projection.shortfall(), 0.0);
    }

    #[test]
    fn test_delayed_goal() {
        let goal = GoalSpec::new(5000.0, 6000.0, 12).unwrap();
        let projection = evaluate(&goal, &allocation(4700.0));

        assert!(!projection.achievable);
        assert_eq!(projection.months_needed, Some(20));
        assert_eq!(projection.status(), GoalStatus::Delayed);
        assert_eq!(projection.shortfall(), 200.0);
    }

    #[test]
    fn test_no_savings_is_unreachable() {
        let goal = GoalSpec::new(3000.0, 6000.0, 12).unwrap();
        for spend in [3000.0, 3500.0] {
            let projection = evaluate(&goal, &allocation(spend));
            assert!(!projection.achievable);
            assert_eq!(projection.months_needed, None);
            assert_eq!(projection.status(), GoalStatus::Unreachable);
            assert!(projection.savings_rate.is_finite());
        }
    }

    #[test]
    fn test_extended_timeline() {
        let goal = GoalSpec::new(3000.0, 24000.0, 12).unwrap();
        let bounds = CategoryBounds::default().amounts(3000.0);

        // Minimums total 1680, leaving 1320 a month
        let (max_savings, months) = extended_timeline(&goal, &bounds);
        assert!((max_savings - 1320.0).abs() < 1e-6);
        assert_eq!(months, Some(19));
    }
}
