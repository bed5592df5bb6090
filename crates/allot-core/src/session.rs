//! Planning sessions
//!
//! A session owns the inputs of one planning conversation (goal, spending
//! profile, priority weights) and a bounded history of plans. Plans are never
//! modified once recorded; refinement and re-recommendation append new ones.
//!
//! ## Request flow
//!
//! Hosts that re-plan in the background (e.g. on every slider change) use
//! [`PlanningSession::prepare`] to snapshot the current inputs, compute the
//! plan with [`PlanningSession::execute`], and hand it back through
//! [`PlanningSession::commit`]. Only the most recently prepared request is
//! accepted; results of superseded requests are discarded.
//! [`PlanningSession::recommend`] does all three in one call.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::allocator::Allocator;
use crate::classifier::IntentClassifier;
use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::goal::{evaluate, extended_timeline, GoalProjection};
use crate::models::{Allocation, Category, Explanations, GoalSpec, SpendingProfile};
use crate::refine::{refine, Intents};
use crate::warnings::Warning;
use crate::weights::{StrategyKind, WeightStrategy, Weights};

/// Where a plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    Recommendation,
    Refinement,
}

/// One entry of a session's history
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: u64,
    pub origin: PlanOrigin,
    pub strategy: StrategyKind,
    pub allocation: Allocation,
    pub explanations: Explanations,
    pub projection: GoalProjection,
    pub warnings: Vec<Warning>,
    /// One-line summary for display
    pub message: String,
    /// Categories making up 80% of current spend (Pareto plans)
    pub high_impact: Vec<Category>,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of session inputs for one recommendation
#[derive(Debug, Clone)]
pub struct PlanRequest {
    ticket: u64,
    goal: GoalSpec,
    strategy: WeightStrategy,
}

impl PlanRequest {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn goal(&self) -> &GoalSpec {
        &self.goal
    }

    pub fn strategy(&self) -> &WeightStrategy {
        &self.strategy
    }
}

pub struct PlanningSession {
    goal: GoalSpec,
    profile: SpendingProfile,
    weights: Weights,
    config: PlannerConfig,
    allocator: Allocator,
    history: VecDeque<Plan>,
    refinements: u32,
    next_id: u64,
    latest_ticket: Option<u64>,
}

impl PlanningSession {
    pub fn new(goal: GoalSpec, profile: SpendingProfile, config: PlannerConfig) -> Self {
        Self {
            allocator: Allocator::new(config.rounding_unit),
            goal,
            profile,
            weights: Weights::uniform(),
            config,
            history: VecDeque::new(),
            refinements: 0,
            next_id: 1,
            latest_ticket: None,
        }
    }

    pub fn goal(&self) -> &GoalSpec {
        &self.goal
    }

    pub fn profile(&self) -> &SpendingProfile {
        &self.profile
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Replace the goal used by subsequent requests
    ///
    /// Requests prepared before the change can no longer be committed.
    pub fn set_goal(&mut self, goal: GoalSpec) {
        self.goal = goal;
        self.supersede_pending();
    }

    /// Replace the priority weights used by subsequent requests
    ///
    /// Requests prepared before the change can no longer be committed.
    pub fn set_weights(&mut self, weights: Weights) {
        self.weights = weights;
        self.supersede_pending();
    }

    /// Latest plan, if any
    pub fn current(&self) -> Option<&Plan> {
        self.history.back()
    }

    /// Retained plans, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Plan> {
        self.history.iter()
    }

    pub fn refinements_used(&self) -> u32 {
        self.refinements
    }

    pub fn refinements_remaining(&self) -> u32 {
        self.config.max_refinements.saturating_sub(self.refinements)
    }

    /// Snapshot the current goal and weights into a request
    ///
    /// Preparing a request supersedes every earlier one.
    pub fn prepare(&mut self, kind: StrategyKind) -> PlanRequest {
        let ticket = self.take_id();
        self.latest_ticket = Some(ticket);
        let strategy = match kind {
            StrategyKind::Pareto => WeightStrategy::Pareto,
            StrategyKind::Priority => WeightStrategy::Priority(self.weights.clone()),
        };
        PlanRequest {
            ticket,
            goal: self.goal.clone(),
            strategy,
        }
    }

    /// Compute the plan for a request without recording it
    pub fn execute(&self, request: &PlanRequest) -> Result<Plan> {
        let goal = &request.goal;
        let bounds = self.config.bounds.amounts(goal.salary());
        let mut warnings = Vec::new();

        let mut target = goal.salary() - goal.required_monthly_savings();
        if target < bounds.total_min() {
            let (max_savings, suggested_months) = extended_timeline(goal, &bounds);
            warnings.push(Warning::GoalInfeasible {
                required: goal.required_monthly_savings(),
                max_savings,
                suggested_months,
            });
            target = bounds.total_min();
        } else if target > bounds.total_max() {
            target = bounds.total_max();
        }

        let derived = request.strategy.derive(&self.profile, goal)?;
        let outcome = self
            .allocator
            .allocate(&self.profile, &derived.weights, target, &bounds)?;
        let projection = evaluate(goal, &outcome.allocation);

        warnings.extend(outcome.warnings);
        warnings.extend(self.projection_warnings(&projection));

        let message = match request.strategy.kind() {
            StrategyKind::Pareto if !derived.high_impact.is_empty() => format!(
                "Focus on your top {} spending categories ({}), which make up 80% of spending.",
                derived.high_impact.len(),
                derived
                    .high_impact
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            StrategyKind::Pareto => "No spending recorded yet; budget split evenly.".to_string(),
            StrategyKind::Priority => {
                "Created a personalized budget based on your priorities.".to_string()
            }
        };

        Ok(Plan {
            id: request.ticket,
            origin: PlanOrigin::Recommendation,
            strategy: request.strategy.kind(),
            allocation: outcome.allocation,
            explanations: outcome.explanations,
            projection,
            warnings,
            message,
            high_impact: derived.high_impact,
            created_at: Utc::now(),
        })
    }

    /// Record the plan for a request; returns false if the request was superseded
    pub fn commit(&mut self, request: &PlanRequest, plan: Plan) -> bool {
        if self.latest_ticket != Some(request.ticket) {
            debug!(
                ticket = request.ticket,
                latest = ?self.latest_ticket,
                "Discarding superseded plan"
            );
            return false;
        }
        self.push(plan);
        true
    }

    /// Recommend a fresh plan from the current inputs
    pub fn recommend(&mut self, kind: StrategyKind) -> Result<Plan> {
        let request = self.prepare(kind);
        let plan = self.execute(&request)?;
        self.commit(&request, plan.clone());
        Ok(plan)
    }

    /// Apply intents to the current plan
    ///
    /// Once the session's refinements are used up, the current plan is
    /// returned unchanged with a [`Warning::RefinementLimitExceeded`] attached
    /// and nothing is recorded. Either way, a recommendation still in flight
    /// is superseded.
    pub fn refine(&mut self, intents: &Intents) -> Result<Plan> {
        let prior = self.history.back().cloned().ok_or(Error::NoPlan)?;
        self.supersede_pending();

        match self.check_refinement_budget() {
            Ok(()) => {}
            Err(Error::RefinementLimitExceeded { limit }) => {
                warn!(limit, "Refinement limit reached; keeping current plan");
                let mut unchanged = prior;
                unchanged
                    .warnings
                    .push(Warning::RefinementLimitExceeded { limit });
                return Ok(unchanged);
            }
            Err(e) => return Err(e),
        }

        let bounds = self.config.bounds.amounts(self.goal.salary());
        let refinement = refine(
            &prior.allocation,
            intents,
            &bounds,
            self.config.refinement_step,
            self.config.rounding_unit,
        );
        self.refinements += 1;

        let projection = evaluate(&self.goal, &refinement.allocation);
        let mut warnings = refinement.warnings;
        warnings.extend(self.projection_warnings(&projection));

        let plan = Plan {
            id: self.take_id(),
            origin: PlanOrigin::Refinement,
            strategy: prior.strategy,
            allocation: refinement.allocation,
            explanations: refinement.explanations,
            projection,
            warnings,
            message: format!(
                "Adjusted plan based on your preferences. {} {} modified.",
                intents.len(),
                if intents.len() == 1 { "category" } else { "categories" }
            ),
            high_impact: prior.high_impact,
            created_at: Utc::now(),
        };
        self.push(plan.clone());
        Ok(plan)
    }

    /// Classify free-text feedback and refine with the result
    pub fn refine_feedback(
        &mut self,
        feedback: &str,
        classifier: &dyn IntentClassifier,
    ) -> Result<Plan> {
        let intents = classifier.classify(feedback);
        debug!(feedback, intents = intents.len(), "Classified feedback");
        self.refine(&intents)
    }

    /// Drop the latest plan, keeping at least one; returns the new current plan
    pub fn undo(&mut self) -> Option<&Plan> {
        if self.history.len() <= 1 {
            return None;
        }
        self.history.pop_back();
        self.history.back()
    }

    /// Start over: clear history and the refinement count
    pub fn reset(&mut self) {
        self.history.clear();
        self.refinements = 0;
        self.latest_ticket = None;
    }

    fn supersede_pending(&mut self) {
        if let Some(ticket) = self.latest_ticket.take() {
            debug!(ticket, "Superseded pending request");
        }
    }

    fn check_refinement_budget(&self) -> Result<()> {
        if self.refinements >= self.config.max_refinements {
            return Err(Error::RefinementLimitExceeded {
                limit: self.config.max_refinements,
            });
        }
        Ok(())
    }

    fn projection_warnings(&self, projection: &GoalProjection) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if !projection.achievable {
            warnings.push(Warning::Shortfall {
                required: projection.required_monthly_savings,
                achieved: projection.monthly_savings,
            });
        }
        if projection.savings_rate < self.config.low_savings_rate {
            warnings.push(Warning::LowSavingsRate {
                rate: projection.savings_rate,
                threshold: self.config.low_savings_rate,
            });
        }
        warnings
    }

    fn push(&mut self, plan: Plan) {
        info!(
            id = plan.id,
            strategy = %plan.strategy,
            savings = plan.projection.monthly_savings,
            "Recorded plan"
        );
        self.history.push_back(plan);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::refine::Direction;

    fn session() -> PlanningSession {
        let goal = GoalSpec::new(5000.0, 6000.0, 12).unwrap();
        let profile = SpendingProfile::new(
            [
                (Category::Housing, 1700.0),
                (Category::Food, 800.0),
                (Category::Transportation, 600.0),
                (Category::Entertainment, 500.0),
                (Category::Healthcare, 400.0),
                (Category::Other, 700.0),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();
        PlanningSession::new(goal, profile, PlannerConfig::default())
    }

    fn more_food() -> Intents {
        [(Category::Food, Direction::Increase)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_recommend_meets_goal() {
        let mut session = session();
        let plan = session.recommend(StrategyKind::Priority).unwrap();

        // Target spend is 5000 - 500
        assert!((plan.allocation.total() - 4500.0).abs() <= 6.0);
        assert!(plan.projection.achievable);
        assert_eq!(plan.origin, PlanOrigin::Recommendation);
        assert_eq!(session.current().unwrap().id, plan.id);
    }

    #[test]
    fn test_pareto_lists_high_impact() {
        let mut session = session();
        let plan = session.recommend(StrategyKind::Pareto).unwrap();
        assert_eq!(
            plan.high_impact,
            vec![
                Category::Housing,
                Category::Food,
                Category::Other,
                Category::Transportation
            ]
        );
        assert!(plan.message.contains("top 4"));
    }

    #[test]
    fn test_infeasible_goal_warns_with_timeline() {
        let goal = GoalSpec::new(3000.0, 24000.0, 12).unwrap();
        let profile = SpendingProfile::new(Default::default()).unwrap();
        let mut session = PlanningSession::new(goal, profile, PlannerConfig::default());

        let plan = session.recommend(StrategyKind::Priority).unwrap();
        assert!((plan.allocation.total() - 1680.0).abs() <= 6.0);
        assert!(plan.warnings.iter().any(|w| matches!(
            w,
            Warning::GoalInfeasible {
                suggested_months: Some(19),
                ..
            }
        )));
        assert!(plan
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::Shortfall { .. })));
    }

    #[test]
    fn test_refine_without_plan() {
        let mut session = session();
        assert!(matches!(session.refine(&more_food()), Err(Error::NoPlan)));
    }

    #[test]
    fn test_refine_raises_food() {
        let mut session = session();
        let first = session.recommend(StrategyKind::Priority).unwrap();
        let refined = session.refine(&more_food()).unwrap();

        assert!(refined.allocation.get(Category::Food) >= first.allocation.get(Category::Food));
        assert_eq!(refined.origin, PlanOrigin::Refinement);
        assert_eq!(session.refinements_used(), 1);
        assert_eq!(session.refinements_remaining(), 4);
        assert!(refined.id > first.id);
    }

    #[test]
    fn test_sixth_refinement_returns_fifth_plan() {
        let mut session = session();
        session.recommend(StrategyKind::Priority).unwrap();

        let mut fifth = None;
        for _ in 0..5 {
            fifth = Some(session.refine(&more_food()).unwrap());
        }
        let fifth = fifth.unwrap();

        let sixth = session.refine(&more_food()).unwrap();
        assert_eq!(sixth.id, fifth.id);
        assert_eq!(sixth.allocation, fifth.allocation);
        assert!(sixth
            .warnings
            .contains(&Warning::RefinementLimitExceeded { limit: 5 }));
        assert_eq!(session.current().unwrap().id, fifth.id);
        assert_eq!(session.refinements_remaining(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut session = session();
        for _ in 0..8 {
            session.recommend(StrategyKind::Priority).unwrap();
        }
        assert_eq!(session.history().count(), 6);
        assert_eq!(session.history().next().unwrap().id, 3);
    }

    #[test]
    fn test_undo_keeps_first_plan() {
        let mut session = session();
        let first = session.recommend(StrategyKind::Priority).unwrap();
        session.refine(&more_food()).unwrap();

        assert_eq!(session.undo().unwrap().id, first.id);
        assert!(session.undo().is_none());
        assert_eq!(session.current().unwrap().id, first.id);
    }

    #[test]
    fn test_superseded_request_is_discarded() {
        let mut session = session();
        let stale = session.prepare(StrategyKind::Priority);

        let mut weights = Weights::uniform();
        weights.set(Category::Food, 100.0).unwrap();
        session.set_weights(weights);
        let fresh = session.prepare(StrategyKind::Priority);

        let fresh_plan = session.execute(&fresh).unwrap();
        let stale_plan = session.execute(&stale).unwrap();
        assert!(session.commit(&fresh, fresh_plan.clone()));
        assert!(!session.commit(&stale, stale_plan));

        assert_eq!(session.history().count(), 1);
        assert_eq!(session.current().unwrap().allocation, fresh_plan.allocation);
    }

    #[test]
    fn test_refine_supersedes_pending_recommendation() {
        let mut session = session();
        session.recommend(StrategyKind::Priority).unwrap();
        let pending = session.prepare(StrategyKind::Priority);

        let refined = session.refine(&more_food()).unwrap();
        let late_plan = session.execute(&pending).unwrap();

        assert!(!session.commit(&pending, late_plan));
        assert_eq!(session.current().unwrap().id, refined.id);
        assert_eq!(session.current().unwrap().origin, PlanOrigin::Refinement);
    }

    #[test]
    fn test_changed_inputs_supersede_pending_request() {
        let mut session = session();
        let before_weights = session.prepare(StrategyKind::Priority);
        session.set_weights(Weights::uniform());
        let plan = session.execute(&before_weights).unwrap();
        assert!(!session.commit(&before_weights, plan));

        let before_goal = session.prepare(StrategyKind::Pareto);
        session.set_goal(GoalSpec::new(5000.0, 3000.0, 12).unwrap());
        let plan = session.execute(&before_goal).unwrap();
        assert!(!session.commit(&before_goal, plan));
        assert!(session.current().is_none());

        let fresh = session.prepare(StrategyKind::Pareto);
        let plan = session.execute(&fresh).unwrap();
        assert!(session.commit(&fresh, plan));
    }

    #[test]
    fn test_refine_feedback_uses_classifier() {
        let mut session = session();
        let first = session.recommend(StrategyKind::Priority).unwrap();
        let classifier = KeywordClassifier::new().unwrap();

        let refined = session
            .refine_feedback("less entertainment please", &classifier)
            .unwrap();
        assert!(
            refined.allocation.get(Category::Entertainment)
                < first.allocation.get(Category::Entertainment)
        );
        assert!(refined.message.contains("1 category modified"));
    }

    #[test]
    fn test_reset_clears_refinements() {
        let mut session = session();
        session.recommend(StrategyKind::Priority).unwrap();
        session.refine(&more_food()).unwrap();
        session.reset();

        assert!(session.current().is_none());
        assert_eq!(session.refinements_used(), 0);
    }
}
