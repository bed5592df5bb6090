//! Integration tests for allot-core
//!
//! These tests exercise the full profile → recommend → refine → undo workflow.

use allot_core::{
    compare, read_observations_csv, BudgetStatus, Category, GoalSpec, KeywordClassifier,
    PlannerConfig, PlanningSession, ProfileBuilder, SpendingProfile, StrategyKind, Warning,
    Weights,
};

fn observations_csv() -> &'static str {
    r#"category,amount,type
Rent,-1600.00,debit
Groceries,-520.40,debit
Dining,-180.00,debit
Gas,-210.00,debit
Streaming,-45.99,debit
Pharmacy,-60.00,debit
Shopping,-330.00,debit
Paycheck,4800.00,credit"#
}

// =============================================================================
// Session Workflow Tests
// =============================================================================

#[test]
fn test_synthetic_profile_workflow() {
    let config = PlannerConfig::default();
    let mut builder = ProfileBuilder::new(
        config.bounds.clone(),
        config.profile.clone(),
        config.rounding_unit,
    );
    let profile = builder.build(6000.0).expect("Failed to build profile");
    let goal = GoalSpec::new(6000.0, 9000.0, 12).expect("Invalid goal");

    let mut session = PlanningSession::new(goal, profile, config);
    let first = session
        .recommend(StrategyKind::Pareto)
        .expect("Failed to recommend");

    // 6000 - 750 required savings, give or take rounding
    assert!((first.allocation.total() - 5250.0).abs() <= 6.0);
    assert!(matches!(first.projection.months_needed, Some(m) if m <= 13));
    assert!(!first.high_impact.is_empty());

    let classifier = KeywordClassifier::new().expect("Failed to build classifier");
    let refined = session
        .refine_feedback("more food and less entertainment", &classifier)
        .expect("Failed to refine");
    assert!(refined.allocation.get(Category::Food) >= first.allocation.get(Category::Food));
    assert!(
        refined.allocation.get(Category::Entertainment)
            <= first.allocation.get(Category::Entertainment)
    );
    assert_eq!(session.history().count(), 2);

    let restored = session.undo().expect("Undo should keep the first plan");
    assert_eq!(restored.allocation, first.allocation);
}

#[test]
fn test_observed_profile_workflow() {
    let observations =
        read_observations_csv(observations_csv().as_bytes()).expect("Failed to parse CSV");
    assert_eq!(observations.len(), 8);

    let profile = SpendingProfile::from_observations(&observations).expect("Invalid profile");
    assert!((profile.get(Category::Food) - 700.40).abs() < 1e-9);
    assert_eq!(profile.get(Category::Transportation), 210.0);

    let goal = GoalSpec::new(4800.0, 3000.0, 6).expect("Invalid goal");
    let mut session = PlanningSession::new(goal, profile.clone(), PlannerConfig::default());

    let mut weights = Weights::uniform();
    weights.set(Category::Healthcare, 90.0).unwrap();
    weights.set(Category::Entertainment, 10.0).unwrap();
    session.set_weights(weights);

    let plan = session
        .recommend(StrategyKind::Priority)
        .expect("Failed to recommend");
    assert!(
        plan.allocation.get(Category::Healthcare) > plan.allocation.get(Category::Entertainment)
    );

    let rows = compare(&profile, &plan.allocation);
    assert_eq!(rows.len(), Category::ALL.len());
    // Rent of 1600 against a 1200 minimum budget
    assert_eq!(rows[0].category, Category::Housing);
    assert_eq!(rows[0].status, BudgetStatus::Danger);
}

#[test]
fn test_refinement_limit_across_feedback() {
    let goal = GoalSpec::new(5000.0, 6000.0, 12).unwrap();
    let profile = SpendingProfile::new(Default::default()).unwrap();
    let mut session = PlanningSession::new(goal, profile, PlannerConfig::default());
    session.recommend(StrategyKind::Priority).unwrap();

    let classifier = KeywordClassifier::new().unwrap();
    for _ in 0..5 {
        session.refine_feedback("less fun", &classifier).unwrap();
    }
    let fifth = session.current().unwrap().clone();

    let sixth = session.refine_feedback("less fun", &classifier).unwrap();
    assert_eq!(sixth.allocation, fifth.allocation);
    assert!(sixth
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::RefinementLimitExceeded { limit: 5 })));
    assert_eq!(session.history().count(), 6);
}

// =============================================================================
// Serialization Tests
// =============================================================================

#[test]
fn test_plan_serializes_to_json() {
    let goal = GoalSpec::new(5000.0, 6000.0, 12)
        .unwrap()
        .with_label("Emergency fund");
    let profile = SpendingProfile::new(Default::default()).unwrap();
    let mut session = PlanningSession::new(goal, profile, PlannerConfig::default());
    let plan = session.recommend(StrategyKind::Priority).unwrap();

    let json = serde_json::to_value(&plan).expect("Failed to serialize plan");
    assert_eq!(json["strategy"], "priority");
    assert_eq!(json["origin"], "recommendation");
    assert!(json["allocation"]["amounts"]["housing"].is_number());
    assert!(json["explanations"]["food"].is_string());
    assert_eq!(json["projection"]["achievable"], true);
    assert!(json["created_at"].is_string());
}
