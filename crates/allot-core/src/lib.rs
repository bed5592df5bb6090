//! Allot Core Library
//!
//! Budget allocation engine for savings goals:
//! - Spending profiles (synthetic, or aggregated from observations)
//! - Constrained allocation within per-category envelopes
//! - Weight strategies (Pareto and user priorities)
//! - Goal projection and extended-timeline suggestions
//! - Feedback refinement behind a pluggable intent classifier
//! - Planning sessions with bounded history and last-write-wins requests
//! - Layered TOML configuration

pub mod allocator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod goal;
pub mod models;
pub mod observations;
pub mod profile;
pub mod refine;
pub mod session;
pub mod warnings;
pub mod weights;

pub use allocator::{AllocationOutcome, Allocator, Pin};
pub use classifier::{IntentClassifier, KeywordClassifier};
pub use config::{ConfigSource, PlannerConfig, ProfileConfig};
pub use error::{Error, Result};
pub use goal::{evaluate, extended_timeline, GoalProjection, GoalStatus};
pub use models::{
    Allocation, AmountRange, BoundAmounts, Category, CategoryBounds, Explanations, FractionBound,
    GoalSpec, SpendingProfile,
};
pub use observations::{
    compare, read_observations_csv, summarize, BudgetComparison, BudgetStatus, Observation,
    ObservationKind, ObservationSummary,
};
pub use profile::{ProfileBuilder, RandomSource, SeededRandom};
pub use refine::{refine, Direction, Intents, Refinement};
pub use session::{Plan, PlanOrigin, PlanRequest, PlanningSession};
pub use warnings::{BoundSide, Severity, Warning};
pub use weights::{NormalizedWeights, StrategyKind, WeightStrategy, Weights};
