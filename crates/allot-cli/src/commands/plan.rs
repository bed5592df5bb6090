//! Plan command implementation

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use allot_core::{
    compare, read_observations_csv, summarize, BudgetComparison, BudgetStatus, Category,
    GoalSpec, KeywordClassifier, ObservationSummary, Plan, PlannerConfig, PlanningSession,
    Severity, SpendingProfile, StrategyKind, Weights,
};
use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use super::{build_profile, money};

/// Inputs of one `allot plan` run
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub salary: f64,
    pub target: f64,
    pub months: u32,
    pub strategy: StrategyKind,
    pub weights: Weights,
    pub feedback: Vec<String>,
    pub transactions: Option<PathBuf>,
    pub seed: Option<u64>,
    pub label: Option<String>,
}

/// Everything produced by one run
#[derive(Debug)]
pub struct PlanReport {
    pub goal: GoalSpec,
    pub profile: SpendingProfile,
    /// Observed income and expenses when a transactions file was given
    pub observed: Option<ObservationSummary>,
    /// Initial recommendation followed by one plan per feedback
    pub plans: Vec<Plan>,
    pub comparison: Vec<BudgetComparison>,
}

pub fn parse_strategy(value: &str) -> Result<StrategyKind> {
    value
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}. Available: pareto, priority", e))
}

/// Parse `category=score` pairs into weights
pub fn parse_weights(pairs: &[String]) -> Result<Weights> {
    let mut scores = BTreeMap::new();
    for pair in pairs {
        let (name, score) = pair
            .split_once('=')
            .with_context(|| format!("Invalid weight '{}': expected category=score", pair))?;
        let category: Category = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let score: f64 = score
            .trim()
            .parse()
            .with_context(|| format!("Invalid score for {}: {}", category, score))?;
        scores.insert(category, score);
    }
    Weights::new(scores).context("Invalid weights")
}

/// Build the session, recommend, and apply each feedback in turn
pub fn run_plan(config: &PlannerConfig, options: &PlanOptions) -> Result<PlanReport> {
    let mut goal = GoalSpec::new(options.salary, options.target, options.months)
        .context("Invalid goal")?;
    if let Some(label) = &options.label {
        goal = goal.with_label(label.clone());
    }

    let (profile, observed) = match &options.transactions {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let observations = read_observations_csv(file)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            info!(
                "Loaded {} observations from {}",
                observations.len(),
                path.display()
            );
            let profile = SpendingProfile::from_observations(&observations)?;
            (profile, Some(summarize(&observations)))
        }
        None => (build_profile(config, options.salary, options.seed)?, None),
    };

    let mut session = PlanningSession::new(goal.clone(), profile.clone(), config.clone());
    session.set_weights(options.weights.clone());

    let mut plans = vec![session
        .recommend(options.strategy)
        .context("Failed to recommend a plan")?];

    if !options.feedback.is_empty() {
        let classifier = KeywordClassifier::new()?;
        for feedback in &options.feedback {
            let plan = session
                .refine_feedback(feedback, &classifier)
                .with_context(|| format!("Failed to apply feedback '{}'", feedback))?;
            plans.push(plan);
        }
    }

    let comparison = match session.current() {
        Some(plan) => compare(&profile, &plan.allocation),
        None => Vec::new(),
    };

    Ok(PlanReport {
        goal,
        profile,
        observed,
        plans,
        comparison,
    })
}

pub fn cmd_plan(config: &PlannerConfig, options: &PlanOptions, json: bool) -> Result<()> {
    let report = run_plan(config, options)?;

    if json {
        let value = json!({
            "goal": report.goal,
            "profile": report.profile,
            "observed": report.observed,
            "plans": report.plans,
            "comparison": report.comparison,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_report(&report, options);
    Ok(())
}

fn print_report(report: &PlanReport, options: &PlanOptions) {
    let goal = &report.goal;

    println!();
    println!("🎯 {}", goal.label().unwrap_or("Savings Goal"));
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Save {} in {} months ({}/month from {}/month)",
        money(goal.target_amount()),
        goal.timeline_months(),
        money(goal.required_monthly_savings()),
        money(goal.salary())
    );
    if let Some(observed) = &report.observed {
        print!(
            "   Observed: {} income, {} expenses",
            money(observed.income),
            money(observed.expenses)
        );
        match observed.savings_rate {
            Some(rate) => println!(" ({:.1}% saved)", rate * 100.0),
            None => println!(),
        }
    }

    for (index, plan) in report.plans.iter().enumerate() {
        println!();
        if index == 0 {
            println!("📋 Recommended plan ({})", plan.strategy);
        } else {
            println!(
                "🔁 Refinement {}: \"{}\"",
                index,
                options.feedback[index - 1]
            );
        }
        println!("   {}", plan.message);
        println!();
        println!(
            "   {:<15} {:>9} {:>9}  {:>6}",
            "Category", "Current", "Budget", "Change"
        );
        for (category, budget) in plan.allocation.iter() {
            let current = report.profile.get(category);
            let change = if current > 0.0 {
                format!("{:+.0}%", (budget - current) / current * 100.0)
            } else {
                "new".to_string()
            };
            let marker = if plan.high_impact.contains(&category) { "*" } else { " " };
            println!(
                "  {}{:<15} {:>9} {:>9}  {:>6}",
                marker,
                category.label(),
                money(current),
                money(budget),
                change
            );
        }

        let projection = &plan.projection;
        println!();
        println!(
            "   Monthly savings: {} ({:.1}% of income)",
            money(projection.monthly_savings),
            projection.savings_rate * 100.0
        );
        match projection.months_needed {
            Some(months) if projection.achievable => {
                println!("   ✅ Goal reached in {} months", months)
            }
            Some(months) => println!(
                "   ⚠️  Goal reached in {} months ({} planned)",
                months,
                goal.timeline_months()
            ),
            None => println!("   ❌ Goal not reachable: nothing is saved each month"),
        }

        let mut warnings: Vec<_> = plan
            .warnings
            .iter()
            .filter(|w| w.severity() > Severity::Info)
            .collect();
        warnings.sort_by_key(|w| std::cmp::Reverse(w.severity()));
        for warning in warnings {
            println!("   ⚠️  {}", warning);
        }
    }

    if let Some(plan) = report.plans.last() {
        println!();
        println!("💬 Why these budgets");
        for (category, text) in &plan.explanations {
            println!("   {:<15} {}", category.label(), text);
        }
    }

    let attention: Vec<_> = report
        .comparison
        .iter()
        .filter(|row| row.status != BudgetStatus::Good)
        .collect();
    if !attention.is_empty() {
        println!();
        println!("🚦 Over budget today");
        for row in attention {
            let icon = match row.status {
                BudgetStatus::Danger => "🔴",
                _ => "🟡",
            };
            println!(
                "   {} {:<15} {} now vs {} planned",
                icon,
                row.category.label(),
                money(row.current),
                money(row.recommended)
            );
        }
    }
    println!();
}
