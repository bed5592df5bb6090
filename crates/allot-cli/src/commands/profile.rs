//! Profile command implementation

use allot_core::{PlannerConfig, ProfileBuilder, ProfileConfig, SpendingProfile};
use anyhow::{Context, Result};

use super::{bar, money};

/// Build a synthetic profile, with an optional seed override
pub fn build_profile(
    config: &PlannerConfig,
    salary: f64,
    seed: Option<u64>,
) -> Result<SpendingProfile> {
    let settings = ProfileConfig {
        seed: seed.unwrap_or(config.profile.seed),
        ..config.profile.clone()
    };
    let mut builder = ProfileBuilder::new(config.bounds.clone(), settings, config.rounding_unit);
    builder
        .build(salary)
        .context("Failed to build spending profile")
}

pub fn cmd_profile(
    config: &PlannerConfig,
    salary: f64,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let profile = build_profile(config, salary, seed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    print_profile(&profile, salary);
    Ok(())
}

pub fn print_profile(profile: &SpendingProfile, salary: f64) {
    let total = profile.total();
    let largest = profile.iter().map(|(_, a)| a).fold(0.0, f64::max);

    println!();
    println!("📊 Current Spending");
    println!("   ─────────────────────────────────────────────────────────────");
    for (category, amount) in profile.iter() {
        println!(
            "   {:<15} {:>9}  {}  {:>5.1}%",
            category.label(),
            money(amount),
            bar(amount, largest, 20),
            amount / salary * 100.0
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:<15} {:>9}", "Total", money(total));
    println!(
        "   {:<15} {:>9}  ({:.1}% of income)",
        "Saving",
        money(salary - total),
        (salary - total) / salary * 100.0
    );
    println!();
}
