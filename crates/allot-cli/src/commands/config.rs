//! Config command implementation

use std::path::Path;

use allot_core::{config::default_config_path, ConfigSource, PlannerConfig};
use anyhow::Result;

use super::load_config;

pub fn cmd_config(explicit: Option<&Path>, path_only: bool) -> Result<()> {
    if path_only {
        match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => println!("{}", path.display()),
            None => println!("(no data directory on this platform)"),
        }
        return Ok(());
    }

    let (config, source) = load_config(explicit)?;
    print_config(&config, &source);
    Ok(())
}

fn print_config(config: &PlannerConfig, source: &ConfigSource) {
    println!();
    println!("⚙️  Planner Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    match source {
        ConfigSource::Embedded => println!("   Source: built-in defaults"),
        ConfigSource::File(path) => println!("   Source: {}", path.display()),
    }
    println!();
    println!("   {:<15} {:>6} {:>6}", "Category", "Min", "Max");
    for (category, bound) in config.bounds.iter() {
        println!(
            "   {:<15} {:>5.0}% {:>5.0}%",
            category.label(),
            bound.min_fraction * 100.0,
            bound.max_fraction * 100.0
        );
    }
    println!();
    println!("   Rounding unit:     {}", config.rounding_unit);
    println!(
        "   Refinement:        {:.0}% step, {} per session",
        config.refinement_step * 100.0,
        config.max_refinements
    );
    println!("   History:           {} plans", config.history_limit);
    println!(
        "   Low savings below: {:.0}%",
        config.low_savings_rate * 100.0
    );
    println!(
        "   Profile:           seed {}, ±{:.0}% variation, {:.0}-{:.0}% of salary spent",
        config.profile.seed,
        config.profile.perturbation * 100.0,
        config.profile.spend_ratio_min * 100.0,
        config.profile.spend_ratio_max * 100.0
    );
    println!();
}
