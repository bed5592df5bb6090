//! Shared utilities for command implementations
//!
//! This module contains:
//! - `load_config` - Resolve and load the planner configuration
//! - `money` - Format a monthly amount for display
//! - `bar` - Render a proportional text bar

use std::path::Path;

use allot_core::{ConfigSource, PlannerConfig};
use anyhow::{Context, Result};
use tracing::debug;

/// Load the planner config: explicit path, then data-dir override, then defaults
pub fn load_config(explicit: Option<&Path>) -> Result<(PlannerConfig, ConfigSource)> {
    let (config, source) =
        PlannerConfig::load(explicit).context("Failed to load planner config")?;
    match &source {
        ConfigSource::Embedded => debug!("Using built-in planner config"),
        ConfigSource::File(path) => debug!(path = %path.display(), "Using planner config file"),
    }
    Ok((config, source))
}

/// Format a monthly amount, e.g. `$1,250`
pub fn money(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Text bar of `width` cells filled in proportion to `value / max`
pub fn bar(value: f64, max: f64, width: usize) -> String {
    let filled = if max > 0.0 {
        ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
