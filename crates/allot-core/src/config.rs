//! Planner configuration
//!
//! Holds the category envelopes and the tunables of the allocation engine
//! (refinement step and limit, history size, profile generator settings).
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a three-layer resolution:
//! 1. An explicit path (e.g. `allot --config my.toml`)
//! 2. Override in data dir (~/.local/share/allot/config/planner.toml)
//! 3. Fall back to embedded defaults (compiled into binary)
//!
//! Override files only need the keys they change; everything else keeps the
//! embedded default.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Category, CategoryBounds, FractionBound};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/planner.toml");

/// Settings for the synthetic spending profile generator
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    /// Seed for the default random source
    pub seed: u64,
    /// Maximum relative perturbation of each category baseline
    pub perturbation: f64,
    /// Lower end of the spend-to-salary ratio
    pub spend_ratio_min: f64,
    /// Upper end of the spend-to-salary ratio
    pub spend_ratio_max: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            perturbation: 0.20,
            spend_ratio_min: 0.92,
            spend_ratio_max: 0.97,
        }
    }
}

/// Full planner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Per-category spending envelopes
    pub bounds: CategoryBounds,
    /// Minor currency unit budgets are rounded to
    pub rounding_unit: f64,
    /// Fraction applied by one "increase"/"decrease" intent
    pub refinement_step: f64,
    /// Refinements allowed per planning session
    pub max_refinements: u32,
    /// Plans kept in a session's history
    pub history_limit: usize,
    /// Savings rate below which a warning is emitted
    pub low_savings_rate: f64,
    /// Synthetic profile settings
    pub profile: ProfileConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            bounds: CategoryBounds::default(),
            rounding_unit: 1.0,
            refinement_step: 0.15,
            max_refinements: 5,
            history_limit: 6,
            low_savings_rate: 0.10,
            profile: ProfileConfig::default(),
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Compiled-in defaults
    Embedded,
    /// An override file on disk
    File(PathBuf),
}

impl PlannerConfig {
    /// Load configuration using the standard resolution order
    pub fn load(explicit_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::from_file(path)?, ConfigSource::File(path.to_path_buf())));
        }

        if let Some(default_path) = default_config_path() {
            if default_path.exists() {
                let config = Self::from_file(&default_path)?;
                return Ok((config, ConfigSource::File(default_path)));
            }
        }

        Ok((parse_config(DEFAULT_CONFIG)?, ConfigSource::Embedded))
    }

    /// Load an override file (missing keys keep the defaults)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
        debug!(path = %path.display(), "Loaded planner config override");
        parse_config(&content)
    }

    /// Parse configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("allot").join("config").join("planner.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    allocation: Option<RawAllocation>,
    refinement: Option<RawRefinement>,
    session: Option<RawSession>,
    profile: Option<RawProfile>,
    bounds: Option<HashMap<String, RawBound>>,
}

#[derive(Debug, Deserialize)]
struct RawAllocation {
    rounding_unit: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRefinement {
    step: Option<f64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSession {
    history_limit: Option<usize>,
    low_savings_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    seed: Option<u64>,
    perturbation: Option<f64>,
    spend_ratio_min: Option<f64>,
    spend_ratio_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawBound {
    min: Option<f64>,
    max: Option<f64>,
}

fn parse_config(content: &str) -> Result<PlannerConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = PlannerConfig::default();

    if let Some(allocation) = raw.allocation {
        if let Some(unit) = allocation.rounding_unit {
            config.rounding_unit = unit;
        }
    }

    if let Some(refinement) = raw.refinement {
        if let Some(step) = refinement.step {
            config.refinement_step = step;
        }
        if let Some(max_attempts) = refinement.max_attempts {
            config.max_refinements = max_attempts;
        }
    }

    if let Some(session) = raw.session {
        if let Some(limit) = session.history_limit {
            config.history_limit = limit;
        }
        if let Some(rate) = session.low_savings_rate {
            config.low_savings_rate = rate;
        }
    }

    if let Some(profile) = raw.profile {
        if let Some(seed) = profile.seed {
            config.profile.seed = seed;
        }
        if let Some(perturbation) = profile.perturbation {
            config.profile.perturbation = perturbation;
        }
        if let Some(ratio) = profile.spend_ratio_min {
            config.profile.spend_ratio_min = ratio;
        }
        if let Some(ratio) = profile.spend_ratio_max {
            config.profile.spend_ratio_max = ratio;
        }
    }

    if let Some(bounds) = raw.bounds {
        let mut table: BTreeMap<Category, FractionBound> = config.bounds.iter().collect();
        for (name, bound) in bounds {
            let category: Category = name.parse().map_err(Error::Config)?;
            let entry = table
                .get_mut(&category)
                .ok_or_else(|| Error::Config(format!("Unknown category: {}", name)))?;
            if let Some(min) = bound.min {
                entry.min_fraction = min;
            }
            if let Some(max) = bound.max {
                entry.max_fraction = max;
            }
        }
        config.bounds = CategoryBounds::new(table)
            .map_err(|e| Error::Config(e.to_string()))?;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &PlannerConfig) -> Result<()> {
    if config.rounding_unit.is_nan() || config.rounding_unit < 0.0 {
        return Err(Error::Config("rounding_unit must be >= 0".into()));
    }
    if !(config.refinement_step > 0.0 && config.refinement_step < 1.0) {
        return Err(Error::Config(
            "refinement step must be between 0 and 1".into(),
        ));
    }
    if config.max_refinements == 0 {
        return Err(Error::Config("max_attempts must be at least 1".into()));
    }
    if config.history_limit == 0 {
        return Err(Error::Config("history_limit must be at least 1".into()));
    }
    if !(0.0..1.0).contains(&config.low_savings_rate) {
        return Err(Error::Config("low_savings_rate must be in [0, 1)".into()));
    }
    let profile = &config.profile;
    if !(0.0..1.0).contains(&profile.perturbation) {
        return Err(Error::Config("perturbation must be in [0, 1)".into()));
    }
    let ratios_ok = profile.spend_ratio_min > 0.0
        && profile.spend_ratio_min <= profile.spend_ratio_max
        && profile.spend_ratio_max <= 1.0;
    if !ratios_ok {
        return Err(Error::Config(
            "spend ratios must satisfy 0 < min <= max <= 1".into(),
        ));
    }
    Ok(())
}
