//! Analysis Configuration Module
//!
//! Operator-tunable thresholds loaded from TOML, with built-in defaults that
//! reproduce the plant's established reports.
//!
//! ## Loading Order
//!
//! 1. `PLANT_HEALTH_CONFIG` environment variable (path to TOML file)
//! 2. `plant_health.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is passed explicitly into every stage. There is no global:
//!
//! ```ignore
//! let config = AnalysisConfig::load();
//! let report = pipeline::analyze_press(&dataset, &config)?;
//! ```

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;
