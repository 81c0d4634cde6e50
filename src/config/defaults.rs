//! Fixed scoring constants.
//!
//! Weights and breakpoints are part of the report contract: downstream
//! comparisons depend on them, so they are not exposed in the TOML config.
//! Tunable thresholds live in `AnalysisConfig`.

// ============================================================================
// Press composite (four 25-point shares)
// ============================================================================

/// Cycle-time share of the press composite.
pub const PRESS_CYCLE_WEIGHT: f64 = 25.0;
/// Anomaly-rate share of the press composite.
pub const PRESS_ANOMALY_WEIGHT: f64 = 25.0;
/// Efficiency share of the press composite.
pub const PRESS_EFFICIENCY_WEIGHT: f64 = 25.0;
/// Quality share of the press composite.
pub const PRESS_QUALITY_WEIGHT: f64 = 25.0;

/// Target cycle time (ms).
pub const CYCLE_TARGET_MS: f64 = 1500.0;

/// Hard cycle-time ceiling used by the anomaly-rate score (ms).
pub const CYCLE_CEILING_MS: f64 = 2000.0;

/// Press composite bands: EXCELLENT / GOOD / MEDIUM, else POOR.
pub const PRESS_BANDS: [f64; 3] = [85.0, 70.0, 50.0];

/// Press quality bands: EXCELLENT / GOOD / MEDIUM, else LOW.
pub const QUALITY_BANDS: [f64; 3] = [95.0, 90.0, 85.0];

/// Efficiency below this is critical (%).
pub const EFFICIENCY_CRITICAL_PCT: f64 = 50.0;
/// Efficiency below this is a warning (%).
pub const EFFICIENCY_WARNING_PCT: f64 = 70.0;

// ============================================================================
// Cleaning survey
// ============================================================================

/// IQR multiplier of the cleaning-stage outlier survey.
pub const SURVEY_IQR_K: f64 = 1.5;
/// Columns are listed only above this outlier share (%).
pub const SURVEY_MIN_PCT: f64 = 1.0;

// ============================================================================
// Furnace composite (50 / 30 / 20)
// ============================================================================

pub const FURNACE_TEMPERATURE_WEIGHT: f64 = 50.0;
pub const FURNACE_ENERGY_WEIGHT: f64 = 30.0;
pub const FURNACE_COOLING_WEIGHT: f64 = 20.0;

/// Furnace composite bands: EXCELLENT / GOOD / MEDIUM, else LOW.
/// Per-zone control bands use the same breakpoints.
pub const FURNACE_BANDS: [f64; 3] = [90.0, 75.0, 60.0];

/// Optimal mean power band (%).
pub const POWER_OPTIMAL_LOW: f64 = 50.0;
pub const POWER_OPTIMAL_HIGH: f64 = 70.0;

/// Optimal stage1 - stage3 cooling delta band (degC).
pub const COOLING_DELTA_LOW: f64 = 150.0;
pub const COOLING_DELTA_HIGH: f64 = 250.0;

/// Staged cooling counts as balanced below this |d12 - d23| (degC).
pub const COOLING_STAGE_BALANCE: f64 = 50.0;

/// Zone-balance breakpoints (max pairwise zone mean difference, degC).
pub const ZONE_BALANCE_BREAKPOINTS: [f64; 3] = [50.0, 100.0, 150.0];

/// Daily power trend counts as stable below this absolute change (points).
pub const POWER_TREND_STABLE: f64 = 5.0;

/// Coefficient-of-variation breakpoints for operational consistency (%).
pub const CONSISTENCY_CV_BREAKPOINTS: [f64; 3] = [20.0, 40.0, 60.0];
