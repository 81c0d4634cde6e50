//! Piecewise-linear scoring curves
//!
//! Every curve reproduces the breakpoints of the plant's established
//! reports exactly. None of them clamps its upper end: a mean cycle faster
//! than target scores above 25 and is reported, not hidden.

use crate::config::defaults::*;
use crate::types::{EfficiencyLevel, EnergyStatus, HealthBand, PowerTrend};

// ============================================================================
// Press
// ============================================================================

/// Cycle-time share (25 points at target).
///
/// `max(0, 25 - (mean - target) / target * 25)`
pub fn cycle_time_score(mean_cycle_ms: f64) -> f64 {
    (PRESS_CYCLE_WEIGHT - (mean_cycle_ms - CYCLE_TARGET_MS) / CYCLE_TARGET_MS * PRESS_CYCLE_WEIGHT).max(0.0)
}

/// Anomaly-rate share: one point lost per percent of cycles over the ceiling.
pub fn anomaly_rate_score(pct_above_ceiling: f64) -> f64 {
    (PRESS_ANOMALY_WEIGHT - pct_above_ceiling).max(0.0)
}

/// Efficiency share: efficiency % scaled to 25 points.
pub fn efficiency_score(efficiency_pct: f64) -> f64 {
    efficiency_pct * PRESS_EFFICIENCY_WEIGHT / 100.0
}

/// Quality share: quality % scaled to 25 points.
pub fn quality_score(quality_pct: f64) -> f64 {
    quality_pct * PRESS_QUALITY_WEIGHT / 100.0
}

pub fn press_band(total: f64) -> HealthBand {
    HealthBand::from_breakpoints(total, PRESS_BANDS, HealthBand::Poor)
}

pub fn quality_band(quality_pct: f64) -> HealthBand {
    HealthBand::from_breakpoints(quality_pct, QUALITY_BANDS, HealthBand::Low)
}

pub fn efficiency_level(efficiency_pct: f64) -> EfficiencyLevel {
    if efficiency_pct < EFFICIENCY_CRITICAL_PCT {
        EfficiencyLevel::Critical
    } else if efficiency_pct < EFFICIENCY_WARNING_PCT {
        EfficiencyLevel::Warning
    } else {
        EfficiencyLevel::Acceptable
    }
}

// ============================================================================
// Furnace
// ============================================================================

/// Energy efficiency (0-100) from mean power %.
///
/// - [50, 70]: 100
/// - below 50: `70 + power * 0.6`
/// - above 70: `max(0, 100 - (power - 70))`
pub fn energy_score(mean_power_pct: f64) -> f64 {
    if mean_power_pct < POWER_OPTIMAL_LOW {
        70.0 + mean_power_pct * 0.6
    } else if mean_power_pct <= POWER_OPTIMAL_HIGH {
        100.0
    } else {
        (100.0 - (mean_power_pct - POWER_OPTIMAL_HIGH)).max(0.0)
    }
}

pub fn energy_status(mean_power_pct: f64) -> EnergyStatus {
    if mean_power_pct < POWER_OPTIMAL_LOW {
        EnergyStatus::LowCapacity
    } else if mean_power_pct <= POWER_OPTIMAL_HIGH {
        EnergyStatus::Optimal
    } else {
        EnergyStatus::HighConsumption
    }
}

/// Daily power trend from the first-to-last daily mean change (points).
pub fn power_trend(change: f64) -> PowerTrend {
    if change.abs() < POWER_TREND_STABLE {
        PowerTrend::Stable
    } else if change > 0.0 {
        PowerTrend::Rising
    } else {
        PowerTrend::Falling
    }
}

/// Cooling effectiveness (0-100) from the stage1 - stage3 delta.
///
/// - [150, 250]: 100
/// - below 150: `delta / 150 * 100`
/// - above 250: `max(0, 100 - (delta - 250) / 5)`
pub fn cooling_score(delta: f64) -> f64 {
    if delta < COOLING_DELTA_LOW {
        delta / COOLING_DELTA_LOW * 100.0
    } else if delta <= COOLING_DELTA_HIGH {
        100.0
    } else {
        (100.0 - (delta - COOLING_DELTA_HIGH) / 5.0).max(0.0)
    }
}

/// Zone balance (0-100) from the max pairwise zone mean difference.
///
/// - < 50: 100
/// - [50, 100): `100 - (diff - 50) * 2`
/// - [100, 150): `50 - (diff - 100)`
/// - >= 150: `max(0, 50 - (diff - 150) * 0.5)`
pub fn zone_balance_score(max_difference: f64) -> f64 {
    let [b1, b2, b3] = ZONE_BALANCE_BREAKPOINTS;
    if max_difference < b1 {
        100.0
    } else if max_difference < b2 {
        100.0 - (max_difference - b1) * 2.0
    } else if max_difference < b3 {
        50.0 - (max_difference - b2)
    } else {
        (50.0 - (max_difference - b3) * 0.5).max(0.0)
    }
}

/// Operational consistency from the coefficient of variation (%) of daily
/// record counts.
pub fn consistency_score(cv_pct: f64) -> f64 {
    let [c1, c2, c3] = CONSISTENCY_CV_BREAKPOINTS;
    if cv_pct < c1 {
        100.0
    } else if cv_pct < c2 {
        80.0
    } else if cv_pct < c3 {
        60.0
    } else {
        40.0
    }
}

pub fn furnace_band(total: f64) -> HealthBand {
    HealthBand::from_breakpoints(total, FURNACE_BANDS, HealthBand::Low)
}
