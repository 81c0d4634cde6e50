//! Analysis Configuration - every tunable threshold as a TOML value
//!
//! Each struct implements `Default` with the plant's established limits, so
//! a run without a config file behaves exactly like the stock reports.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::OutlierMethod;

/// Environment variable holding an explicit config path.
pub const CONFIG_ENV_VAR: &str = "PLANT_HEALTH_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "plant_health.toml";

/// Top-level analysis configuration.
///
/// Loaded from TOML with the search order:
/// 1. `$PLANT_HEALTH_CONFIG`
/// 2. `./plant_health.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Plant / machine labels for reports
    #[serde(default)]
    pub site: SiteInfo,

    /// Sensor fault repair
    #[serde(default)]
    pub repair: RepairConfig,

    /// Injection press anomaly parameters
    #[serde(default)]
    pub press: PressConfig,

    /// Furnace anomaly and scoring parameters
    #[serde(default)]
    pub furnace: FurnaceConfig,

    /// Maintenance advisor floors and ceilings
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PLANT_HEALTH_CONFIG` environment variable
    /// 2. `./plant_health.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), plant = %config.site.plant, "Loaded analysis config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. ./plant_health.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(plant = %config.site.plant, "Loaded analysis config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged, never fatal.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate thresholds for internal consistency.
    ///
    /// Rules:
    /// - Every multiplier, ceiling and floor must be finite and > 0
    /// - Ranges must be ordered (min < max, low < high)
    /// - Ratios must fall in (0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let r = &self.repair;
        Self::check_range(r.temp_min_c, r.temp_max_c, "repair.temp", &mut errors);

        let p = &self.press;
        for (name, v) in [
            ("press.piston_pressure_k", p.piston_pressure_k),
            ("press.fill_time_k", p.fill_time_k),
            ("press.fill_time_critical_ms", p.fill_time_critical_ms),
            ("press.phase1_speed_k", p.phase1_speed_k),
            ("press.phase2_speed_k", p.phase2_speed_k),
            ("press.pressure_rise_k", p.pressure_rise_k),
            ("press.pressure_rise_critical_ms", p.pressure_rise_critical_ms),
            ("press.trend_threshold_pct", p.trend_threshold_pct),
        ] {
            Self::check_positive(v, name, &mut errors);
        }
        if p.slowest_molds == 0 {
            errors.push("press.slowest_molds must be > 0".to_string());
        }

        let f = &self.furnace;
        for (name, v) in [
            ("furnace.sensor_k", f.sensor_k),
            ("furnace.setpoint_tolerance_c", f.setpoint_tolerance_c),
            ("furnace.setpoint_deviation_c", f.setpoint_deviation_c),
            ("furnace.sudden_change_c", f.sudden_change_c),
            ("furnace.high_power_pct", f.high_power_pct),
            ("furnace.max_time_gap_min", f.max_time_gap_min),
            ("furnace.expected_records_per_hour", f.expected_records_per_hour),
            ("furnace.zone_imbalance_c", f.zone_imbalance_c),
            ("furnace.trend_threshold_pct", f.trend_threshold_pct),
        ] {
            Self::check_positive(v, name, &mut errors);
        }
        if !(f.high_power_row_ratio > 0.0 && f.high_power_row_ratio <= 1.0) {
            errors.push(format!(
                "furnace.high_power_row_ratio must be in (0, 1], got {}",
                f.high_power_row_ratio
            ));
        }
        if f.setpoint_tolerance_c >= f.setpoint_deviation_c {
            errors.push(format!(
                "furnace.setpoint_tolerance_c ({:.1}) must be < setpoint_deviation_c ({:.1})",
                f.setpoint_tolerance_c, f.setpoint_deviation_c
            ));
        }

        let ap = &self.advisor.press;
        for (name, v) in [
            ("advisor.press.max_piston_pressure_bar", ap.max_piston_pressure_bar),
            ("advisor.press.max_mean_cycle_ms", ap.max_mean_cycle_ms),
            ("advisor.press.min_efficiency_pct", ap.min_efficiency_pct),
            ("advisor.press.min_quality_pct", ap.min_quality_pct),
        ] {
            Self::check_positive(v, name, &mut errors);
        }

        let af = &self.advisor.furnace;
        for (name, v) in [
            ("advisor.furnace.min_control_success_pct", af.min_control_success_pct),
            ("advisor.furnace.max_zone_imbalance_c", af.max_zone_imbalance_c),
            ("advisor.furnace.min_energy_score", af.min_energy_score),
            ("advisor.furnace.high_power_pct", af.high_power_pct),
            ("advisor.furnace.critical_zone_success_pct", af.critical_zone_success_pct),
        ] {
            Self::check_positive(v, name, &mut errors);
        }
        Self::check_range(
            af.cooling_delta_low_c,
            af.cooling_delta_high_c,
            "advisor.furnace.cooling_delta",
            &mut errors,
        );
        if af.max_critical_zones == 0 {
            errors.push("advisor.furnace.max_critical_zones must be > 0".to_string());
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        // Reject NaN/Inf in any config value (sweep all f64 fields via serialization)
        if let Ok(value) = toml::Value::try_from(self) {
            let non_finite = super::validation::non_finite_keys(&value, "");
            if !non_finite.is_empty() {
                errors.push(format!(
                    "Config contains NaN or Inf values ({}), all thresholds must be finite numbers",
                    non_finite.join(", ")
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        } else if value <= 0.0 {
            errors.push(format!("{name} must be > 0 (got {value})"));
        }
    }

    fn check_range(low: f64, high: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, catch them explicitly
        if !low.is_finite() || !high.is_finite() {
            errors.push(format!("{name}: values must be finite (got low={low}, high={high})"));
            return;
        }
        if low >= high {
            errors.push(format!("{name}: low ({low:.1}) must be < high ({high:.1})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Site
// ============================================================================

/// Identification metadata. Not used for logic, only printed in reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteInfo {
    #[serde(default = "default_plant")]
    pub plant: String,
    #[serde(default)]
    pub press_name: String,
    #[serde(default)]
    pub furnace_name: String,
}

fn default_plant() -> String {
    "Unnamed plant".to_string()
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            plant: default_plant(),
            press_name: String::new(),
            furnace_name: String::new(),
        }
    }
}

// ============================================================================
// Repair
// ============================================================================

/// Physical plausibility range for temperature sensors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairConfig {
    /// Readings below this are sensor faults (degC).
    #[serde(default = "default_temp_min")]
    pub temp_min_c: f64,
    /// Readings above this are sensor faults (degC).
    #[serde(default = "default_temp_max")]
    pub temp_max_c: f64,
}

fn default_temp_min() -> f64 { -100.0 }
fn default_temp_max() -> f64 { 2000.0 }

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            temp_min_c: default_temp_min(),
            temp_max_c: default_temp_max(),
        }
    }
}

// ============================================================================
// Press
// ============================================================================

/// Per-parameter outlier settings for the injection press.
///
/// `*_k` is the IQR multiplier when `outlier_method = "iqr"` and the z limit
/// when `outlier_method = "zscore"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressConfig {
    #[serde(default = "default_outlier_method")]
    pub outlier_method: OutlierMethod,
    #[serde(default = "default_iqr_k")]
    pub piston_pressure_k: f64,
    #[serde(default = "default_iqr_k")]
    pub fill_time_k: f64,
    /// Fill times above this are critical regardless of bounds (ms).
    #[serde(default = "default_fill_time_critical")]
    pub fill_time_critical_ms: f64,
    #[serde(default = "default_iqr_k")]
    pub phase1_speed_k: f64,
    #[serde(default = "default_iqr_k")]
    pub phase2_speed_k: f64,
    #[serde(default = "default_pressure_rise_k")]
    pub pressure_rise_k: f64,
    /// Pressure-rise times above this are critical regardless of bounds (ms).
    #[serde(default = "default_pressure_rise_critical")]
    pub pressure_rise_critical_ms: f64,
    /// First-day vs last-day change that counts as a trend (%).
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold_pct: f64,
    /// Number of slowest molds listed in the report.
    #[serde(default = "default_slowest_molds")]
    pub slowest_molds: usize,
    /// Number of critical pressure-rise shot numbers listed in the report.
    #[serde(default = "default_slowest_molds")]
    pub critical_shot_sample: usize,
}

fn default_outlier_method() -> OutlierMethod { OutlierMethod::Iqr }
fn default_iqr_k() -> f64 { 1.5 }
fn default_fill_time_critical() -> f64 { 1200.0 }
fn default_pressure_rise_k() -> f64 { 2.0 }
fn default_pressure_rise_critical() -> f64 { 1000.0 }
fn default_trend_threshold() -> f64 { 10.0 }
fn default_slowest_molds() -> usize { 5 }

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            outlier_method: default_outlier_method(),
            piston_pressure_k: default_iqr_k(),
            fill_time_k: default_iqr_k(),
            fill_time_critical_ms: default_fill_time_critical(),
            phase1_speed_k: default_iqr_k(),
            phase2_speed_k: default_iqr_k(),
            pressure_rise_k: default_pressure_rise_k(),
            pressure_rise_critical_ms: default_pressure_rise_critical(),
            trend_threshold_pct: default_trend_threshold(),
            slowest_molds: default_slowest_molds(),
            critical_shot_sample: default_slowest_molds(),
        }
    }
}

// ============================================================================
// Furnace
// ============================================================================

/// Furnace anomaly and scoring thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FurnaceConfig {
    #[serde(default = "default_outlier_method")]
    pub outlier_method: OutlierMethod,
    /// Outlier multiplier for every actual temperature sensor.
    #[serde(default = "default_iqr_k")]
    pub sensor_k: f64,
    /// A zone is on target when |set - actual| is within this (degC).
    #[serde(default = "default_setpoint_tolerance")]
    pub setpoint_tolerance_c: f64,
    /// Set-point deviations above this are anomalies (degC).
    #[serde(default = "default_setpoint_deviation")]
    pub setpoint_deviation_c: f64,
    /// Row-to-row change above this is a sudden change (degC).
    #[serde(default = "default_sudden_change")]
    pub sudden_change_c: f64,
    /// Power above this counts as high draw (%).
    #[serde(default = "default_high_power")]
    pub high_power_pct: f64,
    /// Share of rows at high draw before a power column is flagged.
    #[serde(default = "default_high_power_ratio")]
    pub high_power_row_ratio: f64,
    /// Gaps between consecutive records above this are reported (minutes).
    #[serde(default = "default_max_time_gap")]
    pub max_time_gap_min: f64,
    #[serde(default = "default_expected_records")]
    pub expected_records_per_hour: f64,
    /// Max pairwise zone mean difference flagged as imbalance (degC).
    #[serde(default = "default_zone_imbalance")]
    pub zone_imbalance_c: f64,
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold_pct: f64,
}

fn default_setpoint_tolerance() -> f64 { 10.0 }
fn default_setpoint_deviation() -> f64 { 50.0 }
fn default_sudden_change() -> f64 { 100.0 }
fn default_high_power() -> f64 { 90.0 }
fn default_high_power_ratio() -> f64 { 0.10 }
fn default_max_time_gap() -> f64 { 30.0 }
fn default_expected_records() -> f64 { 20.0 }
fn default_zone_imbalance() -> f64 { 100.0 }

impl Default for FurnaceConfig {
    fn default() -> Self {
        Self {
            outlier_method: default_outlier_method(),
            sensor_k: default_iqr_k(),
            setpoint_tolerance_c: default_setpoint_tolerance(),
            setpoint_deviation_c: default_setpoint_deviation(),
            sudden_change_c: default_sudden_change(),
            high_power_pct: default_high_power(),
            high_power_row_ratio: default_high_power_ratio(),
            max_time_gap_min: default_max_time_gap(),
            expected_records_per_hour: default_expected_records(),
            zone_imbalance_c: default_zone_imbalance(),
            trend_threshold_pct: default_trend_threshold(),
        }
    }
}

// ============================================================================
// Advisor
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub press: PressAdvisorConfig,
    #[serde(default)]
    pub furnace: FurnaceAdvisorConfig,
}

/// Rule limits for press recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressAdvisorConfig {
    #[serde(default = "default_max_piston_pressure")]
    pub max_piston_pressure_bar: f64,
    #[serde(default = "default_max_mean_cycle")]
    pub max_mean_cycle_ms: f64,
    /// Rows over the pressure-rise ceiling tolerated before the valve rule fires.
    #[serde(default = "default_max_rise_over_limit")]
    pub max_rise_over_limit: usize,
    #[serde(default = "default_min_efficiency")]
    pub min_efficiency_pct: f64,
    #[serde(default = "default_min_quality")]
    pub min_quality_pct: f64,
}

fn default_max_piston_pressure() -> f64 { 6.0 }
fn default_max_mean_cycle() -> f64 { 1800.0 }
fn default_max_rise_over_limit() -> usize { 50 }
fn default_min_efficiency() -> f64 { 60.0 }
fn default_min_quality() -> f64 { 90.0 }

impl Default for PressAdvisorConfig {
    fn default() -> Self {
        Self {
            max_piston_pressure_bar: default_max_piston_pressure(),
            max_mean_cycle_ms: default_max_mean_cycle(),
            max_rise_over_limit: default_max_rise_over_limit(),
            min_efficiency_pct: default_min_efficiency(),
            min_quality_pct: default_min_quality(),
        }
    }
}

/// Rule limits for furnace recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FurnaceAdvisorConfig {
    #[serde(default = "default_min_control_success")]
    pub min_control_success_pct: f64,
    #[serde(default = "default_zone_imbalance")]
    pub max_zone_imbalance_c: f64,
    #[serde(default = "default_min_energy_score")]
    pub min_energy_score: f64,
    /// Above this mean power a low energy score means over-consumption (%).
    #[serde(default = "default_advisor_high_power")]
    pub high_power_pct: f64,
    #[serde(default = "default_cooling_low")]
    pub cooling_delta_low_c: f64,
    #[serde(default = "default_cooling_high")]
    pub cooling_delta_high_c: f64,
    /// Zones below this success rate are critical (%).
    #[serde(default = "default_critical_zone_success")]
    pub critical_zone_success_pct: f64,
    #[serde(default = "default_max_critical_zones")]
    pub max_critical_zones: usize,
}

fn default_min_control_success() -> f64 { 75.0 }
fn default_min_energy_score() -> f64 { 70.0 }
fn default_advisor_high_power() -> f64 { 70.0 }
fn default_cooling_low() -> f64 { 150.0 }
fn default_cooling_high() -> f64 { 250.0 }
fn default_critical_zone_success() -> f64 { 60.0 }
fn default_max_critical_zones() -> usize { 3 }

impl Default for FurnaceAdvisorConfig {
    fn default() -> Self {
        Self {
            min_control_success_pct: default_min_control_success(),
            max_zone_imbalance_c: default_zone_imbalance(),
            min_energy_score: default_min_energy_score(),
            high_power_pct: default_advisor_high_power(),
            cooling_delta_low_c: default_cooling_low(),
            cooling_delta_high_c: default_cooling_high(),
            critical_zone_success_pct: default_critical_zone_success(),
            max_critical_zones: default_max_critical_zones(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [press]
            fill_time_critical_ms = 1500.0
            "#,
        )
        .unwrap();
        assert_eq!(config.press.fill_time_critical_ms, 1500.0);
        assert_eq!(config.press.pressure_rise_k, 2.0);
        assert_eq!(config.furnace.setpoint_tolerance_c, 10.0);
    }

    #[test]
    fn test_inverted_repair_range_rejected() {
        let mut config = AnalysisConfig::default();
        config.repair.temp_min_c = 500.0;
        config.repair.temp_max_c = 100.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("repair.temp"));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let mut config = AnalysisConfig::default();
        config.furnace.sudden_change_c = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_ratio_outside_unit_interval_rejected() {
        let mut config = AnalysisConfig::default();
        config.furnace.high_power_row_ratio = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("high_power_row_ratio"));
    }

    #[test]
    fn test_zscore_method_parses() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [furnace]
            outlier_method = "zscore"
            sensor_k = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.furnace.outlier_method, OutlierMethod::ZScore);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalysisConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(AnalysisConfig::from_toml_str(&text).unwrap(), config);
    }
}
