//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Raw TOML is first parsed into `toml::Value`, its key tree is compared
//! against the known field names and typos produce "did you mean?"
//! warnings. Normal serde deserialization follows. Warnings never break
//! an existing config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `AnalysisConfig`.
///
/// Maintained by hand alongside analysis_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [site]
        "site",
        "site.plant",
        "site.press_name",
        "site.furnace_name",
        // [repair]
        "repair",
        "repair.temp_min_c",
        "repair.temp_max_c",
        // [press]
        "press",
        "press.outlier_method",
        "press.piston_pressure_k",
        "press.fill_time_k",
        "press.fill_time_critical_ms",
        "press.phase1_speed_k",
        "press.phase2_speed_k",
        "press.pressure_rise_k",
        "press.pressure_rise_critical_ms",
        "press.trend_threshold_pct",
        "press.slowest_molds",
        "press.critical_shot_sample",
        // [furnace]
        "furnace",
        "furnace.outlier_method",
        "furnace.sensor_k",
        "furnace.setpoint_tolerance_c",
        "furnace.setpoint_deviation_c",
        "furnace.sudden_change_c",
        "furnace.high_power_pct",
        "furnace.high_power_row_ratio",
        "furnace.max_time_gap_min",
        "furnace.expected_records_per_hour",
        "furnace.zone_imbalance_c",
        "furnace.trend_threshold_pct",
        // [advisor]
        "advisor",
        "advisor.press",
        "advisor.press.max_piston_pressure_bar",
        "advisor.press.max_mean_cycle_ms",
        "advisor.press.max_rise_over_limit",
        "advisor.press.min_efficiency_pct",
        "advisor.press.min_quality_pct",
        "advisor.furnace",
        "advisor.furnace.min_control_success_pct",
        "advisor.furnace.max_zone_imbalance_c",
        "advisor.furnace.min_energy_score",
        "advisor.furnace.high_power_pct",
        "advisor.furnace.cooling_delta_low_c",
        "advisor.furnace.cooling_delta_high_c",
        "advisor.furnace.critical_zone_success_pct",
        "advisor.furnace.max_critical_zones",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Key walking
// ============================================================================

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Depth-first walk calling `visit(path, value)` for every entry.
fn visit_entries(value: &toml::Value, prefix: &str, visit: &mut dyn FnMut(String, &toml::Value)) {
    let Some(table) = value.as_table() else {
        return;
    };
    for (key, child) in table {
        let path = join_key(prefix, key);
        visit(path.clone(), child);
        visit_entries(child, &path, visit);
    }
}

/// Every dotted key path in a TOML value, tables included.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    visit_entries(value, prefix, &mut |path: String, _: &toml::Value| keys.push(path));
    keys
}

/// Dotted paths of float values that are NaN or infinite.
pub fn non_finite_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    visit_entries(value, prefix, &mut |path: String, v: &toml::Value| {
        if v.as_float().is_some_and(|f| !f.is_finite()) {
            keys.push(path);
        }
    });
    keys
}

/// Edit distance, single rolling row.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + usize::from(ca != *cb));
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Closest known key within edit distance 3. Ties go to the
/// lexicographically smaller key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Warnings for every key the config structs do not know about.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical ranges
// ============================================================================

/// Validate physical ranges on a parsed config.
///
/// Returns (errors, warnings). Errors are impossible values, warnings are
/// suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::AnalysisConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Nothing reads below absolute zero
    if config.repair.temp_min_c < -273.15 {
        errors.push(format!(
            "repair.temp_min_c = {:.1} is below absolute zero",
            config.repair.temp_min_c
        ));
    }

    // Percentages
    for (field, v) in [
        ("furnace.high_power_pct", config.furnace.high_power_pct),
        ("advisor.press.min_efficiency_pct", config.advisor.press.min_efficiency_pct),
        ("advisor.press.min_quality_pct", config.advisor.press.min_quality_pct),
        ("advisor.furnace.min_control_success_pct", config.advisor.furnace.min_control_success_pct),
        ("advisor.furnace.high_power_pct", config.advisor.furnace.high_power_pct),
        ("advisor.furnace.critical_zone_success_pct", config.advisor.furnace.critical_zone_success_pct),
    ] {
        if v > 100.0 {
            errors.push(format!("{field} = {v:.1} exceeds 100%"));
        }
    }

    // Repair ceiling: no furnace in the plant runs past 2000 degC
    if config.repair.temp_max_c > 2500.0 {
        warnings.push(ValidationWarning {
            field: "repair.temp_max_c".to_string(),
            message: format!(
                "repair.temp_max_c = {:.0} is above the typical sensor range (<= 2500 degC), faults may go undetected",
                config.repair.temp_max_c
            ),
            suggestion: None,
        });
    }

    // IQR multipliers outside 0.5-5 either flag everything or nothing
    for (field, v) in [
        ("press.piston_pressure_k", config.press.piston_pressure_k),
        ("press.fill_time_k", config.press.fill_time_k),
        ("press.phase1_speed_k", config.press.phase1_speed_k),
        ("press.phase2_speed_k", config.press.phase2_speed_k),
        ("press.pressure_rise_k", config.press.pressure_rise_k),
        ("furnace.sensor_k", config.furnace.sensor_k),
    ] {
        if v.is_finite() && v > 0.0 && !(0.5..=5.0).contains(&v) {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {v:.2} is outside the typical range (0.5-5)"),
                suggestion: None,
            });
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
