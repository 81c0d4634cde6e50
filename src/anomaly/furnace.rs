//! Furnace anomaly analysis
//!
//! - IQR screening of every actual temperature sensor
//! - Set-point deviation tables per zone pair
//! - Sudden row-to-row jumps on the key sensors
//! - Sustained high heater power
//! - Cooling stage ordering (stage 1 >= stage 2 >= stage 3)
//! - Zone imbalance and the daily power trend

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::aggregator::{
    aggregate, daily_means, order_violations, sudden_changes, summarize, threshold_table,
    trend_check, OrderCheck, ParameterSpec,
};
use crate::config::FurnaceConfig;
use crate::detection::stats;
use crate::types::fields::{self, furnace};
use crate::types::{AnomalySummary, AnomalyTable, Dataset, DatasetError, ReportIssue, TrendCheck};

/// Row-to-row jump count on one sensor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuddenChange {
    pub sensor: String,
    pub count: usize,
}

/// A power column running hot on too many rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighPowerColumn {
    pub column: String,
    pub rows_above: usize,
    pub share_pct: f64,
}

/// Mean temperature of one zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ZoneMean {
    pub zone: u8,
    pub mean: f64,
}

/// Zone means and their largest pairwise difference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZoneImbalance {
    pub zone_means: Vec<ZoneMean>,
    pub max_difference: f64,
    pub imbalanced: bool,
}

/// Everything the furnace anomaly stage produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FurnaceAnomalyReport {
    /// Statistical screening of actual temperatures.
    pub tables: Vec<AnomalyTable>,
    /// `|set - actual|` above the deviation ceiling, one table per zone pair.
    pub setpoint_deviations: Vec<AnomalyTable>,
    pub sudden_changes: Vec<SuddenChange>,
    pub high_power: Vec<HighPowerColumn>,
    pub cooling_order: OrderCheck,
    pub zone_imbalance: ZoneImbalance,
    /// Trend of the per-row mean heater power.
    pub power_trend: Option<TrendCheck>,
    /// Roll-up over sensor and set-point tables.
    pub summary: AnomalySummary,
}

/// Zone means: the mean of per-column means of each zone's actual
/// temperatures. Zones with no usable column are left out.
pub fn zone_means(dataset: &Dataset, excluded: &[&str]) -> Vec<ZoneMean> {
    let actual = dataset.numeric_columns_where(|n| fields::is_actual_temp(n) && !excluded.contains(&n));
    furnace::BALANCE_ZONES
        .iter()
        .filter_map(|&zone| {
            let column_means: Vec<f64> = actual
                .iter()
                .filter(|name| fields::zone_of(name) == Some(zone))
                .filter_map(|name| dataset.numeric(name).ok().and_then(stats::column_mean))
                .collect();
            stats::mean(&column_means).map(|mean| ZoneMean { zone, mean })
        })
        .collect()
}

/// Largest pairwise difference between zone means (0 below two zones).
pub fn max_pairwise_difference(means: &[ZoneMean]) -> f64 {
    let mut max = 0.0_f64;
    for (i, a) in means.iter().enumerate() {
        for b in &means[i + 1..] {
            max = max.max((a.mean - b.mean).abs());
        }
    }
    max
}

/// Mean across all power columns for each row.
pub fn row_mean_power(dataset: &Dataset, power_columns: &[String]) -> Result<Vec<Option<f64>>, DatasetError> {
    let columns: Vec<&[Option<f64>]> = power_columns
        .iter()
        .map(|c| dataset.numeric(c))
        .collect::<Result<_, _>>()?;
    Ok((0..dataset.row_count())
        .map(|row| {
            let present: Vec<f64> = columns.iter().filter_map(|c| c[row]).collect();
            stats::mean(&present)
        })
        .collect())
}

/// Run the furnace anomaly stage on a cleaned dataset.
///
/// Columns in `excluded` failed repair and are not analysed.
pub fn analyze(
    dataset: &Dataset,
    config: &FurnaceConfig,
    excluded: &[&str],
    issues: &mut Vec<ReportIssue>,
) -> Result<FurnaceAnomalyReport, DatasetError> {
    let timestamps = dataset.timestamps().ok();

    let specs: Vec<ParameterSpec> = dataset
        .numeric_columns_where(fields::is_actual_temp)
        .into_iter()
        .map(|c| ParameterSpec::new(c, config.outlier_method, config.sensor_k))
        .collect();
    let aggregation = aggregate(dataset, &specs, excluded, issues);

    let mut setpoint_deviations = Vec::new();
    for pair in &furnace::ZONE_PAIRS {
        if excluded.contains(&pair.set_id) || excluded.contains(&pair.actual_id) {
            continue;
        }
        let (Ok(set), Ok(actual)) = (dataset.numeric(pair.set_id), dataset.numeric(pair.actual_id)) else {
            continue;
        };
        let deviation: Vec<Option<f64>> = set
            .iter()
            .zip(actual)
            .map(|(s, a)| match (s, a) {
                (Some(s), Some(a)) => Some((s - a).abs()),
                _ => None,
            })
            .collect();
        setpoint_deviations.push(threshold_table(
            &format!("{}_setpoint_deviation", pair.name),
            &deviation,
            timestamps,
            config.setpoint_deviation_c,
        ));
    }

    let jumps: Vec<SuddenChange> = furnace::SUDDEN_CHANGE_SENSORS
        .iter()
        .copied()
        .filter(|s| !excluded.contains(s))
        .filter_map(|s| dataset.numeric(s).ok().map(|v| (s, v)))
        .map(|(s, v)| SuddenChange {
            sensor: s.to_string(),
            count: sudden_changes(v, config.sudden_change_c),
        })
        .collect();

    let power_columns = dataset.numeric_columns_where(fields::is_power);
    let mut high_power = Vec::new();
    let rows = dataset.row_count();
    for column in &power_columns {
        let rows_above = dataset
            .numeric(column)?
            .iter()
            .filter(|v| matches!(v, Some(x) if *x > config.high_power_pct))
            .count();
        if rows > 0 && rows_above as f64 > rows as f64 * config.high_power_row_ratio {
            high_power.push(HighPowerColumn {
                column: column.clone(),
                rows_above,
                share_pct: rows_above as f64 / rows as f64 * 100.0,
            });
        }
    }

    let cooling: Vec<&str> = furnace::COOLING_STAGES
        .iter()
        .copied()
        .filter(|c| !excluded.contains(c))
        .collect();
    let cooling_order = if cooling.len() == furnace::COOLING_STAGES.len() {
        order_violations(dataset, &cooling)
    } else {
        issues.push(ReportIssue::insufficient_data(
            "cooling_order",
            "a cooling stage failed repair, ordering not checked",
        ));
        OrderCheck::default()
    };

    let means = zone_means(dataset, excluded);
    let max_difference = max_pairwise_difference(&means);
    let zone_imbalance = ZoneImbalance {
        imbalanced: max_difference > config.zone_imbalance_c,
        zone_means: means,
        max_difference,
    };

    let power_trend = match (timestamps, power_columns.is_empty()) {
        (Some(ts), false) => {
            let per_row = row_mean_power(dataset, &power_columns)?;
            let daily = daily_means(&per_row, ts);
            Some(trend_check("mean_power_pct", &daily, config.trend_threshold_pct, issues))
        }
        _ => {
            issues.push(ReportIssue::insufficient_data(
                "mean_power_pct",
                "no power columns, power trend not computed",
            ));
            None
        }
    };

    let mut all_tables: Vec<AnomalyTable> = aggregation.tables.clone();
    all_tables.extend(setpoint_deviations.iter().cloned());
    let summary = summarize(rows, &all_tables);

    if zone_imbalance.imbalanced {
        warn!(difference = zone_imbalance.max_difference, "Zone imbalance above limit");
    }
    info!(
        flags = summary.total_flags,
        cooling_violations = cooling_order.total_violations,
        high_power = high_power.len(),
        "Furnace anomaly analysis complete"
    );

    Ok(FurnaceAnomalyReport {
        tables: aggregation.tables,
        setpoint_deviations,
        sudden_changes: jumps,
        high_power,
        cooling_order,
        zone_imbalance,
        power_trend,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn numeric(v: &[f64]) -> Column {
        Column::Numeric(v.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_zone_means_average_column_means() {
        let ds = Dataset::new()
            .with_column("zone1_upper1_temp", numeric(&[800.0, 800.0]))
            .unwrap()
            .with_column("zone1_lower1_temp", numeric(&[900.0, 900.0]))
            .unwrap()
            .with_column("zone1_upper1_set_temp", numeric(&[5000.0, 5000.0]))
            .unwrap()
            .with_column("zone2_upper1_temp", numeric(&[1000.0, 1000.0]))
            .unwrap();
        let means = zone_means(&ds, &[]);
        assert_eq!(means, vec![ZoneMean { zone: 1, mean: 850.0 }, ZoneMean { zone: 2, mean: 1000.0 }]);
        assert_eq!(max_pairwise_difference(&means), 150.0);
    }

    #[test]
    fn test_zone_means_skip_excluded() {
        let ds = Dataset::new()
            .with_column("zone1_upper1_temp", numeric(&[800.0]))
            .unwrap()
            .with_column("zone1_lower1_temp", numeric(&[900.0]))
            .unwrap();
        let means = zone_means(&ds, &["zone1_lower1_temp"]);
        assert_eq!(means[0].mean, 800.0);
    }

    #[test]
    fn test_max_pairwise_difference_single_zone() {
        assert_eq!(max_pairwise_difference(&[ZoneMean { zone: 1, mean: 10.0 }]), 0.0);
    }

    #[test]
    fn test_row_mean_power() {
        let ds = Dataset::new()
            .with_column("zone1_upper1_power_pct", Column::Numeric(vec![Some(40.0), None]))
            .unwrap()
            .with_column("zone2_upper1_power_pct", Column::Numeric(vec![Some(60.0), Some(80.0)]))
            .unwrap();
        let cols = ds.numeric_columns_where(fields::is_power);
        assert_eq!(row_mean_power(&ds, &cols).unwrap(), vec![Some(50.0), Some(80.0)]);
    }
}
