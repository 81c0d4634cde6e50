//! Injection press performance scoring
//!
//! Derived cycle time (fill + pressure rise) feeds four 25-point shares:
//! cycle time against target, share of cycles over the hard ceiling,
//! throughput efficiency and quality. Their sum is the composite health
//! score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::curves;
use crate::config::defaults::{
    CYCLE_CEILING_MS, CYCLE_TARGET_MS, PRESS_ANOMALY_WEIGHT, PRESS_CYCLE_WEIGHT,
    PRESS_EFFICIENCY_WEIGHT, PRESS_QUALITY_WEIGHT,
};
use crate::config::AnalysisConfig;
use crate::detection::stats;
use crate::types::fields::press;
use crate::types::{
    period_days, AnomalySummary, Dataset, DatasetError, EfficiencyLevel, HealthBand, ReportIssue,
};

/// Per-row values computed from the dataset, kept apart from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetrics {
    /// fill time + pressure rise time (ms); missing when either is missing.
    pub cycle_time_ms: Vec<Option<f64>>,
}

/// Derive per-row metrics without touching the dataset.
pub fn derive_metrics(dataset: &Dataset) -> Result<DerivedMetrics, DatasetError> {
    let fill = dataset.numeric(press::FILL_TIME)?;
    let rise = dataset.numeric(press::PRESSURE_RISE)?;
    Ok(DerivedMetrics {
        cycle_time_ms: fill
            .iter()
            .zip(rise)
            .map(|(f, r)| match (f, r) {
                (Some(f), Some(r)) => Some(f + r),
                _ => None,
            })
            .collect(),
    })
}

// ============================================================================
// Report structures
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CycleTimeStats {
    pub count: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub std_ms: f64,
    /// Share of cycles at or below target (%).
    pub within_target_pct: f64,
    pub over_ceiling_count: usize,
    pub over_ceiling_pct: f64,
    pub hourly_capacity: f64,
    pub daily_capacity: f64,
}

/// Shots per calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyProduction {
    pub mean: f64,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyMetrics {
    pub period_days: i64,
    pub total_hours: f64,
    pub actual_shots: usize,
    pub theoretical_shots: f64,
    pub efficiency_pct: f64,
    pub level: EfficiencyLevel,
    pub daily_production: Option<DailyProduction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub total_shots: usize,
    pub pressure_anomalies: usize,
    pub fill_time_anomalies: usize,
    pub quality_pct: f64,
    pub band: HealthBand,
}

/// Composite press health. Keys follow the legacy report format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressHealthScore {
    #[serde(rename = "cevrim_skoru")]
    pub cycle_score: f64,
    #[serde(rename = "anomali_skoru")]
    pub anomaly_score: f64,
    #[serde(rename = "verimlilik_skoru")]
    pub efficiency_score: f64,
    #[serde(rename = "kalite_skoru")]
    pub quality_score: f64,
    #[serde(rename = "toplam_skor")]
    pub total: f64,
    pub band: HealthBand,
}

impl PressHealthScore {
    fn from_parts(cycle: f64, anomaly: f64, efficiency: f64, quality: f64) -> Self {
        let total = cycle + anomaly + efficiency + quality;
        Self {
            cycle_score: cycle,
            anomaly_score: anomaly,
            efficiency_score: efficiency,
            quality_score: quality,
            total,
            band: curves::press_band(total),
        }
    }

    /// Scores outside their nominal share, kept as-is and reported.
    pub fn out_of_range_issues(&self) -> Vec<ReportIssue> {
        let mut issues = Vec::new();
        for (name, value, max) in [
            ("cevrim_skoru", self.cycle_score, PRESS_CYCLE_WEIGHT),
            ("anomali_skoru", self.anomaly_score, PRESS_ANOMALY_WEIGHT),
            ("verimlilik_skoru", self.efficiency_score, PRESS_EFFICIENCY_WEIGHT),
            ("kalite_skoru", self.quality_score, PRESS_QUALITY_WEIGHT),
            ("toplam_skor", self.total, 100.0),
        ] {
            if !(0.0..=max).contains(&value) {
                issues.push(ReportIssue::data_quality(
                    name,
                    format!("score_out_of_range: {value:.2} outside [0, {max}]"),
                ));
            }
        }
        issues
    }
}

/// Press Performance Scorer output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressPerformance {
    pub cycle: CycleTimeStats,
    pub efficiency: EfficiencyMetrics,
    pub quality: QualityMetrics,
    pub health: PressHealthScore,
    pub mean_piston_pressure_bar: Option<f64>,
    /// Rows with pressure-rise time above the critical ceiling.
    pub pressure_rise_over_limit: usize,
}

// ============================================================================
// Scoring
// ============================================================================

/// Score a cleaned press dataset.
///
/// Metrics that cannot be formed score zero and record an issue.
pub fn score(
    dataset: &Dataset,
    summary: &AnomalySummary,
    config: &AnalysisConfig,
    issues: &mut Vec<ReportIssue>,
) -> Result<PressPerformance, DatasetError> {
    let derived = derive_metrics(dataset)?;
    let cycles = stats::valid_values(&derived.cycle_time_ms);

    // 1. Cycle time
    let cycle = cycle_stats(&cycles);
    let (cycle_share, anomaly_share) = if cycles.is_empty() {
        issues.push(ReportIssue::insufficient_data(
            "cycle_time_ms",
            "no row with both fill and pressure-rise time, cycle scores set to 0",
        ));
        (0.0, 0.0)
    } else {
        (
            curves::cycle_time_score(cycle.mean_ms),
            curves::anomaly_rate_score(cycle.over_ceiling_pct),
        )
    };

    // 2. Efficiency (needs the mean cycle)
    let efficiency = efficiency_metrics(dataset, &cycle)?;
    let efficiency_share = if cycles.is_empty() {
        0.0
    } else {
        curves::efficiency_score(efficiency.efficiency_pct)
    };

    // 3. Quality
    let quality = quality_metrics(dataset.row_count(), summary);
    if quality.total_shots == 0 {
        issues.push(ReportIssue::insufficient_data("quality", "no rows to score"));
    }
    let quality_share = curves::quality_score(quality.quality_pct);

    let health = PressHealthScore::from_parts(cycle_share, anomaly_share, efficiency_share, quality_share);

    let mean_piston_pressure_bar = stats::column_mean(dataset.numeric(press::PISTON_PRESSURE)?);
    let pressure_rise_over_limit = dataset
        .numeric(press::PRESSURE_RISE)?
        .iter()
        .filter(|v| matches!(v, Some(x) if *x > config.press.pressure_rise_critical_ms))
        .count();

    info!(
        total = health.total,
        band = %health.band,
        efficiency = efficiency.efficiency_pct,
        quality = quality.quality_pct,
        "Press scored"
    );

    Ok(PressPerformance {
        cycle,
        efficiency,
        quality,
        health,
        mean_piston_pressure_bar,
        pressure_rise_over_limit,
    })
}

fn cycle_stats(cycles: &[f64]) -> CycleTimeStats {
    let Some(mean) = stats::mean(cycles) else {
        return CycleTimeStats::default();
    };
    let count = cycles.len();
    let over_ceiling_count = cycles.iter().filter(|&&c| c > CYCLE_CEILING_MS).count();
    let within = cycles.iter().filter(|&&c| c <= CYCLE_TARGET_MS).count();
    let hourly_capacity = if mean > 0.0 { 3600.0 * 1000.0 / mean } else { 0.0 };
    CycleTimeStats {
        count,
        mean_ms: mean,
        min_ms: cycles.iter().copied().fold(f64::INFINITY, f64::min),
        max_ms: cycles.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std_ms: stats::sample_std(cycles).unwrap_or(0.0),
        within_target_pct: within as f64 / count as f64 * 100.0,
        over_ceiling_count,
        over_ceiling_pct: over_ceiling_count as f64 / count as f64 * 100.0,
        hourly_capacity,
        daily_capacity: hourly_capacity * 24.0,
    }
}

fn efficiency_metrics(dataset: &Dataset, cycle: &CycleTimeStats) -> Result<EfficiencyMetrics, DatasetError> {
    let timestamps = dataset.timestamps()?;
    let days = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(first), Some(last)) => period_days(*first, *last),
        _ => 0,
    };
    let total_hours = days as f64 * 24.0;
    let actual_shots = dataset.row_count();
    let theoretical_shots = if cycle.mean_ms > 0.0 {
        total_hours * 3600.0 / (cycle.mean_ms / 1000.0)
    } else {
        0.0
    };
    let efficiency_pct = if theoretical_shots > 0.0 {
        actual_shots as f64 / theoretical_shots * 100.0
    } else {
        0.0
    };

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ts in timestamps {
        *per_day.entry(ts.date()).or_default() += 1;
    }
    let counts: Vec<usize> = per_day.into_values().collect();
    let daily_production = match (counts.iter().min(), counts.iter().max()) {
        (Some(&min), Some(&max)) => Some(DailyProduction {
            mean: counts.iter().sum::<usize>() as f64 / counts.len() as f64,
            min,
            max,
        }),
        _ => None,
    };

    Ok(EfficiencyMetrics {
        period_days: days,
        total_hours,
        actual_shots,
        theoretical_shots,
        efficiency_pct,
        level: curves::efficiency_level(efficiency_pct),
        daily_production,
    })
}

/// Defects are statistical outliers only; ceiling hits stay in the anomaly report.
fn quality_metrics(total: usize, summary: &AnomalySummary) -> QualityMetrics {
    let pressure_anomalies = summary.outliers_for(press::PISTON_PRESSURE);
    let fill_time_anomalies = summary.outliers_for(press::FILL_TIME);
    let quality_pct = if total == 0 {
        0.0
    } else {
        (total as f64 - (pressure_anomalies + fill_time_anomalies) as f64) / total as f64 * 100.0
    };
    QualityMetrics {
        total_shots: total,
        pressure_anomalies,
        fill_time_anomalies,
        quality_pct,
        band: curves::quality_band(quality_pct),
    }
}
