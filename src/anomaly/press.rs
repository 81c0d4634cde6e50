//! Injection press anomaly analysis
//!
//! Parameter screening (IQR per parameter, hard ceilings on fill time and
//! pressure-rise time), descriptive statistics, phase speed ratio, per-mold
//! statistics and the daily fill-time trend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use super::aggregator::{
    aggregate, daily_means, group_rows, key_column, ratio_stats, trend_check, ParameterSpec,
};
use crate::config::PressConfig;
use crate::detection::{describe, stats, ColumnStats};
use crate::types::fields::press;
use crate::types::{
    AnomalySummary, AnomalyTable, Dataset, DatasetError, RatioStats, ReportIssue, TrendCheck,
};

/// Statistics of one mold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoldStats {
    pub mold: String,
    pub shots: usize,
    pub fill_time_mean: Option<f64>,
    pub fill_time_std: Option<f64>,
    pub piston_pressure_mean: Option<f64>,
    pub piston_pressure_std: Option<f64>,
    pub specific_pressure_mean: Option<f64>,
    pub specific_pressure_std: Option<f64>,
}

/// Daily means of the key press parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressDailyMeans {
    pub date: NaiveDate,
    pub fill_time_ms: Option<f64>,
    pub piston_pressure_bar: Option<f64>,
    pub specific_pressure_bar: Option<f64>,
}

/// Everything the press anomaly stage produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressAnomalyReport {
    pub tables: Vec<AnomalyTable>,
    pub summary: AnomalySummary,
    pub statistics: BTreeMap<String, ColumnStats>,
    /// Phase-two over phase-one speed.
    pub speed_ratio: Option<RatioStats>,
    /// All molds, ordered by mold key.
    pub molds: Vec<MoldStats>,
    /// Slowest molds by mean fill time.
    pub slowest_molds: Vec<MoldStats>,
    pub daily: Vec<PressDailyMeans>,
    pub fill_time_trend: TrendCheck,
    /// Shot numbers of the first critical pressure-rise rows.
    pub critical_rise_shots: Vec<String>,
}

impl PressAnomalyReport {
    pub fn table(&self, parameter: &str) -> Option<&AnomalyTable> {
        self.tables.iter().find(|t| t.parameter == parameter)
    }
}

/// Parameter set screened on the press.
pub fn press_specs(config: &PressConfig) -> Vec<ParameterSpec> {
    let m = config.outlier_method;
    vec![
        ParameterSpec::new(press::PISTON_PRESSURE, m, config.piston_pressure_k),
        ParameterSpec::new(press::FILL_TIME, m, config.fill_time_k)
            .with_ceiling(config.fill_time_critical_ms),
        ParameterSpec::new(press::PHASE1_SPEED, m, config.phase1_speed_k),
        ParameterSpec::new(press::PHASE2_SPEED, m, config.phase2_speed_k),
        ParameterSpec::new(press::PRESSURE_RISE, m, config.pressure_rise_k)
            .with_ceiling(config.pressure_rise_critical_ms),
    ]
}

/// Run the press anomaly stage on a cleaned dataset.
pub fn analyze(
    dataset: &Dataset,
    config: &PressConfig,
    issues: &mut Vec<ReportIssue>,
) -> Result<PressAnomalyReport, DatasetError> {
    let specs = press_specs(config);
    let aggregation = aggregate(dataset, &specs, &[], issues);

    let mut statistics = BTreeMap::new();
    for name in [
        press::FILL_TIME,
        press::PISTON_PRESSURE,
        press::PHASE1_SPEED,
        press::PHASE2_SPEED,
        press::PRESSURE_RISE,
        press::SPECIFIC_PRESSURE,
    ] {
        if let Some(s) = describe(dataset.numeric(name)?) {
            statistics.insert(name.to_string(), s);
        }
    }

    let speed_ratio = ratio_stats(
        dataset.numeric(press::PHASE2_SPEED)?,
        dataset.numeric(press::PHASE1_SPEED)?,
    );
    if speed_ratio.is_none() {
        issues.push(ReportIssue::insufficient_data(
            "speed_ratio",
            "no row with a non-zero phase-one speed",
        ));
    }

    let molds = mold_statistics(dataset)?;
    let mut slowest: Vec<MoldStats> = molds
        .iter()
        .filter(|m| m.fill_time_mean.is_some())
        .cloned()
        .collect();
    slowest.sort_by(|a, b| {
        b.fill_time_mean
            .unwrap_or(0.0)
            .total_cmp(&a.fill_time_mean.unwrap_or(0.0))
    });
    slowest.truncate(config.slowest_molds);

    let timestamps = dataset.timestamps()?;
    let fill_daily = daily_means(dataset.numeric(press::FILL_TIME)?, timestamps);
    let daily = press_daily(dataset, &fill_daily)?;
    let fill_time_trend = trend_check(press::FILL_TIME, &fill_daily, config.trend_threshold_pct, issues);

    let critical_rise_shots = critical_shots(dataset, &aggregation.tables, config.critical_shot_sample);

    info!(
        flags = aggregation.summary.total_flags,
        molds = molds.len(),
        trend = %fill_time_trend.trend,
        "Press anomaly analysis complete"
    );

    Ok(PressAnomalyReport {
        tables: aggregation.tables,
        summary: aggregation.summary,
        statistics,
        speed_ratio,
        molds,
        slowest_molds: slowest,
        daily,
        fill_time_trend,
        critical_rise_shots,
    })
}

fn mold_statistics(dataset: &Dataset) -> Result<Vec<MoldStats>, DatasetError> {
    let Some(keys) = key_column(dataset, press::MOLD_NO) else {
        return Ok(Vec::new());
    };
    let fill = dataset.numeric(press::FILL_TIME)?;
    let piston = dataset.numeric(press::PISTON_PRESSURE)?;
    let specific = dataset.numeric(press::SPECIFIC_PRESSURE)?;

    let pick = |col: &[Option<f64>], rows: &[usize]| -> Vec<f64> {
        rows.iter().filter_map(|&i| col[i]).filter(|x| x.is_finite()).collect()
    };

    let groups: BTreeMap<String, Vec<usize>> = group_rows(&keys).into_iter().collect();
    Ok(groups
        .into_iter()
        .map(|(mold, rows)| {
            let f = pick(fill, &rows);
            let p = pick(piston, &rows);
            let s = pick(specific, &rows);
            MoldStats {
                mold,
                shots: rows.len(),
                fill_time_mean: stats::mean(&f),
                fill_time_std: stats::sample_std(&f),
                piston_pressure_mean: stats::mean(&p),
                piston_pressure_std: stats::sample_std(&p),
                specific_pressure_mean: stats::mean(&s),
                specific_pressure_std: stats::sample_std(&s),
            }
        })
        .collect())
}

fn press_daily(
    dataset: &Dataset,
    fill_daily: &[(NaiveDate, f64)],
) -> Result<Vec<PressDailyMeans>, DatasetError> {
    let timestamps = dataset.timestamps()?;
    let piston: BTreeMap<NaiveDate, f64> =
        daily_means(dataset.numeric(press::PISTON_PRESSURE)?, timestamps).into_iter().collect();
    let specific: BTreeMap<NaiveDate, f64> =
        daily_means(dataset.numeric(press::SPECIFIC_PRESSURE)?, timestamps).into_iter().collect();
    let fill: BTreeMap<NaiveDate, f64> = fill_daily.iter().copied().collect();

    let dates: BTreeSet<NaiveDate> = timestamps.iter().map(|t| t.date()).collect();
    Ok(dates
        .into_iter()
        .map(|date| PressDailyMeans {
            date,
            fill_time_ms: fill.get(&date).copied(),
            piston_pressure_bar: piston.get(&date).copied(),
            specific_pressure_bar: specific.get(&date).copied(),
        })
        .collect())
}

fn critical_shots(dataset: &Dataset, tables: &[AnomalyTable], sample: usize) -> Vec<String> {
    let Some(shots) = key_column(dataset, press::SHOT_NO) else {
        return Vec::new();
    };
    tables
        .iter()
        .find(|t| t.parameter == press::PRESSURE_RISE)
        .map(|t| {
            t.rows
                .iter()
                .filter(|r| r.critical)
                .filter_map(|r| shots.get(r.index).cloned().flatten())
                .take(sample)
                .collect()
        })
        .unwrap_or_default()
}
