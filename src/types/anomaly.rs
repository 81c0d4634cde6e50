//! Anomaly tables and cross-parameter summaries

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Detection methods
// ============================================================================

/// Statistical outlier method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OutlierMethod {
    #[serde(rename = "iqr")]
    Iqr,
    #[serde(rename = "zscore")]
    ZScore,
}

impl std::fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutlierMethod::Iqr => write!(f, "IQR"),
            OutlierMethod::ZScore => write!(f, "Z-score"),
        }
    }
}

/// How an anomaly table was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Iqr,
    #[serde(rename = "zscore")]
    ZScore,
    /// Fixed operational limit, no statistics involved.
    Threshold,
}

impl From<OutlierMethod> for DetectionMethod {
    fn from(m: OutlierMethod) -> Self {
        match m {
            OutlierMethod::Iqr => DetectionMethod::Iqr,
            OutlierMethod::ZScore => DetectionMethod::ZScore,
        }
    }
}

/// (lower, upper) bounds derived from one column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColumnBound {
    pub lower: f64,
    pub upper: f64,
}

impl ColumnBound {
    /// Strictly outside the bounds.
    pub fn is_outside(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

// ============================================================================
// Anomaly records
// ============================================================================

/// One flagged row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlaggedRow {
    /// Row index into the cleaned dataset.
    pub index: usize,
    pub timestamp: Option<NaiveDateTime>,
    pub value: f64,
    /// Above the parameter's hard operational ceiling.
    pub critical: bool,
}

/// Count of flagged rows on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Rows flagged by one detector instance on one parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyTable {
    pub parameter: String,
    pub method: DetectionMethod,
    /// k for IQR, z for Z-score, the limit for threshold checks.
    pub threshold: f64,
    pub bounds: Option<ColumnBound>,
    pub critical_above: Option<f64>,
    pub rows: Vec<FlaggedRow>,
    pub critical_count: usize,
    /// Rows outside the statistical bounds. Rows flagged only by the
    /// ceiling are not included.
    pub outlier_count: usize,
    /// Flags per calendar day, most anomalous first.
    pub daily_counts: Vec<DayCount>,
}

impl AnomalyTable {
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Trend
// ============================================================================

/// Direction of the first-day vs last-day comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Degrading,
    Improving,
    #[default]
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Degrading => write!(f, "degrading"),
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Informational trend signal on a key parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendCheck {
    pub parameter: String,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub first_mean: f64,
    pub last_mean: f64,
    pub change_pct: f64,
    pub trend: Trend,
}

// ============================================================================
// Summary
// ============================================================================

/// Cross-parameter roll-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnomalySummary {
    pub total_rows: usize,
    /// Sum of per-parameter counts; a row flagged twice counts twice.
    pub total_flags: usize,
    pub flagged_pct: f64,
    pub parameters_with_anomalies: usize,
    pub per_parameter: BTreeMap<String, usize>,
    /// Statistical outliers per parameter, ceiling-only rows excluded.
    pub outliers_per_parameter: BTreeMap<String, usize>,
    /// Calendar days ranked by flag count, ties by ascending date.
    pub most_anomalous_days: Vec<DayCount>,
}

impl AnomalySummary {
    /// Count recorded for `parameter`, zero when it was not analysed.
    pub fn count_for(&self, parameter: &str) -> usize {
        self.per_parameter.get(parameter).copied().unwrap_or(0)
    }

    /// Statistical outlier count for `parameter`, zero when not analysed.
    pub fn outliers_for(&self, parameter: &str) -> usize {
        self.outliers_per_parameter.get(parameter).copied().unwrap_or(0)
    }
}

/// Mean / min / max of a ratio between two columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatioStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}
