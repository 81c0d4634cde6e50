//! Anomaly Aggregator: per-parameter tables and the cross-parameter summary
//!
//! Each parameter runs the outlier detector with its own method and
//! threshold. A hard operational ceiling, when configured, is OR'd with the
//! statistical mask and marks rows critical. Rows flagged on several
//! parameters are counted once per parameter.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::detection::{self, stats};
use crate::types::{
    AnomalySummary, AnomalyTable, ColumnBound, Dataset, DayCount, DetectionMethod, FlaggedRow,
    OutlierMethod, RatioStats, ReportIssue, Trend, TrendCheck,
};

/// How one parameter is screened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub column: String,
    pub method: OutlierMethod,
    /// k for IQR, z for Z-score.
    pub threshold: f64,
    /// Values above this are flagged critical regardless of bounds.
    pub critical_above: Option<f64>,
}

impl ParameterSpec {
    pub fn new(column: impl Into<String>, method: OutlierMethod, threshold: f64) -> Self {
        Self {
            column: column.into(),
            method,
            threshold,
            critical_above: None,
        }
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.critical_above = Some(ceiling);
        self
    }
}

/// Aggregator output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub tables: Vec<AnomalyTable>,
    pub summary: AnomalySummary,
}

/// Run every spec against the dataset.
///
/// Columns in `excluded` (failed repair) and absent columns are skipped with
/// an issue. Columns too short for statistics still get their ceiling check.
pub fn aggregate(
    dataset: &Dataset,
    specs: &[ParameterSpec],
    excluded: &[&str],
    issues: &mut Vec<ReportIssue>,
) -> Aggregation {
    let timestamps = dataset.timestamps().ok();
    let mut tables = Vec::with_capacity(specs.len());

    for spec in specs {
        if excluded.contains(&spec.column.as_str()) {
            debug!(column = %spec.column, "Skipping unrepairable column");
            continue;
        }
        let Ok(values) = dataset.numeric(&spec.column) else {
            issues.push(ReportIssue::insufficient_data(
                &spec.column,
                "column not present, parameter not analysed",
            ));
            continue;
        };

        let (mask, bounds) = match detection::detect_with_bounds(values, spec.method, spec.threshold) {
            Ok(d) => (d.mask, Some(d.bound)),
            Err(e) => {
                issues.push(ReportIssue::insufficient_data(&spec.column, e.to_string()));
                (vec![false; values.len()], None)
            }
        };
        let critical: Vec<bool> = values
            .iter()
            .map(|v| match (v, spec.critical_above) {
                (Some(x), Some(limit)) => *x > limit,
                _ => false,
            })
            .collect();

        let table = build_table(
            &spec.column,
            spec.method.into(),
            spec.threshold,
            bounds,
            spec.critical_above,
            values,
            timestamps,
            &mask,
            &critical,
        );
        debug!(
            parameter = %table.parameter,
            flagged = table.count(),
            critical = table.critical_count,
            "Parameter screened"
        );
        tables.push(table);
    }

    let summary = summarize(dataset.row_count(), &tables);
    info!(
        parameters = tables.len(),
        flags = summary.total_flags,
        pct = summary.flagged_pct,
        "Anomaly aggregation complete"
    );
    Aggregation { tables, summary }
}

/// Assemble a table from a statistical mask and a critical mask.
#[allow(clippy::too_many_arguments)]
pub fn build_table(
    parameter: &str,
    method: DetectionMethod,
    threshold: f64,
    bounds: Option<ColumnBound>,
    critical_above: Option<f64>,
    values: &[Option<f64>],
    timestamps: Option<&[NaiveDateTime]>,
    mask: &[bool],
    critical: &[bool],
) -> AnomalyTable {
    let rows: Vec<FlaggedRow> = values
        .iter()
        .enumerate()
        .filter_map(|(index, v)| {
            let is_critical = critical.get(index).copied().unwrap_or(false);
            let flagged = mask.get(index).copied().unwrap_or(false) || is_critical;
            match v {
                Some(value) if flagged => Some(FlaggedRow {
                    index,
                    timestamp: timestamps.and_then(|ts| ts.get(index).copied()),
                    value: *value,
                    critical: is_critical,
                }),
                _ => None,
            }
        })
        .collect();
    let critical_count = rows.iter().filter(|r| r.critical).count();
    let outlier_count = rows
        .iter()
        .filter(|r| mask.get(r.index).copied().unwrap_or(false))
        .count();
    let daily_counts = daily_counts(&rows);
    AnomalyTable {
        parameter: parameter.to_string(),
        method,
        threshold,
        bounds,
        critical_above,
        rows,
        critical_count,
        outlier_count,
        daily_counts,
    }
}

/// Fixed-limit check: rows whose value exceeds `limit`, all critical.
pub fn threshold_table(
    parameter: &str,
    values: &[Option<f64>],
    timestamps: Option<&[NaiveDateTime]>,
    limit: f64,
) -> AnomalyTable {
    let over: Vec<bool> = values.iter().map(|v| matches!(v, Some(x) if *x > limit)).collect();
    build_table(
        parameter,
        DetectionMethod::Threshold,
        limit,
        None,
        Some(limit),
        values,
        timestamps,
        &over,
        &over,
    )
}

/// Group flagged rows by calendar day, most flags first, ties by date.
pub fn daily_counts(rows: &[FlaggedRow]) -> Vec<DayCount> {
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ts in rows.iter().filter_map(|r| r.timestamp) {
        *by_day.entry(ts.date()).or_default() += 1;
    }
    rank_days(by_day)
}

fn rank_days(by_day: BTreeMap<NaiveDate, usize>) -> Vec<DayCount> {
    let mut days: Vec<DayCount> = by_day
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect();
    // BTreeMap order is ascending date and the sort is stable.
    days.sort_by(|a, b| b.count.cmp(&a.count));
    days
}

/// Cross-parameter summary of a set of tables.
pub fn summarize(total_rows: usize, tables: &[AnomalyTable]) -> AnomalySummary {
    let per_parameter: BTreeMap<String, usize> = tables
        .iter()
        .map(|t| (t.parameter.clone(), t.count()))
        .collect();
    let outliers_per_parameter: BTreeMap<String, usize> = tables
        .iter()
        .map(|t| (t.parameter.clone(), t.outlier_count))
        .collect();
    let total_flags: usize = tables.iter().map(AnomalyTable::count).sum();
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for day in tables.iter().flat_map(|t| &t.daily_counts) {
        *by_day.entry(day.date).or_default() += day.count;
    }
    AnomalySummary {
        total_rows,
        total_flags,
        flagged_pct: if total_rows == 0 {
            0.0
        } else {
            total_flags as f64 / total_rows as f64 * 100.0
        },
        parameters_with_anomalies: tables.iter().filter(|t| !t.is_empty()).count(),
        per_parameter,
        outliers_per_parameter,
        most_anomalous_days: rank_days(by_day),
    }
}

// ============================================================================
// Daily grouping and trend
// ============================================================================

/// Mean of present values per calendar day, ascending by date.
pub fn daily_means(values: &[Option<f64>], timestamps: &[NaiveDateTime]) -> Vec<(NaiveDate, f64)> {
    let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (v, ts) in values.iter().zip(timestamps) {
        if let Some(x) = v.filter(|x| x.is_finite()) {
            groups.entry(ts.date()).or_default().push(x);
        }
    }
    groups
        .into_iter()
        .filter_map(|(date, xs)| stats::mean(&xs).map(|m| (date, m)))
        .collect()
}

/// Compare the first and last daily mean.
///
/// A change above `threshold_pct` is degrading, below `-threshold_pct`
/// improving. A zero first-day mean or fewer than two days is stable with an
/// issue recorded.
pub fn trend_check(
    parameter: &str,
    daily: &[(NaiveDate, f64)],
    threshold_pct: f64,
    issues: &mut Vec<ReportIssue>,
) -> TrendCheck {
    let mut check = TrendCheck {
        parameter: parameter.to_string(),
        first_day: daily.first().map(|d| d.0),
        last_day: daily.last().map(|d| d.0),
        first_mean: daily.first().map_or(0.0, |d| d.1),
        last_mean: daily.last().map_or(0.0, |d| d.1),
        change_pct: 0.0,
        trend: Trend::Stable,
    };
    if daily.len() < 2 {
        issues.push(ReportIssue::insufficient_data(
            parameter,
            format!("trend needs at least 2 days of data, have {}", daily.len()),
        ));
        return check;
    }
    if check.first_mean == 0.0 {
        issues.push(ReportIssue::insufficient_data(
            parameter,
            "first-day mean is zero, trend reported as stable",
        ));
        return check;
    }
    check.change_pct = (check.last_mean - check.first_mean) / check.first_mean * 100.0;
    check.trend = if check.change_pct > threshold_pct {
        Trend::Degrading
    } else if check.change_pct < -threshold_pct {
        Trend::Improving
    } else {
        Trend::Stable
    };
    check
}

// ============================================================================
// Composite checks
// ============================================================================

/// Descriptive statistics of `numerator / denominator` over rows with a
/// present, non-zero denominator.
pub fn ratio_stats(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Option<RatioStats> {
    let ratios: Vec<f64> = numerator
        .iter()
        .zip(denominator)
        .filter_map(|(n, d)| match (n, d) {
            (Some(n), Some(d)) if *d != 0.0 => Some(n / d),
            _ => None,
        })
        .filter(|r| r.is_finite())
        .collect();
    let mean = stats::mean(&ratios)?;
    Some(RatioStats {
        mean,
        min: ratios.iter().copied().fold(f64::INFINITY, f64::min),
        max: ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: ratios.len(),
    })
}

/// Rows breaking one `upper >= lower` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairViolation {
    pub upper: String,
    pub lower: String,
    pub count: usize,
}

/// Monotonic ordering check across an ordered set of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCheck {
    pub pairs: Vec<PairViolation>,
    /// Sum over pairs; a row breaking two pairs counts twice.
    pub total_violations: usize,
}

/// Columns are expected non-increasing in the given order. Rows with a
/// missing value on either side of a pair are not counted for that pair.
pub fn order_violations(dataset: &Dataset, ordered: &[&str]) -> OrderCheck {
    let mut check = OrderCheck::default();
    for pair in ordered.windows(2) {
        let (Ok(upper), Ok(lower)) = (dataset.numeric(pair[0]), dataset.numeric(pair[1])) else {
            continue;
        };
        let count = upper
            .iter()
            .zip(lower)
            .filter(|(u, l)| matches!((u, l), (Some(u), Some(l)) if u < l))
            .count();
        check.total_violations += count;
        check.pairs.push(PairViolation {
            upper: pair[0].to_string(),
            lower: pair[1].to_string(),
            count,
        });
    }
    check
}

/// Consecutive rows whose absolute difference exceeds `limit`.
pub fn sudden_changes(values: &[Option<f64>], limit: f64) -> usize {
    values
        .windows(2)
        .filter(|w| matches!((w[0], w[1]), (Some(a), Some(b)) if (b - a).abs() > limit))
        .count()
}

/// Group keys of a mold / shot column, numeric or text.
pub fn key_column(dataset: &Dataset, name: &str) -> Option<Vec<Option<String>>> {
    if let Ok(values) = dataset.numeric(name) {
        return Some(
            values
                .iter()
                .map(|v| {
                    v.map(|x| {
                        if x.fract() == 0.0 && x.abs() < 1e15 {
                            format!("{}", x as i64)
                        } else {
                            x.to_string()
                        }
                    })
                })
                .collect(),
        );
    }
    dataset.text(name).ok().map(<[Option<String>]>::to_vec)
}

/// Group row indices by key, skipping rows with no key.
pub fn group_rows(keys: &[Option<String>]) -> HashMap<String, Vec<usize>> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, k) in keys.iter().enumerate() {
        if let Some(k) = k {
            groups.entry(k.clone()).or_default().push(i);
        }
    }
    groups
}
