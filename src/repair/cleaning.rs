//! Dataset cleaning per machine, with a cleaning report
//!
//! Furnace: every temperature column is repaired against the physical
//! range and power columns are gap-filled, then gaps in the record stream
//! and large set-point deviations are noted. Press: negative and zero
//! readings are noted and every numeric column is gap-filled. Both sort by
//! timestamp, drop rows with no numeric reading at all and survey IQR
//! outliers per measurement column.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::interpolate::{fill_gaps, repair, RepairFailure};
use crate::config::defaults::{SURVEY_IQR_K, SURVEY_MIN_PCT};
use crate::config::AnalysisConfig;
use crate::detection::outliers::detect;
use crate::types::fields::{self, furnace, press};
use crate::types::{Dataset, DatasetError, OutlierMethod, ReportIssue};

/// What repair did to one column.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRepair {
    pub repaired: usize,
    pub filled_missing: usize,
}

/// IQR outliers found in one column during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnOutliers {
    pub column: String,
    pub count: usize,
    pub pct: f64,
}

/// Cleaning summary. Feeds the report, never the anomaly counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleaningReport {
    pub initial_rows: usize,
    pub final_rows: usize,
    pub dropped_rows: usize,
    /// Out-of-range values replaced across all columns.
    pub repaired_values: usize,
    pub filled_missing: usize,
    /// Only columns that needed repair or gap filling.
    pub per_column: BTreeMap<String, ColumnRepair>,
    pub failures: Vec<RepairFailure>,
    pub notes: Vec<ReportIssue>,
    /// Columns with more than 1 % IQR outliers, most first.
    pub outlier_survey: Vec<ColumnOutliers>,
}

impl CleaningReport {
    /// Columns left unrepaired; scoring must skip them.
    pub fn failed_columns(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.column.as_str()).collect()
    }

    fn record(&mut self, column: &str, repaired: usize, filled_missing: usize) {
        if repaired == 0 && filled_missing == 0 {
            return;
        }
        self.repaired_values += repaired;
        self.filled_missing += filled_missing;
        let entry = self.per_column.entry(column.to_string()).or_default();
        entry.repaired += repaired;
        entry.filled_missing += filled_missing;
    }

    /// Failures as report issues.
    pub fn failure_issues(&self) -> Vec<ReportIssue> {
        self.failures
            .iter()
            .map(|f| ReportIssue::repair_failure(&f.column, &f.reason))
            .collect()
    }
}

/// Drop rows where every numeric column is missing.
fn drop_empty_rows(dataset: &Dataset) -> Result<Dataset, DatasetError> {
    let numeric = dataset.numeric_columns_where(|_| true);
    if numeric.is_empty() {
        return Ok(dataset.clone());
    }
    let mut keep = vec![false; dataset.row_count()];
    for name in &numeric {
        for (k, v) in keep.iter_mut().zip(dataset.numeric(name)?) {
            *k |= v.is_some();
        }
    }
    Ok(dataset.retain_rows(&keep))
}

/// Gap-fill each of `columns`; columns with nothing to fill from get a note.
fn fill_columns(
    dataset: &mut Dataset,
    columns: &[String],
    report: &mut CleaningReport,
) -> Result<(), DatasetError> {
    for name in columns {
        let values = dataset.numeric(name)?;
        if values.iter().all(Option::is_none) {
            if !values.is_empty() {
                report
                    .notes
                    .push(ReportIssue::data_quality(name, "no readings, gaps left unfilled"));
            }
            continue;
        }
        let (filled, count) = fill_gaps(values);
        if count > 0 {
            debug!(column = %name, filled = count, "Filled missing values");
            report.record(name, 0, count);
            dataset.replace_numeric(name, filled)?;
        }
    }
    Ok(())
}

/// IQR outlier share per column, keeping columns above the survey floor.
fn outlier_survey(dataset: &Dataset, columns: &[String]) -> Result<Vec<ColumnOutliers>, DatasetError> {
    let rows = dataset.row_count();
    if rows == 0 {
        return Ok(Vec::new());
    }
    let mut survey = Vec::new();
    for name in columns {
        let count = detect(dataset.numeric(name)?, OutlierMethod::Iqr, SURVEY_IQR_K)
            .into_iter()
            .filter(|&flagged| flagged)
            .count();
        let pct = count as f64 / rows as f64 * 100.0;
        if count > 0 && pct > SURVEY_MIN_PCT {
            survey.push(ColumnOutliers {
                column: name.clone(),
                count,
                pct,
            });
        }
    }
    survey.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(survey)
}

/// Sort, drop empty rows and start a report.
fn prepare(dataset: &Dataset) -> Result<(Dataset, CleaningReport), DatasetError> {
    let initial_rows = dataset.row_count();
    let cleaned = drop_empty_rows(&dataset.sorted_by_timestamp())?;
    let report = CleaningReport {
        initial_rows,
        final_rows: cleaned.row_count(),
        dropped_rows: initial_rows - cleaned.row_count(),
        ..Default::default()
    };
    if report.dropped_rows > 0 {
        info!(dropped = report.dropped_rows, "Dropped rows with no readings");
    }
    Ok((cleaned, report))
}

// ============================================================================
// Furnace
// ============================================================================

/// Repair temperature columns and note stream gaps and set-point deviations.
pub fn clean_furnace(
    dataset: &Dataset,
    config: &AnalysisConfig,
) -> Result<(Dataset, CleaningReport), DatasetError> {
    // Gaps are checked in arrival order so out-of-order records show up as negative.
    let gap_note = time_gap_note(dataset, config.furnace.max_time_gap_min);

    let (mut cleaned, mut report) = prepare(dataset)?;
    report.notes.extend(gap_note);

    let (min, max) = (config.repair.temp_min_c, config.repair.temp_max_c);
    for name in cleaned.numeric_columns_where(fields::is_temp) {
        let outcome = repair(&name, cleaned.numeric(&name)?, min, max);
        match outcome {
            Ok(out) => {
                if out.repaired_count == 0 && out.filled_missing == 0 {
                    continue;
                }
                debug!(column = %name, repaired = out.repaired_count, filled = out.filled_missing, "Repaired column");
                report.record(&name, out.repaired_count, out.filled_missing);
                cleaned.replace_numeric(&name, out.values)?;
            }
            Err(failure) => {
                warn!(column = %name, reason = %failure.reason, "Repair failed, column excluded from scoring");
                report.failures.push(failure);
            }
        }
    }

    if report.repaired_values > 0 {
        info!(
            repaired = report.repaired_values,
            columns = report.per_column.len(),
            "Sensor faults repaired"
        );
    }

    let power = cleaned.numeric_columns_where(fields::is_power);
    fill_columns(&mut cleaned, &power, &mut report)?;

    let failed: Vec<String> = report.failed_columns().into_iter().map(String::from).collect();
    report.notes.extend(setpoint_deviation_notes(
        &cleaned,
        config.furnace.setpoint_deviation_c,
        &failed,
    )?);

    let sensors = cleaned.numeric_columns_where(|n| fields::is_actual_temp(n) && !failed.iter().any(|f| f == n));
    report.outlier_survey = outlier_survey(&cleaned, &sensors)?;
    Ok((cleaned, report))
}

fn time_gap_note(dataset: &Dataset, max_gap_min: f64) -> Option<ReportIssue> {
    let ts = dataset.timestamps().ok()?;
    let mut negative = 0;
    let mut long = 0;
    let mut longest = 0.0_f64;
    for w in ts.windows(2) {
        let minutes = (w[1] - w[0]).num_seconds() as f64 / 60.0;
        if minutes < 0.0 {
            negative += 1;
        } else if minutes > max_gap_min {
            long += 1;
            longest = longest.max(minutes);
        }
    }
    if negative == 0 && long == 0 {
        return None;
    }
    warn!(negative, long, "Irregular gaps in the record stream");
    Some(ReportIssue::data_quality(
        fields::TIMESTAMP,
        format!(
            "{long} gap(s) longer than {max_gap_min} min (longest {longest:.0} min), {negative} out-of-order record(s)"
        ),
    ))
}

/// Pairs with an unrepairable column are skipped; their sentinels are not deviations.
fn setpoint_deviation_notes(
    dataset: &Dataset,
    limit: f64,
    failed: &[String],
) -> Result<Vec<ReportIssue>, DatasetError> {
    let mut notes = Vec::new();
    for pair in &furnace::ZONE_PAIRS {
        if !dataset.has_column(pair.set_id) || !dataset.has_column(pair.actual_id) {
            continue;
        }
        if failed.iter().any(|f| f == pair.set_id || f == pair.actual_id) {
            continue;
        }
        let set = dataset.numeric(pair.set_id)?;
        let actual = dataset.numeric(pair.actual_id)?;
        let count = set
            .iter()
            .zip(actual)
            .filter(|(s, a)| matches!((s, a), (Some(s), Some(a)) if (s - a).abs() > limit))
            .count();
        if count > 0 {
            notes.push(ReportIssue::data_quality(
                pair.name,
                format!("{count} reading(s) deviate more than {limit} degC from set-point"),
            ));
        }
    }
    Ok(notes)
}

// ============================================================================
// Press
// ============================================================================

/// Columns where a zero reading means the shot was not recorded.
const ZERO_SUSPECT: [&str; 4] = [
    press::PHASE1_SPEED,
    press::PHASE2_SPEED,
    press::FILL_TIME,
    press::SPECIFIC_PRESSURE,
];

/// Identifier columns, left out of the outlier survey.
fn is_press_identifier(name: &str) -> bool {
    name == press::MOLD_NO || name == press::SHOT_NO
}

/// Sort, drop empty rows, note negative or zero readings and gap-fill.
pub fn clean_press(dataset: &Dataset) -> Result<(Dataset, CleaningReport), DatasetError> {
    let (mut cleaned, mut report) = prepare(dataset)?;

    let numeric = cleaned.numeric_columns_where(|_| true);
    for name in &numeric {
        let values = cleaned.numeric(name)?;
        let negative = values.iter().filter(|v| matches!(v, Some(x) if *x < 0.0)).count();
        if negative > 0 {
            report.notes.push(ReportIssue::data_quality(
                name,
                format!("{negative} negative value(s)"),
            ));
        }
        if ZERO_SUSPECT.contains(&name.as_str()) {
            let zeros = values.iter().filter(|v| matches!(v, Some(x) if *x == 0.0)).count();
            if zeros > 0 {
                report.notes.push(ReportIssue::data_quality(
                    name,
                    format!("{zeros} zero value(s)"),
                ));
            }
        }
    }

    if !report.notes.is_empty() {
        warn!(notes = report.notes.len(), "Press data quality notes");
    }

    fill_columns(&mut cleaned, &numeric, &mut report)?;
    if report.filled_missing > 0 {
        info!(filled = report.filled_missing, "Missing press values filled");
    }

    let measurements: Vec<String> = numeric.into_iter().filter(|n| !is_press_identifier(n)).collect();
    report.outlier_survey = outlier_survey(&cleaned, &measurements)?;
    Ok((cleaned, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(8, minute, 0))
            .unwrap()
    }

    #[test]
    fn test_furnace_repairs_temp_columns_only() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1), ts(2)]))
            .unwrap()
            .with_column("zone1_upper1_temp", Column::Numeric(vec![Some(800.0), Some(-3276.0), Some(820.0)]))
            .unwrap()
            .with_column("zone1_upper1_power_pct", Column::Numeric(vec![Some(60.0), Some(-3276.0), Some(60.0)]))
            .unwrap();
        let (cleaned, report) = clean_furnace(&ds, &AnalysisConfig::default()).unwrap();
        assert_eq!(cleaned.numeric("zone1_upper1_temp").unwrap()[1], Some(810.0));
        assert_eq!(cleaned.numeric("zone1_upper1_power_pct").unwrap()[1], Some(-3276.0));
        assert_eq!(report.repaired_values, 1);
        assert_eq!(report.per_column["zone1_upper1_temp"].repaired, 1);
    }

    #[test]
    fn test_furnace_failure_leaves_column_untouched() {
        let bad = vec![Some(-3276.0), Some(-3276.0)];
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1)]))
            .unwrap()
            .with_column("cooling3_temp", Column::Numeric(bad.clone()))
            .unwrap();
        let (cleaned, report) = clean_furnace(&ds, &AnalysisConfig::default()).unwrap();
        assert_eq!(cleaned.numeric("cooling3_temp").unwrap(), bad.as_slice());
        assert_eq!(report.failed_columns(), vec!["cooling3_temp"]);
        assert_eq!(report.failure_issues().len(), 1);
    }

    #[test]
    fn test_furnace_notes_long_and_negative_gaps() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(45), ts(40)]))
            .unwrap()
            .with_column("preheat_temp", Column::Numeric(vec![Some(1.0), Some(1.0), Some(1.0)]))
            .unwrap();
        let (_, report) = clean_furnace(&ds, &AnalysisConfig::default()).unwrap();
        let note = report
            .notes
            .iter()
            .find(|n| n.subject == fields::TIMESTAMP)
            .unwrap();
        assert!(note.message.starts_with("1 gap(s)"));
        assert!(note.message.contains("1 out-of-order"));
    }

    #[test]
    fn test_press_notes_zero_and_negative() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1), ts(2)]))
            .unwrap()
            .with_column(press::FILL_TIME, Column::Numeric(vec![Some(0.0), Some(700.0), Some(-5.0)]))
            .unwrap()
            .with_column(press::MOLD_NO, Column::Numeric(vec![Some(0.0), Some(1.0), Some(1.0)]))
            .unwrap();
        let (_, report) = clean_press(&ds).unwrap();
        let subjects: Vec<&str> = report.notes.iter().map(|n| n.subject.as_str()).collect();
        assert_eq!(subjects, vec![press::FILL_TIME, press::FILL_TIME]);
    }

    #[test]
    fn test_empty_rows_dropped() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1), ts(2)]))
            .unwrap()
            .with_column(press::FILL_TIME, Column::Numeric(vec![Some(700.0), None, Some(710.0)]))
            .unwrap();
        let (cleaned, report) = clean_press(&ds).unwrap();
        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(report.final_rows, 2);
    }

    #[test]
    fn test_press_gaps_filled_forward_then_backward() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1), ts(2), ts(3)]))
            .unwrap()
            .with_column(press::FILL_TIME, Column::Numeric(vec![None, Some(700.0), None, Some(720.0)]))
            .unwrap()
            .with_column(press::PISTON_PRESSURE, Column::Numeric(vec![Some(4.5), Some(4.6), Some(4.7), None]))
            .unwrap();
        let (cleaned, report) = clean_press(&ds).unwrap();
        assert_eq!(
            cleaned.numeric(press::FILL_TIME).unwrap(),
            &[Some(700.0), Some(700.0), Some(700.0), Some(720.0)]
        );
        assert_eq!(cleaned.numeric(press::PISTON_PRESSURE).unwrap()[3], Some(4.7));
        assert_eq!(report.filled_missing, 3);
        assert_eq!(report.per_column[press::FILL_TIME].filled_missing, 2);
        assert_eq!(report.repaired_values, 0);
    }

    #[test]
    fn test_furnace_power_gaps_filled() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1), ts(2)]))
            .unwrap()
            .with_column("zone1_upper1_temp", Column::Numeric(vec![Some(820.0); 3]))
            .unwrap()
            .with_column("zone1_upper1_power_pct", Column::Numeric(vec![Some(92.0), None, Some(94.0)]))
            .unwrap();
        let (cleaned, report) = clean_furnace(&ds, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            cleaned.numeric("zone1_upper1_power_pct").unwrap(),
            &[Some(92.0), Some(92.0), Some(94.0)]
        );
        assert_eq!(report.per_column["zone1_upper1_power_pct"].filled_missing, 1);
        assert_eq!(report.repaired_values, 0);
    }

    #[test]
    fn test_dead_probe_skips_setpoint_deviation_note() {
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(vec![ts(0), ts(1)]))
            .unwrap()
            .with_column("zone2_upper1_set_temp", Column::Numeric(vec![Some(860.0); 2]))
            .unwrap()
            .with_column("zone2_upper1_temp", Column::Numeric(vec![Some(-3276.0); 2]))
            .unwrap()
            .with_column("zone3_upper1_set_temp", Column::Numeric(vec![Some(880.0); 2]))
            .unwrap()
            .with_column("zone3_upper1_temp", Column::Numeric(vec![Some(800.0); 2]))
            .unwrap();
        let (_, report) = clean_furnace(&ds, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.failed_columns(), vec!["zone2_upper1_temp"]);
        let subjects: Vec<&str> = report.notes.iter().map(|n| n.subject.as_str()).collect();
        assert_eq!(subjects, vec!["zone3_upper1"]);
    }

    #[test]
    fn test_outlier_survey_lists_measurement_columns() {
        let n = 40;
        let stamps: Vec<NaiveDateTime> = (0..n).map(|i| ts(i)).collect();
        let mut fill: Vec<Option<f64>> = (0..n).map(|i| Some(700.0 + f64::from(i % 4) * 5.0)).collect();
        fill[10] = Some(2400.0);
        fill[30] = Some(2500.0);
        let shots: Vec<Option<f64>> = (0..n).map(|i| Some(if i == 5 { 9e6 } else { f64::from(i) })).collect();
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(stamps))
            .unwrap()
            .with_column(press::FILL_TIME, Column::Numeric(fill))
            .unwrap()
            .with_column(press::SHOT_NO, Column::Numeric(shots))
            .unwrap();
        let (_, report) = clean_press(&ds).unwrap();
        assert_eq!(
            report.outlier_survey,
            vec![ColumnOutliers {
                column: press::FILL_TIME.to_string(),
                count: 2,
                pct: 5.0,
            }]
        );
    }

    #[test]
    fn test_outlier_survey_ignores_shares_at_one_percent() {
        // 1 outlier in 100 rows is exactly 1 %, not above it
        let n = 100;
        let stamps: Vec<NaiveDateTime> = (0..n).map(|i| ts(i % 60) + chrono::Duration::hours(i64::from(i / 60))).collect();
        let mut temps: Vec<Option<f64>> = (0..n).map(|i| Some(820.0 + f64::from(i % 3))).collect();
        temps[50] = Some(1500.0);
        let ds = Dataset::new()
            .with_column(fields::TIMESTAMP, Column::Timestamp(stamps))
            .unwrap()
            .with_column("zone1_upper1_temp", Column::Numeric(temps))
            .unwrap();
        let (_, report) = clean_furnace(&ds, &AnalysisConfig::default()).unwrap();
        assert!(report.outlier_survey.is_empty());
    }
}
