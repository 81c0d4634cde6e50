//! Stage orchestration for one dataset

use thiserror::Error;
use tracing::{info, warn};

use super::report::{DomainReport, FurnaceReport, PressReport};
use crate::advisor::{advise, furnace_rules, press_rules};
use crate::config::AnalysisConfig;
use crate::types::fields::{self, furnace, press};
use crate::types::{Dataset, DatasetError, Domain, ReportIssue};
use crate::{anomaly, repair, scoring};

/// Fatal pipeline failures. Everything else ends up in the report's issues.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("{domain}: no rows left to analyse after cleaning")]
    NoRows { domain: Domain },
}

/// Analyse a dataset of the given domain.
pub fn analyze(domain: Domain, dataset: &Dataset, config: &AnalysisConfig) -> Result<DomainReport, PipelineError> {
    match domain {
        Domain::Press => analyze_press(dataset, config).map(DomainReport::Press),
        Domain::Furnace => analyze_furnace(dataset, config).map(DomainReport::Furnace),
    }
}

/// Press: required columns, cleaning, anomalies, scoring, advice.
pub fn analyze_press(dataset: &Dataset, config: &AnalysisConfig) -> Result<PressReport, PipelineError> {
    dataset.require(Domain::Press, &press::REQUIRED)?;

    let (cleaned, cleaning) = repair::clean_press(dataset)?;
    if cleaned.is_empty() {
        return Err(PipelineError::NoRows { domain: Domain::Press });
    }
    let mut issues: Vec<ReportIssue> = cleaning.notes.clone();
    issues.extend(cleaning.failure_issues());

    let anomalies = anomaly::press::analyze(&cleaned, &config.press, &mut issues)?;
    let performance = scoring::press::score(&cleaned, &anomalies.summary, config, &mut issues)?;
    issues.extend(performance.health.out_of_range_issues());
    if performance.efficiency.efficiency_pct > 100.0 {
        issues.push(ReportIssue::data_quality(
            "efficiency_pct",
            format!(
                "score_out_of_range: efficiency {:.1}% above 100%",
                performance.efficiency.efficiency_pct
            ),
        ));
    }

    let recommendations = advise(&press_rules(&config.advisor.press), &performance);
    log_outcome(Domain::Press, performance.health.total, recommendations.len(), &issues);

    let span = cleaned.time_span();
    Ok(PressReport {
        plant: config.site.plant.clone(),
        machine: config.site.press_name.clone(),
        period_start: span.map(|s| s.0),
        period_end: span.map(|s| s.1),
        cleaning,
        anomalies,
        performance,
        recommendations,
        issues,
    })
}

/// Furnace: required columns, repair, anomalies, scoring, advice.
///
/// Columns that fail repair are excluded from every later stage.
pub fn analyze_furnace(dataset: &Dataset, config: &AnalysisConfig) -> Result<FurnaceReport, PipelineError> {
    require_furnace(dataset)?;

    let (cleaned, cleaning) = repair::clean_furnace(dataset, config)?;
    if cleaned.is_empty() {
        return Err(PipelineError::NoRows { domain: Domain::Furnace });
    }
    let mut issues: Vec<ReportIssue> = cleaning.notes.clone();
    issues.extend(cleaning.failure_issues());

    let failed: Vec<String> = cleaning.failed_columns().into_iter().map(String::from).collect();
    let excluded: Vec<&str> = failed.iter().map(String::as_str).collect();
    for column in &excluded {
        warn!(column = %column, "Column excluded from analysis after repair failure");
    }

    let anomalies = anomaly::furnace::analyze(&cleaned, &config.furnace, &excluded, &mut issues)?;
    let performance = scoring::furnace::score(&cleaned, config, &excluded, &mut issues)?;
    issues.extend(performance.composite.out_of_range_issues());

    let recommendations = advise(&furnace_rules(&config.advisor.furnace), &performance);
    log_outcome(Domain::Furnace, performance.composite.total, recommendations.len(), &issues);

    let span = cleaned.time_span();
    Ok(FurnaceReport {
        plant: config.site.plant.clone(),
        machine: config.site.furnace_name.clone(),
        period_start: span.map(|s| s.0),
        period_end: span.map(|s| s.1),
        cleaning,
        anomalies,
        performance,
        recommendations,
        issues,
    })
}

/// Named furnace columns plus at least one power column, all missing
/// ones reported together.
fn require_furnace(dataset: &Dataset) -> Result<(), DatasetError> {
    let mut missing = match dataset.require(Domain::Furnace, &furnace::required()) {
        Ok(()) => Vec::new(),
        Err(DatasetError::MissingColumns { columns, .. }) => columns,
        Err(e) => return Err(e),
    };
    if !dataset.column_names().iter().any(|n| fields::is_power(n)) {
        missing.push(furnace::POWER_COLUMNS.to_string());
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DatasetError::MissingColumns {
            domain: Domain::Furnace,
            columns: missing,
        })
    }
}

fn log_outcome(domain: Domain, total: f64, recommendations: usize, issues: &[ReportIssue]) {
    info!(
        domain = %domain,
        score = total,
        recommendations,
        issues = issues.len(),
        "Analysis complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    #[test]
    fn test_missing_press_columns_fail_fast() {
        let ds = Dataset::new()
            .with_column(press::FILL_TIME, Column::Numeric(vec![Some(800.0)]))
            .unwrap();
        let err = analyze_press(&ds, &AnalysisConfig::default()).unwrap_err();
        match err {
            PipelineError::Dataset(DatasetError::MissingColumns { domain, columns }) => {
                assert_eq!(domain, Domain::Press);
                assert!(columns.contains(&press::PISTON_PRESSURE.to_string()));
                assert!(!columns.contains(&press::FILL_TIME.to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_furnace_columns_fail_fast() {
        let err = analyze(Domain::Furnace, &Dataset::new(), &AnalysisConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("furnace: required column(s) missing"));
    }

    fn named_furnace_columns() -> Dataset {
        let mut ds = Dataset::new();
        for name in furnace::required() {
            let column = if name == fields::TIMESTAMP {
                Column::Timestamp(Vec::new())
            } else {
                Column::Numeric(Vec::new())
            };
            ds.insert(name, column).unwrap();
        }
        ds
    }

    #[test]
    fn test_furnace_without_power_columns_fails_fast() {
        let err = analyze_furnace(&named_furnace_columns(), &AnalysisConfig::default()).unwrap_err();
        match err {
            PipelineError::Dataset(DatasetError::MissingColumns { domain, columns }) => {
                assert_eq!(domain, Domain::Furnace);
                assert_eq!(columns, vec![furnace::POWER_COLUMNS.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_one_power_column_satisfies_furnace_schema() {
        let mut ds = named_furnace_columns();
        ds.insert("zone1_power_pct", Column::Numeric(Vec::new())).unwrap();
        // Schema passes; the empty dataset then fails on row count
        let err = analyze_furnace(&ds, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NoRows { domain: Domain::Furnace }));
    }
}
