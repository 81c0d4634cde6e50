//! CSV loader for plant spreadsheet exports
//!
//! - Quote-aware field splitting (commas inside quoted cells)
//! - Header mapping to neutral ids, duplicate headers suffixed `_2`, `_3`
//! - Timestamp parsing with a separate `SAAT` time-of-day column merged in
//! - A leftover second header row (first cell `tarih`) is dropped
//! - Decimal commas accepted; mostly non-numeric columns kept as text
//! - Rows sorted by timestamp (stable)

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::columns::{HeaderMapper, TIME_OF_DAY};
use crate::types::fields::TIMESTAMP;
use crate::types::{Column, Dataset, DatasetError};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no header row found")]
    Empty,

    #[error("no timestamp column (looked for TARİH / timestamp headers)")]
    NoTimestamp,

    #[error("timestamp column could not be parsed (first value: `{sample}`)")]
    Timestamp { sample: String },

    #[error("header pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// What the loader did to the raw file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngestReport {
    pub rows: usize,
    pub columns: usize,
    /// Repeated header rows dropped from the body.
    pub header_rows_dropped: usize,
    /// Rows dropped because their timestamp could not be parsed.
    pub bad_timestamps: usize,
    pub text_columns: Vec<String>,
    /// (raw header, neutral id)
    pub mapped_headers: Vec<(String, String)>,
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields; `""` inside quotes is a quote.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Cell parsing
// ============================================================================

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a timestamp cell; date-only cells land on midnight.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_time_of_day(cell: &str) -> Option<NaiveTime> {
    let s = cell.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse a numeric cell, accepting a decimal comma.
pub fn parse_number(cell: &str) -> Option<f64> {
    let s = cell.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s == "-" {
        return None;
    }
    s.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_repeated_header(fields: &[String]) -> bool {
    fields
        .first()
        .is_some_and(|c| c.trim().trim_matches('"').eq_ignore_ascii_case("tarih"))
}

// ============================================================================
// Loading
// ============================================================================

/// Read and parse a CSV export.
pub fn load_csv(path: impl AsRef<Path>) -> Result<(Dataset, IngestReport), IngestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (dataset, report) = parse_csv(&content)?;
    info!(
        file = %path.display(),
        rows = report.rows,
        columns = report.columns,
        dropped_headers = report.header_rows_dropped,
        bad_timestamps = report.bad_timestamps,
        "CSV loaded"
    );
    Ok((dataset, report))
}

/// Parse CSV text into a dataset keyed by neutral ids.
pub fn parse_csv(content: &str) -> Result<(Dataset, IngestReport), IngestError> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or(IngestError::Empty)?;

    let mapper = HeaderMapper::new()?;
    let mut report = IngestReport::default();
    let mut ids: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for raw in split_line(header) {
        let base = mapper.map(&raw);
        let mut id = base.clone();
        let mut n = 2;
        while !seen.insert(id.clone()) {
            id = format!("{base}_{n}");
            n += 1;
        }
        report.mapped_headers.push((raw.trim().to_string(), id.clone()));
        ids.push(id);
    }

    let ts_idx = ids.iter().position(|c| c == TIMESTAMP).ok_or(IngestError::NoTimestamp)?;
    let tod_idx = ids.iter().position(|c| c == TIME_OF_DAY);

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); ids.len()];
    let mut timestamps = Vec::new();
    let mut first_bad: Option<String> = None;
    for line in lines {
        let mut fields = split_line(line);
        if is_repeated_header(&fields) {
            report.header_rows_dropped += 1;
            continue;
        }
        fields.resize(ids.len(), String::new());

        let Some(mut ts) = parse_timestamp(&fields[ts_idx]) else {
            report.bad_timestamps += 1;
            first_bad.get_or_insert_with(|| fields[ts_idx].clone());
            continue;
        };
        if let Some(t) = tod_idx.and_then(|i| parse_time_of_day(&fields[i])) {
            ts = ts.date().and_time(t);
        }
        timestamps.push(ts);
        for (col, field) in cells.iter_mut().zip(fields) {
            col.push(field);
        }
    }

    if timestamps.is_empty() && report.bad_timestamps > 0 {
        return Err(IngestError::Timestamp {
            sample: first_bad.unwrap_or_default(),
        });
    }
    if report.bad_timestamps > 0 {
        warn!(rows = report.bad_timestamps, "Dropped rows with unparseable timestamps");
    }

    let mut dataset = Dataset::new();
    for (i, (id, raw)) in ids.iter().zip(cells).enumerate() {
        if i == ts_idx {
            dataset.insert(id.clone(), Column::Timestamp(timestamps.clone()))?;
            continue;
        }
        if Some(i) == tod_idx {
            continue;
        }
        dataset.insert(id.clone(), typed_column(id, raw, &mut report))?;
    }

    report.rows = dataset.row_count();
    report.columns = dataset.column_names().len();
    Ok((dataset.sorted_by_timestamp(), report))
}

/// Numeric when at least half of the non-empty cells parse as numbers.
fn typed_column(id: &str, raw: Vec<String>, report: &mut IngestReport) -> Column {
    let parsed: Vec<Option<f64>> = raw.iter().map(|c| parse_number(c)).collect();
    let non_empty = raw.iter().filter(|c| !c.trim().is_empty()).count();
    let numeric = parsed.iter().filter(|v| v.is_some()).count();
    if non_empty == 0 || numeric * 2 >= non_empty {
        Column::Numeric(parsed)
    } else {
        report.text_columns.push(id.to_string());
        Column::Text(
            raw.into_iter()
                .map(|c| {
                    let t = c.trim().to_string();
                    (!t.is_empty()).then_some(t)
                })
                .collect(),
        )
    }
}
