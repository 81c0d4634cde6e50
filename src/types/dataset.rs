//! Tabular dataset: the in-memory table handed between pipeline stages
//!
//! Column-oriented storage keyed by neutral field ids (`fill_time_ms`,
//! `zone2_upper1_temp`, ...). Numeric cells are `Option<f64>` so that a
//! missing reading is explicit instead of a magic value.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::fields::TIMESTAMP;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised when a stage asks the dataset for something it does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// Required columns are absent. Fatal for the domain being analyzed.
    #[error("{domain}: required column(s) missing: {}", .columns.join(", "))]
    MissingColumns { domain: Domain, columns: Vec<String> },

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("column `{column}` is not {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("column `{column}` has {found} rows, dataset has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

// ============================================================================
// Domain
// ============================================================================

/// Machine family a dataset was exported from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Press,
    Furnace,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Press => write!(f, "press"),
            Domain::Furnace => write!(f, "furnace"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "press" | "injection" | "injection_press" => Ok(Domain::Press),
            "furnace" | "oven" => Ok(Domain::Furnace),
            other => Err(format!("unknown domain '{other}' (expected 'press' or 'furnace')")),
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Timestamp(Vec<NaiveDateTime>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Timestamp(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder the column with a permutation of row indices.
    fn permute(&self, order: &[usize]) -> Self {
        match self {
            Column::Numeric(v) => Column::Numeric(order.iter().map(|&i| v[i]).collect()),
            Column::Timestamp(v) => Column::Timestamp(order.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(order.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Rows x named columns. All columns share one row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: HashMap<String, Column>,
    rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used heavily by fixtures.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, DatasetError> {
        self.insert(name, column)?;
        Ok(self)
    }

    /// Insert or replace a column. The first column fixes the row count.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<(), DatasetError> {
        let name = name.into();
        if self.names.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(DatasetError::LengthMismatch {
                column: name,
                expected: self.rows,
                found: column.len(),
            });
        }
        if !self.columns.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Replace the values of an existing numeric column.
    pub fn replace_numeric(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), DatasetError> {
        match self.columns.get(name) {
            Some(Column::Numeric(_)) => self.insert(name, Column::Numeric(values)),
            Some(_) => Err(DatasetError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric",
            }),
            None => Err(DatasetError::UnknownColumn(name.to_string())),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], DatasetError> {
        match self.columns.get(name) {
            Some(Column::Numeric(v)) => Ok(v),
            Some(_) => Err(DatasetError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric",
            }),
            None => Err(DatasetError::UnknownColumn(name.to_string())),
        }
    }

    pub fn text(&self, name: &str) -> Result<&[Option<String>], DatasetError> {
        match self.columns.get(name) {
            Some(Column::Text(v)) => Ok(v),
            Some(_) => Err(DatasetError::TypeMismatch {
                column: name.to_string(),
                expected: "text",
            }),
            None => Err(DatasetError::UnknownColumn(name.to_string())),
        }
    }

    /// The dataset's timestamp column.
    pub fn timestamps(&self) -> Result<&[NaiveDateTime], DatasetError> {
        match self.columns.get(TIMESTAMP) {
            Some(Column::Timestamp(v)) => Ok(v),
            Some(_) => Err(DatasetError::TypeMismatch {
                column: TIMESTAMP.to_string(),
                expected: "a timestamp column",
            }),
            None => Err(DatasetError::UnknownColumn(TIMESTAMP.to_string())),
        }
    }

    /// Numeric column names accepted by `pred`, in insertion order.
    pub fn numeric_columns_where<F>(&self, pred: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        self.names
            .iter()
            .filter(|n| matches!(self.columns.get(n.as_str()), Some(Column::Numeric(_))))
            .filter(|n| pred(n.as_str()))
            .cloned()
            .collect()
    }

    /// Fail fast when any of `required` is absent.
    pub fn require(&self, domain: Domain, required: &[&str]) -> Result<(), DatasetError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.columns.contains_key(**c))
            .map(|c| (*c).to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::MissingColumns {
                domain,
                columns: missing,
            })
        }
    }

    /// Copy of the dataset with rows ordered by timestamp (stable).
    ///
    /// Datasets without a timestamp column are returned unchanged.
    pub fn sorted_by_timestamp(&self) -> Self {
        let Ok(ts) = self.timestamps() else {
            return self.clone();
        };
        let mut order: Vec<usize> = (0..self.rows).collect();
        order.sort_by_key(|&i| ts[i]);
        if order.iter().enumerate().all(|(pos, &i)| pos == i) {
            return self.clone();
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.permute(&order)))
            .collect();
        Self {
            names: self.names.clone(),
            columns,
            rows: self.rows,
        }
    }

    /// Copy of the dataset keeping only rows where `keep` is true.
    pub fn retain_rows(&self, keep: &[bool]) -> Self {
        let order: Vec<usize> = (0..self.rows)
            .filter(|&i| keep.get(i).copied().unwrap_or(true))
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.permute(&order)))
            .collect();
        Self {
            names: self.names.clone(),
            columns,
            rows: order.len(),
        }
    }

    /// (first, last) timestamp of the dataset.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let ts = self.timestamps().ok()?;
        let first = ts.iter().min()?;
        let last = ts.iter().max()?;
        Some((*first, *last))
    }
}

/// Calendar day of a reading, used for daily grouping.
pub fn calendar_date(ts: &NaiveDateTime) -> NaiveDate {
    ts.date()
}

/// Whole days covered by a span, counted inclusively (`days + 1`).
pub fn period_days(first: NaiveDateTime, last: NaiveDateTime) -> i64 {
    (last - first).num_days() + 1
}
