//! Per-domain report structures assembled by the pipeline

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::anomaly::{FurnaceAnomalyReport, PressAnomalyReport};
use crate::repair::CleaningReport;
use crate::scoring::{FurnacePerformance, PressPerformance};
use crate::types::{Domain, HealthBand, Recommendation, ReportIssue};

/// Full press analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressReport {
    pub plant: String,
    pub machine: String,
    pub period_start: Option<NaiveDateTime>,
    pub period_end: Option<NaiveDateTime>,
    pub cleaning: CleaningReport,
    pub anomalies: PressAnomalyReport,
    pub performance: PressPerformance,
    pub recommendations: Vec<Recommendation>,
    pub issues: Vec<ReportIssue>,
}

/// Full furnace analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FurnaceReport {
    pub plant: String,
    pub machine: String,
    pub period_start: Option<NaiveDateTime>,
    pub period_end: Option<NaiveDateTime>,
    pub cleaning: CleaningReport,
    pub anomalies: FurnaceAnomalyReport,
    pub performance: FurnacePerformance,
    pub recommendations: Vec<Recommendation>,
    pub issues: Vec<ReportIssue>,
}

/// Either domain's report, tagged with its domain in serialized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DomainReport {
    Press(PressReport),
    Furnace(FurnaceReport),
}

impl DomainReport {
    pub fn domain(&self) -> Domain {
        match self {
            DomainReport::Press(_) => Domain::Press,
            DomainReport::Furnace(_) => Domain::Furnace,
        }
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            DomainReport::Press(r) => &r.recommendations,
            DomainReport::Furnace(r) => &r.recommendations,
        }
    }

    pub fn issues(&self) -> &[ReportIssue] {
        match self {
            DomainReport::Press(r) => &r.issues,
            DomainReport::Furnace(r) => &r.issues,
        }
    }

    pub fn cleaning(&self) -> &CleaningReport {
        match self {
            DomainReport::Press(r) => &r.cleaning,
            DomainReport::Furnace(r) => &r.cleaning,
        }
    }

    /// Composite score and its band.
    pub fn total_score(&self) -> (f64, HealthBand) {
        match self {
            DomainReport::Press(r) => (r.performance.health.total, r.performance.health.band),
            DomainReport::Furnace(r) => (r.performance.composite.total, r.performance.composite.band),
        }
    }
}
