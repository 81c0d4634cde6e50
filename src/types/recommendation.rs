//! Maintenance recommendations and non-fatal report issues

use serde::{Deserialize, Serialize};

/// Recommendation priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::Low => write!(f, "LOW"),
        }
    }
}

/// One maintenance action. Built once by the advisor, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub problem: String,
    pub action: String,
    /// Estimated effort, taken from a fixed lookup table.
    pub duration: String,
}

impl Recommendation {
    pub fn new(
        priority: Priority,
        category: impl Into<String>,
        problem: impl Into<String>,
        action: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            priority,
            category: category.into(),
            problem: problem.into(),
            action: action.into(),
            duration: duration.into(),
        }
    }
}

// ============================================================================
// Report issues
// ============================================================================

/// Kind of a non-fatal failure surfaced in the report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    RepairFailure,
    InsufficientData,
    DataQuality,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::RepairFailure => write!(f, "repair_failure"),
            IssueKind::InsufficientData => write!(f, "insufficient_data"),
            IssueKind::DataQuality => write!(f, "data_quality"),
        }
    }
}

/// Column- or metric-level failure that did not abort the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportIssue {
    pub kind: IssueKind,
    /// Column, parameter or metric the issue is about.
    pub subject: String,
    pub message: String,
}

impl ReportIssue {
    pub fn new(kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn repair_failure(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueKind::RepairFailure, subject, message)
    }

    pub fn insufficient_data(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueKind::InsufficientData, subject, message)
    }

    pub fn data_quality(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueKind::DataQuality, subject, message)
    }
}

impl std::fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}
