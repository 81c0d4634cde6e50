//! Reporter
//!
//! Pretty JSON of the full report, or a sectioned plain-text summary for
//! the shift log. Parameter names are printed with their spreadsheet labels.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::ingest::display_label;
use crate::pipeline::{DomainReport, FurnaceReport, PressReport};
use crate::types::{Priority, Recommendation, ReportIssue};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which renderings to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
    Both,
}

pub fn to_json(report: &DomainReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

const RULE: &str = "============================================================";

/// Plain-text summary of a report.
pub fn render_text(report: &DomainReport) -> String {
    let mut out = String::new();
    let (total, band) = report.total_score();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{} HEALTH REPORT", report.domain().to_string().to_uppercase());
    let _ = writeln!(out, "{RULE}");

    match report {
        DomainReport::Press(r) => render_press(&mut out, r),
        DomainReport::Furnace(r) => render_furnace(&mut out, r),
    }

    section(&mut out, "COMPOSITE SCORE");
    let _ = writeln!(out, "  Total: {total:.1}/100 ({band})");

    render_recommendations(&mut out, report.recommendations());
    render_issues(&mut out, report.issues());
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{}", "-".repeat(title.len()));
}

fn render_data_summary(
    out: &mut String,
    plant: &str,
    machine: &str,
    period: (Option<chrono::NaiveDateTime>, Option<chrono::NaiveDateTime>),
    cleaning: &crate::repair::CleaningReport,
) {
    section(out, "DATA SUMMARY");
    let _ = writeln!(out, "  Plant: {plant}");
    if !machine.is_empty() {
        let _ = writeln!(out, "  Machine: {machine}");
    }
    if let (Some(start), Some(end)) = period {
        let _ = writeln!(out, "  Period: {start} .. {end}");
    }
    let _ = writeln!(
        out,
        "  Rows: {} ({} dropped), repaired values: {}, filled gaps: {}",
        cleaning.final_rows, cleaning.dropped_rows, cleaning.repaired_values, cleaning.filled_missing
    );
    for survey in &cleaning.outlier_survey {
        let _ = writeln!(
            out,
            "  IQR outliers {:<32} {:>6} ({:.2}%)",
            display_label(&survey.column),
            survey.count,
            survey.pct
        );
    }
}

fn render_press(out: &mut String, r: &PressReport) {
    render_data_summary(out, &r.plant, &r.machine, (r.period_start, r.period_end), &r.cleaning);

    section(out, "ANOMALIES");
    let summary = &r.anomalies.summary;
    let _ = writeln!(
        out,
        "  {} flags over {} rows ({:.2}%)",
        summary.total_flags, summary.total_rows, summary.flagged_pct
    );
    for table in &r.anomalies.tables {
        let _ = writeln!(
            out,
            "  {:<32} {:>6} ({} critical)",
            display_label(&table.parameter),
            table.count(),
            table.critical_count
        );
    }
    let trend = &r.anomalies.fill_time_trend;
    let _ = writeln!(out, "  Fill time trend: {} ({:+.1}%)", trend.trend, trend.change_pct);
    if let Some(mold) = r.anomalies.slowest_molds.first() {
        let _ = writeln!(out, "  Slowest mold: {} ({} shots)", mold.mold, mold.shots);
    }

    let p = &r.performance;
    section(out, "PERFORMANCE");
    let _ = writeln!(
        out,
        "  Cycle: mean {:.0} ms, {:.1}% at or below target, {:.1}% over ceiling",
        p.cycle.mean_ms, p.cycle.within_target_pct, p.cycle.over_ceiling_pct
    );
    let _ = writeln!(
        out,
        "  Capacity: {:.0} shots/hour, {:.0} shots/day",
        p.cycle.hourly_capacity, p.cycle.daily_capacity
    );
    let _ = writeln!(
        out,
        "  Efficiency: {:.1}% over {} day(s) ({})",
        p.efficiency.efficiency_pct, p.efficiency.period_days, p.efficiency.level
    );
    let _ = writeln!(out, "  Quality: {:.1}% ({})", p.quality.quality_pct, p.quality.band);
    let h = &p.health;
    let _ = writeln!(
        out,
        "  Scores: cycle {:.1}, anomaly {:.1}, efficiency {:.1}, quality {:.1}",
        h.cycle_score, h.anomaly_score, h.efficiency_score, h.quality_score
    );
}

fn render_furnace(out: &mut String, r: &FurnaceReport) {
    render_data_summary(out, &r.plant, &r.machine, (r.period_start, r.period_end), &r.cleaning);

    section(out, "ANOMALIES");
    let a = &r.anomalies;
    let _ = writeln!(
        out,
        "  {} flags over {} rows ({:.2}%)",
        a.summary.total_flags, a.summary.total_rows, a.summary.flagged_pct
    );
    for table in a.tables.iter().chain(&a.setpoint_deviations).filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "  {:<32} {:>6}", display_label(&table.parameter), table.count());
    }
    for jump in a.sudden_changes.iter().filter(|j| j.count > 0) {
        let _ = writeln!(out, "  Sudden changes on {}: {}", display_label(&jump.sensor), jump.count);
    }
    for hot in &a.high_power {
        let _ = writeln!(out, "  High power on {}: {:.1}% of rows", display_label(&hot.column), hot.share_pct);
    }
    let _ = writeln!(out, "  Cooling order violations: {}", a.cooling_order.total_violations);

    let p = &r.performance;
    section(out, "PERFORMANCE");
    let _ = writeln!(
        out,
        "  Temperature control: {:.1}% within {:.0} C",
        p.temperature.average_success_pct, p.temperature.tolerance_c
    );
    if let Some(e) = &p.energy {
        let _ = writeln!(out, "  Energy: mean power {:.1}% ({}), score {:.1}", e.mean_power_pct, e.status, e.score);
    }
    if let Some(c) = &p.cooling {
        let _ = writeln!(
            out,
            "  Cooling: drop {:.0} C, score {:.1}{}",
            c.delta,
            c.score,
            if c.balanced { "" } else { " (stages unbalanced)" }
        );
    }
    let _ = writeln!(
        out,
        "  Zone balance: max difference {:.0} C, score {:.1}",
        p.zone_balance.max_difference, p.zone_balance.score
    );
    let _ = writeln!(
        out,
        "  Consistency: {} records over {} day(s), {:.1}% of expected, score {:.0}",
        p.consistency.records, p.consistency.period_days, p.consistency.record_ratio_pct, p.consistency.score
    );
    let c = &p.composite;
    let _ = writeln!(
        out,
        "  Scores: temperature {:.1}, energy {:.1}, cooling {:.1}",
        c.temperature_score, c.energy_score, c.cooling_score
    );
}

fn render_recommendations(out: &mut String, recs: &[Recommendation]) {
    section(out, "RECOMMENDATIONS");
    if recs.is_empty() {
        let _ = writeln!(out, "  None, no action needed");
        return;
    }
    let count = |p: Priority| recs.iter().filter(|r| r.priority == p).count();
    let _ = writeln!(
        out,
        "  HIGH: {}, MEDIUM: {}, LOW: {}",
        count(Priority::High),
        count(Priority::Medium),
        count(Priority::Low)
    );
    for (i, r) in recs.iter().enumerate() {
        let _ = writeln!(out, "  {}. [{}] {}: {}", i + 1, r.priority, r.category, r.problem);
        let _ = writeln!(out, "     Action: {} ({})", r.action, r.duration);
    }
}

fn render_issues(out: &mut String, issues: &[ReportIssue]) {
    if issues.is_empty() {
        return;
    }
    section(out, "ISSUES");
    for issue in issues {
        let _ = writeln!(out, "  {issue}");
    }
}

/// Write the report into `dir` as `<domain>_report.json` / `.txt`.
pub fn write_reports(report: &DomainReport, dir: &Path, format: ReportFormat) -> Result<Vec<PathBuf>, ReportError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ReportError::Io { path, source }
    };
    fs::create_dir_all(dir).map_err(io_err(dir))?;

    let stem = format!("{}_report", report.domain());
    let mut written = Vec::new();
    if matches!(format, ReportFormat::Json | ReportFormat::Both) {
        let path = dir.join(format!("{stem}.json"));
        fs::write(&path, to_json(report)?).map_err(io_err(&path))?;
        written.push(path);
    }
    if matches!(format, ReportFormat::Text | ReportFormat::Both) {
        let path = dir.join(format!("{stem}.txt"));
        fs::write(&path, render_text(report)).map_err(io_err(&path))?;
        written.push(path);
    }
    for path in &written {
        info!(path = %path.display(), "Report written");
    }
    Ok(written)
}
