//! Furnace performance scoring
//!
//! Composite = temperature control (50) + energy efficiency (30)
//! + cooling effectiveness (20). Zone balance and operational consistency
//! are reported alongside but do not enter the composite.
//!
//! Columns that failed repair are excluded from every metric.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::curves;
use crate::anomaly::aggregator::daily_means;
use crate::anomaly::furnace::{max_pairwise_difference, row_mean_power, zone_means, ZoneMean};
use crate::config::defaults::{
    COOLING_STAGE_BALANCE, FURNACE_COOLING_WEIGHT, FURNACE_ENERGY_WEIGHT, FURNACE_TEMPERATURE_WEIGHT,
};
use crate::config::AnalysisConfig;
use crate::detection::stats;
use crate::types::fields::{self, furnace};
use crate::types::{period_days, Dataset, DatasetError, EnergyStatus, HealthBand, PowerTrend, ReportIssue};

// ============================================================================
// Report structures
// ============================================================================

/// Set-point tracking of one zone pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneControl {
    pub zone: String,
    /// Share of rows with `|set - actual|` within tolerance (%).
    pub success_pct: f64,
    pub mean_deviation: f64,
    pub max_deviation: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemperatureControl {
    pub tolerance_c: f64,
    pub zones: Vec<ZoneControl>,
    pub average_success_pct: f64,
}

impl TemperatureControl {
    /// Zones below `limit`, worst first; ties keep zone-pair order.
    pub fn zones_below(&self, limit: f64) -> Vec<&ZoneControl> {
        let mut low: Vec<&ZoneControl> = self.zones.iter().filter(|z| z.success_pct < limit).collect();
        low.sort_by(|a, b| a.success_pct.total_cmp(&b.success_pct));
        low
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyEfficiency {
    pub power_columns: usize,
    pub mean_power_pct: f64,
    pub score: f64,
    pub status: EnergyStatus,
    /// Last minus first daily mean power (points).
    pub daily_change: f64,
    pub trend: PowerTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoolingEffectiveness {
    pub stage_means: [f64; 3],
    /// Stage 1 mean minus stage 3 mean.
    pub delta: f64,
    pub delta_12: f64,
    pub delta_23: f64,
    /// `|delta_12 - delta_23|` below the stage balance limit.
    pub balanced: bool,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZoneBalance {
    pub zone_means: Vec<ZoneMean>,
    pub max_difference: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OperationalConsistency {
    pub period_days: i64,
    pub records: usize,
    pub expected_records: f64,
    pub record_ratio_pct: f64,
    pub daily_count_mean: f64,
    pub daily_count_std: f64,
    pub cv_pct: f64,
    pub score: f64,
}

/// Composite furnace score. Keys follow the legacy report format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FurnaceCompositeScore {
    #[serde(rename = "sicaklik_skoru")]
    pub temperature_score: f64,
    #[serde(rename = "enerji_skoru")]
    pub energy_score: f64,
    #[serde(rename = "sogutma_skoru")]
    pub cooling_score: f64,
    #[serde(rename = "toplam_skor")]
    pub total: f64,
    pub band: HealthBand,
}

impl FurnaceCompositeScore {
    fn from_parts(temperature: f64, energy: f64, cooling: f64) -> Self {
        let total = temperature + energy + cooling;
        Self {
            temperature_score: temperature,
            energy_score: energy,
            cooling_score: cooling,
            total,
            band: curves::furnace_band(total),
        }
    }

    pub fn out_of_range_issues(&self) -> Vec<ReportIssue> {
        [
            ("sicaklik_skoru", self.temperature_score, FURNACE_TEMPERATURE_WEIGHT),
            ("enerji_skoru", self.energy_score, FURNACE_ENERGY_WEIGHT),
            ("sogutma_skoru", self.cooling_score, FURNACE_COOLING_WEIGHT),
            ("toplam_skor", self.total, 100.0),
        ]
        .into_iter()
        .filter(|(_, value, max)| !(0.0..=*max).contains(value))
        .map(|(name, value, max)| {
            ReportIssue::data_quality(name, format!("score_out_of_range: {value:.2} outside [0, {max}]"))
        })
        .collect()
    }
}

/// Furnace Performance Scorer output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FurnacePerformance {
    pub temperature: TemperatureControl,
    pub energy: Option<EnergyEfficiency>,
    pub cooling: Option<CoolingEffectiveness>,
    pub zone_balance: ZoneBalance,
    pub consistency: OperationalConsistency,
    pub composite: FurnaceCompositeScore,
}

// ============================================================================
// Scoring
// ============================================================================

/// Score a cleaned furnace dataset.
pub fn score(
    dataset: &Dataset,
    config: &AnalysisConfig,
    excluded: &[&str],
    issues: &mut Vec<ReportIssue>,
) -> Result<FurnacePerformance, DatasetError> {
    let temperature = temperature_control(dataset, config.furnace.setpoint_tolerance_c, excluded, issues);
    let temperature_share = temperature.average_success_pct / 100.0 * FURNACE_TEMPERATURE_WEIGHT;

    let energy = energy_efficiency(dataset, excluded, issues)?;
    let energy_share = energy.as_ref().map_or(0.0, |e| e.score * FURNACE_ENERGY_WEIGHT / 100.0);

    let cooling = cooling_effectiveness(dataset, excluded, issues);
    let cooling_share = cooling.as_ref().map_or(0.0, |c| c.score * FURNACE_COOLING_WEIGHT / 100.0);

    let means = zone_means(dataset, excluded);
    let max_difference = max_pairwise_difference(&means);
    if means.len() < 2 {
        issues.push(ReportIssue::insufficient_data(
            "zone_balance",
            format!("{} zone(s) with usable temperatures, balance needs 2", means.len()),
        ));
    }
    let zone_balance = ZoneBalance {
        zone_means: means,
        max_difference,
        score: curves::zone_balance_score(max_difference),
    };

    let consistency = operational_consistency(dataset, config.furnace.expected_records_per_hour, issues)?;

    let composite = FurnaceCompositeScore::from_parts(temperature_share, energy_share, cooling_share);
    info!(
        total = composite.total,
        band = %composite.band,
        control = temperature.average_success_pct,
        "Furnace scored"
    );

    Ok(FurnacePerformance {
        temperature,
        energy,
        cooling,
        zone_balance,
        consistency,
        composite,
    })
}

/// Set-point success rate per zone pair.
pub fn temperature_control(
    dataset: &Dataset,
    tolerance_c: f64,
    excluded: &[&str],
    issues: &mut Vec<ReportIssue>,
) -> TemperatureControl {
    let mut zones = Vec::new();
    for pair in &furnace::ZONE_PAIRS {
        if excluded.contains(&pair.set_id) || excluded.contains(&pair.actual_id) {
            continue;
        }
        let (Ok(set), Ok(actual)) = (dataset.numeric(pair.set_id), dataset.numeric(pair.actual_id)) else {
            continue;
        };
        let deviations: Vec<f64> = set
            .iter()
            .zip(actual)
            .filter_map(|(s, a)| Some((s.as_ref()? - a.as_ref()?).abs()))
            .collect();
        let Some(mean_deviation) = stats::mean(&deviations) else {
            issues.push(ReportIssue::insufficient_data(pair.name, "no row with both set and actual temperature"));
            continue;
        };
        let within = deviations.iter().filter(|&&d| d <= tolerance_c).count();
        zones.push(ZoneControl {
            zone: pair.name.to_string(),
            success_pct: within as f64 / deviations.len() as f64 * 100.0,
            mean_deviation,
            max_deviation: deviations.iter().copied().fold(0.0, f64::max),
        });
    }

    let rates: Vec<f64> = zones.iter().map(|z| z.success_pct).collect();
    let average_success_pct = stats::mean(&rates).unwrap_or_else(|| {
        issues.push(ReportIssue::insufficient_data(
            "temperature_control",
            "no usable zone pair, temperature score set to 0",
        ));
        0.0
    });

    TemperatureControl {
        tolerance_c,
        zones,
        average_success_pct,
    }
}

/// Mean heater power, its score and the daily trend.
pub fn energy_efficiency(
    dataset: &Dataset,
    excluded: &[&str],
    issues: &mut Vec<ReportIssue>,
) -> Result<Option<EnergyEfficiency>, DatasetError> {
    let power_columns = dataset.numeric_columns_where(|n| fields::is_power(n) && !excluded.contains(&n));
    let column_means: Vec<f64> = power_columns
        .iter()
        .filter_map(|c| dataset.numeric(c).ok().and_then(stats::column_mean))
        .collect();
    let Some(mean_power_pct) = stats::mean(&column_means) else {
        issues.push(ReportIssue::insufficient_data(
            "energy_efficiency",
            "no usable power column, energy score set to 0",
        ));
        return Ok(None);
    };

    let per_row = row_mean_power(dataset, &power_columns)?;
    let daily = daily_means(&per_row, dataset.timestamps()?);
    let daily_change = match (daily.first(), daily.last()) {
        (Some(first), Some(last)) => last.1 - first.1,
        _ => 0.0,
    };
    debug!(days = daily.len(), change = daily_change, "Daily power trend");

    Ok(Some(EnergyEfficiency {
        power_columns: power_columns.len(),
        mean_power_pct,
        score: curves::energy_score(mean_power_pct),
        status: curves::energy_status(mean_power_pct),
        daily_change,
        trend: curves::power_trend(daily_change),
    }))
}

/// Temperature drop across the cooling stages.
pub fn cooling_effectiveness(
    dataset: &Dataset,
    excluded: &[&str],
    issues: &mut Vec<ReportIssue>,
) -> Option<CoolingEffectiveness> {
    let mut means = [0.0; 3];
    for (slot, stage) in means.iter_mut().zip(furnace::COOLING_STAGES) {
        let mean = if excluded.contains(&stage) {
            None
        } else {
            dataset.numeric(stage).ok().and_then(stats::column_mean)
        };
        let Some(mean) = mean else {
            issues.push(ReportIssue::insufficient_data(
                stage,
                "cooling stage unusable, cooling score set to 0",
            ));
            return None;
        };
        *slot = mean;
    }

    let [c1, c2, c3] = means;
    let delta = c1 - c3;
    let delta_12 = c1 - c2;
    let delta_23 = c2 - c3;
    Some(CoolingEffectiveness {
        stage_means: means,
        delta,
        delta_12,
        delta_23,
        balanced: (delta_12 - delta_23).abs() < COOLING_STAGE_BALANCE,
        score: curves::cooling_score(delta),
    })
}

/// Record coverage and day-to-day regularity of logging.
pub fn operational_consistency(
    dataset: &Dataset,
    expected_per_hour: f64,
    issues: &mut Vec<ReportIssue>,
) -> Result<OperationalConsistency, DatasetError> {
    let timestamps = dataset.timestamps()?;
    let Some((first, last)) = dataset.time_span() else {
        issues.push(ReportIssue::insufficient_data("operational_consistency", "no records"));
        return Ok(OperationalConsistency::default());
    };
    let days = period_days(first, last);
    let expected_records = days as f64 * 24.0 * expected_per_hour;
    let records = dataset.row_count();

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ts in timestamps {
        *per_day.entry(ts.date()).or_default() += 1;
    }
    let counts: Vec<f64> = per_day.values().map(|&c| c as f64).collect();
    let daily_count_mean = stats::mean(&counts).unwrap_or(0.0);

    let mut result = OperationalConsistency {
        period_days: days,
        records,
        expected_records,
        record_ratio_pct: if expected_records > 0.0 {
            records as f64 / expected_records * 100.0
        } else {
            0.0
        },
        daily_count_mean,
        ..OperationalConsistency::default()
    };

    match stats::sample_std(&counts) {
        Some(std) if daily_count_mean > 0.0 => {
            result.daily_count_std = std;
            result.cv_pct = std / daily_count_mean * 100.0;
            result.score = curves::consistency_score(result.cv_pct);
        }
        _ => issues.push(ReportIssue::insufficient_data(
            "operational_consistency",
            format!("{} day(s) of data, consistency needs 2", counts.len()),
        )),
    }
    Ok(result)
}
