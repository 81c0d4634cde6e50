//! Qualitative bands attached to numeric scores

use serde::{Deserialize, Serialize};

/// Health band derived from fixed breakpoints.
///
/// Press composites use `Poor` as the lowest band, furnace composites and
/// quality levels use `Low`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthBand {
    Excellent,
    Good,
    Medium,
    Poor,
    Low,
}

impl HealthBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthBand::Excellent => "EXCELLENT",
            HealthBand::Good => "GOOD",
            HealthBand::Medium => "MEDIUM",
            HealthBand::Poor => "POOR",
            HealthBand::Low => "LOW",
        }
    }

    /// Band for a value against three descending breakpoints.
    pub fn from_breakpoints(value: f64, breakpoints: [f64; 3], floor: HealthBand) -> Self {
        if value >= breakpoints[0] {
            HealthBand::Excellent
        } else if value >= breakpoints[1] {
            HealthBand::Good
        } else if value >= breakpoints[2] {
            HealthBand::Medium
        } else {
            floor
        }
    }
}

impl std::fmt::Display for HealthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Efficiency level on the press.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EfficiencyLevel {
    Critical,
    Warning,
    Acceptable,
}

impl std::fmt::Display for EfficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EfficiencyLevel::Critical => write!(f, "CRITICAL"),
            EfficiencyLevel::Warning => write!(f, "WARNING"),
            EfficiencyLevel::Acceptable => write!(f, "ACCEPTABLE"),
        }
    }
}

/// Power draw classification on the furnace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyStatus {
    Optimal,
    LowCapacity,
    HighConsumption,
}

impl std::fmt::Display for EnergyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyStatus::Optimal => write!(f, "OPTIMAL"),
            EnergyStatus::LowCapacity => write!(f, "LOW_CAPACITY"),
            EnergyStatus::HighConsumption => write!(f, "HIGH_CONSUMPTION"),
        }
    }
}

/// Daily power trend direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PowerTrend {
    Rising,
    Falling,
    Stable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_breakpoints_are_inclusive() {
        let bp = [85.0, 70.0, 50.0];
        assert_eq!(HealthBand::from_breakpoints(85.0, bp, HealthBand::Poor), HealthBand::Excellent);
        assert_eq!(HealthBand::from_breakpoints(84.99, bp, HealthBand::Poor), HealthBand::Good);
        assert_eq!(HealthBand::from_breakpoints(50.0, bp, HealthBand::Poor), HealthBand::Medium);
        assert_eq!(HealthBand::from_breakpoints(49.0, bp, HealthBand::Low), HealthBand::Low);
    }

    #[test]
    fn test_band_serializes_uppercase() {
        let json = serde_json::to_string(&HealthBand::Excellent).unwrap();
        assert_eq!(json, "\"EXCELLENT\"");
    }
}
