//! Outlier Detector: IQR and Z-score classification
//!
//! - IQR: bounds `[Q1 - k*IQR, Q3 + k*IQR]`, flagged iff strictly outside
//! - Z-score: flagged iff `|x - mean| / std > z` (sample std)
//!
//! Both are pure. Missing cells are never flagged and never enter the
//! statistics. When the statistics cannot be formed the caller gets a
//! `DetectionError`, or an all-false mask through [`detect`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stats::{mean, quantile_sorted, sample_std, valid_values};
use crate::types::{ColumnBound, OutlierMethod};

/// Fewer valid values than this and no bound can be formed.
pub const MIN_VALUES_FOR_BOUNDS: usize = 2;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DetectionError {
    #[error("insufficient data: need at least {needed} valid values, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("zero spread: standard deviation is 0")]
    ZeroSpread,
}

/// Mask plus the bound it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub mask: Vec<bool>,
    pub bound: ColumnBound,
}

impl Detection {
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// IQR bounds of a column.
pub fn iqr_bounds(values: &[Option<f64>], k: f64) -> Result<ColumnBound, DetectionError> {
    let mut valid = valid_values(values);
    if valid.len() < MIN_VALUES_FOR_BOUNDS {
        return Err(DetectionError::InsufficientData {
            needed: MIN_VALUES_FOR_BOUNDS,
            available: valid.len(),
        });
    }
    valid.sort_by(f64::total_cmp);
    let insufficient = DetectionError::InsufficientData {
        needed: MIN_VALUES_FOR_BOUNDS,
        available: valid.len(),
    };
    let q1 = quantile_sorted(&valid, 0.25).ok_or(insufficient)?;
    let q3 = quantile_sorted(&valid, 0.75).ok_or(insufficient)?;
    let iqr = q3 - q1;
    Ok(ColumnBound {
        lower: q1 - k * iqr,
        upper: q3 + k * iqr,
    })
}

/// Z-score bounds `mean -/+ z*std` of a column.
///
/// Classifying with these bounds is equivalent to `|x - mean| / std > z`.
pub fn zscore_bounds(values: &[Option<f64>], z: f64) -> Result<ColumnBound, DetectionError> {
    let valid = valid_values(values);
    let insufficient = DetectionError::InsufficientData {
        needed: MIN_VALUES_FOR_BOUNDS,
        available: valid.len(),
    };
    let std = sample_std(&valid).ok_or(insufficient)?;
    let mu = mean(&valid).ok_or(insufficient)?;
    if std == 0.0 || !std.is_finite() {
        return Err(DetectionError::ZeroSpread);
    }
    Ok(ColumnBound {
        lower: mu - z * std,
        upper: mu + z * std,
    })
}

/// Bounds for `method` with its threshold (k for IQR, z for Z-score).
pub fn bounds(
    values: &[Option<f64>],
    method: OutlierMethod,
    threshold: f64,
) -> Result<ColumnBound, DetectionError> {
    match method {
        OutlierMethod::Iqr => iqr_bounds(values, threshold),
        OutlierMethod::ZScore => zscore_bounds(values, threshold),
    }
}

/// Classify every row against `bound`. Missing cells are never flagged.
pub fn classify(values: &[Option<f64>], bound: &ColumnBound) -> Vec<bool> {
    values
        .iter()
        .map(|v| matches!(v, Some(x) if x.is_finite() && bound.is_outside(*x)))
        .collect()
}

/// Compute bounds and classify in one step.
pub fn detect_with_bounds(
    values: &[Option<f64>],
    method: OutlierMethod,
    threshold: f64,
) -> Result<Detection, DetectionError> {
    let bound = bounds(values, method, threshold)?;
    Ok(Detection {
        mask: classify(values, &bound),
        bound,
    })
}

/// `detect(column, method, threshold) -> mask`.
///
/// Returns an all-false mask when bounds cannot be formed.
pub fn detect(values: &[Option<f64>], method: OutlierMethod, threshold: f64) -> Vec<bool> {
    detect_with_bounds(values, method, threshold)
        .map(|d| d.mask)
        .unwrap_or_else(|_| vec![false; values.len()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::stats::quantile;

    fn col(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_iqr_flags_exactly_the_planted_values() {
        // 18 base values plus 2 planted at Q3 + 2*IQR of the final column.
        let base: Vec<f64> = (1..=18).map(f64::from).collect();
        let mut values = base.clone();
        values.extend([0.0, 0.0]);

        // Solve for the planted value v so that v == Q3 + 2*IQR of the
        // column that contains it. Both copies sit above Q3, so quartiles
        // depend only on the base values plus two maxima.
        let mut planted = 100.0;
        for _ in 0..10 {
            values[18] = planted;
            values[19] = planted;
            let q1 = quantile(&values, 0.25).unwrap();
            let q3 = quantile(&values, 0.75).unwrap();
            planted = q3 + 2.0 * (q3 - q1);
        }
        values[18] = planted;
        values[19] = planted;

        let column = col(&values);
        let det = detect_with_bounds(&column, OutlierMethod::Iqr, 1.5).unwrap();
        assert!(planted > det.bound.upper);
        let flagged: Vec<usize> = det
            .mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![18, 19]);
    }

    #[test]
    fn test_iqr_flag_iff_strictly_outside() {
        let column = col(&[10.0, 12.0, 11.0, 13.0, 50.0, 9.0, 12.0, -20.0, 11.0]);
        let det = detect_with_bounds(&column, OutlierMethod::Iqr, 1.5).unwrap();
        for (v, flagged) in column.iter().zip(&det.mask) {
            let x = v.unwrap();
            assert_eq!(*flagged, x < det.bound.lower || x > det.bound.upper);
        }
        assert_eq!(det.count(), 2);
    }

    #[test]
    fn test_value_on_bound_is_not_flagged() {
        // Q1 = 1, Q3 = 3, IQR = 2, k = 0.5 -> upper = 4
        let column = col(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let det = detect_with_bounds(&column, OutlierMethod::Iqr, 0.5).unwrap();
        assert_eq!(det.bound.upper, 4.0);
        assert!(!det.mask[4]);
    }

    #[test]
    fn test_missing_never_flagged() {
        let column = vec![Some(1.0), None, Some(1.0), Some(1.0), Some(100.0), None];
        let mask = detect(&column, OutlierMethod::Iqr, 1.5);
        assert_eq!(mask, vec![false, false, false, false, true, false]);
    }

    #[test]
    fn test_zscore_flags_far_values() {
        let mut values = vec![10.0; 20];
        values[3] = 9.0;
        values[7] = 11.0;
        values[19] = 40.0;
        let mask = detect(&col(&values), OutlierMethod::ZScore, 3.0);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
        assert!(mask[19]);
    }

    #[test]
    fn test_zscore_zero_spread_is_all_false() {
        let column = col(&[5.0, 5.0, 5.0]);
        assert_eq!(
            detect_with_bounds(&column, OutlierMethod::ZScore, 2.0),
            Err(DetectionError::ZeroSpread)
        );
        assert_eq!(detect(&column, OutlierMethod::ZScore, 2.0), vec![false; 3]);
    }

    #[test]
    fn test_insufficient_data() {
        let column = vec![Some(5.0), None];
        assert_eq!(
            iqr_bounds(&column, 1.5),
            Err(DetectionError::InsufficientData { needed: 2, available: 1 })
        );
        assert_eq!(detect(&column, OutlierMethod::Iqr, 1.5), vec![false, false]);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let column = col(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 50.0]);
        assert_eq!(
            detect(&column, OutlierMethod::Iqr, 1.5),
            detect(&column, OutlierMethod::Iqr, 1.5)
        );
    }
}
