//! Column statistics shared by the detectors and the scorers
//!
//! Missing cells never take part in any statistic. Mean and sample
//! standard deviation come from `statrs`; quantiles use linear
//! interpolation between closest ranks (position `(n - 1) * q`).

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Present, finite values of a column in row order.
pub fn valid_values(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Sample standard deviation (n - 1), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        None
    } else {
        Some(values.iter().std_dev())
    }
}

/// Mean of the present values of a column.
pub fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    mean(&valid_values(values))
}

/// Quantile `q` in [0, 1] of an ascending-sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Quantile `q` of unsorted values.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// Descriptive statistics of one column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation, 0 for a single value.
    pub std: f64,
}

/// Describe the present values of a column. `None` when nothing is present.
pub fn describe(values: &[Option<f64>]) -> Option<ColumnStats> {
    let mut valid = valid_values(values);
    if valid.is_empty() {
        return None;
    }
    valid.sort_by(f64::total_cmp);
    let count = valid.len();
    Some(ColumnStats {
        count,
        mean: valid.iter().mean(),
        median: quantile_sorted(&valid, 0.5)?,
        min: valid[0],
        max: valid[count - 1],
        std: sample_std(&valid).unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_linear_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.75), Some(3.25));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
    }

    #[test]
    fn test_quantile_single_value() {
        assert_eq!(quantile(&[7.0], 0.25), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_missing_values_excluded() {
        let col = [Some(2.0), None, Some(4.0), Some(f64::NAN)];
        assert_eq!(valid_values(&col), vec![2.0, 4.0]);
        assert_eq!(column_mean(&col), Some(3.0));
    }

    #[test]
    fn test_sample_std_uses_n_minus_one() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138_089_935).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_describe() {
        let stats = describe(&[Some(3.0), Some(1.0), None, Some(2.0)]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert!((stats.std - 1.0).abs() < 1e-12);
        assert!(describe(&[None, None]).is_none());
    }
}
