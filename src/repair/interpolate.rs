//! Sensor Repair Engine
//!
//! Values outside a physically plausible range are sensor faults, not
//! process anomalies. They are blanked and filled by linear interpolation
//! between the nearest valid neighbours. Faults at either end of the
//! column take the nearest valid value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A column that cannot be repaired. Non-fatal: the column is left as-is
/// and excluded from scoring.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("column `{column}` cannot be repaired: {reason}")]
pub struct RepairFailure {
    pub column: String,
    pub reason: String,
}

/// Repaired values plus what was done to them.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub values: Vec<Option<f64>>,
    /// Out-of-range values replaced.
    pub repaired_count: usize,
    /// Cells that were already missing and got filled.
    pub filled_missing: usize,
}

/// True when `value` is a usable physical reading.
fn in_range(value: f64, min: f64, max: f64) -> bool {
    value.is_finite() && value >= min && value <= max
}

/// Repair one column against the physical range `[min, max]`.
///
/// `column` only names the failure.
pub fn repair(
    column: &str,
    values: &[Option<f64>],
    min: f64,
    max: f64,
) -> Result<RepairOutcome, RepairFailure> {
    let mut repaired_count = 0;
    let mut filled_missing = 0;
    let mut cleaned: Vec<Option<f64>> = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Some(x) if in_range(*x, min, max) => cleaned.push(Some(*x)),
            Some(_) => {
                repaired_count += 1;
                cleaned.push(None);
            }
            None => {
                filled_missing += 1;
                cleaned.push(None);
            }
        }
    }

    if repaired_count == 0 && filled_missing == 0 {
        return Ok(RepairOutcome {
            values: cleaned,
            repaired_count,
            filled_missing,
        });
    }

    let anchors: Vec<usize> = cleaned
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    if anchors.is_empty() {
        return Err(RepairFailure {
            column: column.to_string(),
            reason: format!(
                "no valid values in [{min}, {max}] ({repaired_count} out of range, {filled_missing} missing)"
            ),
        });
    }

    let first = anchors[0];
    let last = anchors[anchors.len() - 1];
    let mut next_anchor = 0;
    let mut repaired = cleaned.clone();
    for i in 0..cleaned.len() {
        if cleaned[i].is_some() {
            continue;
        }
        let filled = if i < first {
            cleaned[first]
        } else if i > last {
            cleaned[last]
        } else {
            // anchors[next_anchor] is the first anchor past i
            while anchors[next_anchor] < i {
                next_anchor += 1;
            }
            let hi = anchors[next_anchor];
            let lo = anchors[next_anchor - 1];
            match (cleaned[lo], cleaned[hi]) {
                (Some(a), Some(b)) => {
                    let t = (i - lo) as f64 / (hi - lo) as f64;
                    Some(a + (b - a) * t)
                }
                _ => None,
            }
        };
        repaired[i] = filled;
    }

    Ok(RepairOutcome {
        values: repaired,
        repaired_count,
        filled_missing,
    })
}

/// Forward-fill then back-fill missing cells. Returns the column and the
/// number of cells filled. A column with no value at all comes back as-is.
pub fn fill_gaps(values: &[Option<f64>]) -> (Vec<Option<f64>>, usize) {
    let mut filled: Vec<Option<f64>> = Vec::with_capacity(values.len());
    let mut last = None;
    for v in values {
        if v.is_some() {
            last = *v;
        }
        filled.push(v.or(last));
    }
    // Leading gaps take the first reading
    if let Some(first) = values.iter().flatten().next() {
        for v in filled.iter_mut().take_while(|v| v.is_none()) {
            *v = Some(*first);
        }
    }
    let count = values
        .iter()
        .zip(&filled)
        .filter(|(before, after)| before.is_none() && after.is_some())
        .count();
    (filled, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_clean_column_is_unchanged() {
        let values = col(&[850.0, 851.5, 849.0, 860.0]);
        let out = repair("zone1_upper1_temp", &values, -100.0, 2000.0).unwrap();
        assert_eq!(out.values, values);
        assert_eq!(out.repaired_count, 0);
        assert_eq!(out.filled_missing, 0);
    }

    #[test]
    fn test_fault_between_equal_neighbours() {
        let values = col(&[10.0, 10.0, -9999.0, 10.0, 10.0]);
        let out = repair("t", &values, -100.0, 2000.0).unwrap();
        assert_eq!(out.values[2], Some(10.0));
        assert_eq!(out.repaired_count, 1);
    }

    #[test]
    fn test_linear_between_neighbours() {
        let values = col(&[100.0, -3276.0, 3276.0, 400.0]);
        let out = repair("t", &values, -100.0, 2000.0).unwrap();
        for (got, want) in out.values.iter().zip([100.0, 200.0, 300.0, 400.0]) {
            assert!((got.unwrap() - want).abs() < 1e-9);
        }
        assert_eq!(out.repaired_count, 2);
    }

    #[test]
    fn test_boundary_faults_take_nearest_value() {
        let values = col(&[-3276.0, 500.0, 520.0, 9000.0]);
        let out = repair("t", &values, -100.0, 2000.0).unwrap();
        assert_eq!(out.values, col(&[500.0, 500.0, 520.0, 520.0]));
    }

    #[test]
    fn test_missing_cells_are_filled_and_counted_separately() {
        let values = vec![Some(1.0), None, Some(3.0), Some(-500.0), Some(5.0)];
        let out = repair("t", &values, -100.0, 2000.0).unwrap();
        assert_eq!(out.values, col(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(out.repaired_count, 1);
        assert_eq!(out.filled_missing, 1);
    }

    #[test]
    fn test_all_faulty_column_fails() {
        let values = col(&[-3276.0, -3276.0, 5000.0]);
        let err = repair("cooling2_temp", &values, -100.0, 2000.0).unwrap_err();
        assert_eq!(err.column, "cooling2_temp");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let values = col(&[10.0, -9999.0, 30.0, 2500.0, 50.0]);
        let once = repair("t", &values, -100.0, 2000.0).unwrap();
        let twice = repair("t", &once.values, -100.0, 2000.0).unwrap();
        assert_eq!(once.values, twice.values);
        assert_eq!(twice.repaired_count, 0);
    }

    #[test]
    fn test_fill_gaps_forward_then_backward() {
        let values = vec![None, Some(60.0), None, None, Some(64.0), None];
        let (filled, count) = fill_gaps(&values);
        assert_eq!(
            filled,
            vec![Some(60.0), Some(60.0), Some(60.0), Some(60.0), Some(64.0), Some(64.0)]
        );
        assert_eq!(count, 4);
    }

    #[test]
    fn test_fill_gaps_all_missing_is_unchanged() {
        let (filled, count) = fill_gaps(&[None, None]);
        assert_eq!(filled, vec![None, None]);
        assert_eq!(count, 0);
    }
}
