// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PVScope.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use tracing::debug;

use pvscope_types::stats::{nan_max, nan_quantile};
use pvscope_types::{ClearDayMask, PowerMatrix};

use crate::error::{AnalysisError, AnalysisResult};

/// Daily capacity statistic normalized to [0, 1].
///
/// Each day contributes its NaN-ignoring `quantile`; the whole series is then divided by its
/// largest value. Negative statistics are clamped to zero and days without finite samples stay
/// NaN. The mask only has to select at least one day, the statistic is computed for every day.
pub fn capacity_metric(
    matrix: &PowerMatrix,
    inclusion: &ClearDayMask,
    quantile: f64,
) -> AnalysisResult<Vec<f64>> {
    if inclusion.len() != matrix.days() {
        return Err(AnalysisError::ShapeMismatch {
            expected: matrix.days(),
            found: inclusion.len(),
        });
    }
    if inclusion.count_clear() == 0 {
        return Err(AnalysisError::EmptySelection);
    }

    let daily: Vec<f64> = matrix
        .iter_days()
        .map(|day| {
            let statistic = nan_quantile(day, quantile);
            if statistic < 0.0 { 0.0 } else { statistic }
        })
        .collect();

    let peak = nan_max(&daily);
    if !(peak > 0.0) {
        return Err(AnalysisError::NoUsableData);
    }
    debug!("Capacity metric peak {:.3} over {} days", peak, daily.len());

    Ok(daily.into_iter().map(|value| value / peak).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_metric_is_normalized_daily_max() {
        let matrix = PowerMatrix::from_days(vec![
            vec![0.0, 2.0, 1.0],
            vec![0.0, 4.0, f64::NAN],
            vec![f64::NAN; 3],
        ])
        .unwrap();
        let metric = capacity_metric(&matrix, &ClearDayMask::all(3), 1.0).unwrap();
        assert_eq!(metric[0], 0.5);
        assert_eq!(metric[1], 1.0);
        assert!(metric[2].is_nan());
    }

    #[test]
    fn test_metric_uses_quantile() {
        let matrix =
            PowerMatrix::from_days(vec![vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![4.0; 5]]).unwrap();
        let metric = capacity_metric(&matrix, &ClearDayMask::all(2), 0.5).unwrap();
        assert_eq!(metric, vec![0.5, 1.0]);
    }

    #[test]
    fn test_empty_selection() {
        let matrix = PowerMatrix::from_days(vec![vec![1.0, 2.0]; 3]).unwrap();
        let err = capacity_metric(&matrix, &ClearDayMask::new(vec![false; 3]), 1.0).unwrap_err();
        assert_eq!(err, AnalysisError::EmptySelection);

        let empty = PowerMatrix::new(4, 0, vec![]).unwrap();
        assert_eq!(
            capacity_metric(&empty, &ClearDayMask::all(0), 1.0).unwrap_err(),
            AnalysisError::EmptySelection
        );
    }

    #[test]
    fn test_mask_must_cover_every_day() {
        let matrix = PowerMatrix::from_days(vec![vec![1.0, 2.0]; 3]).unwrap();
        assert_eq!(
            capacity_metric(&matrix, &ClearDayMask::all(2), 1.0).unwrap_err(),
            AnalysisError::ShapeMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_dark_record_has_no_usable_data() {
        let matrix = PowerMatrix::from_days(vec![vec![0.0, -1.0], vec![f64::NAN; 2]]).unwrap();
        assert_eq!(
            capacity_metric(&matrix, &ClearDayMask::all(2), 1.0).unwrap_err(),
            AnalysisError::NoUsableData
        );
    }

    proptest! {
        #[test]
        fn prop_metric_lies_in_unit_interval(
            days in proptest::collection::vec(
                proptest::collection::vec(
                    prop_oneof![4 => -5.0_f64..100.0, 1 => Just(f64::NAN)],
                    6,
                ),
                1..30,
            ),
            quantile in 0.0_f64..=1.0,
        ) {
            let count = days.len();
            let matrix = PowerMatrix::from_days(days).unwrap();
            match capacity_metric(&matrix, &ClearDayMask::all(count), quantile) {
                Ok(metric) => {
                    prop_assert_eq!(metric.len(), count);
                    let finite: Vec<f64> = metric.iter().copied().filter(|v| v.is_finite()).collect();
                    prop_assert!(finite.iter().all(|v| (0.0..=1.0).contains(v)));
                    prop_assert_eq!(finite.iter().copied().fold(f64::NAN, f64::max), 1.0);
                }
                Err(err) => prop_assert_eq!(err, AnalysisError::NoUsableData),
            }
        }
    }
}
