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

use pvscope_types::PowerMatrix;

/// Energy-weighted mean time of day, in hours, for every day of `matrix`.
///
/// The time axis runs linearly from 0 to 24 inclusive across the samples of a day, so the last
/// sample sits at hour 24. Gaps are skipped; a day without energy has no centroid (NaN).
pub fn daily_centroids(matrix: &PowerMatrix) -> Vec<f64> {
    let hours = time_of_day(matrix.samples_per_day());
    matrix
        .iter_days()
        .map(|day| {
            let (weighted, energy) = day
                .iter()
                .zip(&hours)
                .filter(|(power, _)| power.is_finite())
                .fold((0.0, 0.0), |(weighted, energy), (power, hour)| {
                    (weighted + hour * power, energy + power)
                });
            if energy == 0.0 {
                f64::NAN
            } else {
                weighted / energy
            }
        })
        .collect()
}

/// Hour of every intraday sample, `24 * i / (rows - 1)`
fn time_of_day(rows: usize) -> Vec<f64> {
    if rows < 2 {
        return vec![0.0; rows];
    }
    #[expect(clippy::cast_precision_loss)]
    let step = 24.0 / (rows - 1) as f64;
    #[expect(clippy::cast_precision_loss)]
    let hours = (0..rows).map(|i| i as f64 * step).collect();
    hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_day_centres_on_midday() {
        let matrix = PowerMatrix::from_days(vec![vec![0.0, 1.0, 2.0, 1.0, 0.0]]).unwrap();
        let centroids = daily_centroids(&matrix);
        assert!((centroids[0] - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_dark_day_has_no_centroid() {
        let matrix = PowerMatrix::from_days(vec![
            vec![0.0; 5],
            vec![f64::NAN; 5],
            vec![0.0, 0.0, 0.0, 0.0, 3.0],
        ])
        .unwrap();
        let centroids = daily_centroids(&matrix);
        assert!(centroids[0].is_nan());
        assert!(centroids[1].is_nan());
        assert_eq!(centroids[2], 24.0);
    }

    #[test]
    fn test_gaps_are_ignored() {
        let matrix =
            PowerMatrix::from_days(vec![vec![0.0, 2.0, f64::NAN, 2.0, 0.0]]).unwrap();
        assert!((daily_centroids(&matrix)[0] - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_day() {
        let matrix = PowerMatrix::from_days(vec![vec![5.0], vec![0.0]]).unwrap();
        let centroids = daily_centroids(&matrix);
        assert_eq!(centroids[0], 0.0);
        assert!(centroids[1].is_nan());
    }
}
