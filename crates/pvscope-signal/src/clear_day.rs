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

use pvscope_types::stats::nan_percentile;
use pvscope_types::{ClearDayClassifier, ClearDayConfig, ClearDayMask, PowerMatrix};

/// Clear-day classifier scoring each day on profile smoothness and relative energy.
///
/// Roughness is the summed absolute second difference of the day's profile divided by its
/// energy. A low roughness percentile across the record defines a perfectly smooth day.
/// Energy is compared against a high percentile of the surrounding days, so seasonally low but
/// cloudless days still pass. The combined score is the geometric mean of both parts.
#[derive(Debug, Clone, Default)]
pub struct SmoothnessEnergyClassifier {
    config: ClearDayConfig,
}

impl SmoothnessEnergyClassifier {
    pub fn new(config: ClearDayConfig) -> Self {
        Self { config }
    }

    /// Per-day clear-sky score in [0, 1]; days without energy score zero
    pub fn scores(&self, matrix: &PowerMatrix) -> Vec<f64> {
        let energy: Vec<f64> = matrix
            .iter_days()
            .map(|day| day.iter().filter(|v| v.is_finite()).sum())
            .collect();
        let roughness: Vec<f64> = matrix
            .iter_days()
            .zip(&energy)
            .map(|(day, &e)| {
                if e > 0.0 {
                    second_difference_variation(day) / e
                } else {
                    f64::NAN
                }
            })
            .collect();

        let reference = nan_percentile(&roughness, self.config.smoothness_percentile);
        let half_window = self.config.envelope_window_days / 2;

        (0..matrix.days())
            .map(|day| {
                let e = energy[day];
                let rough = roughness[day];
                if !(e > 0.0 && rough.is_finite()) {
                    return 0.0;
                }

                let smoothness = if rough <= reference {
                    1.0
                } else {
                    reference / rough
                };

                let first = day.saturating_sub(half_window);
                let last = (day + half_window + 1).min(energy.len());
                let envelope = nan_percentile(&energy[first..last], self.config.envelope_percentile);
                let energy_score = if envelope > 0.0 {
                    (e / envelope).min(1.0)
                } else {
                    0.0
                };

                (smoothness * energy_score).sqrt()
            })
            .collect()
    }
}

/// Σ |x[i] - 2 x[i+1] + x[i+2]| over windows without gaps
fn second_difference_variation(day: &[f64]) -> f64 {
    day.windows(3)
        .filter(|w| w.iter().all(|v| v.is_finite()))
        .map(|w| (w[0] - 2.0 * w[1] + w[2]).abs())
        .sum()
}

impl ClearDayClassifier for SmoothnessEnergyClassifier {
    fn classify(&self, matrix: &PowerMatrix) -> ClearDayMask {
        let flags: Vec<bool> = self
            .scores(matrix)
            .into_iter()
            .map(|score| score >= self.config.threshold)
            .collect();
        let mask = ClearDayMask::new(flags);
        debug!(
            "Classified {} of {} days as clear",
            mask.count_clear(),
            matrix.days()
        );
        mask
    }

    fn name(&self) -> &str {
        "smoothness-energy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn bell(amplitude: f64) -> Vec<f64> {
        (0..96)
            .map(|i| {
                if (24..=72).contains(&i) {
                    amplitude * (PI * f64::from(i - 24) / 48.0).sin()
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn test_cloudy_and_dark_days_are_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut days = Vec::new();
        for day in 0..40 {
            let mut profile = bell(1.0);
            if day % 5 == 2 {
                for value in &mut profile {
                    *value *= rng.gen_range(0.1..1.0);
                }
            }
            days.push(profile);
        }
        days[30] = vec![0.0; 96];
        days[31] = vec![f64::NAN; 96];
        let matrix = PowerMatrix::from_days(days).unwrap();

        let mask = SmoothnessEnergyClassifier::default().classify(&matrix);
        assert_eq!(mask.len(), 40);
        for day in 0..40 {
            let expected = day % 5 != 2 && day != 30 && day != 31;
            assert_eq!(mask.is_clear(day), expected, "day {day}");
        }
    }

    #[test]
    fn test_low_energy_day_fails_envelope() {
        let mut days: Vec<Vec<f64>> = (0..20).map(|_| bell(1.0)).collect();
        days[10] = bell(0.3);
        let matrix = PowerMatrix::from_days(days).unwrap();

        let scores = SmoothnessEnergyClassifier::default().scores(&matrix);
        assert!((scores[0] - 1.0).abs() < 1e-12);
        assert!(scores[10] < 0.6);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = PowerMatrix::new(4, 0, vec![]).unwrap();
        let mask = SmoothnessEnergyClassifier::default().classify(&matrix);
        assert!(mask.is_empty());
    }
}
