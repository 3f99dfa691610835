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

//! Density-based clustering of the solar-noon baseline into alignment regimes.
//!
//! A Gaussian kernel density is sampled on a padded grid over the baseline values. Valleys of the
//! density separate regimes. Peaks too faint to be a real regime are merged into their nearest
//! dominant peak by deleting the valleys in between, so noise never produces a phantom boundary.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use pvscope_types::RegimeConfig;

/// Density modes of a baseline and the valleys kept as cluster boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeAnalysis {
    /// Grid the density was evaluated on, increasing
    pub grid: Vec<f64>,
    pub log_density: Vec<f64>,
    /// Grid indices of strict local maxima
    pub maxima: Vec<usize>,
    /// Grid indices of strict local minima
    pub minima: Vec<usize>,
    /// (dropped maximum, merge target) pairs in grid order; the target is `None` when no maximum
    /// survived
    pub merges: Vec<(usize, Option<usize>)>,
    /// Grid indices of the minima that survived merging, increasing
    pub surviving_minima: Vec<usize>,
}

impl ModeAnalysis {
    /// Boundary values of the clusters, increasing
    pub fn boundary_values(&self) -> Vec<f64> {
        self.surviving_minima.iter().map(|&i| self.grid[i]).collect()
    }
}

/// Splits a gap-free baseline into regimes of constant alignment
#[derive(Debug, Clone, Default)]
pub struct RegimeSegmenter {
    config: RegimeConfig,
}

impl RegimeSegmenter {
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    /// Locate density modes and valleys of `values` and merge the low-density modes
    pub fn analyze(&self, values: &[f64]) -> ModeAnalysis {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return ModeAnalysis {
                grid: Vec::new(),
                log_density: Vec::new(),
                maxima: Vec::new(),
                minima: Vec::new(),
                merges: Vec::new(),
                surviving_minima: Vec::new(),
            };
        }

        let grid = self.density_grid(&finite);
        let log_density: Vec<f64> = grid
            .iter()
            .map(|&x| log_kde(&finite, x, self.config.kde_bandwidth))
            .collect();

        let maxima = strict_extrema(&log_density, |centre, side| centre > side);
        let minima = strict_extrema(&log_density, |centre, side| centre < side);

        let (dropped, kept): (Vec<usize>, Vec<usize>) = maxima
            .iter()
            .partition(|&&m| log_density[m].exp() < self.config.density_threshold);

        let mut discarded = vec![false; minima.len()];
        let mut merges = Vec::with_capacity(dropped.len());
        for &weak in &dropped {
            // Nearest dominant peak by value; earlier peak wins ties
            let target = kept.iter().copied().min_by(|&a, &b| {
                (grid[a] - grid[weak])
                    .abs()
                    .total_cmp(&(grid[b] - grid[weak]).abs())
            });
            match target {
                Some(target) => {
                    let (low, high) = (weak.min(target), weak.max(target));
                    for (flag, &minimum) in discarded.iter_mut().zip(&minima) {
                        if low < minimum && minimum < high {
                            *flag = true;
                        }
                    }
                }
                None => discarded.iter_mut().for_each(|flag| *flag = true),
            }
            merges.push((weak, target));
        }

        let surviving_minima: Vec<usize> = minima
            .iter()
            .zip(&discarded)
            .filter_map(|(&minimum, &gone)| (!gone).then_some(minimum))
            .collect();

        debug!(
            "Density has {} peaks ({} merged) and {} valleys ({} kept)",
            maxima.len(),
            dropped.len(),
            minima.len(),
            surviving_minima.len()
        );

        ModeAnalysis {
            grid,
            log_density,
            maxima,
            minima,
            merges,
            surviving_minima,
        }
    }

    /// Cluster index per value: the number of boundary values it is at or above
    pub fn cluster_labels(&self, values: &[f64]) -> Vec<usize> {
        let boundaries = self.analyze(values).boundary_values();
        values
            .iter()
            .map(|&v| boundaries.iter().filter(|&&b| v >= b).count())
            .collect()
    }

    /// Day indices at which the regime changes, strictly increasing; empty for a single regime
    pub fn boundaries(&self, values: &[f64]) -> Vec<usize> {
        let labels = self.cluster_labels(values);
        labels
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| (pair[0] != pair[1]).then_some(i + 1))
            .collect()
    }

    fn density_grid(&self, values: &[f64]) -> Vec<f64> {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = (1.0 - self.config.padding_fraction) * min;
        let high = (1.0 + self.config.padding_fraction) * max;

        let points = self.config.grid_points.max(2);
        #[expect(clippy::cast_precision_loss)]
        let step = (high - low) / (points - 1) as f64;
        #[expect(clippy::cast_precision_loss)]
        let grid = (0..points).map(|i| low + step * i as f64).collect();
        grid
    }
}

/// Log of the Gaussian kernel density of `values` at `x`, via log-sum-exp
fn log_kde(values: &[f64], x: f64, bandwidth: f64) -> f64 {
    let exponents: Vec<f64> = values
        .iter()
        .map(|v| -(x - v).powi(2) / (2.0 * bandwidth * bandwidth))
        .collect();
    let peak = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = exponents.iter().map(|e| (e - peak).exp()).sum();

    #[expect(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    peak + sum.ln() - (n * bandwidth * (2.0 * PI).sqrt()).ln()
}

/// Interior indices whose value beats both neighbours under `beats`
fn strict_extrema(values: &[f64], beats: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    (1..values.len().saturating_sub(1))
        .filter(|&i| beats(values[i], values[i - 1]) && beats(values[i], values[i + 1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_regimes() -> Vec<f64> {
        let mut values = vec![12.05; 120];
        values.extend(vec![12.95; 80]);
        values
    }

    #[test]
    fn test_single_regime_has_no_boundaries() {
        let segmenter = RegimeSegmenter::default();
        let values: Vec<f64> = (0..200).map(|i| 12.0 + 0.001 * f64::from(i % 7)).collect();
        assert!(segmenter.boundaries(&values).is_empty());
    }

    #[test]
    fn test_two_regimes_split_at_change() {
        let segmenter = RegimeSegmenter::default();
        let values = two_regimes();
        assert_eq!(segmenter.boundaries(&values), vec![120]);

        let labels = segmenter.cluster_labels(&values);
        assert_eq!(labels[0], 0);
        assert_eq!(labels[199], 1);
    }

    #[test]
    fn test_regime_returning_to_start_gives_two_boundaries() {
        let segmenter = RegimeSegmenter::default();
        let mut values = vec![12.0; 100];
        values.extend(vec![13.0; 100]);
        values.extend(vec![12.0; 100]);
        assert_eq!(segmenter.boundaries(&values), vec![100, 200]);
    }

    #[test]
    fn test_faint_mode_is_merged() {
        // Three days sitting apart form a peak far below the density threshold
        let mut values = vec![12.0; 300];
        values.extend(vec![12.4; 3]);
        let segmenter = RegimeSegmenter::new(RegimeConfig {
            density_threshold: 0.5,
            ..RegimeConfig::default()
        });

        let analysis = segmenter.analyze(&values);
        assert!(!analysis.merges.is_empty());
        assert!(segmenter.boundaries(&values).is_empty());
    }

    #[test]
    fn test_empty_and_constant_input() {
        let segmenter = RegimeSegmenter::default();
        assert!(segmenter.boundaries(&[]).is_empty());
        assert!(segmenter.boundaries(&[12.0; 10]).is_empty());
        assert!(segmenter.boundaries(&[0.0; 10]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_no_surviving_valley_between_merged_modes(
            values in proptest::collection::vec(11.0_f64..14.0, 5..120),
            threshold in 0.05_f64..2.0,
        ) {
            let segmenter = RegimeSegmenter::new(RegimeConfig {
                density_threshold: threshold,
                ..RegimeConfig::default()
            });
            let analysis = segmenter.analyze(&values);

            for &(weak, target) in &analysis.merges {
                match target {
                    Some(target) => {
                        let (low, high) = (weak.min(target), weak.max(target));
                        prop_assert!(analysis
                            .surviving_minima
                            .iter()
                            .all(|&m| m <= low || m >= high));
                    }
                    None => prop_assert!(analysis.surviving_minima.is_empty()),
                }
            }

            let boundaries = segmenter.boundaries(&values);
            prop_assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(boundaries.iter().all(|&b| b >= 1 && b < values.len()));
        }
    }
}
