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

//! Default filter and demixer: piecewise-constant plus annual-seasonal decomposition.
//!
//! Minimizes `w_r Σ_{i ∈ fit} r_i² + w_j Σ |p_{i+1} - p_i| + w_s · roughness(s)` with
//! `y = p + s + r`. The two blocks are updated alternately: `p` exactly through total-variation
//! denoising and `s` through the penalized Fourier least squares in [`crate::seasonal`]. Days
//! outside the fit set are imputed with the current model before each sweep, which turns the
//! masked problem into a sequence of fully observed ones with a non-increasing objective.

use tracing::{debug, warn};

use pvscope_types::{
    BaselineSmoothness, DemixWeights, DemixedComponents, SeasonalBaseline,
    SeasonalBaselineFilter, SignalDemixer, SolverConfig, SolverError,
};

use crate::seasonal::SeasonalBasis;
use crate::tv::tv_denoise;

/// Registry name of [`TvSeasonalSolver`]
pub const TV_SEASONAL: &str = "tv-seasonal";

/// Block-coordinate solver for the piecewise-constant plus seasonal model
#[derive(Debug, Clone, Default)]
pub struct TvSeasonalSolver {
    config: SolverConfig,
}

/// Result of one run of the alternating solver
#[derive(Debug, Clone)]
struct Decomposition {
    piecewise: Vec<f64>,
    seasonal: Vec<f64>,
    iterations: usize,
    converged: bool,
}

impl TvSeasonalSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    fn decompose(
        &self,
        signal: &[f64],
        fit_mask: &[bool],
        weights: &DemixWeights,
    ) -> Result<Decomposition, SolverError> {
        if !weights.is_valid() {
            return Err(SolverError::InvalidWeights(format!(
                "residual={}, jump={}, seasonal={}",
                weights.residual, weights.jump, weights.seasonal
            )));
        }
        if signal.len() != fit_mask.len() {
            return Err(SolverError::LengthMismatch {
                signal: signal.len(),
                mask: fit_mask.len(),
            });
        }

        let observed: Vec<bool> = signal
            .iter()
            .zip(fit_mask)
            .map(|(value, &fit)| fit && value.is_finite())
            .collect();
        let observed_values: Vec<f64> = signal
            .iter()
            .zip(&observed)
            .filter_map(|(&value, &obs)| obs.then_some(value))
            .collect();
        if observed_values.is_empty() {
            return Err(SolverError::EmptyFit);
        }

        #[expect(clippy::cast_precision_loss)]
        let mean = observed_values.iter().sum::<f64>() / observed_values.len() as f64;
        let scale = observed_values
            .iter()
            .fold(1.0_f64, |acc, value| acc.max(value.abs()));
        let threshold = self.config.tolerance * scale;

        let n = signal.len();
        let basis = SeasonalBasis::new(n, self.config.harmonics, self.config.period_days);
        let seasonal_fit = basis.fitter(weights.residual, weights.seasonal)?;
        let lambda = weights.jump / (2.0 * weights.residual);

        let mut target: Vec<f64> = signal
            .iter()
            .zip(&observed)
            .map(|(&value, &obs)| if obs { value } else { mean })
            .collect();
        let mut piecewise = vec![0.0; n];
        let mut seasonal = vec![0.0; n];

        for iteration in 1..=self.config.max_iterations {
            let deseasoned: Vec<f64> = target.iter().zip(&seasonal).map(|(t, s)| t - s).collect();
            let next_piecewise = tv_denoise(&deseasoned, lambda);

            let remainder: Vec<f64> = target
                .iter()
                .zip(&next_piecewise)
                .map(|(t, p)| t - p)
                .collect();
            let next_seasonal = seasonal_fit.fit(&remainder);

            let change = max_abs_diff(&next_piecewise, &piecewise)
                .max(max_abs_diff(&next_seasonal, &seasonal));
            piecewise = next_piecewise;
            seasonal = next_seasonal;

            if !change.is_finite() {
                return Err(SolverError::Numerical(format!(
                    "non-finite update at iteration {iteration}"
                )));
            }

            for (i, t) in target.iter_mut().enumerate() {
                if !observed[i] {
                    *t = piecewise[i] + seasonal[i];
                }
            }

            if change < threshold {
                debug!(
                    "Decomposed {} days ({} fitted) in {} iterations",
                    n,
                    observed_values.len(),
                    iteration
                );
                return Ok(Decomposition {
                    piecewise,
                    seasonal,
                    iterations: iteration,
                    converged: true,
                });
            }
        }

        Ok(Decomposition {
            piecewise,
            seasonal,
            iterations: self.config.max_iterations,
            converged: false,
        })
    }
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()))
}

impl SeasonalBaselineFilter for TvSeasonalSolver {
    fn filter(
        &self,
        signal: &[f64],
        smoothness: &BaselineSmoothness,
    ) -> Result<SeasonalBaseline, SolverError> {
        let weights = DemixWeights {
            residual: 1.0,
            jump: smoothness.tv_weight,
            seasonal: smoothness.seasonal_weight,
        };
        let fit_mask: Vec<bool> = signal.iter().map(|v| v.is_finite()).collect();
        let decomposition = self.decompose(signal, &fit_mask, &weights)?;

        if !decomposition.converged {
            warn!(
                "Baseline filter stopped after {} iterations without converging, using last iterate",
                decomposition.iterations
            );
        }

        Ok(SeasonalBaseline {
            baseline: decomposition.piecewise,
            seasonal: decomposition.seasonal,
        })
    }

    fn name(&self) -> &str {
        TV_SEASONAL
    }
}

impl SignalDemixer for TvSeasonalSolver {
    fn demix(
        &self,
        signal: &[f64],
        fit_mask: &[bool],
        weights: &DemixWeights,
    ) -> Result<DemixedComponents, SolverError> {
        let decomposition = self.decompose(signal, fit_mask, weights)?;
        if !decomposition.converged {
            return Err(SolverError::NotConverged {
                iterations: decomposition.iterations,
            });
        }

        let residual = signal
            .iter()
            .zip(decomposition.piecewise.iter().zip(&decomposition.seasonal))
            .map(|(y, (p, s))| y - p - s)
            .collect();

        Ok(DemixedComponents {
            piecewise_constant: decomposition.piecewise,
            seasonal: decomposition.seasonal,
            residual,
        })
    }

    fn name(&self) -> &str {
        TV_SEASONAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn plateau_signal(seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..100)
            .map(|day| {
                let level = if day < 50 { 1.0 } else { 0.6 };
                level + rng.gen_range(-0.01..0.01)
            })
            .collect()
    }

    #[test]
    fn test_demix_recovers_plateaus() {
        let signal = plateau_signal(1);
        let solver = TvSeasonalSolver::default();
        let components = solver
            .demix(&signal, &[true; 100], &DemixWeights::default())
            .unwrap();

        let p = &components.piecewise_constant;
        assert_eq!(p.len(), 100);
        assert!((p[10] - 1.0).abs() < 0.06, "left plateau {}", p[10]);
        assert!((p[90] - 0.6).abs() < 0.06, "right plateau {}", p[90]);
        assert!(p[..50].iter().all(|v| *v > 0.8));
        assert!(p[50..].iter().all(|v| *v < 0.8));

        for i in 0..100 {
            let rebuilt = p[i] + components.seasonal[i] + components.residual[i];
            assert!((rebuilt - signal[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_masked_days_are_imputed() {
        let mut signal = plateau_signal(2);
        let mut mask = vec![true; 100];
        for day in [5, 20, 70, 71, 72] {
            mask[day] = false;
            signal[day] = 100.0;
        }
        signal[30] = f64::NAN;

        let components = TvSeasonalSolver::default()
            .demix(&signal, &mask, &DemixWeights::default())
            .unwrap();

        // Excluded outliers do not pull the fit
        let p = &components.piecewise_constant;
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(p[20] < 1.2 && p[71] < 0.8);
        assert!(components.residual[30].is_nan());
    }

    #[test]
    fn test_demix_rejects_bad_input() {
        let solver = TvSeasonalSolver::default();
        let weights = DemixWeights::default();

        assert_eq!(
            solver.demix(&[1.0, 2.0], &[true], &weights).unwrap_err(),
            SolverError::LengthMismatch { signal: 2, mask: 1 }
        );
        assert_eq!(
            solver.demix(&[1.0, 2.0], &[false, false], &weights).unwrap_err(),
            SolverError::EmptyFit
        );
        assert_eq!(
            solver.demix(&[], &[], &weights).unwrap_err(),
            SolverError::EmptyFit
        );

        let negative = DemixWeights {
            jump: -1.0,
            ..DemixWeights::default()
        };
        assert!(matches!(
            solver.demix(&[1.0], &[true], &negative),
            Err(SolverError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let solver = TvSeasonalSolver::new(SolverConfig {
            max_iterations: 1,
            tolerance: 1e-15,
            ..SolverConfig::default()
        });
        let signal = plateau_signal(3);
        let err = solver
            .demix(&signal, &[true; 100], &DemixWeights::default())
            .unwrap_err();
        assert_eq!(err, SolverError::NotConverged { iterations: 1 });

        // The filter keeps the last iterate instead
        let baseline = solver
            .filter(&signal, &BaselineSmoothness::default())
            .unwrap();
        assert_eq!(baseline.baseline.len(), 100);
    }

    #[test]
    fn test_filter_fills_gaps() {
        let mut signal: Vec<f64> = (0..60).map(|d| if d < 30 { 12.0 } else { 12.5 }).collect();
        signal[10] = f64::NAN;
        signal[45] = f64::NAN;

        let result = TvSeasonalSolver::default()
            .filter(&signal, &BaselineSmoothness::default())
            .unwrap();
        assert!(result.baseline.iter().all(|v| v.is_finite()));
        assert!(result.baseline[10] < result.baseline[45]);
        assert_eq!(result.seasonal.len(), 60);
    }
}
