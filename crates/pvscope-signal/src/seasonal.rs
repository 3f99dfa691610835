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

//! Smooth annual component expressed in a truncated Fourier basis.
//!
//! The component is `s = X a` where column pairs of `X` are `cos(2πk i / P)` and
//! `sin(2πk i / P)` for `k = 1..=K`. Roughness is the sum of squared second differences of
//! the periodic extension over one full period, measured per year, which is diagonal in `a`:
//! `g_k = (P / 2) · (P² (2 - 2 cos(2πk / P)))²`. The penalty covers the whole period, not only
//! the observed days.

use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

use pvscope_types::SolverError;

/// Ridge added to the normal equations so an all-masked fit stays solvable
const RIDGE: f64 = 1e-9;

/// Fourier design matrix with its normal-equation factor for fixed weights
#[derive(Debug, Clone)]
pub struct SeasonalBasis {
    design: DMatrix<f64>,
    penalty: DVector<f64>,
}

impl SeasonalBasis {
    /// Basis of `harmonics` annual harmonics over `len` days with a period of `period_days`
    pub fn new(len: usize, harmonics: usize, period_days: f64) -> Self {
        let columns = 2 * harmonics;
        let mut design = DMatrix::zeros(len, columns);
        let mut penalty = DVector::zeros(columns);

        for k in 1..=harmonics {
            #[expect(clippy::cast_precision_loss)]
            let frequency = 2.0 * PI * k as f64 / period_days;
            for day in 0..len {
                #[expect(clippy::cast_precision_loss)]
                let phase = frequency * day as f64;
                design[(day, 2 * k - 2)] = phase.cos();
                design[(day, 2 * k - 1)] = phase.sin();
            }

            let curvature = period_days * period_days * (2.0 - 2.0 * frequency.cos());
            let weight = 0.5 * period_days * curvature * curvature;
            penalty[2 * k - 2] = weight;
            penalty[2 * k - 1] = weight;
        }

        Self { design, penalty }
    }

    pub fn len(&self) -> usize {
        self.design.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.design.nrows() == 0
    }

    /// Prepare a solver for `min_a fit_weight ‖t - X a‖² + roughness_weight · aᵀ G a`
    pub fn fitter(
        &self,
        fit_weight: f64,
        roughness_weight: f64,
    ) -> Result<SeasonalFit<'_>, SolverError> {
        let columns = self.design.ncols();
        if columns == 0 {
            return Ok(SeasonalFit {
                basis: self,
                factor: None,
                fit_weight,
            });
        }

        let mut normal = self.design.tr_mul(&self.design) * fit_weight;
        for column in 0..columns {
            normal[(column, column)] += roughness_weight * self.penalty[column] + RIDGE;
        }

        let factor = normal.cholesky().ok_or_else(|| {
            SolverError::Numerical("seasonal normal equations are not positive definite".into())
        })?;

        Ok(SeasonalFit {
            basis: self,
            factor: Some(factor),
            fit_weight,
        })
    }
}

/// Factorized seasonal least-squares problem
#[derive(Debug)]
pub struct SeasonalFit<'a> {
    basis: &'a SeasonalBasis,
    factor: Option<nalgebra::Cholesky<f64, nalgebra::Dyn>>,
    fit_weight: f64,
}

impl SeasonalFit<'_> {
    /// Best seasonal component for `target`, evaluated on every day of the basis
    pub fn fit(&self, target: &[f64]) -> Vec<f64> {
        let Some(factor) = &self.factor else {
            return vec![0.0; self.basis.len()];
        };

        let target = DVector::from_column_slice(target);
        let rhs = self.basis.design.tr_mul(&target) * self.fit_weight;
        let coefficients = factor.solve(&rhs);
        (&self.basis.design * coefficients).iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_shape() {
        let basis = SeasonalBasis::new(100, 4, 365.0);
        assert_eq!(basis.len(), 100);
        assert_eq!(basis.design.ncols(), 8);
        assert!(!basis.is_empty());
    }

    #[test]
    fn test_weak_penalty_recovers_annual_cycle() {
        let days = 730;
        let target: Vec<f64> = (0..days)
            .map(|d| 0.3 * (2.0 * PI * f64::from(d) / 365.0).cos())
            .collect();
        let basis = SeasonalBasis::new(target.len(), 4, 365.0);
        let fitted = basis.fitter(1.0, 1e-9).unwrap().fit(&target);

        for (a, b) in fitted.iter().zip(&target) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_strong_penalty_flattens() {
        let target: Vec<f64> = (0..200).map(|d| if d < 100 { 1.0 } else { -1.0 }).collect();
        let basis = SeasonalBasis::new(target.len(), 4, 365.0);
        let fitted = basis.fitter(1.0, 1e3).unwrap().fit(&target);
        assert!(fitted.iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_no_harmonics_gives_zero_component() {
        let basis = SeasonalBasis::new(10, 0, 365.0);
        let fitted = basis.fitter(1.0, 1.0).unwrap().fit(&[1.0; 10]);
        assert_eq!(fitted, vec![0.0; 10]);
    }
}
