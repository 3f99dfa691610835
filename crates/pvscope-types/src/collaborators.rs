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

//! Contracts of the capabilities the detection algorithms consume.
//!
//! Clear-day classification, seasonal baseline filtering and signal demixing are injected into
//! the pipelines through these traits so alternative implementations can be swapped in without
//! touching the detection logic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{BaselineSmoothness, DemixWeights};
use crate::matrix::{ClearDayMask, PowerMatrix};

/// Failures of a filter or demixing solver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("invalid penalty weights: {0}")]
    InvalidWeights(String),

    #[error("signal has {signal} samples but the fit mask has {mask}")]
    LengthMismatch { signal: usize, mask: usize },

    #[error("no finite samples selected for fitting")]
    EmptyFit,

    #[error("did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("solver '{0}' is not available")]
    Unavailable(String),
}

/// Output of a seasonal baseline filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBaseline {
    /// Denoised, gap-free baseline with the seasonal term removed
    pub baseline: Vec<f64>,
    /// Smooth annual component
    pub seasonal: Vec<f64>,
}

/// Piecewise-constant, seasonal and residual parts of a demixed signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemixedComponents {
    pub piecewise_constant: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

/// Classifies days free of cloud-induced irregularity
pub trait ClearDayClassifier: Send + Sync + fmt::Debug {
    /// One flag per day of `matrix`
    fn classify(&self, matrix: &PowerMatrix) -> ClearDayMask;

    /// Classifier name for logging
    fn name(&self) -> &str;
}

/// Denoises a gappy daily signal into a baseline plus a smooth seasonal term
pub trait SeasonalBaselineFilter: Send + Sync + fmt::Debug {
    /// `signal` may contain NaN gaps; the returned baseline has none
    fn filter(
        &self,
        signal: &[f64],
        smoothness: &BaselineSmoothness,
    ) -> Result<SeasonalBaseline, SolverError>;

    /// Filter name for logging
    fn name(&self) -> &str;
}

/// Splits a daily signal into piecewise-constant, annual-seasonal and residual components
pub trait SignalDemixer: Send + Sync + fmt::Debug {
    /// Only days with `fit_mask[i] == true` contribute to the fit residual. All three
    /// components have the length of `signal`.
    fn demix(
        &self,
        signal: &[f64],
        fit_mask: &[bool],
        weights: &DemixWeights,
    ) -> Result<DemixedComponents, SolverError>;

    /// Solver name for logging and registry lookup
    fn name(&self) -> &str;
}
