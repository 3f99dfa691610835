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

use thiserror::Error;

use pvscope_types::SolverError;

/// Whole-batch failures of an analysis run.
///
/// Per-day degeneracies (dark days, gaps) never show up here; they travel through the signals as
/// NaN. An empty boundary list from the time-shift pipeline is a result, not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("inclusion mask selects no days")]
    EmptySelection,

    #[error("no day has a usable capacity statistic")]
    NoUsableData,

    #[error("mask covers {found} days but the matrix has {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
