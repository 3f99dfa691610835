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

pub mod collaborators;
pub mod config;
pub mod matrix;
pub mod stats;
pub mod time_axis;

// Re-export common types for convenience
pub use collaborators::{
    ClearDayClassifier, DemixedComponents, SeasonalBaseline, SeasonalBaselineFilter,
    SignalDemixer, SolverError,
};
pub use config::{
    AnalysisConfig, BaselineSmoothness, CapacityConfig, ClearDayConfig, DemixWeights,
    RegimeConfig, SolverConfig, TimeShiftConfig,
};
pub use matrix::{ClearDayMask, MatrixError, PowerMatrix};
pub use time_axis::{RegularSeries, TimeAxisError, standardize_time_axis};
