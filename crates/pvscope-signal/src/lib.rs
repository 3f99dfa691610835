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

//! Default signal-processing capabilities: clear-day classification, the seasonal baseline
//! filter and the piecewise-constant demixer, plus the registry that selects demixers by name.

pub mod clear_day;
pub mod registry;
pub mod seasonal;
pub mod solver;
pub mod tv;

pub use clear_day::SmoothnessEnergyClassifier;
pub use registry::SolverRegistry;
pub use seasonal::{SeasonalBasis, SeasonalFit};
pub use solver::{TV_SEASONAL, TvSeasonalSolver};
pub use tv::tv_denoise;
