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

//! Detection of clock shifts and capacity changes in PV power records.

pub mod analysis;
pub mod capacity;
pub mod centroid;
pub mod error;
pub mod regime;
pub mod time_shift;

pub use analysis::{RecordAnalysis, RecordAnalyzer, analyze_record};
pub use capacity::{
    CapacityChangePipeline, CapacityChangeReport, CapacityRequest, capacity_labels,
    capacity_metric, detect_capacity_changes, detect_changes,
};
pub use centroid::daily_centroids;
pub use error::{AnalysisError, AnalysisResult};
pub use regime::{ModeAnalysis, RegimeSegmenter};
pub use time_shift::{
    TimeShiftPipeline, TimeShiftReport, apply_shifts, detect_and_correct_time_shifts,
    shift_schedule,
};

// Collaborator contracts consumed by the pipelines
pub use pvscope_types::{
    ClearDayClassifier, DemixedComponents, SeasonalBaseline, SeasonalBaselineFilter,
    SignalDemixer, SolverError,
};
