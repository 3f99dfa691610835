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

use tracing::info;

use pvscope_types::{AnalysisConfig, PowerMatrix};

use crate::capacity::{CapacityChangePipeline, CapacityChangeReport, CapacityRequest};
use crate::error::AnalysisResult;
use crate::time_shift::{TimeShiftPipeline, TimeShiftReport};

/// Both analyses of one record. Each succeeds or fails on its own.
#[derive(Debug, Clone)]
pub struct RecordAnalysis {
    pub time_shift: AnalysisResult<TimeShiftReport>,
    pub capacity: AnalysisResult<CapacityChangeReport>,
}

/// Runs time-shift and capacity-change detection over the same record
#[derive(Debug, Clone)]
pub struct RecordAnalyzer {
    time_shift: TimeShiftPipeline,
    capacity: CapacityChangePipeline,
    request: CapacityRequest,
}

impl RecordAnalyzer {
    pub fn new(
        time_shift: TimeShiftPipeline,
        capacity: CapacityChangePipeline,
        request: CapacityRequest,
    ) -> Self {
        Self {
            time_shift,
            capacity,
            request,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            TimeShiftPipeline::from_config(config),
            CapacityChangePipeline::from_config(config),
            CapacityRequest::from_config(&config.capacity),
        )
    }

    /// Classify clear days once, then run both analyses in parallel on the rayon pool.
    ///
    /// Without an explicit filter in the request the capacity fit is restricted to clear days.
    pub fn analyze(&self, matrix: &PowerMatrix) -> RecordAnalysis {
        let clear_days = self.time_shift.classify(matrix);
        info!(
            "Analyzing record of {} days at {} samples per day, {} clear",
            matrix.days(),
            matrix.samples_per_day(),
            clear_days.count_clear()
        );

        let request = if self.request.filter_mask.is_some() {
            self.request.clone()
        } else {
            self.request.clone().with_filter(clear_days.clone())
        };

        let (time_shift, capacity) = rayon::join(
            || {
                self.time_shift
                    .detect_and_correct_with_mask(matrix, &clear_days)
            },
            || self.capacity.detect(matrix, &request),
        );

        RecordAnalysis {
            time_shift,
            capacity,
        }
    }
}

impl Default for RecordAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Run both analyses with the pipelines described by `config`
pub fn analyze_record(matrix: &PowerMatrix, config: &AnalysisConfig) -> RecordAnalysis {
    RecordAnalyzer::from_config(config).analyze(matrix)
}
