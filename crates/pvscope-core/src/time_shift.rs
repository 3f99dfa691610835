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

//! Time-shift detection and correction.
//!
//! The daily centroid tracks apparent solar noon. Restricted to clear days and passed through the
//! seasonal baseline filter it becomes a step signal whose steps are clock changes. Steps are found
//! by [`RegimeSegmenter`] and undone by rolling every later regime back onto the first one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use pvscope_signal::{SmoothnessEnergyClassifier, TvSeasonalSolver};
use pvscope_types::stats::nan_mean;
use pvscope_types::{
    AnalysisConfig, BaselineSmoothness, ClearDayClassifier, ClearDayMask, PowerMatrix,
    SeasonalBaselineFilter,
};

use crate::centroid::daily_centroids;
use crate::error::{AnalysisError, AnalysisResult};
use crate::regime::RegimeSegmenter;

/// Outcome of a time-shift run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeShiftReport {
    /// Input with every regime aligned to the first one; equal to the input when nothing was found
    pub corrected: PowerMatrix,
    /// Days on which a new regime starts, strictly increasing
    pub boundaries: Vec<usize>,
    /// Roll applied to each regime in samples, 0 for the first
    pub shifts: Vec<i64>,
    /// Daily centroids in hours
    pub centroids: Vec<f64>,
    /// Centroids with non-clear days set to NaN
    pub filtered_centroids: Vec<f64>,
    /// Filtered baseline the regimes were detected on, empty when no day was clear
    pub baseline: Vec<f64>,
    pub clear_days: ClearDayMask,
}

impl TimeShiftReport {
    pub fn shift_detected(&self) -> bool {
        !self.boundaries.is_empty()
    }

    fn unchanged(
        matrix: &PowerMatrix,
        centroids: Vec<f64>,
        filtered_centroids: Vec<f64>,
        baseline: Vec<f64>,
        clear_days: ClearDayMask,
    ) -> Self {
        Self {
            corrected: matrix.clone(),
            boundaries: Vec::new(),
            shifts: vec![0],
            centroids,
            filtered_centroids,
            baseline,
            clear_days,
        }
    }
}

/// Roll per regime that aligns it with the first regime.
///
/// Each regime's offset is its mean filtered centroid in samples, `round(hours * rows / 24)`.
/// A regime without any clear day keeps its data as is, and nothing moves when the first regime
/// has no clear day.
pub fn shift_schedule(filtered_centroids: &[f64], boundaries: &[usize], rows: usize) -> Vec<i64> {
    let segments = segment_ranges(boundaries, filtered_centroids.len());

    #[expect(clippy::cast_precision_loss)]
    let samples_per_hour = rows as f64 / 24.0;
    let offsets: Vec<Option<i64>> = segments
        .iter()
        .map(|&(start, end)| {
            let mean = nan_mean(&filtered_centroids[start..end]);
            #[expect(clippy::cast_possible_truncation)]
            let offset = mean
                .is_finite()
                .then(|| (mean * samples_per_hour).round_ties_even() as i64);
            offset
        })
        .collect();

    let Some(reference) = offsets.first().copied().flatten() else {
        warn!("First regime has no clear day, leaving every regime in place");
        return vec![0; segments.len()];
    };

    offsets
        .iter()
        .enumerate()
        .map(|(segment, offset)| match offset {
            Some(offset) => reference - offset,
            None => {
                warn!("Regime {} has no clear day, leaving it in place", segment);
                0
            }
        })
        .collect()
}

/// Copy of `matrix` with each regime's days rolled circularly by its shift
pub fn apply_shifts(matrix: &PowerMatrix, boundaries: &[usize], shifts: &[i64]) -> PowerMatrix {
    let mut corrected = matrix.clone();
    let rows = matrix.samples_per_day();
    let Ok(period) = i64::try_from(rows) else {
        return corrected;
    };

    for (&(start, end), &shift) in segment_ranges(boundaries, matrix.days()).iter().zip(shifts) {
        let Ok(roll) = usize::try_from(shift.rem_euclid(period)) else {
            continue;
        };
        if roll == 0 {
            continue;
        }
        for day in start..end {
            corrected.day_mut(day).rotate_right(roll);
        }
    }
    corrected
}

/// `[start, end)` day ranges of the regimes delimited by `boundaries`
fn segment_ranges(boundaries: &[usize], days: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(boundaries.len() + 2);
    edges.push(0);
    edges.extend(boundaries.iter().copied().filter(|&b| b > 0 && b < days));
    edges.push(days);
    edges.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Detects clock shifts in a power matrix and realigns it
#[derive(Debug, Clone)]
pub struct TimeShiftPipeline {
    classifier: Arc<dyn ClearDayClassifier>,
    filter: Arc<dyn SeasonalBaselineFilter>,
    segmenter: RegimeSegmenter,
    smoothness: BaselineSmoothness,
}

impl TimeShiftPipeline {
    pub fn new(
        classifier: Arc<dyn ClearDayClassifier>,
        filter: Arc<dyn SeasonalBaselineFilter>,
        segmenter: RegimeSegmenter,
        smoothness: BaselineSmoothness,
    ) -> Self {
        Self {
            classifier,
            filter,
            segmenter,
            smoothness,
        }
    }

    /// Pipeline backed by the built-in classifier and filter
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            Arc::new(SmoothnessEnergyClassifier::new(config.clear_day)),
            Arc::new(TvSeasonalSolver::new(config.solver)),
            RegimeSegmenter::new(config.time_shift.regime),
            config.time_shift.baseline,
        )
    }

    pub fn classify(&self, matrix: &PowerMatrix) -> ClearDayMask {
        self.classifier.classify(matrix)
    }

    pub fn detect_and_correct(&self, matrix: &PowerMatrix) -> AnalysisResult<TimeShiftReport> {
        let clear_days = self.classifier.classify(matrix);
        self.detect_and_correct_with_mask(matrix, &clear_days)
    }

    /// Run with a precomputed clear-day mask
    pub fn detect_and_correct_with_mask(
        &self,
        matrix: &PowerMatrix,
        clear_days: &ClearDayMask,
    ) -> AnalysisResult<TimeShiftReport> {
        if clear_days.len() != matrix.days() {
            return Err(AnalysisError::ShapeMismatch {
                expected: matrix.days(),
                found: clear_days.len(),
            });
        }

        let centroids = daily_centroids(matrix);
        let filtered: Vec<f64> = centroids
            .iter()
            .enumerate()
            .map(|(day, &c)| if clear_days.is_clear(day) { c } else { f64::NAN })
            .collect();

        if !filtered.iter().any(|c| c.is_finite()) {
            warn!(
                "No clear day with energy among {} days, skipping time-shift detection",
                matrix.days()
            );
            return Ok(TimeShiftReport::unchanged(
                matrix,
                centroids,
                filtered,
                Vec::new(),
                clear_days.clone(),
            ));
        }

        debug!(
            "Filtering centroids of {} clear days with {}",
            clear_days.count_clear(),
            self.filter.name()
        );
        let baseline = self.filter.filter(&filtered, &self.smoothness)?.baseline;
        let boundaries = self.segmenter.boundaries(&baseline);

        if boundaries.is_empty() {
            debug!("No time shift detected");
            return Ok(TimeShiftReport::unchanged(
                matrix,
                centroids,
                filtered,
                baseline,
                clear_days.clone(),
            ));
        }

        let shifts = shift_schedule(&filtered, &boundaries, matrix.samples_per_day());
        let corrected = apply_shifts(matrix, &boundaries, &shifts);
        info!(
            "Detected time shifts on days {:?}, rolling regimes by {:?} samples",
            boundaries, shifts
        );

        Ok(TimeShiftReport {
            corrected,
            boundaries,
            shifts,
            centroids,
            filtered_centroids: filtered,
            baseline,
            clear_days: clear_days.clone(),
        })
    }
}

impl Default for TimeShiftPipeline {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Detect clock shifts with the default pipeline; returns the corrected matrix and the days on
/// which a new regime starts
pub fn detect_and_correct_time_shifts(
    matrix: &PowerMatrix,
) -> AnalysisResult<(PowerMatrix, Vec<usize>)> {
    let report = TimeShiftPipeline::default().detect_and_correct(matrix)?;
    Ok((report.corrected, report.boundaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvscope_types::{SeasonalBaseline, SolverError};

    #[derive(Debug)]
    struct AllClear;

    impl ClearDayClassifier for AllClear {
        fn classify(&self, matrix: &PowerMatrix) -> ClearDayMask {
            ClearDayMask::all(matrix.days())
        }

        fn name(&self) -> &str {
            "all-clear"
        }
    }

    /// Passes the signal through, carrying the last value over gaps
    #[derive(Debug)]
    struct CarryForward;

    impl SeasonalBaselineFilter for CarryForward {
        fn filter(
            &self,
            signal: &[f64],
            _smoothness: &BaselineSmoothness,
        ) -> Result<SeasonalBaseline, SolverError> {
            let first = signal
                .iter()
                .copied()
                .find(|v| v.is_finite())
                .ok_or(SolverError::EmptyFit)?;
            let mut last = first;
            let baseline = signal
                .iter()
                .map(|&v| {
                    if v.is_finite() {
                        last = v;
                    }
                    last
                })
                .collect();
            Ok(SeasonalBaseline {
                baseline,
                seasonal: vec![0.0; signal.len()],
            })
        }

        fn name(&self) -> &str {
            "carry-forward"
        }
    }

    fn pipeline() -> TimeShiftPipeline {
        TimeShiftPipeline::new(
            Arc::new(AllClear),
            Arc::new(CarryForward),
            RegimeSegmenter::default(),
            BaselineSmoothness::default(),
        )
    }

    /// 24 samples per day with a triangular profile peaking at `peak`
    fn day_profile(peak: usize) -> Vec<f64> {
        (0..24)
            .map(|i: usize| {
                let distance = i.abs_diff(peak);
                if distance < 6 {
                    #[expect(clippy::cast_precision_loss)]
                    let value = (6 - distance) as f64;
                    value
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn shifted_record(days: usize, shift_day: usize, peak_after: usize) -> PowerMatrix {
        let data = (0..days)
            .map(|d| day_profile(if d < shift_day { 10 } else { peak_after }))
            .collect();
        PowerMatrix::from_days(data).unwrap()
    }

    #[test]
    fn test_shift_schedule_is_relative_to_first_regime() {
        let filtered = [12.0, 12.0, f64::NAN, 13.0, 13.0, 11.0];
        let shifts = shift_schedule(&filtered, &[3, 5], 24);
        assert_eq!(shifts, vec![0, -1, 1]);
    }

    #[test]
    fn test_shift_schedule_without_clear_days() {
        let filtered = [12.0, 12.0, f64::NAN, f64::NAN, 14.0];
        assert_eq!(shift_schedule(&filtered, &[2, 4], 24), vec![0, 0, -2]);

        let filtered = [f64::NAN, f64::NAN, 13.0];
        assert_eq!(shift_schedule(&filtered, &[2], 24), vec![0, 0]);
    }

    #[test]
    fn test_apply_shifts_rolls_only_later_regimes() {
        let matrix = PowerMatrix::from_days(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![1.0, 2.0, 3.0, 4.0],
        ])
        .unwrap();

        let corrected = apply_shifts(&matrix, &[1, 2], &[0, 1, -1]);
        assert_eq!(corrected.day(0), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(corrected.day(1), &[4.0, 1.0, 2.0, 3.0]);
        assert_eq!(corrected.day(2), &[2.0, 3.0, 4.0, 1.0]);
        // The input is untouched
        assert_eq!(matrix.day(1), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_pipeline_detects_and_undoes_shift() {
        let matrix = shifted_record(60, 40, 7);
        let report = pipeline().detect_and_correct(&matrix).unwrap();

        assert!(report.shift_detected());
        assert_eq!(report.boundaries, vec![40]);
        assert_eq!(report.shifts, vec![0, 3]);
        assert_eq!(report.corrected, shifted_record(60, 60, 7));
    }

    #[test]
    fn test_pipeline_leaves_aligned_record_alone() {
        let matrix = shifted_record(30, 30, 7);
        let report = pipeline().detect_and_correct(&matrix).unwrap();
        assert!(!report.shift_detected());
        assert_eq!(report.shifts, vec![0]);
        assert_eq!(report.corrected, matrix);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let matrix = shifted_record(50, 20, 8);
        let first = pipeline().detect_and_correct(&matrix).unwrap();
        assert_eq!(first.boundaries, vec![20]);

        let second = pipeline().detect_and_correct(&first.corrected).unwrap();
        assert!(second.boundaries.is_empty());
        assert_eq!(second.corrected, first.corrected);
    }

    #[test]
    fn test_no_clear_days_is_not_an_error() {
        let matrix = shifted_record(10, 5, 7);
        let report = pipeline()
            .detect_and_correct_with_mask(&matrix, &ClearDayMask::new(vec![false; 10]))
            .unwrap();
        assert!(report.boundaries.is_empty());
        assert!(report.baseline.is_empty());
        assert_eq!(report.corrected, matrix);
    }

    #[test]
    fn test_mask_length_is_checked() {
        let matrix = shifted_record(10, 5, 7);
        let err = pipeline()
            .detect_and_correct_with_mask(&matrix, &ClearDayMask::all(9))
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ShapeMismatch {
                expected: 10,
                found: 9
            }
        );
    }
}
