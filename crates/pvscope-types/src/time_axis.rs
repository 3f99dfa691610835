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

//! Time-axis standardization for raw, irregular power readings.
//!
//! Raw acquisition data skips scans and stamps readings at fractional, irregular times. The
//! functions here rebuild a regular axis starting at midnight of the first day and snap every
//! grid point to the nearest recorded reading, so the series can be reshaped into a
//! [`PowerMatrix`].

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matrix::{MatrixError, PowerMatrix};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeAxisError {
    #[error("at least two readings are required, got {0}")]
    TooFewReadings(usize),

    #[error("readings have no positive spacing")]
    NoCadence,

    #[error("cadence of {0}s does not divide a day")]
    CadenceDoesNotDivideDay(i64),

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Series on a regular axis starting at midnight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularSeries {
    pub start: NaiveDateTime,
    pub cadence_secs: i64,
    pub values: Vec<f64>,
}

impl RegularSeries {
    pub fn samples_per_day(&self) -> usize {
        usize::try_from(SECONDS_PER_DAY / self.cadence_secs).unwrap_or(0)
    }

    /// Reshape into a day-by-sample matrix
    pub fn into_matrix(self) -> Result<PowerMatrix, TimeAxisError> {
        let samples_per_day = self.samples_per_day();
        Ok(PowerMatrix::from_regular_series(
            &self.values,
            samples_per_day,
        )?)
    }
}

/// Rebuild a regular time axis over whole days.
///
/// The cadence is the median spacing between consecutive readings. The grid runs from midnight
/// of the first day up to, but excluding, midnight after the last day. Each grid point takes the
/// value of the nearest reading (the earlier one on ties) and non-finite values become zero.
pub fn standardize_time_axis(
    readings: &[(NaiveDateTime, f64)],
) -> Result<RegularSeries, TimeAxisError> {
    if readings.len() < 2 {
        return Err(TimeAxisError::TooFewReadings(readings.len()));
    }

    let mut sorted = readings.to_vec();
    sorted.sort_by_key(|(ts, _)| *ts);

    let mut spacings: Vec<i64> = sorted
        .windows(2)
        .map(|pair| (pair[1].0 - pair[0].0).num_seconds())
        .filter(|&secs| secs > 0)
        .collect();
    if spacings.is_empty() {
        return Err(TimeAxisError::NoCadence);
    }
    spacings.sort_unstable();
    let cadence_secs = spacings[spacings.len() / 2];
    if SECONDS_PER_DAY % cadence_secs != 0 {
        return Err(TimeAxisError::CadenceDoesNotDivideDay(cadence_secs));
    }

    let first_day = sorted[0].0.date();
    let last_day = sorted[sorted.len() - 1].0.date();
    let start = first_day.and_time(chrono::NaiveTime::MIN);
    let day_count = (last_day - first_day).num_days() + 1;
    let total = usize::try_from(day_count * SECONDS_PER_DAY / cadence_secs).unwrap_or(0);

    let mut values = Vec::with_capacity(total);
    let mut cursor = 0_usize;
    for index in 0..total {
        let offset = i64::try_from(index).unwrap_or(i64::MAX) * cadence_secs;
        let ts = start + Duration::seconds(offset);
        // Readings are sorted and grid points increase, so the nearest reading never moves back
        while cursor + 1 < sorted.len() && sorted[cursor + 1].0 <= ts {
            cursor += 1;
        }
        let mut nearest = sorted[cursor];
        if let Some(next) = sorted.get(cursor + 1)
            && (next.0 - ts).abs() < (ts - nearest.0).abs()
        {
            nearest = *next;
        }
        values.push(if nearest.1.is_finite() { nearest.1 } else { 0.0 });
    }

    tracing::debug!(
        "Standardized {} readings onto {} samples at {}s cadence",
        readings.len(),
        values.len(),
        cadence_secs
    );

    Ok(RegularSeries {
        start,
        cadence_secs,
        values,
    })
}
