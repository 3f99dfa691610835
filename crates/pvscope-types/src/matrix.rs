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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or combining day-by-sample matrices
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("samples per day must be positive")]
    NoSamplesPerDay,

    #[error("data length {len} is not {samples_per_day} x {days}")]
    LengthMismatch {
        len: usize,
        samples_per_day: usize,
        days: usize,
    },

    #[error("series of {len} samples is not a whole number of {samples_per_day}-sample days")]
    PartialDay { len: usize, samples_per_day: usize },

    #[error("day {day} has {found} samples, expected {expected}")]
    RaggedDay {
        day: usize,
        found: usize,
        expected: usize,
    },
}

/// Day-by-intraday-sample power matrix.
///
/// Rows are the intraday sample index at a fixed cadence, columns are calendar days in
/// chronological order. Storage is day-major so every day's samples are contiguous.
/// Missing samples are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerMatrix {
    samples_per_day: usize,
    days: usize,
    data: Vec<f64>,
}

impl PowerMatrix {
    /// Build a matrix from day-major data (`data[day * samples_per_day + sample]`)
    pub fn new(samples_per_day: usize, days: usize, data: Vec<f64>) -> Result<Self, MatrixError> {
        if samples_per_day == 0 {
            return Err(MatrixError::NoSamplesPerDay);
        }
        if data.len() != samples_per_day * days {
            return Err(MatrixError::LengthMismatch {
                len: data.len(),
                samples_per_day,
                days,
            });
        }
        Ok(Self {
            samples_per_day,
            days,
            data,
        })
    }

    /// Build a matrix from one vector per day
    pub fn from_days(days: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let samples_per_day = days.first().map_or(0, Vec::len);
        if samples_per_day == 0 {
            return Err(MatrixError::NoSamplesPerDay);
        }
        let mut data = Vec::with_capacity(samples_per_day * days.len());
        for (day, samples) in days.iter().enumerate() {
            if samples.len() != samples_per_day {
                return Err(MatrixError::RaggedDay {
                    day,
                    found: samples.len(),
                    expected: samples_per_day,
                });
            }
            data.extend_from_slice(samples);
        }
        Self::new(samples_per_day, days.len(), data)
    }

    /// Chunk a regular series that starts at midnight into consecutive days
    pub fn from_regular_series(values: &[f64], samples_per_day: usize) -> Result<Self, MatrixError> {
        if samples_per_day == 0 {
            return Err(MatrixError::NoSamplesPerDay);
        }
        if values.len() % samples_per_day != 0 {
            return Err(MatrixError::PartialDay {
                len: values.len(),
                samples_per_day,
            });
        }
        Self::new(
            samples_per_day,
            values.len() / samples_per_day,
            values.to_vec(),
        )
    }

    pub fn samples_per_day(&self) -> usize {
        self.samples_per_day
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days == 0
    }

    /// Samples of a single day
    ///
    /// # Panics
    /// Panics if `day` is out of range.
    pub fn day(&self, day: usize) -> &[f64] {
        let start = day * self.samples_per_day;
        &self.data[start..start + self.samples_per_day]
    }

    pub fn day_mut(&mut self, day: usize) -> &mut [f64] {
        let start = day * self.samples_per_day;
        &mut self.data[start..start + self.samples_per_day]
    }

    /// Iterate over days in chronological order
    pub fn iter_days(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.samples_per_day)
    }

}

/// Per-day usability flags produced by a clear-day classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearDayMask(Vec<bool>);

impl ClearDayMask {
    pub fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// Every day usable
    pub fn all(days: usize) -> Self {
        Self(vec![true; days])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_clear(&self, day: usize) -> bool {
        self.0.get(day).copied().unwrap_or(false)
    }

    pub fn count_clear(&self) -> usize {
        self.0.iter().filter(|&&clear| clear).count()
    }
}
