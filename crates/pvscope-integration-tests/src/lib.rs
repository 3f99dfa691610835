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

//! Synthetic PV records for end-to-end tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use pvscope_types::PowerMatrix;

/// Five-minute cadence
pub const SAMPLES_PER_DAY: usize = 288;

/// Clear-sky profile: a half sine from 06:00 to 18:00 peaking at 1.0 at noon
pub fn clear_profile() -> Vec<f64> {
    profile_around(144.0)
}

/// Twelve-hour half sine centred on the fractional sample `noon`
fn profile_around(noon: f64) -> Vec<f64> {
    let sunrise = noon - 72.0;
    (0..SAMPLES_PER_DAY)
        .map(|i| {
            #[expect(clippy::cast_precision_loss)]
            let sample = i as f64;
            if (sunrise..=noon + 72.0).contains(&sample) {
                (PI * (sample - sunrise) / 144.0).sin().max(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Equation of time in minutes (sundial noon minus clock noon) for a day counted from 1 January
pub fn equation_of_time_minutes(day: usize) -> f64 {
    #[expect(clippy::cast_precision_loss)]
    let b = 2.0 * PI * (day as f64 - 81.0) / 365.0;
    9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()
}

/// Builder for a multi-day record with an annual amplitude cycle and a weekly cloudy day
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    days: usize,
    seed: u64,
    capacity_change: Option<(usize, f64)>,
    clock_shift: Option<(usize, usize)>,
    equation_of_time: bool,
}

impl RecordBuilder {
    pub fn new(days: usize) -> Self {
        Self {
            days,
            seed: 42,
            capacity_change: None,
            clock_shift: None,
            equation_of_time: false,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Scale output by `factor` from `day` on
    pub fn capacity_change(mut self, day: usize, factor: f64) -> Self {
        self.capacity_change = Some((day, factor));
        self
    }

    /// Delay the recorded clock by `samples` from `day` on
    pub fn clock_shift(mut self, day: usize, samples: usize) -> Self {
        self.clock_shift = Some((day, samples));
        self
    }

    /// Let solar noon follow the equation of time instead of sitting at 12:00
    pub fn equation_of_time(mut self) -> Self {
        self.equation_of_time = true;
        self
    }

    /// Same record without the clock shift
    pub fn without_clock_shift(mut self) -> Self {
        self.clock_shift = None;
        self
    }

    pub fn is_cloudy(day: usize) -> bool {
        day % 7 == 3
    }

    pub fn build_days(&self) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let profile = clear_profile();

        (0..self.days)
            .map(|day| {
                #[expect(clippy::cast_precision_loss)]
                let season = (2.0 * PI * day as f64 / 365.0).cos();
                let mut amplitude = 0.8 + 0.2 * season;
                if let Some((change_day, factor)) = self.capacity_change
                    && day >= change_day
                {
                    amplitude *= factor;
                }

                let shape = if self.equation_of_time {
                    // Five-minute samples
                    profile_around(144.0 + equation_of_time_minutes(day) / 5.0)
                } else {
                    profile.clone()
                };
                let mut samples: Vec<f64> = shape.iter().map(|p| amplitude * p).collect();
                if Self::is_cloudy(day) {
                    for sample in &mut samples {
                        *sample *= rng.gen_range(0.2..1.0);
                    }
                }
                if let Some((shift_day, shift)) = self.clock_shift
                    && day >= shift_day
                {
                    samples.rotate_right(shift);
                }
                samples
            })
            .collect()
    }

    pub fn build(&self) -> PowerMatrix {
        match PowerMatrix::from_days(self.build_days()) {
            Ok(matrix) => matrix,
            Err(err) => panic!("synthetic record is malformed: {err}"),
        }
    }

    /// Timestamped readings starting 2024-01-01, dropping every `skip_every`-th scan
    pub fn build_readings(&self, skip_every: usize) -> Vec<(NaiveDateTime, f64)> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();

        self.build_days()
            .into_iter()
            .flatten()
            .enumerate()
            .filter(|(index, _)| skip_every == 0 || index % skip_every != skip_every - 1)
            .map(|(index, value)| {
                let offset = i64::try_from(index).unwrap_or(i64::MAX) * 300;
                (start + Duration::seconds(offset), value)
            })
            .collect()
    }
}

/// Two capacity plateaus with small multiplicative noise
pub fn plateau_record(
    days: usize,
    change_day: usize,
    before: f64,
    after: f64,
    seed: u64,
) -> PowerMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let profile = clear_profile();
    let data = (0..days)
        .map(|day| {
            let level = if day < change_day { before } else { after };
            let amplitude = level + rng.gen_range(-0.01..0.01);
            profile.iter().map(|p| amplitude * p).collect()
        })
        .collect();
    match PowerMatrix::from_days(data) {
        Ok(matrix) => matrix,
        Err(err) => panic!("plateau record is malformed: {err}"),
    }
}
