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

//! NaN-ignoring aggregations. Gaps in power data are NaN, so every statistic skips them and
//! returns NaN only when nothing finite is left.

/// Mean of the finite values, NaN if there are none
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        #[expect(clippy::cast_precision_loss)]
        let n = count as f64;
        sum / n
    }
}

/// Largest finite value, NaN if there are none
pub fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NAN, f64::max)
}

/// Quantile (`q` in [0, 1]) of the finite values with linear interpolation between order
/// statistics. NaN if there are no finite values.
pub fn nan_quantile(values: &[f64], q: f64) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted_quantile(&mut finite, q)
}

/// Percentile (`p` in [0, 100]) of the finite values
pub fn nan_percentile(values: &[f64], p: f64) -> f64 {
    nan_quantile(values, p / 100.0)
}

fn sorted_quantile(finite: &mut [f64], q: f64) -> f64 {
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_unstable_by(f64::total_cmp);

    #[expect(clippy::cast_precision_loss)]
    let position = q.clamp(0.0, 1.0) * (finite.len() - 1) as f64;
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(finite.len() - 1);
    #[expect(clippy::cast_precision_loss)]
    let fraction = position - lower as f64;
    finite[lower] + (finite[upper] - finite[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_mean_skips_gaps() {
        assert_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn test_nan_max() {
        let values = [f64::NAN, 2.0, -1.0, 5.0];
        assert_eq!(nan_max(&values), 5.0);
        assert!(nan_max(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [4.0, 1.0, f64::NAN, 3.0, 2.0];
        assert_eq!(nan_quantile(&values, 0.0), 1.0);
        assert_eq!(nan_quantile(&values, 1.0), 4.0);
        assert_eq!(nan_quantile(&values, 0.5), 2.5);
        assert_eq!(nan_percentile(&values, 25.0), 1.75);
        assert!(nan_quantile(&[f64::NAN], 0.5).is_nan());
    }
}
