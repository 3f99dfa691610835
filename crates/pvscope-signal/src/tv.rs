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

//! Exact one-dimensional total-variation denoising.
//!
//! Solves `min_x ½ Σ (y_i - x_i)² + λ Σ |x_{i+1} - x_i|` with the direct taut-string algorithm
//! of L. Condat, "A Direct Algorithm for 1D Total Variation Denoising" (2013). The solution is
//! piecewise constant and is found in a single forward sweep with occasional restarts.

/// Denoise `input` with jump penalty `lambda`.
///
/// A non-positive or non-finite `lambda` returns the input unchanged.
pub fn tv_denoise(input: &[f64], lambda: f64) -> Vec<f64> {
    let n = input.len();
    let mut output = vec![0.0; n];
    if n == 0 {
        return output;
    }
    if !(lambda.is_finite() && lambda > 0.0) {
        return input.to_vec();
    }

    let two_lambda = 2.0 * lambda;
    let minus_lambda = -lambda;

    // k: current sample, k0: start of the open segment, km/kp: last positions where the lower
    // and upper taut-string bounds were touched
    let (mut k, mut k0, mut km, mut kp) = (0_usize, 0_usize, 0_usize, 0_usize);
    let mut umin = lambda;
    let mut umax = minus_lambda;
    let mut vmin = input[0] - lambda;
    let mut vmax = input[0] + lambda;

    loop {
        while k == n - 1 {
            if umin < 0.0 {
                fill_segment(&mut output, &mut k0, km, vmin);
                k = k0;
                km = k0;
                vmin = input[k0];
                umin = lambda;
                umax = vmin + umin - vmax;
            } else if umax > 0.0 {
                fill_segment(&mut output, &mut k0, kp, vmax);
                k = k0;
                kp = k0;
                vmax = input[k0];
                umax = minus_lambda;
                umin = vmax + umax - vmin;
            } else {
                vmin += umin / span(k0, k);
                fill_segment(&mut output, &mut k0, k, vmin);
                return output;
            }
        }

        umin += input[k + 1] - vmin;
        if umin < minus_lambda {
            // Negative jump
            fill_segment(&mut output, &mut k0, km, vmin);
            k = k0;
            km = k0;
            kp = k0;
            vmin = input[k0];
            vmax = vmin + two_lambda;
            umin = lambda;
            umax = minus_lambda;
            continue;
        }

        umax += input[k + 1] - vmax;
        if umax > lambda {
            // Positive jump
            fill_segment(&mut output, &mut k0, kp, vmax);
            k = k0;
            km = k0;
            kp = k0;
            vmax = input[k0];
            vmin = vmax - two_lambda;
            umin = lambda;
            umax = minus_lambda;
            continue;
        }

        k += 1;
        if umin >= lambda {
            km = k;
            vmin += (umin - lambda) / span(k0, km);
            umin = lambda;
        }
        if umax <= minus_lambda {
            kp = k;
            vmax += (umax + lambda) / span(k0, kp);
            umax = minus_lambda;
        }
    }
}

/// Write `value` over `k0..=last` and move `k0` past it
fn fill_segment(output: &mut [f64], k0: &mut usize, last: usize, value: f64) {
    let end = last.max(*k0);
    output[*k0..=end].fill(value);
    *k0 = end + 1;
}

/// Number of samples in `first..=last` as a float
fn span(first: usize, last: usize) -> f64 {
    #[expect(clippy::cast_precision_loss)]
    let len = (last - first + 1) as f64;
    len
}
