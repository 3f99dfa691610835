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

/// Round to one decimal place, half to even, with `-0.0` folded into `0.0`
pub fn round_level(value: f64) -> f64 {
    let rounded = (value * 10.0).round_ties_even() / 10.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Label each day by its rounded capacity level.
///
/// Returns the labels and the distinct levels; `levels[label]` is the rounded value of every day
/// carrying `label`. Labels are handed out in order of first appearance.
pub fn capacity_labels(piecewise_constant: &[f64]) -> (Vec<usize>, Vec<f64>) {
    let mut levels: Vec<f64> = Vec::new();
    let labels = piecewise_constant
        .iter()
        .map(|&value| {
            let level = round_level(value);
            match levels.iter().position(|known| known.to_bits() == level.to_bits()) {
                Some(label) => label,
                None => {
                    levels.push(level);
                    levels.len() - 1
                }
            }
        })
        .collect();
    (labels, levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_level() {
        assert_eq!(round_level(0.94), 0.9);
        assert_eq!(round_level(0.96), 1.0);
        assert_eq!(round_level(0.25), 0.2);
        assert_eq!(round_level(-0.01).to_bits(), 0.0_f64.to_bits());
    }

    #[test]
    fn test_labels_follow_first_appearance() {
        let (labels, levels) = capacity_labels(&[0.61, 0.59, 1.02, 0.98, 0.6, 0.3]);
        assert_eq!(labels, vec![0, 0, 1, 1, 0, 2]);
        assert_eq!(levels, vec![0.6, 1.0, 0.3]);
    }

    #[test]
    fn test_empty_input() {
        let (labels, levels) = capacity_labels(&[]);
        assert!(labels.is_empty());
        assert!(levels.is_empty());
    }
}
