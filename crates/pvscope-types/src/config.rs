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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

// ============= Analysis Configuration =============

/// Central configuration for a PVScope analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub time_shift: TimeShiftConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub clear_day: ClearDayConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Time-shift detection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeShiftConfig {
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub baseline: BaselineSmoothness,
}

/// Mode-clustering constants used to split the solar-noon baseline into regimes.
///
/// These encode how far apparent solar noon may plausibly drift, so they are fixed for a
/// pipeline rather than passed per call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Gaussian kernel bandwidth in hours
    pub kde_bandwidth: f64,
    /// Modes whose density is below this value are merged into a neighbour
    pub density_threshold: f64,
    /// Relative padding applied to the observed min/max when sampling the density
    pub padding_fraction: f64,
    /// Number of grid points the density is evaluated on
    pub grid_points: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            kde_bandwidth: 0.05,
            density_threshold: 0.1,
            padding_fraction: 0.05,
            grid_points: 50,
        }
    }
}

/// Weights of the seasonal baseline filter applied to the daily centroid signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineSmoothness {
    /// L1 penalty on jumps of the baseline
    pub tv_weight: f64,
    /// L2 penalty on the curvature of the annual component
    pub seasonal_weight: f64,
}

impl Default for BaselineSmoothness {
    fn default() -> Self {
        Self {
            tv_weight: 5.0,
            seasonal_weight: 2e-4,
        }
    }
}

/// Capacity-change detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Daily quantile used as capacity statistic (1.0 = daily maximum)
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    #[serde(default)]
    pub weights: DemixWeights,
    /// Registered demixer name; `None` selects the registry default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
}

fn default_quantile() -> f64 {
    1.0
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            quantile: default_quantile(),
            weights: DemixWeights::default(),
            solver: None,
        }
    }
}

/// Penalty weights of the demixing objective
///
/// `residual * Σ r² + jump * Σ |Δp| + seasonal * roughness(s)`, where the roughness of the
/// annual component is its summed squared second difference over one period, per year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemixWeights {
    pub residual: f64,
    pub jump: f64,
    pub seasonal: f64,
}

impl Default for DemixWeights {
    fn default() -> Self {
        Self {
            residual: 1.0,
            jump: 1.0,
            seasonal: 1e-5,
        }
    }
}

impl DemixWeights {
    /// Weights are usable when all are finite and non-negative and the residual term is active
    pub fn is_valid(&self) -> bool {
        [self.residual, self.jump, self.seasonal]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
            && self.residual > 0.0
    }
}

/// Clear-day classification settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearDayConfig {
    /// Percentile of daily roughness treated as a perfectly smooth day
    pub smoothness_percentile: f64,
    /// Width of the rolling daily-energy envelope in days
    pub envelope_window_days: usize,
    /// Percentile of daily energy used as the envelope
    pub envelope_percentile: f64,
    /// Minimum combined score for a day to count as clear
    pub threshold: f64,
}

impl Default for ClearDayConfig {
    fn default() -> Self {
        Self {
            smoothness_percentile: 10.0,
            envelope_window_days: 15,
            envelope_percentile: 90.0,
            threshold: 0.6,
        }
    }
}

/// Numerical settings shared by the default filter and demixer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Convergence threshold on the largest component update
    pub tolerance: f64,
    /// Number of annual harmonics in the seasonal basis
    pub harmonics: usize,
    pub period_days: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-7,
            harmonics: 4,
            period_days: 365.0,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML or JSON file, chosen by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            _ => Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
        };

        info!("Loaded analysis configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        let regime = &self.time_shift.regime;
        if !(regime.kde_bandwidth.is_finite() && regime.kde_bandwidth > 0.0) {
            anyhow::bail!("time_shift.regime.kde_bandwidth must be positive");
        }
        if !(regime.density_threshold.is_finite() && regime.density_threshold >= 0.0) {
            anyhow::bail!("time_shift.regime.density_threshold must be non-negative");
        }
        if !(0.0..1.0).contains(&regime.padding_fraction) {
            anyhow::bail!("time_shift.regime.padding_fraction must be in [0, 1)");
        }
        if regime.grid_points < 3 {
            anyhow::bail!("time_shift.regime.grid_points must be at least 3");
        }

        let baseline = &self.time_shift.baseline;
        if !(baseline.tv_weight >= 0.0 && baseline.seasonal_weight >= 0.0) {
            anyhow::bail!("time_shift.baseline weights must be non-negative");
        }

        if !(0.0..=1.0).contains(&self.capacity.quantile) {
            anyhow::bail!(
                "capacity.quantile must be in [0, 1], got {}",
                self.capacity.quantile
            );
        }
        if !self.capacity.weights.is_valid() {
            anyhow::bail!(
                "capacity.weights must be non-negative with a positive residual weight"
            );
        }

        let clear = &self.clear_day;
        if !(0.0..=100.0).contains(&clear.smoothness_percentile)
            || !(0.0..=100.0).contains(&clear.envelope_percentile)
        {
            anyhow::bail!("clear_day percentiles must be in [0, 100]");
        }
        if clear.envelope_window_days == 0 {
            anyhow::bail!("clear_day.envelope_window_days must be at least 1");
        }

        if self.solver.max_iterations == 0 {
            anyhow::bail!("solver.max_iterations must be at least 1");
        }
        if !(self.solver.tolerance > 0.0) {
            anyhow::bail!("solver.tolerance must be positive");
        }
        if !(self.solver.period_days > 2.0) {
            anyhow::bail!("solver.period_days must exceed two days");
        }

        Ok(())
    }
}
