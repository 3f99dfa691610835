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

//! Capacity-change detection.
//!
//! A daily capacity statistic is split into a piecewise-constant level, an annual seasonal term
//! and a residual. Rounded levels become per-day capacity labels; a label change marks a
//! capacity change.

mod labels;
mod metric;

pub use labels::{capacity_labels, round_level};
pub use metric::capacity_metric;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pvscope_signal::SolverRegistry;
use pvscope_types::{
    AnalysisConfig, CapacityConfig, ClearDayMask, DemixWeights, PowerMatrix, SignalDemixer,
};

use crate::error::{AnalysisError, AnalysisResult};

/// Parameters of one capacity-change run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityRequest {
    /// Days allowed to drive the fit; `None` includes every day
    pub filter_mask: Option<ClearDayMask>,
    pub quantile: f64,
    pub weights: DemixWeights,
    /// Registered demixer name; `None` selects the default
    pub solver: Option<String>,
}

impl Default for CapacityRequest {
    fn default() -> Self {
        Self::from_config(&CapacityConfig::default())
    }
}

impl CapacityRequest {
    pub fn from_config(config: &CapacityConfig) -> Self {
        Self {
            filter_mask: None,
            quantile: config.quantile,
            weights: config.weights,
            solver: config.solver.clone(),
        }
    }

    pub fn with_filter(mut self, mask: ClearDayMask) -> Self {
        self.filter_mask = Some(mask);
        self
    }
}

/// Metric, decomposition and labels of a capacity-change run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityChangeReport {
    pub metric: Vec<f64>,
    pub piecewise_constant: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub labels: Vec<usize>,
    /// Rounded capacity level of each label
    pub levels: Vec<f64>,
}

impl CapacityChangeReport {
    /// Days whose label differs from the previous day
    pub fn change_days(&self) -> Vec<usize> {
        self.labels
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| (pair[0] != pair[1]).then_some(i + 1))
            .collect()
    }

    /// Distinct rounded levels, indexed by label
    pub fn capacity_levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn label_count(&self) -> usize {
        self.levels.len()
    }
}

/// Demix `metric` and label every day by its rounded piecewise-constant level
pub fn detect_changes(
    metric: &[f64],
    inclusion: &ClearDayMask,
    demixer: &dyn SignalDemixer,
    weights: &DemixWeights,
) -> AnalysisResult<CapacityChangeReport> {
    if inclusion.len() != metric.len() {
        return Err(AnalysisError::ShapeMismatch {
            expected: metric.len(),
            found: inclusion.len(),
        });
    }

    let fit_mask: Vec<bool> = metric
        .iter()
        .enumerate()
        .map(|(day, value)| inclusion.is_clear(day) && value.is_finite())
        .collect();
    if !fit_mask.iter().any(|&fit| fit) {
        return Err(AnalysisError::EmptySelection);
    }

    debug!(
        "Demixing capacity metric of {} days with {}",
        metric.len(),
        demixer.name()
    );
    let components = demixer.demix(metric, &fit_mask, weights)?;
    let (labels, levels) = capacity_labels(&components.piecewise_constant);

    let report = CapacityChangeReport {
        metric: metric.to_vec(),
        piecewise_constant: components.piecewise_constant,
        seasonal: components.seasonal,
        residual: components.residual,
        labels,
        levels,
    };

    let changes = report.change_days();
    if changes.is_empty() {
        debug!("No capacity change detected");
    } else {
        info!(
            "Detected capacity changes on days {:?}, levels {:?}",
            changes, report.levels
        );
    }
    Ok(report)
}

/// Capacity-change detection with demixers chosen by name
#[derive(Debug, Clone, Default)]
pub struct CapacityChangePipeline {
    registry: SolverRegistry,
}

impl CapacityChangePipeline {
    pub fn new(registry: SolverRegistry) -> Self {
        Self { registry }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(SolverRegistry::with_default_solvers(config.solver))
    }

    pub fn registry_mut(&mut self) -> &mut SolverRegistry {
        &mut self.registry
    }

    pub fn detect(
        &self,
        matrix: &PowerMatrix,
        request: &CapacityRequest,
    ) -> AnalysisResult<CapacityChangeReport> {
        let inclusion = request
            .filter_mask
            .clone()
            .unwrap_or_else(|| ClearDayMask::all(matrix.days()));
        let metric = capacity_metric(matrix, &inclusion, request.quantile)?;
        let demixer = self.registry.resolve(request.solver.as_deref())?;
        detect_changes(&metric, &inclusion, demixer.as_ref(), &request.weights)
    }
}

/// Detect capacity changes with the default demixers.
///
/// Unset arguments fall back to the configuration defaults: every day included, daily maximum,
/// default weights and solver.
pub fn detect_capacity_changes(
    matrix: &PowerMatrix,
    filter_mask: Option<&ClearDayMask>,
    quantile: Option<f64>,
    weights: Option<DemixWeights>,
    solver: Option<&str>,
) -> AnalysisResult<CapacityChangeReport> {
    let defaults = CapacityRequest::default();
    let request = CapacityRequest {
        filter_mask: filter_mask.cloned(),
        quantile: quantile.unwrap_or(defaults.quantile),
        weights: weights.unwrap_or(defaults.weights),
        solver: solver.map(str::to_owned).or(defaults.solver),
    };
    CapacityChangePipeline::default().detect(matrix, &request)
}
