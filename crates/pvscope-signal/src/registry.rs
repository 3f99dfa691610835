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

use std::sync::Arc;
use tracing::{debug, info, warn};

use pvscope_types::{SignalDemixer, SolverConfig, SolverError};

use crate::solver::{TV_SEASONAL, TvSeasonalSolver};

/// Demixers selectable by name from configuration
#[derive(Debug, Clone)]
pub struct SolverRegistry {
    /// Registered demixers, most recent first
    demixers: Vec<Arc<dyn SignalDemixer>>,
}

impl SolverRegistry {
    pub fn new(demixers: Vec<Arc<dyn SignalDemixer>>) -> Self {
        Self { demixers }
    }

    /// Registry holding the built-in demixers
    pub fn with_default_solvers(config: SolverConfig) -> Self {
        let demixers: Vec<Arc<dyn SignalDemixer>> = vec![Arc::new(TvSeasonalSolver::new(config))];
        info!("Initialized SolverRegistry with {} demixers", demixers.len());
        Self::new(demixers)
    }

    /// Add a demixer; a later registration shadows an earlier one with the same name
    pub fn register(&mut self, demixer: Arc<dyn SignalDemixer>) {
        info!("Registering demixer: {}", demixer.name());
        self.demixers.insert(0, demixer);
    }

    /// Look up a demixer, `None` selects the default
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn SignalDemixer>, SolverError> {
        let wanted = name.unwrap_or(TV_SEASONAL);
        let found = self
            .demixers
            .iter()
            .find(|demixer| demixer.name() == wanted)
            .cloned();
        match found {
            Some(demixer) => {
                debug!("Resolved demixer '{}'", wanted);
                Ok(demixer)
            }
            None => {
                warn!(
                    "Demixer '{}' is not registered, available: {:?}",
                    wanted,
                    self.solver_names()
                );
                Err(SolverError::Unavailable(wanted.to_owned()))
            }
        }
    }

    pub fn solver_names(&self) -> Vec<String> {
        self.demixers.iter().map(|d| d.name().to_owned()).collect()
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::with_default_solvers(SolverConfig::default())
    }
}
