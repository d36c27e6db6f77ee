//! The immutable options bundle handed to the trainer.

use crate::config::{ArffConfig, RwmConfig};
use crate::error::ArffResult;
use crate::loss::{Loss, MseLoss};
use crate::solver::{AmplitudeSolver, ConfiguredSolver};

/// Loop parameters plus the pluggable amplitude solver and reporting loss.
#[derive(Debug, Clone)]
pub struct TrainingOptions<S, L> {
    pub config: RwmConfig,
    pub solver: S,
    pub loss: L,
}

impl<S: AmplitudeSolver, L: Loss> TrainingOptions<S, L> {
    pub fn new(config: RwmConfig, solver: S, loss: L) -> ArffResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            solver,
            loss,
        })
    }
}

impl TrainingOptions<ConfiguredSolver, MseLoss> {
    /// Options described entirely by configuration, reporting mean squared error.
    pub fn from_config(config: &ArffConfig) -> ArffResult<Self> {
        Self::new(config.training.clone(), config.solver.build()?, MseLoss)
    }
}

/// γ = 3d − 2, the Metropolis exponent recommended for inputs in R^d
/// (Remark 1 of Kammonen et al., "Adaptive random Fourier features with
/// Metropolis sampling", 2020).
pub fn optimal_gamma(dim: usize) -> f64 {
    (3.0 * dim as f64 - 2.0).max(1.0)
}
