//! One epoch of random-walk Metropolis sampling over the wave vectors.
//!
//! Each epoch refits β to the current ω, then runs `inner_steps` rounds of:
//! propose ω', refit β' to ω', and accept each pair (β'_k, ω'_k) on its own
//! with probability min(1, (|β'_k|/|β_k|)^γ). Slot-wise moves are valid
//! because the target density factors over frequencies, and they let large
//! amplitudes pull frequencies toward the spectral mass of the data.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::data::DataSet;
use crate::error::{ArffError, ArffResult, SolveStage};
use crate::loss::Loss;
use crate::model::{FourierModel, design_matrix};
use crate::options::TrainingOptions;
use crate::proposal::{CovarianceAdapter, Proposal};
use crate::solver::AmplitudeSolver;

/// Diagnostics produced by one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// 1-based epoch index.
    pub epoch: usize,
    /// Total epochs in the run.
    pub epochs: usize,
    /// Accepted fraction of the K proposals, averaged over the inner steps.
    pub acceptance_rate: f64,
    /// Reporting loss, when loss recording is enabled.
    pub loss: Option<f64>,
    /// Whether Σ was re-estimated at the end of this epoch.
    pub covariance_adapted: bool,
}

/// Probability of replacing amplitude `current` by `proposed`.
///
/// A zero current amplitude always yields 1: any finite proposal is an
/// unbounded relative improvement.
pub fn acceptance_probability(current: Complex64, proposed: Complex64, gamma: f64) -> f64 {
    let current = current.norm();
    if current == 0.0 {
        return 1.0;
    }
    (proposed.norm() / current).powf(gamma).min(1.0)
}

/// Rejects a model that already holds a wave vector beyond `cutoff`.
///
/// Proposals past the cutoff are never accepted, so a starting frequency
/// beyond it is a configuration error.
pub(crate) fn check_cutoff(model: &FourierModel, cutoff: f64) -> ArffResult<()> {
    if let Some(k) = model.omega.iter().position(|w| w.norm() > cutoff) {
        return Err(ArffError::config(format!(
            "frequency {k} has norm {} above max_frequency_norm {cutoff}",
            model.omega[k].norm()
        )));
    }
    Ok(())
}

/// Runs epochs against a shared proposal state.
///
/// Owns the proposal covariance Σ and, when adaptation is enabled, the running
/// statistics of the accepted wave vectors.
pub struct RwmExecutor<'a, S, L> {
    options: &'a TrainingOptions<S, L>,
    sigma: DMatrix<f64>,
    proposal: Proposal,
    adapter: CovarianceAdapter,
}

impl<'a, S: AmplitudeSolver, L: Loss> RwmExecutor<'a, S, L> {
    pub fn new(options: &'a TrainingOptions<S, L>, sigma: DMatrix<f64>) -> ArffResult<Self> {
        let proposal = Proposal::new(&sigma, options.config.step_size)?;
        let adapter = CovarianceAdapter::new(sigma.nrows());
        Ok(Self {
            options,
            sigma,
            proposal,
            adapter,
        })
    }

    /// The proposal covariance currently in use.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.sigma
    }

    pub fn into_covariance(self) -> DMatrix<f64> {
        self.sigma
    }

    /// Advance `model` by one epoch on `data`.
    pub fn run_epoch<R: Rng + ?Sized>(
        &mut self,
        epoch: usize,
        model: &mut FourierModel,
        data: &DataSet,
        rng: &mut R,
    ) -> ArffResult<EpochReport> {
        let options = self.options;
        let config = &options.config;
        let features = model.len();
        let cutoff = config.frequency_cutoff();
        let dim = self.sigma.nrows();
        if model.dim() != dim || data.dim() != dim {
            return Err(ArffError::config(format!(
                "dimension mismatch: covariance {dim}, model {}, data {}",
                model.dim(),
                data.dim()
            )));
        }
        check_cutoff(model, cutoff)?;

        model.beta = self
            .solve(data, &model.omega)
            .map_err(|e| e.at(epoch, SolveStage::Initial))?;

        let mut acceptance_sum = 0.0;
        for step in 1..=config.inner_steps {
            let mut proposed = self.proposal.propose(&model.omega, rng);
            let beta_proposed = self
                .solve(data, &proposed)
                .map_err(|e| e.at(epoch, SolveStage::Inner(step)))?;

            let mut accepted = 0usize;
            for (slot, candidate) in proposed.iter_mut().enumerate() {
                let u: f64 = rng.gen_range(0.0..1.0);
                let p =
                    acceptance_probability(model.beta[slot], beta_proposed[slot], config.gamma);
                if u < p && candidate.norm() <= cutoff {
                    std::mem::swap(&mut model.omega[slot], candidate);
                    model.beta[slot] = beta_proposed[slot];
                    accepted += 1;
                }
            }
            acceptance_sum += accepted as f64 / features as f64;
            trace!(epoch, step, accepted, "rwm step");
        }
        let acceptance_rate = acceptance_sum / config.inner_steps as f64;

        let covariance_adapted =
            config.adapt_covariance && epoch > config.burn_in && self.adapt(epoch, &model.omega)?;

        // accepted slots carry amplitudes from different proposals
        model.beta = self
            .solve(data, &model.omega)
            .map_err(|e| e.at(epoch, SolveStage::Final))?;

        let loss = config
            .record_loss
            .then(|| options.loss.evaluate(model, data.x(), data.y().as_slice()));

        debug!(epoch, acceptance_rate, ?loss, covariance_adapted, "epoch complete");
        Ok(EpochReport {
            epoch,
            epochs: config.epochs,
            acceptance_rate,
            loss,
            covariance_adapted,
        })
    }

    fn solve(&self, data: &DataSet, omega: &[DVector<f64>]) -> ArffResult<DVector<Complex64>> {
        let design = design_matrix(data.x(), omega);
        let beta = self.options.solver.solve(&design, data.y(), omega)?;
        if beta.len() != omega.len() {
            return Err(ArffError::numerical(format!(
                "solver returned {} amplitudes for {} frequencies",
                beta.len(),
                omega.len()
            )));
        }
        Ok(beta)
    }

    /// Fold the epoch's wave vectors into the running statistics and refresh Σ.
    ///
    /// The sample is the chain state: all K current wave vectors, including
    /// slots whose proposals were rejected this epoch.
    fn adapt(&mut self, epoch: usize, omega: &[DVector<f64>]) -> ArffResult<bool> {
        self.adapter.observe_all(omega);
        let floor = self.options.config.covariance_floor;
        let Some((sigma, floored)) = self.adapter.covariance(floor) else {
            return Ok(false);
        };
        if floored {
            debug!(epoch, samples = self.adapter.count(), floor, "adapted covariance floored");
        }
        self.proposal = Proposal::new(&sigma, self.options.config.step_size).map_err(|e| {
            ArffError::numerical(format!("adapted covariance unusable at epoch {epoch}: {e}"))
        })?;
        self.sigma = sigma;
        Ok(true)
    }
}
