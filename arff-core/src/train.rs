//! Training driver: runs RWM epochs over a data provider and records diagnostics.

use nalgebra::DMatrix;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::callbacks::{ProgressLogger, TrainingCallback};
use crate::data::DataProvider;
use crate::error::{ArffError, ArffResult};
use crate::loss::Loss;
use crate::metrics::TrainingMetrics;
use crate::model::FourierModel;
use crate::options::TrainingOptions;
use crate::rwm::{RwmExecutor, check_cutoff};
use crate::solver::AmplitudeSolver;

/// Result of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Proposal covariance after the last epoch. Identical to the input
    /// covariance when adaptation is disabled.
    pub covariance: DMatrix<f64>,
    pub metrics: TrainingMetrics,
}

impl TrainingOutcome {
    pub fn acceptance_rate(&self) -> &[f64] {
        &self.metrics.acceptance_history
    }

    pub fn loss(&self) -> &[f64] {
        &self.metrics.loss_history
    }
}

/// Result of a run that also kept a copy of the model after every epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryOutcome {
    /// `trajectory[i]` is the model at the end of epoch `i + 1`.
    pub trajectory: Vec<FourierModel>,
    pub outcome: TrainingOutcome,
}

/// Trains Fourier feature models with adaptive random-walk Metropolis.
pub struct RwmTrainer<S, L> {
    options: TrainingOptions<S, L>,
    callbacks: Vec<Box<dyn TrainingCallback>>,
}

impl<S: AmplitudeSolver, L: Loss> RwmTrainer<S, L> {
    pub fn new(options: TrainingOptions<S, L>) -> Self {
        let mut callbacks: Vec<Box<dyn TrainingCallback>> = Vec::new();
        if let Some(every) = options.config.progress_every {
            callbacks.push(Box::new(ProgressLogger::new(every)));
        }
        Self { options, callbacks }
    }

    pub fn with_callback(mut self, callback: impl TrainingCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn options(&self) -> &TrainingOptions<S, L> {
        &self.options
    }

    /// Train `model` in place.
    ///
    /// `sigma` is the initial proposal covariance; the final one is returned
    /// in the outcome. On error the model holds the state reached by the
    /// last completed solve.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        model: &mut FourierModel,
        data: &DataProvider,
        sigma: &DMatrix<f64>,
        rng: &mut R,
    ) -> ArffResult<TrainingOutcome> {
        self.run(model, data, sigma, rng, None)
    }

    /// Train a copy of `initial`, keeping an independent snapshot of the model
    /// after every epoch.
    pub fn train_trajectory<R: Rng + ?Sized>(
        &mut self,
        initial: &FourierModel,
        data: &DataProvider,
        sigma: &DMatrix<f64>,
        rng: &mut R,
    ) -> ArffResult<TrajectoryOutcome> {
        let mut model = initial.clone();
        let mut trajectory = Vec::with_capacity(self.options.config.epochs);
        let outcome = self.run(&mut model, data, sigma, rng, Some(&mut trajectory))?;
        Ok(TrajectoryOutcome {
            trajectory,
            outcome,
        })
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        model: &mut FourierModel,
        data: &DataProvider,
        sigma: &DMatrix<f64>,
        rng: &mut R,
        mut trajectory: Option<&mut Vec<FourierModel>>,
    ) -> ArffResult<TrainingOutcome> {
        let config = &self.options.config;
        config.validate()?;
        if model.dim() != data.dim() {
            return Err(ArffError::config(format!(
                "model frequencies have dimension {} but data has dimension {}",
                model.dim(),
                data.dim()
            )));
        }
        if sigma.nrows() != model.dim() || sigma.ncols() != model.dim() {
            return Err(ArffError::config(format!(
                "proposal covariance is {}x{} but frequencies have dimension {}",
                sigma.nrows(),
                sigma.ncols(),
                model.dim()
            )));
        }
        check_cutoff(model, config.frequency_cutoff())?;

        let mut executor = RwmExecutor::new(&self.options, sigma.clone())?;
        let mut metrics = TrainingMetrics::default();
        info!(
            epochs = config.epochs,
            features = model.len(),
            dim = model.dim(),
            batch = data.batch_len(),
            "starting RWM training"
        );

        for epoch in 1..=config.epochs {
            let batch = data.batch(epoch, rng);
            let report = executor.run_epoch(epoch, model, &batch, rng)?;
            metrics.record_epoch(report.acceptance_rate, report.loss);
            if let Some(trajectory) = trajectory.as_deref_mut() {
                trajectory.push(model.clone());
            }
            for callback in &mut self.callbacks {
                callback.on_epoch_end(&report);
            }
        }

        info!(
            mean_acceptance = metrics.mean_acceptance(),
            final_loss = metrics.final_loss(),
            "RWM training finished"
        );
        Ok(TrainingOutcome {
            covariance: executor.into_covariance(),
            metrics,
        })
    }
}
