//! # arff-core: Adaptive Random Fourier Features
//!
//! Fits a function f(x) ≈ Σ_k β_k exp(i ω_k·x) to data. Amplitudes β come from
//! a regularised least-squares solve; wave vectors ω are resampled every epoch
//! by random-walk Metropolis, accepting moves that grow |β_k|, with an
//! optionally adapted Gaussian proposal covariance.
//!
//! ```no_run
//! use arff_core::{ArffConfig, DataProvider, DataSet, FourierModel, RwmTrainer, TrainingOptions};
//! use nalgebra::{DMatrix, DVector};
//!
//! # fn main() -> arff_core::ArffResult<()> {
//! let config = ArffConfig::default();
//! let mut rng = config.rng();
//! let x: Vec<_> = (0..50).map(|j| DVector::from_element(1, j as f64 / 49.0)).collect();
//! let y = x.iter().map(|x| (-x[0]).exp()).collect();
//! let data = DataProvider::fixed(DataSet::from_real(x, y)?);
//!
//! let mut model = FourierModel::random(8, 1, &mut rng)?;
//! let mut trainer = RwmTrainer::new(TrainingOptions::from_config(&config)?);
//! let outcome = trainer.train(&mut model, &data, &DMatrix::identity(1, 1), &mut rng)?;
//! println!("final loss {:?}", outcome.metrics.final_loss());
//! # Ok(())
//! # }
//! ```

// Foundation
pub mod config;
pub mod error;
pub mod logging;

// Model and data
pub mod data;
pub mod loss;
pub mod model;
pub mod solver;

// Sampling
pub mod options;
pub mod proposal;
pub mod rwm;

// Training
pub mod callbacks;
pub mod metrics;
pub mod train;

// Re-exports
pub use callbacks::{ProgressLogger, TrainingCallback};
pub use config::{ArffConfig, RwmConfig, SolverConfig, load_config};
pub use data::{DataProvider, DataScalings, DataSet};
pub use error::{ArffError, ArffResult, SolveStage};
pub use logging::{init_json_tracing, init_tracing};
pub use loss::{Loss, MseLoss};
pub use metrics::TrainingMetrics;
pub use model::{FourierModel, design_matrix};
pub use options::{TrainingOptions, optimal_gamma};
pub use proposal::{CovarianceAdapter, Proposal};
pub use rwm::{EpochReport, RwmExecutor, acceptance_probability};
pub use solver::{
    AmplitudeSolver, ConfiguredSolver, NormalEquations, SobolevSolver, SolverKind, SvdSolver,
};
pub use train::{RwmTrainer, TrainingOutcome, TrajectoryOutcome};
