//! Configuration system for ARFF training.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ArffError, ArffResult};
use crate::solver::{ConfiguredSolver, SolverKind};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArffConfig {
    /// Seed for the run's random source; entropy is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub training: RwmConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl ArffConfig {
    /// Random source for a run, seeded when `seed` is set.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn to_toml_string(&self) -> ArffResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Scalar parameters of the random-walk Metropolis training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RwmConfig {
    /// Number of training epochs.
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// RWM proposals per epoch.
    #[serde(default = "default_inner_steps")]
    pub inner_steps: usize,
    /// Proposal step size δ.
    #[serde(default = "default_step_size")]
    pub step_size: f64,
    /// Epochs before covariance adaptation starts.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
    /// Metropolis exponent γ.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Wave vectors with a larger norm are always rejected. `None` means no cutoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frequency_norm: Option<f64>,
    #[serde(default = "default_true")]
    pub adapt_covariance: bool,
    /// Evaluate the loss at the end of every epoch.
    #[serde(default = "default_true")]
    pub record_loss: bool,
    /// Smallest eigenvalue allowed in an adapted proposal covariance.
    #[serde(default = "default_covariance_floor")]
    pub covariance_floor: f64,
    /// Log progress every n epochs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_every: Option<usize>,
}

impl Default for RwmConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            inner_steps: default_inner_steps(),
            step_size: default_step_size(),
            burn_in: default_burn_in(),
            gamma: default_gamma(),
            max_frequency_norm: None,
            adapt_covariance: true,
            record_loss: true,
            covariance_floor: default_covariance_floor(),
            progress_every: None,
        }
    }
}

impl RwmConfig {
    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> ArffResult<()> {
        if self.epochs == 0 {
            return Err(ArffError::config("epochs must be positive"));
        }
        if self.inner_steps == 0 {
            return Err(ArffError::config("inner_steps must be positive"));
        }
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(ArffError::config(format!(
                "step_size must be a positive finite number, got {}",
                self.step_size
            )));
        }
        if !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err(ArffError::config(format!(
                "gamma must be a positive finite number, got {}",
                self.gamma
            )));
        }
        if let Some(cutoff) = self.max_frequency_norm {
            if cutoff.is_nan() || cutoff <= 0.0 {
                return Err(ArffError::config(format!(
                    "max_frequency_norm must be positive, got {cutoff}"
                )));
            }
        }
        if !(self.covariance_floor > 0.0 && self.covariance_floor.is_finite()) {
            return Err(ArffError::config(format!(
                "covariance_floor must be a positive finite number, got {}",
                self.covariance_floor
            )));
        }
        if self.progress_every == Some(0) {
            return Err(ArffError::config("progress_every must be positive"));
        }
        Ok(())
    }

    /// The frequency norm cutoff, +∞ when unset.
    pub fn frequency_cutoff(&self) -> f64 {
        self.max_frequency_norm.unwrap_or(f64::INFINITY)
    }
}

fn default_epochs() -> usize {
    100
}

fn default_inner_steps() -> usize {
    10
}

fn default_step_size() -> f64 {
    1.0
}

fn default_burn_in() -> usize {
    10
}

fn default_gamma() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_covariance_floor() -> f64 {
    1e-8
}

/// Amplitude solver selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_solver_kind")]
    pub kind: SolverKind,
    /// Ridge parameter λ (the penalty is scaled by the batch size N).
    #[serde(default = "default_lambda")]
    pub lambda: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: default_solver_kind(),
            lambda: default_lambda(),
        }
    }
}

impl SolverConfig {
    pub fn build(&self) -> ArffResult<ConfiguredSolver> {
        if self.lambda.is_nan() || self.lambda < 0.0 {
            return Err(ArffError::config(format!(
                "solver lambda must be non-negative, got {}",
                self.lambda
            )));
        }
        Ok(ConfiguredSolver::new(self.kind, self.lambda))
    }
}

fn default_solver_kind() -> SolverKind {
    SolverKind::Normal
}

fn default_lambda() -> f64 {
    1e-8
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `ARFF_`, nested with `__`)
/// 3. The config file at `path` (TOML, or JSON for a `.json` extension)
/// 4. Built-in defaults
pub fn load_config(path: Option<&Path>, overrides: Option<&ArffConfig>) -> ArffResult<ArffConfig> {
    let mut figment = Figment::from(Serialized::defaults(ArffConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ArffError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        };
    }

    // ARFF_TRAINING__EPOCHS, ARFF_SOLVER__LAMBDA, ARFF_SEED, ...
    figment = figment.merge(Env::prefixed("ARFF_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: ArffConfig = figment.extract().map_err(Box::new)?;
    config.training.validate()?;
    config.solver.build()?;
    Ok(config)
}
