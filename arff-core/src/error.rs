//! Error types for the arff-core crate.

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type ArffResult<T> = Result<T, ArffError>;

/// Where inside an epoch an amplitude solve was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStage {
    /// Refresh of β against the epoch's starting frequencies.
    Initial,
    /// Solve for a proposal inside the inner RWM loop (1-based step).
    Inner(usize),
    /// Re-solve after the inner loop, before the loss is reported.
    Final,
}

impl fmt::Display for SolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStage::Initial => write!(f, "initial solve"),
            SolveStage::Inner(step) => write!(f, "inner step {step}"),
            SolveStage::Final => write!(f, "final solve"),
        }
    }
}

/// Top-level error type for ARFF training.
#[derive(Debug, Error)]
pub enum ArffError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Training aborted at epoch {epoch} ({stage}): {source}")]
    Training {
        epoch: usize,
        stage: SolveStage,
        #[source]
        source: Box<ArffError>,
    },

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl ArffError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    /// Attach the epoch and solve stage to a failure raised inside the loop.
    pub fn at(self, epoch: usize, stage: SolveStage) -> Self {
        Self::Training {
            epoch,
            stage,
            source: Box::new(self),
        }
    }
}
