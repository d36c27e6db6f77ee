//! Subscriber setup for the `tracing` events emitted during training.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{ArffError, ArffResult};

fn env_filter(filter: &str) -> ArffResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| ArffError::config(format!("invalid log filter '{filter}': {e}")))
}

/// Install a human-readable stderr subscriber, e.g. `init_tracing("arff_core=debug")`.
///
/// Returns `Ok(false)` when a global subscriber was already installed.
pub fn init_tracing(filter: &str) -> ArffResult<bool> {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter(filter)?);
    Ok(tracing_subscriber::registry().with(layer).try_init().is_ok())
}

/// Like [`init_tracing`], but emits one JSON object per event.
pub fn init_json_tracing(filter: &str) -> ArffResult<bool> {
    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(env_filter(filter)?);
    Ok(tracing_subscriber::registry().with(layer).try_init().is_ok())
}
