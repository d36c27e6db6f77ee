//! Training callbacks for progress reporting and other per-epoch side effects.
//!
//! Callbacks observe a run; they cannot alter it or its results.

use tracing::info;

use crate::rwm::EpochReport;

/// Trait for training callbacks.
pub trait TrainingCallback: Send {
    /// Called at the end of each epoch, after diagnostics are recorded.
    fn on_epoch_end(&mut self, report: &EpochReport);
}

impl<F> TrainingCallback for F
where
    F: FnMut(&EpochReport) + Send,
{
    fn on_epoch_end(&mut self, report: &EpochReport) {
        self(report)
    }
}

/// Logs a progress line every `every` epochs and on the last epoch.
#[derive(Debug, Clone)]
pub struct ProgressLogger {
    pub every: usize,
}

impl ProgressLogger {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    fn should_log(&self, report: &EpochReport) -> bool {
        report.epoch % self.every == 0 || report.epoch == report.epochs
    }
}

impl TrainingCallback for ProgressLogger {
    fn on_epoch_end(&mut self, report: &EpochReport) {
        if !self.should_log(report) {
            return;
        }
        let percent = 100.0 * report.epoch as f64 / report.epochs.max(1) as f64;
        match report.loss {
            Some(loss) => info!(
                epoch = report.epoch,
                epochs = report.epochs,
                acceptance = report.acceptance_rate,
                loss,
                "training {percent:.0}%"
            ),
            None => info!(
                epoch = report.epoch,
                epochs = report.epochs,
                acceptance = report.acceptance_rate,
                "training {percent:.0}%"
            ),
        }
    }
}
