//! Training metrics tracking.

use serde::{Deserialize, Serialize};

use crate::error::ArffResult;

/// Per-epoch diagnostics collected over a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub epochs_completed: usize,
    /// Mean acceptance rate of each epoch.
    pub acceptance_history: Vec<f64>,
    /// Reporting loss of each epoch; empty when loss recording is disabled.
    pub loss_history: Vec<f64>,
    pub best_epoch: Option<usize>,
    pub best_loss: Option<f64>,
}

impl TrainingMetrics {
    pub fn record_epoch(&mut self, acceptance_rate: f64, loss: Option<f64>) {
        self.acceptance_history.push(acceptance_rate);
        self.epochs_completed += 1;

        if let Some(loss) = loss {
            self.loss_history.push(loss);
            if self.best_loss.is_none_or(|best| loss < best) {
                self.best_loss = Some(loss);
                self.best_epoch = Some(self.epochs_completed);
            }
        }
    }

    /// Acceptance rate averaged over all epochs.
    pub fn mean_acceptance(&self) -> Option<f64> {
        if self.acceptance_history.is_empty() {
            return None;
        }
        Some(self.acceptance_history.iter().sum::<f64>() / self.acceptance_history.len() as f64)
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }

    pub fn to_json(&self) -> ArffResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_metrics() {
        let mut metrics = TrainingMetrics::default();
        metrics.record_epoch(0.5, Some(0.6));
        metrics.record_epoch(0.3, Some(0.4));
        metrics.record_epoch(0.1, Some(0.45));
        assert_eq!(metrics.epochs_completed, 3);
        assert_eq!(metrics.best_epoch, Some(2));
        assert_eq!(metrics.best_loss, Some(0.4));
        assert_eq!(metrics.final_loss(), Some(0.45));
        assert!((metrics.mean_acceptance().unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_without_loss() {
        let mut metrics = TrainingMetrics::default();
        metrics.record_epoch(0.2, None);
        assert_eq!(metrics.acceptance_history, vec![0.2]);
        assert!(metrics.loss_history.is_empty());
        assert_eq!(metrics.best_epoch, None);
    }

    #[test]
    fn test_json_export() {
        let mut metrics = TrainingMetrics::default();
        metrics.record_epoch(0.25, Some(1.5));
        let json = metrics.to_json().unwrap();
        let parsed: TrainingMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metrics);
    }
}
