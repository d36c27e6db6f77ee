//! Centering and variance scaling of training data.

use nalgebra::DVector;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::data::DataSet;
use crate::model::FourierModel;

/// Means and variances of a dataset, used to train in normalised coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataScalings {
    pub mu_x: DVector<f64>,
    pub sigma2_x: DVector<f64>,
    pub mu_y: Complex64,
    pub sigma2_y: f64,
}

impl DataScalings {
    /// Sample means and (n − 1) variances of `data`.
    ///
    /// A coordinate with zero variance is left unscaled (its variance is
    /// recorded as 1).
    pub fn from_data(data: &DataSet) -> Self {
        let n = data.len() as f64;
        let dim = data.dim();

        let mut mu_x = DVector::<f64>::zeros(dim);
        for x in data.x() {
            mu_x += x;
        }
        mu_x /= n;
        let mu_y = data.y().sum() / n;

        let denom = (n - 1.0).max(1.0);
        let mut sigma2_x = DVector::<f64>::zeros(dim);
        for x in data.x() {
            sigma2_x += (x - &mu_x).map(|v| v * v);
        }
        sigma2_x /= denom;
        let sigma2_y = data.y().iter().map(|y| (y - mu_y).norm_sqr()).sum::<f64>() / denom;

        Self {
            mu_x,
            sigma2_x: sigma2_x.map(unit_if_degenerate),
            mu_y,
            sigma2_y: unit_if_degenerate(sigma2_y),
        }
    }

    /// Scaled copy of `data`: x ↦ (x − μx)/σx, y ↦ (y − μy)/σy.
    pub fn scale(&self, data: &DataSet) -> DataSet {
        let sigma_x = self.sigma2_x.map(f64::sqrt);
        let sigma_y = self.sigma2_y.sqrt();
        data.map(|x, y| {
            (
                (x - &self.mu_x).component_div(&sigma_x),
                (y - self.mu_y) / sigma_y,
            )
        })
    }

    /// Inverse of [`scale`](Self::scale).
    pub fn rescale(&self, data: &DataSet) -> DataSet {
        let sigma_x = self.sigma2_x.map(f64::sqrt);
        let sigma_y = self.sigma2_y.sqrt();
        data.map(|x, y| {
            (
                x.component_mul(&sigma_x) + &self.mu_x,
                y * sigma_y + self.mu_y,
            )
        })
    }

    /// Evaluate a model trained on scaled data at a point in original units.
    pub fn evaluate(&self, model: &FourierModel, x: &DVector<f64>) -> Complex64 {
        let scaled = (x - &self.mu_x).component_div(&self.sigma2_x.map(f64::sqrt));
        model.evaluate(&scaled) * self.sigma2_y.sqrt() + self.mu_y
    }
}

fn unit_if_degenerate(v: f64) -> f64 {
    if v > 0.0 && v.is_finite() { v } else { 1.0 }
}
