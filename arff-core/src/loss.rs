//! Reporting losses. A loss never feeds back into the sampler.

use nalgebra::DVector;
use num_complex::Complex64;

use crate::model::FourierModel;

/// Capability: score a model against (x, y) data.
pub trait Loss {
    fn evaluate(&self, model: &FourierModel, x: &[DVector<f64>], y: &[Complex64]) -> f64;
}

impl<F> Loss for F
where
    F: Fn(&FourierModel, &[DVector<f64>], &[Complex64]) -> f64,
{
    fn evaluate(&self, model: &FourierModel, x: &[DVector<f64>], y: &[Complex64]) -> f64 {
        self(model, x, y)
    }
}

/// Mean squared error, (1/N) Σ_j |f(x_j) − y_j|².
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MseLoss;

impl Loss for MseLoss {
    fn evaluate(&self, model: &FourierModel, x: &[DVector<f64>], y: &[Complex64]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let total: f64 = x
            .iter()
            .zip(y)
            .map(|(xj, yj)| (model.evaluate(xj) - yj).norm_sqr())
            .sum();
        total / x.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_model(value: f64) -> FourierModel {
        FourierModel::new(
            DVector::from_element(1, Complex64::new(value, 0.0)),
            vec![DVector::zeros(1)],
        )
        .unwrap()
    }

    #[test]
    fn test_mse_of_constant_offset() {
        let model = constant_model(1.0);
        let x: Vec<_> = (0..4).map(|j| DVector::from_element(1, j as f64)).collect();
        let y = vec![Complex64::new(0.0, 0.0); 4];
        assert!((MseLoss.evaluate(&model, &x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_closure_loss() {
        let model = constant_model(2.0);
        let max_abs = |m: &FourierModel, x: &[DVector<f64>], y: &[Complex64]| {
            x.iter()
                .zip(y)
                .map(|(xj, yj)| (m.evaluate(xj) - yj).norm())
                .fold(0.0, f64::max)
        };
        let x = vec![DVector::from_element(1, 0.3)];
        let y = vec![Complex64::new(0.5, 0.0)];
        assert!((max_abs.evaluate(&model, &x, &y) - 1.5).abs() < 1e-12);
    }
}
