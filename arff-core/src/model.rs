//! Fourier feature model: f(x) = Σ_k β_k exp(i ω_k·x).

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{ArffError, ArffResult};

/// A scalar-valued Fourier feature model.
///
/// `beta[k]` pairs with `omega[k]`; the number of features is fixed for the
/// lifetime of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFourierModel")]
pub struct FourierModel {
    /// Complex amplitudes.
    pub beta: DVector<Complex64>,
    /// Real wave vectors, all of the same dimension.
    pub omega: Vec<DVector<f64>>,
}

#[derive(Deserialize)]
struct RawFourierModel {
    beta: DVector<Complex64>,
    omega: Vec<DVector<f64>>,
}

impl TryFrom<RawFourierModel> for FourierModel {
    type Error = ArffError;

    fn try_from(raw: RawFourierModel) -> ArffResult<Self> {
        Self::new(raw.beta, raw.omega)
    }
}

impl FourierModel {
    pub fn new(beta: DVector<Complex64>, omega: Vec<DVector<f64>>) -> ArffResult<Self> {
        if beta.len() != omega.len() {
            return Err(ArffError::config(format!(
                "model has {} amplitudes but {} frequencies",
                beta.len(),
                omega.len()
            )));
        }
        if omega.is_empty() {
            return Err(ArffError::config("model needs at least one feature"));
        }
        let dim = omega[0].len();
        if dim == 0 || omega.iter().any(|w| w.len() != dim) {
            return Err(ArffError::config(
                "all frequencies must share one non-zero dimension",
            ));
        }
        Ok(Self { beta, omega })
    }

    /// Random initialisation: β ~ complex standard normal, ω ~ N(0, I).
    pub fn random<R: Rng + ?Sized>(features: usize, dim: usize, rng: &mut R) -> ArffResult<Self> {
        let beta = DVector::from_fn(features, |_, _| {
            let re: f64 = rng.sample(StandardNormal);
            let im: f64 = rng.sample(StandardNormal);
            Complex64::new(re, im) * std::f64::consts::FRAC_1_SQRT_2
        });
        let omega = (0..features)
            .map(|_| DVector::<f64>::from_fn(dim, |_, _| rng.sample(StandardNormal)))
            .collect();
        Self::new(beta, omega)
    }

    /// Number of features K.
    pub fn len(&self) -> usize {
        self.omega.len()
    }

    pub fn is_empty(&self) -> bool {
        self.omega.is_empty()
    }

    /// Input dimension d.
    pub fn dim(&self) -> usize {
        self.omega.first().map_or(0, |w| w.len())
    }

    pub fn evaluate(&self, x: &DVector<f64>) -> Complex64 {
        self.beta
            .iter()
            .zip(&self.omega)
            .map(|(b, w)| b * Complex64::cis(w.dot(x)))
            .sum()
    }

    pub fn evaluate_batch(&self, xs: &[DVector<f64>]) -> Vec<Complex64> {
        xs.iter().map(|x| self.evaluate(x)).collect()
    }

    /// Largest Euclidean norm among the wave vectors.
    pub fn max_frequency_norm(&self) -> f64 {
        self.omega.iter().map(|w| w.norm()).fold(0.0, f64::max)
    }
}

/// Build the N×K design matrix with entries S[j,k] = exp(i ω_k·x_j).
pub fn design_matrix(xs: &[DVector<f64>], omega: &[DVector<f64>]) -> DMatrix<Complex64> {
    DMatrix::from_fn(xs.len(), omega.len(), |j, k| {
        Complex64::cis(omega[k].dot(&xs[j]))
    })
}
