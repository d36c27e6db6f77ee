//! Gaussian random-walk proposals and online adaptation of their covariance.

use nalgebra::{Cholesky, DMatrix, DVector, SymmetricEigen};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{ArffError, ArffResult};

/// Proposal ω'_k = ω_k + δ·ξ_k with ξ_k ~ N(0, Σ), shared Σ across k.
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Lower Cholesky factor of Σ.
    lower: DMatrix<f64>,
    step_size: f64,
}

impl Proposal {
    /// Factor Σ once; fails if Σ is not square, symmetric and positive definite.
    pub fn new(sigma: &DMatrix<f64>, step_size: f64) -> ArffResult<Self> {
        if !sigma.is_square() || sigma.nrows() == 0 {
            return Err(ArffError::config(format!(
                "proposal covariance must be a non-empty square matrix, got {}x{}",
                sigma.nrows(),
                sigma.ncols()
            )));
        }
        let asymmetry = (sigma - sigma.transpose()).amax();
        if asymmetry.is_nan() || asymmetry > 1e-10 * sigma.amax().max(1.0) {
            return Err(ArffError::config("proposal covariance must be symmetric"));
        }
        let chol = Cholesky::new(sigma.clone())
            .ok_or_else(|| ArffError::config("proposal covariance must be positive definite"))?;
        Ok(Self {
            lower: chol.l(),
            step_size,
        })
    }

    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Perturb every wave vector independently.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        omega: &[DVector<f64>],
        rng: &mut R,
    ) -> Vec<DVector<f64>> {
        omega
            .iter()
            .map(|w| {
                let z = DVector::<f64>::from_fn(w.len(), |_, _| rng.sample(StandardNormal));
                w + (&self.lower * z) * self.step_size
            })
            .collect()
    }
}

/// Welford accumulator for the mean and covariance of accepted wave vectors.
///
/// Memory is O(d²) regardless of how many samples are observed.
#[derive(Debug, Clone)]
pub struct CovarianceAdapter {
    count: usize,
    mean: DVector<f64>,
    comoment: DMatrix<f64>,
}

impl CovarianceAdapter {
    pub fn new(dim: usize) -> Self {
        Self {
            count: 0,
            mean: DVector::zeros(dim),
            comoment: DMatrix::zeros(dim, dim),
        }
    }

    pub fn observe(&mut self, sample: &DVector<f64>) {
        self.count += 1;
        let delta = sample - &self.mean;
        self.mean += &delta / self.count as f64;
        let delta_after = sample - &self.mean;
        self.comoment += &delta * delta_after.transpose();
    }

    pub fn observe_all<'a>(&mut self, samples: impl IntoIterator<Item = &'a DVector<f64>>) {
        for sample in samples {
            self.observe(sample);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Sample covariance with every eigenvalue raised to at least `floor`.
    ///
    /// Returns `None` until two samples have been observed. The boolean is
    /// true when the floor had to be applied.
    pub fn covariance(&self, floor: f64) -> Option<(DMatrix<f64>, bool)> {
        if self.count < 2 {
            return None;
        }
        let raw = &self.comoment / (self.count - 1) as f64;
        let symmetric = (&raw + raw.transpose()) * 0.5;
        Some(floor_eigenvalues(symmetric, floor))
    }
}

/// Project a symmetric matrix onto {A : λ_min(A) ≥ floor}.
fn floor_eigenvalues(matrix: DMatrix<f64>, floor: f64) -> (DMatrix<f64>, bool) {
    let eigen = SymmetricEigen::new(matrix.clone());
    let degenerate = eigen
        .eigenvalues
        .iter()
        .any(|&v| !v.is_finite() || v < floor);
    if !degenerate {
        return (matrix, false);
    }
    let adjusted = eigen
        .eigenvalues
        .map(|v| if v.is_finite() { v.max(floor) } else { floor });
    let rebuilt =
        &eigen.eigenvectors * DMatrix::from_diagonal(&adjusted) * eigen.eigenvectors.transpose();
    ((&rebuilt + rebuilt.transpose()) * 0.5, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rejects_non_spd_covariance() {
        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(Proposal::new(&indefinite, 1.0).is_err());
        let asymmetric = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]);
        assert!(Proposal::new(&asymmetric, 1.0).is_err());
        assert!(Proposal::new(&DMatrix::zeros(2, 3), 1.0).is_err());
    }

    #[test]
    fn test_proposal_statistics_follow_sigma() {
        let sigma = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 1.0]);
        let proposal = Proposal::new(&sigma, 0.5).unwrap();
        assert_eq!(proposal.dim(), 2);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let origin = vec![DVector::zeros(2); 20_000];
        let moves = proposal.propose(&origin, &mut rng);

        let mut adapter = CovarianceAdapter::new(2);
        adapter.observe_all(&moves);
        let (cov, floored) = adapter.covariance(1e-12).unwrap();
        assert!(!floored);
        // δ²Σ = Σ/4
        assert!((cov[(0, 0)] - 1.0).abs() < 0.05, "{cov}");
        assert!((cov[(0, 1)] - 0.25).abs() < 0.03, "{cov}");
        assert!((cov[(1, 1)] - 0.25).abs() < 0.02, "{cov}");
    }

    #[test]
    fn test_welford_matches_two_pass() {
        let samples: Vec<DVector<f64>> = [[1.0, 2.0], [3.0, -1.0], [0.5, 0.5], [2.0, 4.0]]
            .iter()
            .map(|s| DVector::from_vec(s.to_vec()))
            .collect();
        let mut adapter = CovarianceAdapter::new(2);
        adapter.observe_all(&samples);

        let n = samples.len() as f64;
        let mean = samples.iter().fold(DVector::<f64>::zeros(2), |acc, s| acc + s) / n;
        let mut expected = DMatrix::<f64>::zeros(2, 2);
        for s in &samples {
            let c = s - &mean;
            expected += &c * c.transpose();
        }
        expected /= n - 1.0;

        let (cov, _) = adapter.covariance(1e-12).unwrap();
        assert_eq!(adapter.count(), 4);
        assert!((adapter.mean() - mean).norm() < 1e-12);
        assert!((cov - expected).norm() < 1e-12);
    }

    #[test]
    fn test_degenerate_samples_are_floored() {
        // all samples on a line: rank-one covariance
        let samples: Vec<DVector<f64>> = (0..10)
            .map(|i| DVector::from_vec(vec![i as f64, 2.0 * i as f64]))
            .collect();
        let mut adapter = CovarianceAdapter::new(2);
        assert!(adapter.covariance(1e-3).is_none());
        adapter.observe_all(&samples);
        let (cov, floored) = adapter.covariance(1e-3).unwrap();
        assert!(floored);
        assert!(Proposal::new(&cov, 1.0).is_ok());
        let eigen = SymmetricEigen::new(cov);
        assert!(eigen.eigenvalues.iter().all(|&v| v >= 1e-3 - 1e-12));
    }

    #[test]
    fn test_identical_samples_give_floor_times_identity() {
        let mut adapter = CovarianceAdapter::new(3);
        for _ in 0..5 {
            adapter.observe(&DVector::from_element(3, 1.5));
        }
        let (cov, floored) = adapter.covariance(0.01).unwrap();
        assert!(floored);
        assert!((cov - DMatrix::identity(3, 3) * 0.01).norm() < 1e-12);
    }
}
