//! Amplitude solvers for the regularised least-squares subproblem.
//!
//! Given the design matrix `S` (N×K), targets `y` and the current wave
//! vectors, a solver returns β approximately minimising
//! ‖Sβ − y‖² + Nλ·R(β, ω). Any closure with the same signature as
//! [`AmplitudeSolver::solve`] is also a solver.

use nalgebra::{Cholesky, DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ArffError, ArffResult};

/// Capability: solve for the amplitudes paired with `omega`.
pub trait AmplitudeSolver {
    fn solve(
        &self,
        design: &DMatrix<Complex64>,
        targets: &DVector<Complex64>,
        omega: &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>>;
}

impl<F> AmplitudeSolver for F
where
    F: Fn(
        &DMatrix<Complex64>,
        &DVector<Complex64>,
        &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>>,
{
    fn solve(
        &self,
        design: &DMatrix<Complex64>,
        targets: &DVector<Complex64>,
        omega: &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>> {
        self(design, targets, omega)
    }
}

/// Ridge regression through the normal equations (SᴴS + NλI)β = Sᴴy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalEquations {
    pub lambda: f64,
}

impl NormalEquations {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Default for NormalEquations {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl AmplitudeSolver for NormalEquations {
    fn solve(
        &self,
        design: &DMatrix<Complex64>,
        targets: &DVector<Complex64>,
        _omega: &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>> {
        let penalty = DVector::from_element(design.ncols(), 1.0);
        solve_penalised(design, targets, self.lambda, &penalty)
    }
}

/// Ridge regression through a thin SVD of S:
/// β = V diag(σ/(σ² + Nλ)) Uᴴy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdSolver {
    pub lambda: f64,
}

impl SvdSolver {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl AmplitudeSolver for SvdSolver {
    fn solve(
        &self,
        design: &DMatrix<Complex64>,
        targets: &DVector<Complex64>,
        _omega: &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>> {
        check_shapes(design, targets, self.lambda)?;
        let shift = design.nrows() as f64 * self.lambda;
        let svd = design.clone().svd(true, true);
        let (u, v_t) = match (&svd.u, &svd.v_t) {
            (Some(u), Some(v_t)) => (u, v_t),
            _ => return Err(ArffError::numerical("SVD did not produce singular vectors")),
        };

        let mut projected = u.ad_mul(targets);
        for (coef, &sigma) in projected.iter_mut().zip(svd.singular_values.iter()) {
            let denom = sigma * sigma + shift;
            *coef = if denom > 0.0 {
                *coef * (sigma / denom)
            } else {
                Complex64::new(0.0, 0.0)
            };
        }
        let beta = v_t.ad_mul(&projected);
        ensure_finite(beta)
    }
}

/// Sobolev-type penalty Nλ Σ_k (1 + |ω_k|²)|β_k|², which damps
/// high-frequency features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SobolevSolver {
    pub lambda: f64,
}

impl SobolevSolver {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl AmplitudeSolver for SobolevSolver {
    fn solve(
        &self,
        design: &DMatrix<Complex64>,
        targets: &DVector<Complex64>,
        omega: &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>> {
        if omega.len() != design.ncols() {
            return Err(ArffError::numerical(format!(
                "{} wave vectors for {} design columns",
                omega.len(),
                design.ncols()
            )));
        }
        let penalty =
            DVector::from_iterator(omega.len(), omega.iter().map(|w| 1.0 + w.norm_squared()));
        solve_penalised(design, targets, self.lambda, &penalty)
    }
}

/// Solver selected by name in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Normal,
    Svd,
    Sobolev,
}

/// A solver built from [`SolverConfig`](crate::config::SolverConfig).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfiguredSolver {
    Normal(NormalEquations),
    Svd(SvdSolver),
    Sobolev(SobolevSolver),
}

impl ConfiguredSolver {
    pub fn new(kind: SolverKind, lambda: f64) -> Self {
        match kind {
            SolverKind::Normal => Self::Normal(NormalEquations::new(lambda)),
            SolverKind::Svd => Self::Svd(SvdSolver::new(lambda)),
            SolverKind::Sobolev => Self::Sobolev(SobolevSolver::new(lambda)),
        }
    }
}

impl AmplitudeSolver for ConfiguredSolver {
    fn solve(
        &self,
        design: &DMatrix<Complex64>,
        targets: &DVector<Complex64>,
        omega: &[DVector<f64>],
    ) -> ArffResult<DVector<Complex64>> {
        match self {
            Self::Normal(s) => s.solve(design, targets, omega),
            Self::Svd(s) => s.solve(design, targets, omega),
            Self::Sobolev(s) => s.solve(design, targets, omega),
        }
    }
}

/// Solve (SᴴS + Nλ diag(penalty))β = Sᴴy by Cholesky factorisation.
fn solve_penalised(
    design: &DMatrix<Complex64>,
    targets: &DVector<Complex64>,
    lambda: f64,
    penalty: &DVector<f64>,
) -> ArffResult<DVector<Complex64>> {
    check_shapes(design, targets, lambda)?;
    let shift = design.nrows() as f64 * lambda;
    let mut gram = design.ad_mul(design);
    for (k, p) in penalty.iter().enumerate() {
        gram[(k, k)] += Complex64::new(shift * p, 0.0);
    }
    let rhs = design.ad_mul(targets);
    let chol = Cholesky::new(gram).ok_or_else(|| {
        ArffError::numerical(format!(
            "normal equations are not positive definite (K = {}, Nλ = {shift:e}); increase lambda",
            design.ncols()
        ))
    })?;
    ensure_finite(chol.solve(&rhs))
}

fn check_shapes(
    design: &DMatrix<Complex64>,
    targets: &DVector<Complex64>,
    lambda: f64,
) -> ArffResult<()> {
    if design.nrows() != targets.len() {
        return Err(ArffError::numerical(format!(
            "design matrix has {} rows but there are {} targets",
            design.nrows(),
            targets.len()
        )));
    }
    if lambda.is_nan() || lambda < 0.0 {
        return Err(ArffError::numerical(format!(
            "regularisation must be non-negative, got {lambda}"
        )));
    }
    Ok(())
}

fn ensure_finite(beta: DVector<Complex64>) -> ArffResult<DVector<Complex64>> {
    if beta.iter().all(|b| b.re.is_finite() && b.im.is_finite()) {
        Ok(beta)
    } else {
        Err(ArffError::numerical("amplitude solve produced non-finite values"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::design_matrix;

    fn problem() -> (Vec<DVector<f64>>, DMatrix<Complex64>, DVector<Complex64>, DVector<Complex64>) {
        let xs: Vec<_> = (0..30)
            .map(|j| DVector::from_element(1, j as f64 / 29.0))
            .collect();
        let omega = vec![
            DVector::from_element(1, 0.0),
            DVector::from_element(1, 2.0),
            DVector::from_element(1, -3.5),
        ];
        let s = design_matrix(&xs, &omega);
        let truth = DVector::from_vec(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(0.5, -0.25),
            Complex64::new(-0.2, 0.1),
        ]);
        let y = &s * &truth;
        (omega, s, y, truth)
    }

    #[test]
    fn test_normal_equations_recover_exact_amplitudes() {
        let (omega, s, y, truth) = problem();
        let beta = NormalEquations::new(1e-12).solve(&s, &y, &omega).unwrap();
        assert!((beta - truth).norm() < 1e-5);
    }

    #[test]
    fn test_svd_matches_normal_equations() {
        let (omega, s, y, _) = problem();
        let a = NormalEquations::new(1e-6).solve(&s, &y, &omega).unwrap();
        let b = SvdSolver::new(1e-6).solve(&s, &y, &omega).unwrap();
        assert!((a - b).norm() < 1e-8);
    }

    #[test]
    fn test_sobolev_shrinks_high_frequencies_more() {
        let (omega, s, y, _) = problem();
        let ridge = NormalEquations::new(1e-2).solve(&s, &y, &omega).unwrap();
        let sobolev = SobolevSolver::new(1e-2).solve(&s, &y, &omega).unwrap();
        assert!(sobolev[2].norm() < ridge[2].norm());
    }

    #[test]
    fn test_singular_system_is_an_error() {
        // an all-zero column and no regularisation
        let mut s = DMatrix::from_element(4, 2, Complex64::new(1.0, 0.0));
        s.column_mut(1).fill(Complex64::new(0.0, 0.0));
        let omega = vec![DVector::from_element(1, 0.0), DVector::from_element(1, 1.0)];
        let y = DVector::from_element(4, Complex64::new(1.0, 0.0));
        let err = NormalEquations::new(0.0).solve(&s, &y, &omega).unwrap_err();
        assert!(matches!(err, ArffError::Numerical(_)));
    }

    #[test]
    fn test_closure_is_a_solver() {
        let (omega, s, y, _) = problem();
        let solver = |s: &DMatrix<Complex64>, y: &DVector<Complex64>, w: &[DVector<f64>]| {
            SvdSolver::new(1e-8).solve(s, y, w)
        };
        let beta = solver.solve(&s, &y, &omega).unwrap();
        assert_eq!(beta.len(), 3);
    }

    #[test]
    fn test_negative_lambda_rejected() {
        let (omega, s, y, _) = problem();
        assert!(NormalEquations::new(-1.0).solve(&s, &y, &omega).is_err());
    }
}
