//! inference::hessian — covariance and standard errors from a Hessian.
//!
//! Purpose
//! -------
//! Turn the Hessian of a negative log-likelihood at the estimate into a
//! covariance matrix and standard errors. The Hessian is copied into a
//! `nalgebra::DMatrix` and inverted through a symmetric eigendecomposition,
//! so nearly singular directions do not blow up the whole matrix.
//!
//! Key behaviors
//! -------------
//! - [`covariance_from_hessian`] returns the Moore–Penrose pseudo-inverse
//!   `H⁺ = Σ_{k: λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k`.
//! - [`standard_errors`] takes square roots of the covariance diagonal.
//!
//! Invariants & assumptions
//! ------------------------
//! - The Hessian is symmetric (symmetrized upstream by the finite-difference
//!   routine); only its lower triangle is read.
//! - A Hessian with any non-finite entry yields an all-`NaN` covariance.
//!   Estimation failure is a reportable outcome, not an error.
//!
//! Conventions
//! -----------
//! - The Hessian is of the **summed** negative log-likelihood in optimizer
//!   space; mapping to the natural scale is done by the caller with the
//!   delta method.
//! - Eigenvalues `≤ EIGEN_EPS` are dropped, which leaves variance in the
//!   corresponding directions at zero rather than infinity.
use crate::optimization::numerical_stability::EIGEN_EPS;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Covariance matrix from the Hessian of the negative log-likelihood.
///
/// Returns an `n × n` all-`NaN` matrix when `hessian` contains a
/// non-finite value.
///
/// # Examples
/// ```rust
/// # use ndarray::array;
/// # use rust_clv::inference::covariance_from_hessian;
/// let hess = array![[4.0, 0.0], [0.0, 0.25]];
/// let cov = covariance_from_hessian(&hess);
/// assert!((cov[[0, 0]] - 0.25).abs() < 1e-12);
/// assert!((cov[[1, 1]] - 4.0).abs() < 1e-12);
/// ```
pub fn covariance_from_hessian(hessian: &Array2<f64>) -> Array2<f64> {
    let n = hessian.nrows();
    if hessian.iter().any(|v| !v.is_finite()) {
        return Array2::from_elem((n, n), f64::NAN);
    }
    let mut hess_nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(hessian, &mut hess_nalg);
    pseudo_inverse(hess_nalg)
}

/// Square roots of the covariance diagonal; negative variances give `NaN`.
pub fn standard_errors(cov: &Array2<f64>) -> Array1<f64> {
    cov.diag().mapv(|v| if v >= 0.0 { v.sqrt() } else { f64::NAN })
}

// ---- Helper methods ----

/// Copy the lower triangle of a symmetric `ndarray` matrix into both
/// triangles of a `DMatrix`, column by column.
fn fill_dmatrix(hessian: &Array2<f64>, hess_nalg: &mut DMatrix<f64>) {
    let n = hessian.ncols();
    for j in 0..n {
        for i in j..n {
            hess_nalg[(i, j)] = hessian[[i, j]];
            hess_nalg[(j, i)] = hessian[[i, j]];
        }
    }
}

/// `Σ_{k: λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k`.
fn pseudo_inverse(hess_nalg: DMatrix<f64>) -> Array2<f64> {
    let n = hess_nalg.nrows();
    let eigen_decomp = hess_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let mut cov = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for i in 0..n {
            let coeff = q[(i, k)] / lambda;
            for j in 0..n {
                cov[[i, j]] += coeff * q[(j, k)];
            }
        }
    }
    cov
}
