//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference derivatives of a scalar cost around a parameter
//! vector, together with validation and symmetry cleanup, so that the rest of
//! the crate can request derivatives without depending directly on the
//! `finitediff` API or re-deriving step-size rules.
//!
//! Key behaviors
//! -------------
//! - Forward-difference gradients with error capture and post-hoc
//!   validation ([`run_fd_diff`]); used by the argmin adapter as a fallback.
//! - Central-difference gradients of a fallible cost ([`central_gradient`]);
//!   used by models that supply their own finite-difference gradient.
//! - Central-difference Hessians built from cost evaluations only
//!   ([`compute_hessian_nograd`]), validated and symmetrized.
//!
//! Invariants & assumptions
//! ------------------------
//! - Errors raised by the objective during differencing are routed into a
//!   `RefCell` slot and surfaced once the sweep finishes; the sweep itself
//!   sees `NaN` for the failing point.
//! - Returned gradients satisfy [`validate_grad`]; returned Hessians satisfy
//!   [`validate_hessian`] and are exactly symmetric.
//!
//! Conventions
//! -----------
//! - Differences are taken in the unconstrained optimizer space.
//! - Hessian steps are `h_i = HESSIAN_STEP · (1 + |θ_i|)`. This is coarser
//!   than `finitediff`'s `√ε` steps because second differences of a
//!   quadrature-based objective would otherwise be dominated by
//!   integration noise.
//!
//! Testing notes
//! -------------
//! - Unit tests cover quadratic objectives with known derivatives, error
//!   propagation from the objective, and symmetrization.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use ndarray::Array2;
use std::cell::RefCell;

/// Relative step used by [`compute_hessian_nograd`].
pub const HESSIAN_STEP: f64 = 1e-4;

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// `func` must write any evaluation error into `closure_err` and return
/// `NaN`. The slot is cleared on entry and inspected after the sweep.
///
/// # Errors
/// - The captured error, converted into [`OptError`].
/// - [`OptError::GradientDimMismatch`] / [`OptError::InvalidGradient`] from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

/// central_gradient — central-difference gradient of a fallible cost.
///
/// # Errors
/// - The first error returned by `cost` during the sweep.
/// - Validation errors if the gradient has non-finite entries.
pub fn central_gradient<G: Fn(&Theta) -> OptResult<f64>>(
    theta: &Theta, cost: &G,
) -> OptResult<Grad> {
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let func = |t: &Theta| -> f64 {
        match cost(t) {
            Ok(v) => v,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let grad = theta.central_diff(&func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

/// compute_hessian_nograd — central-difference Hessian from cost values.
///
/// Uses
/// - diagonal: `(c(θ + h_i e_i) − 2c(θ) + c(θ − h_i e_i)) / h_i²`
/// - off-diagonal: `(c(++) − c(+−) − c(−+) + c(−−)) / (4 h_i h_j)`
///
/// with `h_i = HESSIAN_STEP · (1 + |θ_i|)`, costing `1 + 2n + 2n(n − 1)`
/// evaluations.
///
/// # Errors
/// - The first error returned by `cost`.
/// - [`OptError::InvalidHessian`] if any entry is non-finite.
pub fn compute_hessian_nograd<G: Fn(&Theta) -> OptResult<f64>>(
    cost: &G, theta: &Theta,
) -> OptResult<Hessian> {
    let dim = theta.len();
    let steps: Vec<f64> = theta.iter().map(|t| HESSIAN_STEP * (1.0 + t.abs())).collect();
    let eval = |shifts: &[(usize, f64)]| -> OptResult<f64> {
        let mut point = theta.clone();
        for &(idx, delta) in shifts {
            point[idx] += delta;
        }
        cost(&point)
    };

    let center = cost(theta)?;
    let mut hess: Hessian = Array2::zeros((dim, dim));
    for i in 0..dim {
        let hi = steps[i];
        let plus = eval(&[(i, hi)])?;
        let minus = eval(&[(i, -hi)])?;
        hess[[i, i]] = (plus - 2.0 * center + minus) / (hi * hi);
        for j in 0..i {
            let hj = steps[j];
            let pp = eval(&[(i, hi), (j, hj)])?;
            let pm = eval(&[(i, hi), (j, -hj)])?;
            let mp = eval(&[(i, -hi), (j, hj)])?;
            let mm = eval(&[(i, -hi), (j, -hj)])?;
            hess[[i, j]] = (pp - pm - mp + mm) / (4.0 * hi * hj);
            hess[[j, i]] = hess[[i, j]];
        }
    }
    validate_hessian(&hess, dim)?;
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Replace each off-diagonal pair by its average; the diagonal is untouched.
pub fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
