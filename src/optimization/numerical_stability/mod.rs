//! numerical_stability — numerically robust transforms and covariance tools.
//!
//! Purpose
//! -------
//! Collect the small numerical primitives shared by the likelihood, the
//! interlayers, and post-estimation inference: a stable log-sum-exp, the
//! correlation ↔ surrogate map used by the correlation layer, and the
//! delta-method helper that moves covariances into model space.
//!
//! Key behaviors
//! -------------
//! - `log_sum_exp` combines the two per-customer likelihood branches without
//!   exponentiating large log-terms.
//! - `cor_to_surrogate` / `surrogate_to_cor` map `ρ ∈ (−1, 1)` to ℝ and back
//!   (Fisher's z), clipping at `COR_EPS` from the bounds.
//! - `delta_method` computes `J Σ Jᵀ` for a diagonal Jacobian.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are plain `f64`; shape validation happens in the model layer.
//! - `NaN` inputs propagate; nothing here panics on non-finite values.
//!
//! Conventions
//! -----------
//! - This module never logs or touches global state; everything is pure and
//!   safe to call from parallel per-customer loops.
//!
//! Downstream usage
//! ----------------
//! - `clv::core::likelihood` uses `log_sum_exp`.
//! - `clv::core::params` and `clv::interlayers::correlation` use the
//!   correlation map; estimation uses `delta_method` and `EIGEN_EPS`.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] compare against naïve formulas on safe
//!   grids, check overflow behavior, and verify `delta_method` against an
//!   explicit matrix product.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    COR_EPS, EIGEN_EPS, cor_to_surrogate, d_cor_d_surrogate, delta_method, log_sum_exp,
    surrogate_to_cor,
};

pub mod prelude {
    pub use super::transformations::{
        COR_EPS, EIGEN_EPS, cor_to_surrogate, delta_method, log_sum_exp, surrogate_to_cor,
    };
}
