//! Numerical stability utilities.
//!
//! Provides safe implementations of transforms that overflow or lose
//! precision in naïve form, plus the delta-method helper used to move a
//! covariance matrix from optimizer space into model space.
//!
//! # Provided items
//! - [`COR_EPS`]: distance kept between a back-transformed correlation and
//!   the open interval's end points.
//! - [`EIGEN_EPS`]: eigenvalue floor for pseudo-inverses.
//! - [`log_sum_exp`]: stable `ln(exp(a) + exp(b))`.
//! - [`cor_to_surrogate`] / [`surrogate_to_cor`]: Fisher's z map between
//!   `ρ ∈ (−1, 1)` and ℝ, with [`d_cor_d_surrogate`] as its derivative.
//! - [`delta_method`]: `J Σ Jᵀ` for a diagonal Jacobian.
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Correlations are kept inside `[−1 + COR_EPS, 1 − COR_EPS]`.
///
/// `tanh` saturates to exactly ±1 in `f64` for `|z| ≳ 19`; at ±1 the
/// Sarmanov weight and `atanh` both break down.
pub const COR_EPS: f64 = 1e-10;

/// Eigenvalues at or below this threshold are dropped when forming a
/// pseudo-inverse of a Hessian.
pub const EIGEN_EPS: f64 = 1e-12;

/// Numerically stable `ln(exp(a) + exp(b))`.
///
/// Computed as `max + ln(1 + exp(min − max))`, so neither exponential can
/// overflow. If both inputs are `−∞` the result is `−∞`; a `NaN` input
/// propagates.
///
/// # Parameters
/// - `a`, `b`: log-scale terms.
///
/// # Returns
/// - `ln(exp(a) + exp(b))` as `f64`.
pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if hi == f64::INFINITY {
        return f64::INFINITY;
    }
    hi + (lo - hi).exp().ln_1p()
}

/// Map a correlation `ρ ∈ (−1, 1)` onto ℝ via `z = atanh(ρ)`.
///
/// Inputs are clamped to `[−1 + COR_EPS, 1 − COR_EPS]` first so that the
/// result is always finite for finite input.
pub fn cor_to_surrogate(rho: f64) -> f64 {
    rho.clamp(-1.0 + COR_EPS, 1.0 - COR_EPS).atanh()
}

/// Map an unconstrained surrogate back to a correlation, `ρ = tanh(z)`,
/// clipped to `[−1 + COR_EPS, 1 − COR_EPS]`.
pub fn surrogate_to_cor(z: f64) -> f64 {
    z.tanh().clamp(-1.0 + COR_EPS, 1.0 - COR_EPS)
}

/// Derivative `dρ/dz = 1 − tanh(z)²` of [`surrogate_to_cor`].
pub fn d_cor_d_surrogate(z: f64) -> f64 {
    let rho = z.tanh();
    1.0 - rho * rho
}

/// Delta-method covariance for an element-wise transform.
///
/// Given a θ-space covariance `Σ` and the diagonal `d` of the Jacobian of the
/// element-wise map θ ↦ φ(θ), returns `J Σ Jᵀ` with `J = diag(d)`, i.e.
/// `Σ_φ[i, j] = d_i · Σ[i, j] · d_j`.
///
/// Non-finite entries propagate; the caller decides whether a `NaN`
/// covariance is acceptable.
///
/// # Panics
/// Never panics when `cov` is `n × n` and `jac_diag.len() == n`; mismatched
/// shapes are a programmer error.
pub fn delta_method(jac_diag: ArrayView1<f64>, cov: ArrayView2<f64>) -> Array2<f64> {
    let n = jac_diag.len();
    Array2::from_shape_fn((n, n), |(i, j)| jac_diag[i] * cov[[i, j]] * jac_diag[j])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - log_sum_exp against the naïve formula on a safe grid and in the tails.
    // - The Fisher-z correlation map and its clipping.
    // - delta_method against an explicit J Σ Jᵀ.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // log_sum_exp agrees with the direct formula where the latter is safe and
    // stays finite where it overflows.
    //
    // Given
    // -----
    // - Pairs of moderate values, then pairs around ±800.
    //
    // Expect
    // ------
    // - Relative agreement to 1e-14 on the safe grid.
    // - ln(e^800 + e^800) = 800 + ln 2.
    fn log_sum_exp_matches_naive_and_survives_overflow() {
        for &(a, b) in &[(0.0, 0.0), (-3.0, 2.5), (10.0, -10.0), (-50.0, -49.0)] {
            let naive = (f64::exp(a) + f64::exp(b)).ln();
            assert!((log_sum_exp(a, b) - naive).abs() <= 1e-14 * naive.abs().max(1.0));
        }
        let big = log_sum_exp(800.0, 800.0);
        assert!((big - (800.0 + std::f64::consts::LN_2)).abs() < 1e-12);
        assert!((log_sum_exp(-800.0, -900.0) - (-800.0)).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Infinite and NaN inputs follow the documented conventions.
    fn log_sum_exp_edge_values() {
        assert_eq!(log_sum_exp(f64::NEG_INFINITY, f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(log_sum_exp(f64::NEG_INFINITY, 1.5), 1.5);
        assert_eq!(log_sum_exp(f64::INFINITY, 1.5), f64::INFINITY);
        assert!(log_sum_exp(f64::NAN, 0.0).is_nan());
    }

    #[test]
    // Purpose
    // -------
    // The correlation surrogate round-trips inside (−1, 1) and saturates at
    // the clipping bound outside.
    fn correlation_surrogate_round_trip_and_clipping() {
        for &rho in &[-0.9, -0.3, 0.0, 0.4, 0.95] {
            let z = cor_to_surrogate(rho);
            assert!((surrogate_to_cor(z) - rho).abs() < 1e-12);
        }
        assert_eq!(surrogate_to_cor(50.0), 1.0 - COR_EPS);
        assert_eq!(surrogate_to_cor(-50.0), -1.0 + COR_EPS);
        assert!(cor_to_surrogate(1.0).is_finite());
        assert!((d_cor_d_surrogate(0.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // delta_method equals diag(d) Σ diag(d).
    fn delta_method_matches_explicit_product() {
        let cov = array![[2.0, 0.5, 0.0], [0.5, 1.0, -0.2], [0.0, -0.2, 3.0]];
        let d = array![2.0, 1.0, 0.5];
        let out = delta_method(d.view(), cov.view());

        let j = Array2::from_diag(&d);
        let expected = j.dot(&cov).dot(&j.t());
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-14);
        }
    }
}
