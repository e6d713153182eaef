//! quadrature — adaptive Gauss–Kronrod integration over finite intervals.
//!
//! Purpose
//! -------
//! Provide a self-contained, allocation-aware integrator for smooth
//! one-dimensional integrands on `[a, b]`. The likelihood and prediction
//! layers call it once per customer; the engine knows nothing about the
//! model beyond the integrand callback.
//!
//! Key behaviors
//! -------------
//! - Evaluate the 21-point Gauss–Kronrod rule on a subinterval together with
//!   a QUADPACK-style error estimate ([`gauss_kronrod::qk21`]).
//! - Adaptively bisect the subinterval with the largest error estimate until
//!   the global tolerance is met or the workspace is full
//!   ([`adaptive::integrate`]).
//! - Report the best estimate and its error bound via [`QuadEstimate`]
//!   instead of failing on slow convergence.
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`QagWorkspace`] is owned by exactly one integration at a time; it is
//!   reset at the start of every call and never leaks state across calls.
//! - The subdivision cap (`limit`) bounds the work of a single call; hitting
//!   it yields `converged = false`, never a panic or an error.
//! - Options are validated once through [`QuadratureOptions::new`].
//!
//! Conventions
//! -----------
//! - Tolerance test: `abs_error ≤ max(eps_abs, eps_rel · |value|)`.
//! - Degenerate intervals (`a == b`) integrate to exactly `0.0`.
//! - Reversed intervals (`a > b`) follow the usual sign convention.
//!
//! Downstream usage
//! ----------------
//! - Parallel callers create one workspace per worker (e.g. via rayon's
//!   `map_init`) and pass it to [`integrate`] for every customer they handle.
//!
//! Testing notes
//! -------------
//! - Unit tests check the rule against polynomials it integrates exactly,
//!   adaptive refinement on peaked integrands, the workspace cap, and
//!   option validation.

pub mod adaptive;
pub mod errors;
pub mod gauss_kronrod;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::adaptive::{QagWorkspace, QuadEstimate, integrate};
pub use self::errors::{QuadratureError, QuadratureResult};

/// Default absolute error tolerance.
pub const DEFAULT_EPS_ABS: f64 = 1e-8;

/// Default relative error tolerance.
pub const DEFAULT_EPS_REL: f64 = 1e-8;

/// Default workspace capacity (maximum number of subintervals).
pub const DEFAULT_LIMIT: usize = 1000;

/// Error tolerances and workspace capacity for [`integrate`].
///
/// - `eps_abs`: absolute tolerance (finite, ≥ 0).
/// - `eps_rel`: relative tolerance (finite, ≥ 0).
/// - `limit`: maximum number of subintervals held by a workspace (≥ 1).
///
/// At least one of the two tolerances must be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureOptions {
    pub eps_abs: f64,
    pub eps_rel: f64,
    pub limit: usize,
}

impl QuadratureOptions {
    /// Construct validated options.
    ///
    /// # Errors
    /// - [`QuadratureError::InvalidTolerance`] if a tolerance is negative or
    ///   non-finite, or if both are zero.
    /// - [`QuadratureError::InvalidLimit`] if `limit == 0`.
    pub fn new(eps_abs: f64, eps_rel: f64, limit: usize) -> QuadratureResult<Self> {
        for (name, tol) in [("eps_abs", eps_abs), ("eps_rel", eps_rel)] {
            if !tol.is_finite() || tol < 0.0 {
                return Err(QuadratureError::InvalidTolerance {
                    name,
                    value: tol,
                    reason: "Tolerance must be finite and non-negative.",
                });
            }
        }
        if eps_abs == 0.0 && eps_rel == 0.0 {
            return Err(QuadratureError::InvalidTolerance {
                name: "eps_abs",
                value: eps_abs,
                reason: "At least one tolerance must be strictly positive.",
            });
        }
        if limit == 0 {
            return Err(QuadratureError::InvalidLimit { limit });
        }
        Ok(Self { eps_abs, eps_rel, limit })
    }
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        Self { eps_abs: DEFAULT_EPS_ABS, eps_rel: DEFAULT_EPS_REL, limit: DEFAULT_LIMIT }
    }
}

pub mod prelude {
    pub use super::{
        QagWorkspace, QuadEstimate, QuadratureError, QuadratureOptions, QuadratureResult,
        integrate,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Defaults match the documented tolerances and workspace size.
    fn default_options_match_documented_values() {
        let opts = QuadratureOptions::default();
        assert_eq!(opts.eps_abs, 1e-8);
        assert_eq!(opts.eps_rel, 1e-8);
        assert_eq!(opts.limit, 1000);
    }

    #[test]
    // Purpose
    // -------
    // Invalid tolerances and a zero limit are rejected.
    fn new_rejects_invalid_options() {
        assert!(matches!(
            QuadratureOptions::new(-1.0, 1e-8, 10),
            Err(QuadratureError::InvalidTolerance { name: "eps_abs", .. })
        ));
        assert!(matches!(
            QuadratureOptions::new(1e-8, f64::NAN, 10),
            Err(QuadratureError::InvalidTolerance { name: "eps_rel", .. })
        ));
        assert!(matches!(
            QuadratureOptions::new(0.0, 0.0, 10),
            Err(QuadratureError::InvalidTolerance { .. })
        ));
        assert_eq!(
            QuadratureOptions::new(1e-8, 1e-8, 0),
            Err(QuadratureError::InvalidLimit { limit: 0 })
        );
        assert!(QuadratureOptions::new(0.0, 1e-10, 5).is_ok());
    }
}
