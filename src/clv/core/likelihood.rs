//! GGompertz/NBD log-likelihood evaluator.
//!
//! Purpose
//! -------
//! Compute per-customer log-likelihoods of the GGompertz/NBD model from the
//! customer summary `(x, t_x, t_cal)` and per-customer scales
//! `(alpha_i, beta_i)`, plus the negative-sum objective used by the
//! optimizer.
//!
//! Key behaviors
//! -------------
//! For customer `i` with `r_x = r + x_i`:
//!
//! ```text
//! L1 = lnΓ(r_x) − lnΓ(r) + r·(ln α_i − ln(α_i + T)) − x_i·ln(α_i + T)
//!      + s·(ln β_i − ln(β_i − 1 + e^{bT}))
//! L2 = lnΓ(r_x) − lnΓ(r) + ln b + r·ln α_i + ln s + s·ln β_i + ln I_i
//! I_i = ∫_{t_x}^{T} (y + α_i)^{−r_x} (β_i + e^{by} − 1)^{−(s+1)} e^{by} dy
//! LL  = ln(e^{L1} + e^{L2})
//! ```
//!
//! - `LL` is combined with a stable log-sum-exp.
//! - The integrand is evaluated in log space and rescaled per customer by
//!   its larger endpoint value before integrating, so `ln I_i` stays accurate
//!   when `g` itself under- or overflows; `ln(β + e^z − 1)` switches to
//!   `z + ln(1 + (β − 1)e^{−z})` for large `z` so neither branch overflows.
//! - Integrals run in parallel with rayon; every worker owns its own
//!   [`QagWorkspace`] and the integrand context is an immutable per-customer
//!   value captured by the closure.
//! - Before integrating, coarse magnitude bounds of the integrand across all
//!   customers are checked and a divergence warning is logged when they
//!   underflow to zero or exceed `1e200`. The warning never changes values.
//!
//! Invariants & assumptions
//! ------------------------
//! - Output order equals customer order.
//! - Invalid parameter regions yield non-finite entries, never errors; only
//!   shape problems are reported as [`CLVError`].
//! - An integral that is `≤ 0` (an empty interval `t_x == T`)
//!   makes `L2 = −∞`, so `LL = L1`.
//!
//! Downstream usage
//! ----------------
//! - `clv::interlayers::BaseLikelihood` evaluates [`ggomnbd_branches`] for
//!   the objective; prediction reuses the `(L1, LL)` pair for P(alive).
//! - The four `likelihood_*` functions are the positional entry points used
//!   by external callers and the Python bindings.
use log::warn;
use ndarray::{Array1, ArrayView1, ArrayView2, s};
use rayon::prelude::*;
use statrs::function::gamma::ln_gamma;

use crate::{
    clv::{
        core::{
            covariates::{Heterogeneity, build_heterogeneity},
            data::CBSData,
            params::{GGomNBDParams, N_MODEL_PARAMS},
        },
        errors::{CLVError, CLVResult},
    },
    optimization::numerical_stability::log_sum_exp,
    quadrature::{QagWorkspace, QuadratureOptions, integrate},
};

/// Magnitude above which the integrand's upper bound triggers a warning.
pub const DIVERGENCE_UPPER: f64 = 1e200;

/// Beyond this exponent `ln(β + e^z − 1)` is computed as
/// `z + ln(1 + (β − 1)e^{−z})`.
const EXP_SWITCH: f64 = 30.0;

/// Per-customer closed-form branch, integral branch and log-likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct LLBranches {
    pub l1: Array1<f64>,
    pub l2: Array1<f64>,
    pub ll: Array1<f64>,
}

/// Stable `ln(β + e^z − 1)` for `z ≥ 0`.
pub fn ln_beta_plus_expm1(beta: f64, z: f64) -> f64 {
    if z > EXP_SWITCH {
        z + ((beta - 1.0) * (-z).exp()).ln_1p()
    } else {
        (beta + z.exp_m1()).ln()
    }
}

/// Immutable values the integrand needs for one customer.
#[derive(Debug, Clone, Copy)]
struct IntegrandContext {
    r_x: f64,
    s1: f64,
    b: f64,
    alpha: f64,
    beta: f64,
}

impl IntegrandContext {
    fn ln_eval(&self, y: f64) -> f64 {
        let by = self.b * y;
        -self.r_x * (y + self.alpha).ln() - self.s1 * ln_beta_plus_expm1(self.beta, by) + by
    }

    #[cfg(test)]
    fn eval(&self, y: f64) -> f64 {
        self.ln_eval(y).exp()
    }

    /// `ln ∫ g` over `[lower, upper]`.
    ///
    /// The integrand is rescaled by the larger endpoint value of `ln g`, so
    /// the quadrature sees values of order one even when `g` itself is far
    /// outside the `f64` range.
    fn ln_integral(
        &self, lower: f64, upper: f64, quad: &QuadratureOptions, ws: &mut QagWorkspace,
    ) -> f64 {
        let peak = self.ln_eval(lower).max(self.ln_eval(upper));
        let shift = if peak.is_finite() { peak } else { 0.0 };
        let scaled = integrate(&|y| (self.ln_eval(y) - shift).exp(), lower, upper, quad, ws).value;
        if scaled > 0.0 {
            scaled.ln() + shift
        } else if scaled.is_nan() {
            f64::NAN
        } else {
            f64::NEG_INFINITY
        }
    }
}

/// Evaluate `(L1, L2, LL)` for every customer.
///
/// Only `r`, `b` and `s` are read from `params`; the scales come from `het`.
///
/// # Errors
/// - [`CLVError::DimensionMismatch`] if `het` and `cbs` disagree in length.
pub fn ggomnbd_branches(
    params: &GGomNBDParams, het: &Heterogeneity, cbs: &CBSData, quad: &QuadratureOptions,
) -> CLVResult<LLBranches> {
    let n = cbs.len();
    if het.len() != n {
        return Err(CLVError::DimensionMismatch {
            what: "heterogeneity parameters",
            expected: n,
            actual: het.len(),
        });
    }
    let GGomNBDParams { r, b, s, .. } = *params;

    check_divergence(r, b, s, het, cbs);

    let ln_integrals: Vec<f64> = (0..n)
        .into_par_iter()
        .map_init(
            || QagWorkspace::new(quad.limit),
            |ws, i| {
                let ctx = IntegrandContext {
                    r_x: r + cbs.x[i],
                    s1: s + 1.0,
                    b,
                    alpha: het.alpha_i[i],
                    beta: het.beta_i[i],
                };
                ctx.ln_integral(cbs.t_x[i], cbs.t_cal[i], quad, ws)
            },
        )
        .collect();

    let lg_r = ln_gamma(r);
    let (ln_b, ln_s) = (b.ln(), s.ln());
    let mut l1 = Array1::zeros(n);
    let mut l2 = Array1::zeros(n);
    let mut ll = Array1::zeros(n);
    for i in 0..n {
        let (x, t_cal) = (cbs.x[i], cbs.t_cal[i]);
        let (alpha, beta) = (het.alpha_i[i], het.beta_i[i]);
        let common = ln_gamma(r + x) - lg_r;
        let ln_alpha = alpha.ln();
        let ln_alpha_t = (alpha + t_cal).ln();
        let ln_beta = beta.ln();

        l1[i] = common + r * (ln_alpha - ln_alpha_t) - x * ln_alpha_t
            + s * (ln_beta - ln_beta_plus_expm1(beta, b * t_cal));
        l2[i] = common + ln_b + r * ln_alpha + ln_s + s * ln_beta + ln_integrals[i];
        ll[i] = log_sum_exp(l1[i], l2[i]);
    }

    Ok(LLBranches { l1, l2, ll })
}

/// Which coarse integrand bound tripped in [`check_divergence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DivergenceCheck {
    /// The lower bound underflowed to exactly zero.
    pub lower_underflow: bool,
    /// The upper bound exceeded [`DIVERGENCE_UPPER`].
    pub upper_overflow: bool,
}

impl DivergenceCheck {
    pub fn is_clear(&self) -> bool {
        !self.lower_underflow && !self.upper_overflow
    }
}

/// Log a warning when coarse integrand bounds suggest `ln I` may diverge.
///
/// The bounds combine extremal `t_x`, `alpha_i`, `beta_i` and `x` across all
/// customers. Advisory only: the returned flags never feed back into the
/// likelihood.
pub fn check_divergence(
    r: f64, b: f64, s: f64, het: &Heterogeneity, cbs: &CBSData,
) -> DivergenceCheck {
    let max = |v: &Array1<f64>| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = |v: &Array1<f64>| v.iter().copied().fold(f64::INFINITY, f64::min);
    let (tx_max, tx_min) = (max(&cbs.t_x), min(&cbs.t_x));
    let r_x = r + cbs.max_x();

    let below = (tx_max + max(&het.alpha_i)).powf(-r_x)
        * (max(&het.beta_i) + (b * tx_max).exp() - 1.0).powf(-(s + 1.0))
        * (b * tx_min).exp();
    let above = (tx_min + min(&het.alpha_i)).powf(-r_x)
        * (min(&het.beta_i) + (b * tx_min).exp() - 1.0).powf(-(s + 1.0))
        * (b * tx_max).exp();

    let check = DivergenceCheck {
        lower_underflow: below == 0.0,
        upper_overflow: above > DIVERGENCE_UPPER,
    };
    if check.lower_underflow {
        warn!("Log of the integral might diverge; lower bound = 0");
    }
    if check.upper_overflow {
        warn!("Log of the integral might diverge; upper bound = {above:e}");
    }
    check
}

/// Per-customer log-likelihoods without covariates.
///
/// `log_params = [ln r, ln alpha, ln b, ln s, ln beta]`.
///
/// # Errors
/// - [`CLVError::DimensionMismatch`] unless `log_params` has five entries.
pub fn likelihood_individual_nocov(
    log_params: ArrayView1<f64>, cbs: &CBSData,
) -> CLVResult<Array1<f64>> {
    let params = GGomNBDParams::from_log(log_params)?;
    let het = Heterogeneity::constant(cbs.len(), params.alpha, params.beta);
    Ok(ggomnbd_branches(&params, &het, cbs, &QuadratureOptions::default())?.ll)
}

/// Negative sum of [`likelihood_individual_nocov`].
pub fn likelihood_sum_nocov(log_params: ArrayView1<f64>, cbs: &CBSData) -> CLVResult<f64> {
    Ok(-likelihood_individual_nocov(log_params, cbs)?.sum())
}

/// Per-customer log-likelihoods with static covariates.
///
/// `params = [ln r, ln alpha, ln b, ln s, ln beta, life coefficients…,
/// trans coefficients…]`, one coefficient per covariate column in column
/// order.
///
/// # Errors
/// - [`CLVError::DimensionMismatch`] if `params` does not match
///   `5 + life.ncols() + trans.ncols()` or the covariate rows do not match
///   the number of customers.
pub fn likelihood_individual_staticcov(
    params: ArrayView1<f64>, cbs: &CBSData, life_cov: ArrayView2<f64>, trans_cov: ArrayView2<f64>,
) -> CLVResult<Array1<f64>> {
    let n_life = life_cov.ncols();
    let expected = N_MODEL_PARAMS + n_life + trans_cov.ncols();
    if params.len() != expected {
        return Err(CLVError::DimensionMismatch {
            what: "parameter vector",
            expected,
            actual: params.len(),
        });
    }
    if life_cov.nrows() != cbs.len() {
        return Err(CLVError::DimensionMismatch {
            what: "life covariate rows",
            expected: cbs.len(),
            actual: life_cov.nrows(),
        });
    }

    let model = GGomNBDParams::from_log(params.slice(s![..N_MODEL_PARAMS]))?;
    let life_coeffs = params.slice(s![N_MODEL_PARAMS..N_MODEL_PARAMS + n_life]);
    let trans_coeffs = params.slice(s![N_MODEL_PARAMS + n_life..]);
    let het =
        build_heterogeneity(model.alpha, model.beta, trans_coeffs, life_coeffs, trans_cov, life_cov)?;
    Ok(ggomnbd_branches(&model, &het, cbs, &QuadratureOptions::default())?.ll)
}

/// Negative sum of [`likelihood_individual_staticcov`].
pub fn likelihood_sum_staticcov(
    params: ArrayView1<f64>, cbs: &CBSData, life_cov: ArrayView2<f64>, trans_cov: ArrayView2<f64>,
) -> CLVResult<f64> {
    Ok(-likelihood_individual_staticcov(params, cbs, life_cov, trans_cov)?.sum())
}
