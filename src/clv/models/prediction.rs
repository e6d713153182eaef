//! Prediction metrics of a fitted GGompertz/NBD model.
//!
//! Purpose
//! -------
//! Turn a full parameter vector into per-customer forecasts:
//!
//! ```text
//! PAlive_i = exp(L1_i − LL_i)
//! CET_i(h) = PAlive_i · (r + x_i)/(α_i + T_i) · ∫_{T_i}^{T_i+h} S_i(u | T_i) du
//! E_i(t)   = (r / α_i) · ∫_0^t S_i(u | 0) du
//! S_i(u | t0) = ((β_i + e^{b·t0} − 1) / (β_i + e^{b·u} − 1))^s
//! ```
//!
//! Key behaviors
//! -------------
//! - Survival integrals use the same adaptive quadrature as the likelihood,
//!   one [`QagWorkspace`] per rayon worker, output in customer order.
//! - With an estimated correlation every quantity is computed for the four
//!   shifted components and mixed: posterior quantities (PAlive, CET) with
//!   weights `c_k · exp(LL_k − LL)`, the unconditional expectation with the
//!   plain Sarmanov weights `c_k`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Horizons must be finite and `≥ 0`; a zero horizon gives zeros.
//! - Non-finite parameters propagate as `NaN` forecasts, never as errors.
use ndarray::{Array1, ArrayView1, Zip};
use rayon::prelude::*;

use crate::{
    clv::{
        core::{
            covariates::Heterogeneity,
            likelihood::{LLBranches, ln_beta_plus_expm1},
            params::GGomNBDParams,
        },
        errors::{CLVError, CLVResult},
        interlayers::{
            base::BaseLikelihood,
            correlation::{COMPONENT_SHIFTS, SarmanovTerms, combine, component_branches},
        },
    },
    quadrature::{QagWorkspace, QuadratureOptions, integrate},
};

/// Per-customer forecasts for one horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    /// Probability of being alive at the end of calibration.
    pub palive: Array1<f64>,
    /// Conditional expected transactions in `(T, T + horizon]`.
    pub cet: Array1<f64>,
    pub horizon: f64,
}

/// P(alive) and conditional expected transactions.
///
/// # Errors
/// - [`CLVError::InvalidHorizon`] for a negative or non-finite horizon.
/// - Shape errors from resolving `full`.
pub fn predict(
    base: &BaseLikelihood<'_>, full: ArrayView1<f64>, horizon: f64,
) -> CLVResult<PredictionTable> {
    check_horizon(horizon)?;
    let resolved = base.resolve(full)?;
    let (palive, cet) = match resolved.rho {
        None => {
            let branches = base.branches(&resolved.params, &resolved.het)?;
            conditional_metrics(base, &resolved.params, &resolved.het, &branches, horizon)
        }
        Some(rho) => {
            let terms = SarmanovTerms::new(&resolved.params, &resolved.het, rho);
            let components = component_branches(base, &resolved)?;
            let ll = combine(&components, &terms);
            let weights = terms.weights();
            let n = ll.len();
            let (mut palive, mut cet) = (Array1::<f64>::zeros(n), Array1::<f64>::zeros(n));
            for (k, &(da, db)) in COMPONENT_SHIFTS.iter().enumerate() {
                let het = resolved.het.shifted(da, db);
                let (p_k, cet_k) =
                    conditional_metrics(base, &resolved.params, &het, &components[k], horizon);
                let posterior = Zip::from(&weights[k])
                    .and(&components[k].ll)
                    .and(&ll)
                    .map_collect(|&c, &ll_k, &total| c * (ll_k - total).exp());
                palive += &(&posterior * &p_k);
                cet += &(&posterior * &cet_k);
            }
            (palive, cet)
        }
    };
    Ok(PredictionTable { palive, cet, horizon })
}

/// Unconditional expected number of transactions in `(0, t]` per customer.
///
/// # Errors
/// - [`CLVError::InvalidHorizon`] for a negative or non-finite `t`.
pub fn expectation(
    base: &BaseLikelihood<'_>, full: ArrayView1<f64>, t: f64,
) -> CLVResult<Array1<f64>> {
    check_horizon(t)?;
    let resolved = base.resolve(full)?;
    let params = &resolved.params;
    let quad = &base.quadrature;
    Ok(match resolved.rho {
        None => unconditional(params, &resolved.het, t, quad),
        Some(rho) => {
            let weights = SarmanovTerms::new(params, &resolved.het, rho).weights();
            let mut out = Array1::<f64>::zeros(resolved.het.len());
            for (k, &(da, db)) in COMPONENT_SHIFTS.iter().enumerate() {
                let e_k = unconditional(params, &resolved.het.shifted(da, db), t, quad);
                out += &(&weights[k] * &e_k);
            }
            out
        }
    })
}

fn check_horizon(value: f64) -> CLVResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CLVError::InvalidHorizon { value })
    }
}

/// `(PAlive, CET)` of one uncorrelated component.
fn conditional_metrics(
    base: &BaseLikelihood<'_>, params: &GGomNBDParams, het: &Heterogeneity,
    branches: &LLBranches, horizon: f64,
) -> (Array1<f64>, Array1<f64>) {
    let cbs = &base.data.cbs;
    let palive =
        Zip::from(&branches.l1).and(&branches.ll).map_collect(|&l1, &ll| (l1 - ll).exp());
    let survival = survival_integrals(params, het, cbs.t_cal.view(), horizon, &base.quadrature);
    let r = params.r;
    let mut cet = Array1::<f64>::zeros(palive.len());
    Zip::from(&mut cet)
        .and(&palive)
        .and(&survival)
        .and(&cbs.x)
        .and(&cbs.t_cal)
        .and(&het.alpha_i)
        .for_each(|out, &p, &surv, &x, &t_cal, &alpha| {
            *out = p * (r + x) / (alpha + t_cal) * surv;
        });
    (palive, cet)
}

fn unconditional(
    params: &GGomNBDParams, het: &Heterogeneity, t: f64, quad: &QuadratureOptions,
) -> Array1<f64> {
    let origin = Array1::<f64>::zeros(het.len());
    let survival = survival_integrals(params, het, origin.view(), t, quad);
    Zip::from(&survival).and(&het.alpha_i).map_collect(|&surv, &alpha| params.r / alpha * surv)
}

/// `∫_{t0_i}^{t0_i + length} S_i(u | t0_i) du` for every customer.
fn survival_integrals(
    params: &GGomNBDParams, het: &Heterogeneity, from: ArrayView1<f64>, length: f64,
    quad: &QuadratureOptions,
) -> Array1<f64> {
    let (b, s) = (params.b, params.s);
    let values: Vec<f64> = (0..het.len())
        .into_par_iter()
        .map_init(
            || QagWorkspace::new(quad.limit),
            |ws, i| {
                let (beta, t0) = (het.beta_i[i], from[i]);
                let anchor = ln_beta_plus_expm1(beta, b * t0);
                let survival = |u: f64| (s * (anchor - ln_beta_plus_expm1(beta, b * u))).exp();
                integrate(&survival, t0, t0 + length, quad, ws).value
            },
        )
        .collect();
    Array1::from(values)
}
