//! Correlation layer: Sarmanov coupling of purchase and attrition rates.
//!
//! Purpose
//! -------
//! Let the purchase rate `λ ~ Gamma(r, α_i)` and the attrition rate
//! `η ~ Gamma(s, β_i)` be correlated through a Sarmanov density with mixing
//! functions `φ1 = e^{−λ} − A_i`, `φ2 = e^{−η} − B_i`:
//!
//! ```text
//! A_i = (α_i / (α_i + 1))^r        B_i = (β_i / (β_i + 1))^s
//! ω_i = ρ (α_i + 1)(β_i + 1) / (A_i B_i √(r s))
//! L_i = L00 + ω_i A_i B_i (L11 − L10 − L01 + L00)
//! ```
//!
//! where `Lab` is the uncorrelated likelihood with scales `(α_i + a, β_i + b)`.
//! The choice of `ω_i` makes `corr(λ, η) = ρ`.
//!
//! Key behaviors
//! -------------
//! - The density is non-negative only for
//!   `ω_i ∈ [−1/max((1−A)(1−B), AB), 1/max(A(1−B), (1−A)B)]`. With bound
//!   checks on, any violation returns `CONSTRAINT_PENALTY` without
//!   evaluating the likelihood.
//! - The combination is done in log space relative to `ln L00`.
//! - [`SarmanovTerms::weights`] expresses `L_i` as `Σ_k c_k L_k`, which the
//!   prediction code uses to mix posterior quantities.
use log::debug;
use ndarray::{Array1, ArrayView1, Zip};

use crate::clv::{
    core::{covariates::Heterogeneity, likelihood::LLBranches, params::GGomNBDParams},
    errors::CLVResult,
    interlayers::{
        base::{BaseLikelihood, Resolved, absorb_non_finite},
        config::LayerArgs,
        pipeline::CONSTRAINT_PENALTY,
    },
};

/// Scale shifts `(Δα, Δβ)` of the components `L00, L10, L01, L11`.
pub const COMPONENT_SHIFTS: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];

/// Per-customer Sarmanov quantities `A_i`, `B_i` and `ω_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SarmanovTerms {
    pub a: Array1<f64>,
    pub b: Array1<f64>,
    pub omega: Array1<f64>,
}

impl SarmanovTerms {
    pub fn new(params: &GGomNBDParams, het: &Heterogeneity, rho: f64) -> Self {
        let (r, s) = (params.r, params.s);
        let a = het.alpha_i.mapv(|alpha| (r * (alpha / (alpha + 1.0)).ln()).exp());
        let b = het.beta_i.mapv(|beta| (s * (beta / (beta + 1.0)).ln()).exp());
        let sqrt_rs = (r * s).sqrt();
        let omega = Zip::from(&het.alpha_i)
            .and(&het.beta_i)
            .and(&a)
            .and(&b)
            .map_collect(|&alpha, &beta, &ai, &bi| {
                rho * (alpha + 1.0) * (beta + 1.0) / (ai * bi * sqrt_rs)
            });
        Self { a, b, omega }
    }

    /// Admissible interval for `ω` given `A` and `B`.
    pub fn bounds(a: f64, b: f64) -> (f64, f64) {
        let lower = -1.0 / ((1.0 - a) * (1.0 - b)).max(a * b);
        let upper = 1.0 / (a * (1.0 - b)).max((1.0 - a) * b);
        (lower, upper)
    }

    /// Index of the first customer whose `ω_i` lies outside its bounds (or
    /// is not finite).
    pub fn first_violation(&self) -> Option<usize> {
        (0..self.omega.len()).find(|&i| {
            let (lo, hi) = Self::bounds(self.a[i], self.b[i]);
            let w = self.omega[i];
            !(w.is_finite() && lo <= w && w <= hi)
        })
    }

    /// Component weights `c_k` with `L_i = Σ_k c_k[i] · L_k[i]`, in
    /// [`COMPONENT_SHIFTS`] order.
    pub fn weights(&self) -> [Array1<f64>; 4] {
        let wab = &self.omega * &self.a * &self.b;
        [wab.mapv(|v| 1.0 + v), wab.mapv(|v| -v), wab.mapv(|v| -v), wab]
    }
}

/// Evaluate the four shifted components for resolved parameters.
pub fn component_branches(
    base: &BaseLikelihood<'_>, resolved: &Resolved,
) -> CLVResult<[LLBranches; 4]> {
    let eval = |k: usize| {
        let (da, db) = COMPONENT_SHIFTS[k];
        base.branches(&resolved.params, &resolved.het.shifted(da, db))
    };
    Ok([eval(0)?, eval(1)?, eval(2)?, eval(3)?])
}

/// Combine component log-likelihoods into the correlated log-likelihood.
pub fn combine(components: &[LLBranches; 4], terms: &SarmanovTerms) -> Array1<f64> {
    let [c00, c10, c01, c11] = components;
    let mut out = Array1::zeros(c00.ll.len());
    for i in 0..out.len() {
        let base = c00.ll[i];
        let bracket = (c11.ll[i] - base).exp() - (c10.ll[i] - base).exp()
            - (c01.ll[i] - base).exp()
            + 1.0;
        let wab = terms.omega[i] * terms.a[i] * terms.b[i];
        out[i] = base + (wab * bracket).ln_1p();
    }
    out
}

/// The correlation interlayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Correlation;

impl Correlation {
    /// Per-customer correlated log-likelihoods, or `None` when bound checks
    /// are on and some `ω_i` is inadmissible.
    pub fn individual(
        &self, full: ArrayView1<f64>, base: &BaseLikelihood<'_>, args: LayerArgs,
    ) -> CLVResult<Option<Array1<f64>>> {
        let resolved = base.resolve(full)?;
        let rho = resolved.rho.unwrap_or(0.0);
        let terms = SarmanovTerms::new(&resolved.params, &resolved.het, rho);
        if args.check_correlation_bounds {
            if let Some(i) = terms.first_violation() {
                debug!(
                    "Correlation {rho} inadmissible for customer {i} (omega = {}); returning penalty",
                    terms.omega[i]
                );
                return Ok(None);
            }
        }
        let components = component_branches(base, &resolved)?;
        Ok(Some(combine(&components, &terms)))
    }

    /// Negative-sum objective of the correlated model.
    pub fn evaluate(
        &self, full: ArrayView1<f64>, base: &BaseLikelihood<'_>, args: LayerArgs,
    ) -> CLVResult<f64> {
        Ok(match self.individual(full, base, args)? {
            Some(ll) => absorb_non_finite(-ll.sum()),
            None => CONSTRAINT_PENALTY,
        })
    }
}
