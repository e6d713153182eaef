//! GGompertz/NBD parameters and the optimizer-space layout.
//!
//! Purpose
//! -------
//! Own the bidirectional map between the natural parameters of the model and
//! the unconstrained vector the optimizer works on, including covariate
//! coefficients, equality-constrained coefficients and the correlation
//! surrogate.
//!
//! Key behaviors
//! -------------
//! - [`GGomNBDParams`] stores `(r, alpha, b, s, beta)`, all strictly positive.
//! - [`ParamLayout`] fixes the positional order of the optimizer vector and of
//!   the expanded ("full") vector consumed by the likelihood, and implements
//!   the forward/backward transforms and the diagonal Jacobian.
//! - [`StartValues`] collects user start values by name; [`NaturalParams`]
//!   is the named, natural-scale result of a back-transform.
//!
//! Conventions
//! -----------
//! Optimizer vector θ (names as reported by [`ParamLayout::names`]):
//!
//! ```text
//! [log.r, log.alpha, log.b, log.s, log.beta,
//!  life.<free>…, trans.<free>…, constr.<name>…, cor]
//! ```
//!
//! Full vector (after the constraint layer has expanded θ):
//!
//! ```text
//! [log.r, log.alpha, log.b, log.s, log.beta,
//!  life.<all life columns>…, trans.<all trans columns>…, cor]
//! ```
//!
//! Without constraints and correlation both vectors coincide with the
//! static-covariate likelihood's positional layout. `cor` is present only
//! when correlation is estimated and is Fisher's z of ρ.
//!
//! Invariants & assumptions
//! ------------------------
//! - Model parameters enter θ through `ln`; coefficients pass unchanged;
//!   `ρ` enters through `atanh` and leaves through a clipped `tanh`.
//! - A constrained name exists in both covariate sets and is removed from
//!   their free coefficient lists.
use std::ops::Range;

use ndarray::{Array1, ArrayView1, s};

use crate::{
    clv::errors::{CLVError, CLVResult},
    optimization::{
        loglik_optimizer::Theta,
        numerical_stability::{cor_to_surrogate, d_cor_d_surrogate, surrogate_to_cor},
    },
};

/// Natural names of the baseline parameters, in layout order.
pub const MODEL_PARAM_NAMES: [&str; 5] = ["r", "alpha", "b", "s", "beta"];

/// Number of baseline parameters.
pub const N_MODEL_PARAMS: usize = MODEL_PARAM_NAMES.len();

/// Name of the correlation entry in both vectors.
pub const COR_NAME: &str = "cor";

/// Baseline GGompertz/NBD parameters on the natural scale.
///
/// - `r`, `alpha`: shape and scale of the Gamma purchase-rate mixture.
/// - `b`: Gompertz scale.
/// - `s`, `beta`: shape and scale of the Gamma mixture of the Gompertz rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GGomNBDParams {
    pub r: f64,
    pub alpha: f64,
    pub b: f64,
    pub s: f64,
    pub beta: f64,
}

impl GGomNBDParams {
    /// Construct validated parameters.
    ///
    /// # Errors
    /// - [`CLVError::InvalidStartParameter`] naming the first value that is
    ///   not finite and strictly positive.
    pub fn new(r: f64, alpha: f64, b: f64, s: f64, beta: f64) -> CLVResult<Self> {
        let params = GGomNBDParams { r, alpha, b, s, beta };
        for (name, value) in MODEL_PARAM_NAMES.iter().zip(params.to_array()) {
            if !value.is_finite() || value <= 0.0 {
                return Err(CLVError::InvalidStartParameter { name: name.to_string(), value });
            }
        }
        Ok(params)
    }

    /// Exponentiate log-scale values `[ln r, ln alpha, ln b, ln s, ln beta]`.
    ///
    /// No validation: non-finite logs give non-finite parameters, which the
    /// likelihood absorbs.
    ///
    /// # Errors
    /// - [`CLVError::DimensionMismatch`] unless exactly five values are given.
    pub fn from_log(log_params: ArrayView1<f64>) -> CLVResult<Self> {
        if log_params.len() != N_MODEL_PARAMS {
            return Err(CLVError::DimensionMismatch {
                what: "model log-parameters",
                expected: N_MODEL_PARAMS,
                actual: log_params.len(),
            });
        }
        let e = log_params.mapv(f64::exp);
        Ok(GGomNBDParams { r: e[0], alpha: e[1], b: e[2], s: e[3], beta: e[4] })
    }

    pub fn to_array(&self) -> Array1<f64> {
        ndarray::array![self.r, self.alpha, self.b, self.s, self.beta]
    }

    pub fn to_log(&self) -> Array1<f64> {
        self.to_array().mapv(f64::ln)
    }
}

impl Default for GGomNBDParams {
    /// All parameters equal to one.
    fn default() -> Self {
        GGomNBDParams { r: 1.0, alpha: 1.0, b: 1.0, s: 1.0, beta: 1.0 }
    }
}

/// Start values keyed by name.
///
/// Coefficient names use the optimizer prefixes: `life.<x>`, `trans.<x>` and
/// `constr.<x>`. Coefficients that are not listed start at `0`; a missing
/// correlation starts at `ρ = 0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartValues {
    pub model: GGomNBDParams,
    pub coefficients: Vec<(String, f64)>,
    pub correlation: Option<f64>,
}

impl StartValues {
    pub fn new(model: GGomNBDParams) -> Self {
        StartValues { model, coefficients: Vec::new(), correlation: None }
    }

    pub fn with_coefficient(mut self, name: impl Into<String>, value: f64) -> Self {
        self.coefficients.push((name.into(), value));
        self
    }

    pub fn with_correlation(mut self, rho: f64) -> Self {
        self.correlation = Some(rho);
        self
    }
}

/// Named natural-scale parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalParams {
    pub names: Vec<String>,
    pub values: Array1<f64>,
}

impl NaturalParams {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    /// Baseline parameters (the first five entries).
    pub fn model(&self) -> GGomNBDParams {
        let v = &self.values;
        GGomNBDParams { r: v[0], alpha: v[1], b: v[2], s: v[3], beta: v[4] }
    }

    pub fn correlation(&self) -> Option<f64> {
        self.get(COR_NAME)
    }
}

/// Borrowed pieces of a full parameter vector.
#[derive(Debug, Clone, Copy)]
pub struct FullParts<'a> {
    pub log_model: ArrayView1<'a, f64>,
    pub life: ArrayView1<'a, f64>,
    pub trans: ArrayView1<'a, f64>,
    pub cor_surrogate: Option<f64>,
}

/// Positional layout of the optimizer and full parameter vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamLayout {
    life_names: Vec<String>,
    trans_names: Vec<String>,
    constrained: Vec<String>,
    correlation: bool,
    // Column indices (into life/trans) of the free coefficients.
    free_life: Vec<usize>,
    free_trans: Vec<usize>,
    // For each constrained name: (life column, trans column).
    constr_cols: Vec<(usize, usize)>,
}

impl ParamLayout {
    /// Build a layout from covariate names, constrained names and the
    /// correlation flag.
    ///
    /// # Errors
    /// - [`CLVError::UnknownConstraint`] if a constrained name is missing from
    ///   either covariate set or is listed twice.
    pub fn new(
        life_names: &[String], trans_names: &[String], constrained: &[String], correlation: bool,
    ) -> CLVResult<Self> {
        let mut constr_cols = Vec::with_capacity(constrained.len());
        for (k, name) in constrained.iter().enumerate() {
            if constrained[..k].contains(name) {
                return Err(CLVError::UnknownConstraint {
                    name: name.clone(),
                    reason: "listed more than once",
                });
            }
            let life = life_names.iter().position(|n| n == name);
            let trans = trans_names.iter().position(|n| n == name);
            match (life, trans) {
                (Some(l), Some(t)) => constr_cols.push((l, t)),
                _ => {
                    return Err(CLVError::UnknownConstraint {
                        name: name.clone(),
                        reason: "must be a covariate of both the life and trans process",
                    });
                }
            }
        }
        let free_life = (0..life_names.len()).filter(|&i| !constr_cols.iter().any(|c| c.0 == i));
        let free_trans = (0..trans_names.len()).filter(|&i| !constr_cols.iter().any(|c| c.1 == i));
        Ok(ParamLayout {
            life_names: life_names.to_vec(),
            trans_names: trans_names.to_vec(),
            constrained: constrained.to_vec(),
            correlation,
            free_life: free_life.collect(),
            free_trans: free_trans.collect(),
            constr_cols,
        })
    }

    /// Layout of the model without covariates.
    pub fn without_covariates(correlation: bool) -> Self {
        ParamLayout {
            life_names: Vec::new(),
            trans_names: Vec::new(),
            constrained: Vec::new(),
            correlation,
            free_life: Vec::new(),
            free_trans: Vec::new(),
            constr_cols: Vec::new(),
        }
    }

    // ---- Sizes and ranges (optimizer space) ----

    /// Length of the optimizer vector θ.
    pub fn dim(&self) -> usize {
        N_MODEL_PARAMS
            + self.free_life.len()
            + self.free_trans.len()
            + self.constr_cols.len()
            + usize::from(self.correlation)
    }

    /// Length of the full vector after constraint expansion.
    pub fn full_dim(&self) -> usize {
        N_MODEL_PARAMS
            + self.life_names.len()
            + self.trans_names.len()
            + usize::from(self.correlation)
    }

    pub fn free_life_range(&self) -> Range<usize> {
        N_MODEL_PARAMS..N_MODEL_PARAMS + self.free_life.len()
    }

    pub fn free_trans_range(&self) -> Range<usize> {
        let start = self.free_life_range().end;
        start..start + self.free_trans.len()
    }

    pub fn constr_range(&self) -> Range<usize> {
        let start = self.free_trans_range().end;
        start..start + self.constr_cols.len()
    }

    /// Index of the correlation surrogate in θ.
    pub fn cor_index(&self) -> Option<usize> {
        self.correlation.then(|| self.constr_range().end)
    }

    pub fn has_correlation(&self) -> bool {
        self.correlation
    }

    pub fn has_constraints(&self) -> bool {
        !self.constr_cols.is_empty()
    }

    pub fn life_names(&self) -> &[String] {
        &self.life_names
    }

    pub fn trans_names(&self) -> &[String] {
        &self.trans_names
    }

    /// Optimizer-space names in θ order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = MODEL_PARAM_NAMES.iter().map(|n| format!("log.{n}")).collect();
        names.extend(self.coefficient_names());
        names
    }

    /// Natural-scale names in θ order.
    pub fn natural_names(&self) -> Vec<String> {
        let mut names: Vec<String> = MODEL_PARAM_NAMES.iter().map(|n| n.to_string()).collect();
        names.extend(self.coefficient_names());
        names
    }

    fn coefficient_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dim() - N_MODEL_PARAMS);
        names.extend(self.free_life.iter().map(|&i| format!("life.{}", self.life_names[i])));
        names.extend(self.free_trans.iter().map(|&i| format!("trans.{}", self.trans_names[i])));
        names.extend(self.constrained.iter().map(|n| format!("constr.{n}")));
        if self.correlation {
            names.push(COR_NAME.to_string());
        }
        names
    }

    // ---- Vector maps ----

    /// Check that θ has the layout's length and only finite entries.
    ///
    /// # Errors
    /// - [`CLVError::ThetaLengthMismatch`], [`CLVError::InvalidThetaInput`].
    pub fn check_theta(&self, theta: ArrayView1<f64>) -> CLVResult<()> {
        if theta.len() != self.dim() {
            return Err(CLVError::ThetaLengthMismatch { expected: self.dim(), actual: theta.len() });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(CLVError::InvalidThetaInput { index, value });
        }
        Ok(())
    }

    /// Expand θ into the full vector by copying each constrained coefficient
    /// into its life and trans positions.
    ///
    /// Assumes `theta.len() == self.dim()`.
    pub fn expand(&self, theta: ArrayView1<f64>) -> Array1<f64> {
        let n_life = self.life_names.len();
        let mut full = Array1::zeros(self.full_dim());
        full.slice_mut(s![..N_MODEL_PARAMS]).assign(&theta.slice(s![..N_MODEL_PARAMS]));

        for (k, &col) in self.free_life.iter().enumerate() {
            full[N_MODEL_PARAMS + col] = theta[self.free_life_range().start + k];
        }
        for (k, &col) in self.free_trans.iter().enumerate() {
            full[N_MODEL_PARAMS + n_life + col] = theta[self.free_trans_range().start + k];
        }
        for (k, &(l, t)) in self.constr_cols.iter().enumerate() {
            let value = theta[self.constr_range().start + k];
            full[N_MODEL_PARAMS + l] = value;
            full[N_MODEL_PARAMS + n_life + t] = value;
        }
        if let Some(idx) = self.cor_index() {
            full[self.full_dim() - 1] = theta[idx];
        }
        full
    }

    /// Split a full vector into its named blocks.
    ///
    /// # Errors
    /// - [`CLVError::DimensionMismatch`] if `full.len() != self.full_dim()`.
    pub fn split_full<'a>(&self, full: ArrayView1<'a, f64>) -> CLVResult<FullParts<'a>> {
        if full.len() != self.full_dim() {
            return Err(CLVError::DimensionMismatch {
                what: "full parameter vector",
                expected: self.full_dim(),
                actual: full.len(),
            });
        }
        let life_end = N_MODEL_PARAMS + self.life_names.len();
        let trans_end = life_end + self.trans_names.len();
        let cor_surrogate = self.correlation.then(|| full[trans_end]);
        let (log_model, rest) = full.split_at(ndarray::Axis(0), N_MODEL_PARAMS);
        let (life, rest) = rest.split_at(ndarray::Axis(0), self.life_names.len());
        let (trans, _) = rest.split_at(ndarray::Axis(0), self.trans_names.len());
        Ok(FullParts { log_model, life, trans, cor_surrogate })
    }

    /// Forward transform: start values → θ.
    ///
    /// # Errors
    /// - [`CLVError::InvalidStartParameter`] for non-positive model values.
    /// - [`CLVError::UnknownParameter`] for a coefficient (or correlation)
    ///   the layout does not contain.
    /// - [`CLVError::InvalidCorrelation`] unless `|ρ| < 1`.
    pub fn transform(&self, start: &StartValues) -> CLVResult<Theta> {
        let m = start.model;
        let model = GGomNBDParams::new(m.r, m.alpha, m.b, m.s, m.beta)?;

        let mut theta = Array1::zeros(self.dim());
        theta.slice_mut(s![..N_MODEL_PARAMS]).assign(&model.to_log());

        let names = self.names();
        for (name, value) in &start.coefficients {
            let idx = names[N_MODEL_PARAMS..]
                .iter()
                .position(|n| n == name && n != COR_NAME)
                .ok_or_else(|| CLVError::UnknownParameter { name: name.clone() })?;
            if !value.is_finite() {
                return Err(CLVError::InvalidThetaInput { index: N_MODEL_PARAMS + idx, value: *value });
            }
            theta[N_MODEL_PARAMS + idx] = *value;
        }

        match (self.cor_index(), start.correlation) {
            (Some(idx), rho) => {
                let rho = rho.unwrap_or(0.0);
                if !(rho.abs() < 1.0) {
                    return Err(CLVError::InvalidCorrelation { value: rho });
                }
                theta[idx] = cor_to_surrogate(rho);
            }
            (None, Some(_)) => {
                return Err(CLVError::UnknownParameter { name: COR_NAME.to_string() });
            }
            (None, None) => {}
        }
        Ok(theta)
    }

    /// Backward transform: θ → named natural-scale values.
    ///
    /// # Errors
    /// - [`CLVError::ThetaLengthMismatch`] for a θ of the wrong length.
    pub fn backtransform(&self, theta: ArrayView1<f64>) -> CLVResult<NaturalParams> {
        if theta.len() != self.dim() {
            return Err(CLVError::ThetaLengthMismatch { expected: self.dim(), actual: theta.len() });
        }
        let mut values = theta.to_owned();
        values.slice_mut(s![..N_MODEL_PARAMS]).mapv_inplace(f64::exp);
        if let Some(idx) = self.cor_index() {
            values[idx] = surrogate_to_cor(theta[idx]);
        }
        Ok(NaturalParams { names: self.natural_names(), values })
    }

    /// Diagonal of `∂(natural)/∂θ` evaluated at θ.
    ///
    /// `exp(θ_i)` for the model block, `1` for coefficients and `1 − ρ²` for
    /// the correlation surrogate.
    pub fn jacobian_diag(&self, theta: ArrayView1<f64>) -> Array1<f64> {
        let mut jac = Array1::ones(theta.len());
        for i in 0..N_MODEL_PARAMS.min(theta.len()) {
            jac[i] = theta[i].exp();
        }
        if let Some(idx) = self.cor_index().filter(|&i| i < theta.len()) {
            jac[idx] = d_cor_d_surrogate(theta[idx]);
        }
        jac
    }
}
