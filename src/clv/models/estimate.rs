//! Optimization driver: start values → estimate, Hessian and standard errors.
//!
//! Purpose
//! -------
//! Run the maximum-likelihood fit of a [`GGomNBDModel`] and package every
//! post-estimation quantity in an [`EstimationResult`].
//!
//! Key behaviors
//! -------------
//! 1. Validate the data against the variant and map start values into
//!    optimizer space.
//! 2. Maximize with L-BFGS (`optimization::maximize`).
//! 3. Compute the central-difference Hessian of the pipeline cost at `θ̂`,
//!    with correlation bound checks off when correlation is estimated.
//! 4. Invert it (eigen pseudo-inverse), map the covariance to the natural
//!    scale with the delta method and take standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - A non-finite `θ̂` or an unusable Hessian does not fail the call: the
//!   result is returned with [`EstimationWarning`]s, a `warn!` is logged and
//!   the Hessian is replaced by an all-`NaN` matrix of the right shape.
//! - Configuration, data and start-value problems are returned as errors
//!   before the optimizer runs.
use log::{info, warn};
use ndarray::{Array1, Array2};

use crate::{
    clv::{
        core::{
            data::CLVData,
            params::{NaturalParams, StartValues},
        },
        models::ggomnbd::GGomNBDModel,
    },
    inference::{covariance_from_hessian, standard_errors},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{FnEvalMap, Hessian, Theta, compute_hessian_nograd, maximize},
        numerical_stability::delta_method,
    },
};

/// Raw optimizer output in optimizer space.
///
/// - `hessian`: Hessian of the negative log-likelihood (all `NaN` when
///   unavailable).
/// - `value`: maximized log-likelihood, including any regularization
///   penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub theta_hat: Theta,
    pub hessian: Hessian,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

/// Non-fatal estimation problems.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationWarning {
    /// The optimizer ended on a non-finite coefficient.
    NonFiniteEstimate { index: usize },
    /// The Hessian could not be computed.
    HessianUnavailable { reason: String },
}

impl std::fmt::Display for EstimationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationWarning::NonFiniteEstimate { index } => {
                write!(f, "Estimated coefficient {index} is not finite; the estimate is unreliable")
            }
            EstimationWarning::HessianUnavailable { reason } => {
                write!(f, "Hessian unavailable, standard errors are NaN: {reason}")
            }
        }
    }
}

/// Everything a fit produces.
///
/// `covariance` and `std_errors` are on the natural scale, in the order of
/// `natural.names`; `names` are the optimizer-space names.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    pub names: Vec<String>,
    pub optimization: OptimizationResult,
    pub natural: NaturalParams,
    pub covariance: Array2<f64>,
    pub std_errors: Array1<f64>,
    pub warnings: Vec<EstimationWarning>,
}

impl EstimationResult {
    /// `true` when no [`EstimationWarning`] was raised.
    pub fn is_reliable(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Natural-scale estimate and standard error of a named parameter.
    pub fn coefficient(&self, name: &str) -> Option<(f64, f64)> {
        let idx = self.natural.names.iter().position(|n| n == name)?;
        Some((self.natural.values[idx], self.std_errors[idx]))
    }
}

/// Fit `model` to `data` from `start`.
///
/// # Errors
/// - Start-value, data and layout errors (converted from `CLVError`).
/// - Optimizer configuration and backend errors.
pub fn estimate(
    model: &GGomNBDModel, start: &StartValues, data: &CLVData,
) -> OptResult<EstimationResult> {
    model.variant.check_data(data)?;
    let theta0 = model.start_theta(start)?;
    let dim = theta0.len();
    info!(
        "Estimating {} with {dim} parameters on {} customers; layers {:?}",
        model.variant.name(),
        data.len(),
        model.pipeline().layer_names()
    );

    let outcome = maximize(model, theta0, data, &model.options.mle_opts)?;
    let theta_hat = outcome.theta_hat;

    let mut warnings = Vec::new();
    let args = model.differencing_args();
    let cost = |theta: &Theta| -> OptResult<f64> { Ok(model.cost(theta, data, args)?) };
    let hessian = hessian_or_nan(&cost, &theta_hat, &mut warnings);

    let cov_theta = covariance_from_hessian(&hessian);
    let jac = model.layout().jacobian_diag(theta_hat.view());
    let covariance = delta_method(jac.view(), cov_theta.view());
    let std_errors = standard_errors(&covariance);
    let natural = model.variant.backtransform(model.layout(), &theta_hat)?;

    info!(
        "Estimation finished: converged = {}, status = {}, iterations = {}, loglik = {:.6}",
        outcome.converged, outcome.status, outcome.iterations, outcome.value
    );

    Ok(EstimationResult {
        names: model.names(),
        optimization: OptimizationResult {
            theta_hat,
            hessian,
            value: outcome.value,
            converged: outcome.converged,
            status: outcome.status,
            iterations: outcome.iterations,
            fn_evals: outcome.fn_evals,
        },
        natural,
        covariance,
        std_errors,
        warnings,
    })
}

/// Central-difference Hessian of `cost` at `theta_hat`, or an all-`NaN`
/// matrix with the matching warnings when `theta_hat` is not finite or the
/// Hessian cannot be computed.
fn hessian_or_nan<G: Fn(&Theta) -> OptResult<f64>>(
    cost: &G, theta_hat: &Theta, warnings: &mut Vec<EstimationWarning>,
) -> Hessian {
    let dim = theta_hat.len();
    if let Some(index) = theta_hat.iter().position(|v| !v.is_finite()) {
        warn!("Estimation failed: coefficient {index} of the estimate is not finite");
        warnings.push(EstimationWarning::NonFiniteEstimate { index });
        warnings.push(EstimationWarning::HessianUnavailable {
            reason: "non-finite estimate".to_string(),
        });
        return Array2::from_elem((dim, dim), f64::NAN);
    }
    match compute_hessian_nograd(cost, theta_hat) {
        Ok(hess) => hess,
        Err(err) => {
            warn!("Estimation failed: Hessian could not be computed: {err}");
            warnings.push(EstimationWarning::HessianUnavailable { reason: err.to_string() });
            Array2::from_elem((dim, dim), f64::NAN)
        }
    }
}
