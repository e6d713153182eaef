//! clv — GGompertz/NBD customer-lifetime-value models.
//!
//! Purpose
//! -------
//! Estimate the GGompertz/NBD purchase-and-attrition model from per-customer
//! summaries `(x, t_x, T)`, optionally with static covariates, ridge
//! regularization, coefficient constraints and a Sarmanov correlation
//! between the purchase and attrition rates.
//!
//! Key behaviors
//! -------------
//! - [`core`]: validated data, covariates, parameter layouts and transforms,
//!   and the likelihood evaluator with its positional entry points.
//! - [`interlayers`]: the fixed chain regularization → constraints →
//!   correlation → base likelihood that produces the optimizer cost.
//! - [`models`]: model variants, the [`GGomNBDModel`], the estimation driver
//!   and predictions.
//! - [`errors`]: the [`CLVError`] surface shared by all of the above.
//!
//! Conventions
//! -----------
//! - Optimizer space θ is
//!   `[log.r, log.alpha, log.b, log.s, log.beta, life.*, trans.*, constr.*, cor]`.
//! - Numerical trouble inside an objective evaluation is absorbed into
//!   penalties and logged through `log`; only invalid inputs are errors.
//!
//! Downstream usage
//! ----------------
//! 1. Build [`CBSData`] and, for covariates, two [`CovariateMatrix`] values
//!    combined into [`CLVData`].
//! 2. Configure [`EstimationOptions`] (optimizer, interlayers, quadrature).
//! 3. `GGomNBDModel::new(variant, options, &data)?.fit(&start, &data)?`.
//! 4. Query `predict`, `expectation` and the [`EstimationResult`].

pub mod core;
pub mod errors;
pub mod interlayers;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    CBSData, CLVData, CovariateMatrix, EstimationOptions, GGomNBDParams, NaturalParams,
    ParamLayout, StartValues,
};
pub use self::errors::{CLVError, CLVResult};
pub use self::interlayers::{InterlayerConfig, RegularizationLambdas};
pub use self::models::{
    EstimationResult, EstimationWarning, GGomNBDModel, ModelVariant, PredictionTable, estimate,
};

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::errors::{CLVError, CLVResult};
    pub use super::interlayers::prelude::*;
    pub use super::models::prelude::*;
}
