//! core — customer data, covariates, parameters and the likelihood.
//!
//! Purpose
//! -------
//! Collect the building blocks of the GGompertz/NBD model: validated
//! customer summaries, covariate matrices and per-customer heterogeneity,
//! the parameter layout with its transforms, the likelihood evaluator and
//! the estimation options. The interlayer pipeline and the model driver are
//! built on top of these pieces.
//!
//! Invariants & assumptions
//! ------------------------
//! - Data is validated once at construction ([`CBSData::new`],
//!   [`CovariateMatrix::new`], [`CLVData::new`]); evaluators rely on it.
//! - Evaluators are pure: no shared mutable state, no I/O besides advisory
//!   `log` warnings.
//!
//! Conventions
//! -----------
//! - Customer order is positional everywhere.
//! - Model parameters travel on the log scale inside optimizer vectors.

pub mod covariates;
pub mod data;
pub mod likelihood;
pub mod options;
pub mod params;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::covariates::{CovariateMatrix, Heterogeneity, build_heterogeneity};
pub use self::data::{CBSData, CLVData};
pub use self::likelihood::{
    LLBranches, ggomnbd_branches, likelihood_individual_nocov, likelihood_individual_staticcov,
    likelihood_sum_nocov, likelihood_sum_staticcov,
};
pub use self::options::EstimationOptions;
pub use self::params::{
    FullParts, GGomNBDParams, MODEL_PARAM_NAMES, N_MODEL_PARAMS, NaturalParams, ParamLayout,
    StartValues,
};

pub mod prelude {
    pub use super::covariates::{CovariateMatrix, Heterogeneity};
    pub use super::data::{CBSData, CLVData};
    pub use super::likelihood::{
        likelihood_individual_nocov, likelihood_individual_staticcov, likelihood_sum_nocov,
        likelihood_sum_staticcov,
    };
    pub use super::options::EstimationOptions;
    pub use super::params::{GGomNBDParams, NaturalParams, ParamLayout, StartValues};
}
