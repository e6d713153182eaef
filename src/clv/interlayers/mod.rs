//! interlayers — composable wrappers around the GGompertz/NBD objective.
//!
//! Purpose
//! -------
//! Turn the base likelihood into the cost the optimizer minimizes by
//! stacking optional layers in a fixed order:
//!
//! 1. [`Regularization`]: ridge penalty on covariate coefficients.
//! 2. [`Constraints`]: tie life and trans coefficients of the same covariate.
//! 3. [`Correlation`]: Sarmanov correlation between purchase and attrition
//!    rates, with an admissibility check.
//! 4. [`BaseLikelihood`]: negative sum of per-customer log-likelihoods.
//!
//! Key behaviors
//! -------------
//! - Layers are toggled only through [`InterlayerConfig`] and assembled once
//!   into a [`Pipeline`].
//! - Per-evaluation switches travel in [`LayerArgs`]; currently the
//!   correlation bound check, which finite differencing disables.
//! - Numerical trouble never surfaces as an error: inadmissible correlations
//!   and non-finite likelihood sums become [`CONSTRAINT_PENALTY`] and are
//!   logged at debug level.
//!
//! Invariants & assumptions
//! ------------------------
//! - The [`ParamLayout`](crate::clv::core::ParamLayout) handed to
//!   [`Pipeline::from_config`] was built from the same configuration.
//! - Regularization sees optimizer space; everything after the constraint
//!   layer sees the full vector.
//!
//! Testing notes
//! -------------
//! - Each layer is tested in isolation; the pipeline tests check ordering,
//!   toggling and that layers compose exactly.

pub mod base;
pub mod config;
pub mod constraints;
pub mod correlation;
pub mod pipeline;
pub mod regularization;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::base::{BaseLikelihood, Resolved, absorb_non_finite};
pub use self::config::{InterlayerConfig, LayerArgs, RegularizationLambdas};
pub use self::constraints::Constraints;
pub use self::correlation::{COMPONENT_SHIFTS, Correlation, SarmanovTerms};
pub use self::pipeline::{CONSTRAINT_PENALTY, Interlayer, Pipeline};
pub use self::regularization::Regularization;

pub mod prelude {
    pub use super::config::{InterlayerConfig, LayerArgs, RegularizationLambdas};
    pub use super::pipeline::{CONSTRAINT_PENALTY, Pipeline};
}
