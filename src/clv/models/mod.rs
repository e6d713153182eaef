//! models — user-facing GGompertz/NBD models, estimation and prediction.
//!
//! Purpose
//! -------
//! Sit on top of `clv::core` and `clv::interlayers` and turn them into a
//! fit-and-forecast API: pick a [`ModelVariant`], build a [`GGomNBDModel`],
//! run [`estimate`] (or `GGomNBDModel::fit`) and query predictions.
//!
//! Key behaviors
//! -------------
//! - [`ModelVariant`] is the capability set of a variant: start value
//!   transforms, back-transforms and per-customer scales.
//! - [`GGomNBDModel`] implements [`LogLikelihood`](crate::optimization::loglik_optimizer::LogLikelihood)
//!   over the interlayer pipeline.
//! - [`estimate`] runs L-BFGS, the numerical Hessian and the delta method,
//!   reporting failures as [`EstimationWarning`]s rather than errors.
//! - [`prediction`] computes P(alive), conditional expected transactions and
//!   unconditional expectations.
//!
//! Invariants & assumptions
//! ------------------------
//! - A model is built for one data layout (covariate columns); evaluating it
//!   on data with different columns is a `DimensionMismatch`.
//! - Forecasts are only available after a successful fit.
//!
//! Testing notes
//! -------------
//! - Unit tests beside each module; end-to-end fits live in
//!   `tests/integration_ggomnbd_pipeline.rs`.

pub mod estimate;
pub mod ggomnbd;
pub mod prediction;
pub mod variant;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::estimate::{EstimationResult, EstimationWarning, OptimizationResult, estimate};
pub use self::ggomnbd::GGomNBDModel;
pub use self::prediction::PredictionTable;
pub use self::variant::ModelVariant;

pub mod prelude {
    pub use super::estimate::{EstimationResult, estimate};
    pub use super::ggomnbd::GGomNBDModel;
    pub use super::prediction::PredictionTable;
    pub use super::variant::ModelVariant;
}
