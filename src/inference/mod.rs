//! inference — post-estimation uncertainty for fitted models.
//!
//! Purpose
//! -------
//! Convert the Hessian of the negative log-likelihood at the estimate into
//! a covariance matrix and standard errors in optimizer space. Mapping to
//! natural-scale parameters is done by the model layer with
//! `optimization::numerical_stability::delta_method`.
//!
//! Conventions
//! -----------
//! - Pure functions: no logging, no global state.
//! - Unusable Hessians produce `NaN` outputs instead of errors; the model
//!   layer records the failure as a warning.

pub mod hessian;

pub use self::hessian::{covariance_from_hessian, standard_errors};
