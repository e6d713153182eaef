//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer the CLV models are fitted with: an
//! argmin-backed log-likelihood maximizer, numerically stable transforms, and
//! a single error/result surface. Models implement a log-likelihood, choose
//! tolerances, and get back fitted parameters and diagnostics without
//! touching solver details.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: maximize `ℓ(θ)` with L-BFGS, finite-difference
//!   gradients and cost-only Hessians.
//! - `numerical_stability`: log-sum-exp, the correlation surrogate map and
//!   the delta method.
//! - `errors`: configuration, numerical, backend and model failures as one
//!   enum (`OptError`) with `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers work in an unconstrained θ-space; mapping to model space is
//!   the model layer's job.
//! - Invalid states are reported as `OptError`, never panics.
//!
//! Conventions
//! -----------
//! - We maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing values are
//!   in terms of `ℓ`.
//! - Only `run` logs (initial state when verbose, termination at debug).
//!
//! Testing notes
//! -------------
//! - Submodule unit tests cover local concerns; integration tests exercise
//!   complete estimations.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
