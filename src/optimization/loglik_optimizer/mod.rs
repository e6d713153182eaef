//! loglik_optimizer — argmin-powered log-likelihood maximizer.
//!
//! Purpose
//! -------
//! Fit a model by **maximizing** its log-likelihood `ℓ(θ)`. Models implement
//! [`LogLikelihood`] and call [`maximize`], which runs L-BFGS with a
//! configurable line search, tolerances, and finite-difference fallbacks.
//! The optimizer itself is treated as a black box by the CLV layer.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost
//!   `c(θ) = -ℓ(θ)` and supplies finite-difference gradients when the model
//!   has none.
//! - [`maximize`] validates the start via [`LogLikelihood::check`], builds
//!   the solver ([`builders`]), runs it ([`run::run_lbfgs`]) and returns an
//!   [`OptimOutcome`].
//! - [`finite_diff`] provides central gradients of fallible costs and a
//!   cost-only Hessian for post-estimation inference.
//!
//! Invariants & assumptions
//! ------------------------
//! - `value` must return a finite number for every θ the solver may evaluate;
//!   models absorb invalid regions into finite penalties.
//! - Options are validated on construction ([`Tolerances::new`],
//!   [`MLEOptions::new`]).
//!
//! Conventions
//! -----------
//! - [`OptimOutcome::value`] is the log-likelihood, not the cost.
//! - Gradients from [`LogLikelihood::grad`] are `∇ℓ(θ)`; the adapter negates.
//!
//! Downstream usage
//! ----------------
//! - `clv::models::GGomNBDModel` implements [`LogLikelihood`] and
//!   `clv::models::estimate` wraps [`maximize`] plus the Hessian step.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule; the end-to-end path is covered by
//!   the estimation integration tests.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::finite_diff::{central_gradient, compute_hessian_nograd};
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Hessian, Theta};
}
