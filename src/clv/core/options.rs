//! Estimation options — configuration for fitting GGompertz/NBD models.
//!
//! Purpose
//! -------
//! Bundle every knob of a fit in one value: optimizer settings, the
//! interlayer toggles and the quadrature tolerances. Components validate
//! themselves through their own constructors; this type adds no cross-field
//! checks.
//!
//! Conventions
//! -----------
//! - Public fitting APIs accept [`EstimationOptions`] rather than separate
//!   option arguments.
//! - `EstimationOptions::default()` fits the plain model (no regularization,
//!   no constraints, no correlation) with the default optimizer and
//!   quadrature settings.
use crate::{
    clv::interlayers::InterlayerConfig, optimization::loglik_optimizer::MLEOptions,
    quadrature::QuadratureOptions,
};

/// EstimationOptions — fit-time configuration for CLV models.
///
/// Fields
/// ------
/// - `mle_opts`: L-BFGS tolerances, line search and memory.
/// - `interlayers`: explicit toggles for regularization, constraints and
///   correlation.
/// - `quadrature`: tolerances and workspace size of the per-customer
///   integrals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EstimationOptions {
    pub mle_opts: MLEOptions,
    pub interlayers: InterlayerConfig,
    pub quadrature: QuadratureOptions,
}

impl EstimationOptions {
    pub fn new(
        mle_opts: MLEOptions, interlayers: InterlayerConfig, quadrature: QuadratureOptions,
    ) -> Self {
        Self { mle_opts, interlayers, quadrature }
    }

    pub fn with_interlayers(mut self, interlayers: InterlayerConfig) -> Self {
        self.interlayers = interlayers;
        self
    }

    pub fn with_mle_opts(mut self, mle_opts: MLEOptions) -> Self {
        self.mle_opts = mle_opts;
        self
    }
}
