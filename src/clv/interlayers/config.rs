//! Interlayer configuration.
//!
//! Every layer is switched on by an explicit field; nothing is inferred from
//! the data or from global state.
use crate::clv::errors::{CLVError, CLVResult};

/// Ridge weights for the life and trans covariate coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularizationLambdas {
    life: f64,
    trans: f64,
}

impl RegularizationLambdas {
    /// # Errors
    /// - [`CLVError::InvalidLambda`] unless both weights are finite and ≥ 0.
    pub fn new(life: f64, trans: f64) -> CLVResult<Self> {
        for (name, value) in [("life", life), ("trans", trans)] {
            if !value.is_finite() || value < 0.0 {
                return Err(CLVError::InvalidLambda { name, value });
            }
        }
        Ok(Self { life, trans })
    }

    pub fn life(&self) -> f64 {
        self.life
    }

    pub fn trans(&self) -> f64 {
        self.trans
    }
}

/// Which interlayers wrap the base likelihood.
///
/// - `regularization`: ridge weights, or `None` to disable the layer.
/// - `constraints`: covariate names whose life and trans coefficients are
///   tied together; `None` or an empty list disables the layer.
/// - `correlation`: estimate the correlation between purchase and attrition
///   rates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterlayerConfig {
    pub regularization: Option<RegularizationLambdas>,
    pub constraints: Option<Vec<String>>,
    pub correlation: bool,
}

impl InterlayerConfig {
    /// Constrained names, empty when the layer is off.
    pub fn constrained_names(&self) -> &[String] {
        self.constraints.as_deref().unwrap_or(&[])
    }
}

/// Per-evaluation switches passed down the chain.
///
/// `check_correlation_bounds = false` is used while the optimizer takes
/// finite differences, so points just outside the admissible correlation
/// region are evaluated instead of penalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerArgs {
    pub check_correlation_bounds: bool,
}

impl LayerArgs {
    /// Arguments for finite differencing.
    pub fn unchecked() -> Self {
        Self { check_correlation_bounds: false }
    }
}

impl Default for LayerArgs {
    fn default() -> Self {
        Self { check_correlation_bounds: true }
    }
}
