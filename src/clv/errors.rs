//! Errors for the CLV model family.
//!
//! [`CLVError`] covers data validation, covariate handling, parameter
//! transforms, interlayer configuration and model state. Numerical trouble
//! during an objective evaluation is *not* an error here: it is absorbed into
//! penalty values or logged (see `clv::interlayers`).
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::{optimization::errors::OptError, quadrature::QuadratureError};

pub type CLVResult<T> = Result<T, CLVError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CLVError {
    // ---- Customer data ----
    /// No customers were supplied.
    EmptyData,

    /// `x`, `t_x` and `t_cal` must have the same length.
    LengthMismatch { x: usize, t_x: usize, t_cal: usize },

    /// An input value is NaN or infinite.
    NonFiniteData { field: &'static str, index: usize, value: f64 },

    /// Repeat-transaction counts must be non-negative integers.
    InvalidTransactionCount { index: usize, value: f64 },

    /// Times must be non-negative.
    NegativeTime { field: &'static str, index: usize, value: f64 },

    /// The last transaction cannot lie after the end of calibration.
    TxAfterCalibration { index: usize, t_x: f64, t_cal: f64 },

    // ---- Covariates / dimensions ----
    /// Shapes of covariates, coefficients or parameter vectors disagree.
    DimensionMismatch { what: &'static str, expected: usize, actual: usize },

    /// Covariate names must be unique within a matrix.
    DuplicateCovariate { name: String },

    /// The covariate variant needs at least one covariate column.
    MissingCovariates,

    // ---- Parameters ----
    /// A baseline model parameter is not finite and strictly positive.
    InvalidStartParameter { name: String, value: f64 },

    /// A start value was given for a parameter the layout does not contain.
    UnknownParameter { name: String },

    /// Optimizer vector length does not match the layout.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Optimizer vector entries must be finite.
    InvalidThetaInput { index: usize, value: f64 },

    /// Correlation must lie strictly inside (−1, 1).
    InvalidCorrelation { value: f64 },

    // ---- Interlayers ----
    /// A constrained covariate must exist in both life and trans covariates.
    UnknownConstraint { name: String, reason: &'static str },

    /// Regularization weights must be finite and non-negative.
    InvalidLambda { name: &'static str, value: f64 },

    // ---- Prediction ----
    /// Prediction horizons and expectation times must be finite and ≥ 0.
    InvalidHorizon { value: f64 },

    /// Predictions need a fitted model.
    ModelNotFitted,

    // ---- Wrapped ----
    Quadrature(QuadratureError),

    /// The optimizer failed; the message carries the `OptError`.
    OptimizationFailed { text: String },
}

impl std::error::Error for CLVError {}

impl std::fmt::Display for CLVError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Customer data ----
            CLVError::EmptyData => write!(f, "Customer data must contain at least one customer"),
            CLVError::LengthMismatch { x, t_x, t_cal } => write!(
                f,
                "Customer data length mismatch: x has {x}, t_x has {t_x}, t_cal has {t_cal} entries"
            ),
            CLVError::NonFiniteData { field, index, value } => {
                write!(f, "Non-finite value {value} in {field} at index {index}")
            }
            CLVError::InvalidTransactionCount { index, value } => write!(
                f,
                "Invalid transaction count {value} at index {index}: must be a non-negative integer"
            ),
            CLVError::NegativeTime { field, index, value } => {
                write!(f, "Negative time {value} in {field} at index {index}")
            }
            CLVError::TxAfterCalibration { index, t_x, t_cal } => write!(
                f,
                "Customer {index}: last transaction at {t_x} lies after calibration end {t_cal}"
            ),

            // ---- Covariates / dimensions ----
            CLVError::DimensionMismatch { what, expected, actual } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, actual {actual}")
            }
            CLVError::DuplicateCovariate { name } => {
                write!(f, "Covariate name '{name}' appears more than once")
            }
            CLVError::MissingCovariates => {
                write!(f, "The static covariate model needs at least one covariate")
            }

            // ---- Parameters ----
            CLVError::InvalidStartParameter { name, value } => {
                write!(f, "Invalid start parameter {name} = {value}: must be finite and > 0")
            }
            CLVError::UnknownParameter { name } => {
                write!(f, "Unknown parameter '{name}'")
            }
            CLVError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            CLVError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }
            CLVError::InvalidCorrelation { value } => {
                write!(f, "Invalid correlation {value}: must lie strictly inside (-1, 1)")
            }

            // ---- Interlayers ----
            CLVError::UnknownConstraint { name, reason } => {
                write!(f, "Invalid constraint '{name}': {reason}")
            }
            CLVError::InvalidLambda { name, value } => {
                write!(f, "Invalid regularization weight {name} = {value}: must be finite and >= 0")
            }

            // ---- Prediction ----
            CLVError::InvalidHorizon { value } => {
                write!(f, "Invalid prediction horizon {value}: must be finite and >= 0")
            }
            CLVError::ModelNotFitted => write!(f, "Model has not been fitted"),

            // ---- Wrapped ----
            CLVError::Quadrature(err) => write!(f, "Quadrature: {err}"),
            CLVError::OptimizationFailed { text } => write!(f, "Optimization failed: {text}"),
        }
    }
}

impl From<QuadratureError> for CLVError {
    fn from(err: QuadratureError) -> Self {
        CLVError::Quadrature(err)
    }
}

impl From<OptError> for CLVError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::InvalidStartParameter { name, value } => {
                CLVError::InvalidStartParameter { name, value }
            }
            other => CLVError::OptimizationFailed { text: other.to_string() },
        }
    }
}

/// Surface model errors as Python `ValueError`s.
#[cfg(feature = "python-bindings")]
impl std::convert::From<CLVError> for PyErr {
    fn from(err: CLVError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
