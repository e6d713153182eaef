//! Errors for integration options.
//!
//! Integration itself never fails; only option construction can be rejected.

/// Result alias for quadrature configuration.
pub type QuadratureResult<T> = Result<T, QuadratureError>;

#[derive(Debug, Clone, PartialEq)]
pub enum QuadratureError {
    /// A tolerance is negative, non-finite, or both tolerances are zero.
    InvalidTolerance { name: &'static str, value: f64, reason: &'static str },

    /// Workspace capacity must hold at least one interval.
    InvalidLimit { limit: usize },
}

impl std::error::Error for QuadratureError {}

impl std::fmt::Display for QuadratureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuadratureError::InvalidTolerance { name, value, reason } => {
                write!(f, "Invalid quadrature tolerance {name} = {value}: {reason}")
            }
            QuadratureError::InvalidLimit { limit } => {
                write!(f, "Invalid quadrature workspace limit {limit}: must be at least 1")
            }
        }
    }
}
