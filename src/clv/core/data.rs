//! Customer summary data for CLV models.
//!
//! Purpose
//! -------
//! Provide validated containers for the per-customer summary statistics the
//! likelihood is built from (the "customer-by-sufficient-statistic" table)
//! and for the pairing of those statistics with optional covariates.
//!
//! Key behaviors
//! -------------
//! - [`CBSData`] enforces the customer-record invariants once, at the Rust
//!   boundary, so the likelihood and prediction code can rely on them.
//! - [`CLVData`] aligns the customer table with a life and a trans
//!   [`CovariateMatrix`] row-by-row.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least one customer.
//! - `x[i]` is a finite, non-negative integer (stored as `f64`).
//! - `0 ≤ t_x[i] ≤ t_cal[i]`, all finite.
//! - Covariate matrices have exactly one row per customer; a model without
//!   covariates uses zero-column matrices.
//!
//! Conventions
//! -----------
//! - Customer order is positional and preserved by every evaluator; results
//!   are joined back onto customers by index.
//!
//! Testing notes
//! -------------
//! - Unit tests cover each validation branch of [`CBSData::new`] and the row
//!   alignment check in [`CLVData::new`].
use crate::clv::{
    core::covariates::CovariateMatrix,
    errors::{CLVError, CLVResult},
};
use ndarray::Array1;

/// `CBSData` — validated per-customer `(x, t_x, t_cal)` triples.
///
/// Fields
/// ------
/// - `x`: number of repeat transactions.
/// - `t_x`: time of the last transaction, measured from the first.
/// - `t_cal`: length of the calibration period, measured from the first
///   transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CBSData {
    pub x: Array1<f64>,
    pub t_x: Array1<f64>,
    pub t_cal: Array1<f64>,
}

impl CBSData {
    /// Construct validated customer data.
    ///
    /// Errors
    /// ------
    /// - [`CLVError::LengthMismatch`] if the three arrays differ in length.
    /// - [`CLVError::EmptyData`] if there are no customers.
    /// - [`CLVError::NonFiniteData`] for NaN or infinite entries.
    /// - [`CLVError::InvalidTransactionCount`] if `x[i]` is negative or not
    ///   an integer.
    /// - [`CLVError::NegativeTime`] if `t_x[i] < 0` or `t_cal[i] < 0`.
    /// - [`CLVError::TxAfterCalibration`] if `t_x[i] > t_cal[i]`.
    ///
    /// Validation stops at the first offending customer.
    pub fn new(x: Array1<f64>, t_x: Array1<f64>, t_cal: Array1<f64>) -> CLVResult<Self> {
        if x.len() != t_x.len() || x.len() != t_cal.len() {
            return Err(CLVError::LengthMismatch {
                x: x.len(),
                t_x: t_x.len(),
                t_cal: t_cal.len(),
            });
        }
        if x.is_empty() {
            return Err(CLVError::EmptyData);
        }

        for index in 0..x.len() {
            let (xi, txi, ti) = (x[index], t_x[index], t_cal[index]);
            for (field, value) in [("x", xi), ("t_x", txi), ("t_cal", ti)] {
                if !value.is_finite() {
                    return Err(CLVError::NonFiniteData { field, index, value });
                }
            }
            if xi < 0.0 || xi.fract() != 0.0 {
                return Err(CLVError::InvalidTransactionCount { index, value: xi });
            }
            for (field, value) in [("t_x", txi), ("t_cal", ti)] {
                if value < 0.0 {
                    return Err(CLVError::NegativeTime { field, index, value });
                }
            }
            if txi > ti {
                return Err(CLVError::TxAfterCalibration { index, t_x: txi, t_cal: ti });
            }
        }

        Ok(CBSData { x, t_x, t_cal })
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always `false` for validated data; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Largest transaction count across customers.
    pub fn max_x(&self) -> f64 {
        self.x.iter().copied().fold(0.0, f64::max)
    }
}

/// `CLVData` — customer table plus aligned life and trans covariates.
///
/// The life covariates shift the attrition scale `beta`; the trans
/// covariates shift the purchase scale `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct CLVData {
    pub cbs: CBSData,
    pub life: CovariateMatrix,
    pub trans: CovariateMatrix,
}

impl CLVData {
    /// Pair customer data with covariates.
    ///
    /// # Errors
    /// - [`CLVError::DimensionMismatch`] if either covariate matrix does not
    ///   have one row per customer.
    pub fn new(cbs: CBSData, life: CovariateMatrix, trans: CovariateMatrix) -> CLVResult<Self> {
        for (what, cov) in [("life covariate rows", &life), ("trans covariate rows", &trans)] {
            if cov.n_rows() != cbs.len() {
                return Err(CLVError::DimensionMismatch {
                    what,
                    expected: cbs.len(),
                    actual: cov.n_rows(),
                });
            }
        }
        Ok(CLVData { cbs, life, trans })
    }

    /// Customer data without covariates (zero-column matrices).
    pub fn without_covariates(cbs: CBSData) -> Self {
        let n = cbs.len();
        CLVData { cbs, life: CovariateMatrix::empty(n), trans: CovariateMatrix::empty(n) }
    }

    pub fn len(&self) -> usize {
        self.cbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cbs.is_empty()
    }

    /// `true` if at least one covariate column is present.
    pub fn has_covariates(&self) -> bool {
        self.life.n_cols() > 0 || self.trans.n_cols() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Every validation branch of `CBSData::new`.
    // - Row alignment between customers and covariates in `CLVData::new`.
    //
    // They intentionally DO NOT cover:
    // - Covariate naming rules (see `covariates`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Valid customer data is accepted unchanged.
    //
    // Given
    // -----
    // - Three customers including a zero-repeat customer with t_x = 0.
    //
    // Expect
    // ------
    // - `Ok` with the same arrays and `len() == 3`.
    fn cbs_new_accepts_valid_data() {
        // Arrange
        let x = array![0.0, 2.0, 5.0];
        let t_x = array![0.0, 3.5, 10.0];
        let t_cal = array![10.0, 10.0, 10.0];

        // Act
        let cbs = CBSData::new(x.clone(), t_x, t_cal).unwrap();

        // Assert
        assert_eq!(cbs.len(), 3);
        assert!(!cbs.is_empty());
        assert_eq!(cbs.x, x);
        assert_eq!(cbs.max_x(), 5.0);
    }

    #[test]
    // Purpose
    // -------
    // Length and emptiness violations are reported before element checks.
    fn cbs_new_rejects_shape_problems() {
        assert_eq!(
            CBSData::new(array![1.0], array![1.0, 2.0], array![3.0]),
            Err(CLVError::LengthMismatch { x: 1, t_x: 2, t_cal: 1 })
        );
        assert_eq!(
            CBSData::new(Array1::zeros(0), Array1::zeros(0), Array1::zeros(0)),
            Err(CLVError::EmptyData)
        );
    }

    #[test]
    // Purpose
    // -------
    // Each element-level violation maps to its own error variant.
    fn cbs_new_rejects_invalid_elements() {
        assert!(matches!(
            CBSData::new(array![f64::NAN], array![1.0], array![2.0]),
            Err(CLVError::NonFiniteData { field: "x", index: 0, .. })
        ));
        assert!(matches!(
            CBSData::new(array![1.0, 1.5], array![1.0, 1.0], array![2.0, 2.0]),
            Err(CLVError::InvalidTransactionCount { index: 1, .. })
        ));
        assert!(matches!(
            CBSData::new(array![-1.0], array![1.0], array![2.0]),
            Err(CLVError::InvalidTransactionCount { index: 0, .. })
        ));
        assert!(matches!(
            CBSData::new(array![1.0], array![-0.5], array![2.0]),
            Err(CLVError::NegativeTime { field: "t_x", .. })
        ));
        assert!(matches!(
            CBSData::new(array![1.0], array![3.0], array![2.0]),
            Err(CLVError::TxAfterCalibration { index: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Covariates must carry one row per customer.
    //
    // Given
    // -----
    // - Two customers and a three-row life covariate matrix.
    //
    // Expect
    // ------
    // - `DimensionMismatch` naming the life covariates.
    fn clv_data_checks_covariate_rows() {
        // Arrange
        let cbs = CBSData::new(array![1.0, 2.0], array![1.0, 2.0], array![4.0, 4.0]).unwrap();
        let life = CovariateMatrix::new(vec!["gender".into()], Array2::zeros((3, 1))).unwrap();
        let trans = CovariateMatrix::empty(2);

        // Act
        let err = CLVData::new(cbs.clone(), life, trans).unwrap_err();

        // Assert
        assert_eq!(
            err,
            CLVError::DimensionMismatch { what: "life covariate rows", expected: 2, actual: 3 }
        );
        let plain = CLVData::without_covariates(cbs);
        assert!(!plain.has_covariates());
        assert_eq!(plain.len(), 2);
    }
}
