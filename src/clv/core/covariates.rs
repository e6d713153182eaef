//! Static covariates and per-customer heterogeneity.
//!
//! Purpose
//! -------
//! Hold named covariate matrices and turn baseline scale parameters plus
//! covariate coefficients into per-customer scales:
//!
//! ```text
//! alpha_i = alpha0 · exp(−trans_i · γ_trans)
//! beta_i  = beta0  · exp(−life_i  · γ_life)
//! ```
//!
//! Invariants & assumptions
//! ------------------------
//! - Column names are unique and column order is significant: coefficients
//!   are matched to columns by position.
//! - Only dimensional conformance is checked here. Positivity of `alpha0`
//!   and `beta0` comes from the log parameterization upstream; overflow of
//!   the exponent yields `0` or `inf` scales, which the likelihood treats as
//!   an invalid region rather than an error.
use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::clv::errors::{CLVError, CLVResult};

/// `CovariateMatrix` — one row per customer, one named column per covariate.
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateMatrix {
    names: Vec<String>,
    data: Array2<f64>,
}

impl CovariateMatrix {
    /// Construct a validated covariate matrix.
    ///
    /// # Errors
    /// - [`CLVError::DimensionMismatch`] if `names.len()` differs from the
    ///   column count.
    /// - [`CLVError::DuplicateCovariate`] for repeated names.
    /// - [`CLVError::NonFiniteData`] for NaN or infinite entries (the index is
    ///   the row).
    pub fn new(names: Vec<String>, data: Array2<f64>) -> CLVResult<Self> {
        if names.len() != data.ncols() {
            return Err(CLVError::DimensionMismatch {
                what: "covariate names",
                expected: data.ncols(),
                actual: names.len(),
            });
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(CLVError::DuplicateCovariate { name: name.clone() });
            }
        }
        for ((row, _), &value) in data.indexed_iter() {
            if !value.is_finite() {
                return Err(CLVError::NonFiniteData { field: "covariates", index: row, value });
            }
        }
        Ok(CovariateMatrix { names, data })
    }

    /// Zero-column matrix for `n_rows` customers.
    pub fn empty(n_rows: usize) -> Self {
        CovariateMatrix { names: Vec::new(), data: Array2::zeros((n_rows, 0)) }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }
}

/// Per-customer purchase (`alpha_i`) and attrition (`beta_i`) scales.
#[derive(Debug, Clone, PartialEq)]
pub struct Heterogeneity {
    pub alpha_i: Array1<f64>,
    pub beta_i: Array1<f64>,
}

impl Heterogeneity {
    /// Same scales for all `n` customers.
    pub fn constant(n: usize, alpha0: f64, beta0: f64) -> Self {
        Heterogeneity { alpha_i: Array1::from_elem(n, alpha0), beta_i: Array1::from_elem(n, beta0) }
    }

    /// Scales shifted by constants, as used by the correlation components
    /// (`alpha_i + d_alpha`, `beta_i + d_beta`).
    pub fn shifted(&self, d_alpha: f64, d_beta: f64) -> Self {
        Heterogeneity { alpha_i: &self.alpha_i + d_alpha, beta_i: &self.beta_i + d_beta }
    }

    pub fn len(&self) -> usize {
        self.alpha_i.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha_i.is_empty()
    }
}

/// Build per-customer scales from baseline values and static covariates.
///
/// Covariate matrices must have the same number of rows; a zero-column
/// matrix leaves the corresponding scale constant.
///
/// # Errors
/// - [`CLVError::DimensionMismatch`] if a coefficient vector length differs
///   from its matrix's column count, or the row counts disagree.
pub fn build_heterogeneity(
    alpha0: f64, beta0: f64, trans_coeffs: ArrayView1<f64>, life_coeffs: ArrayView1<f64>,
    trans_cov: ArrayView2<f64>, life_cov: ArrayView2<f64>,
) -> CLVResult<Heterogeneity> {
    if trans_cov.ncols() != trans_coeffs.len() {
        return Err(CLVError::DimensionMismatch {
            what: "trans coefficients",
            expected: trans_cov.ncols(),
            actual: trans_coeffs.len(),
        });
    }
    if life_cov.ncols() != life_coeffs.len() {
        return Err(CLVError::DimensionMismatch {
            what: "life coefficients",
            expected: life_cov.ncols(),
            actual: life_coeffs.len(),
        });
    }
    if trans_cov.nrows() != life_cov.nrows() {
        return Err(CLVError::DimensionMismatch {
            what: "covariate rows",
            expected: life_cov.nrows(),
            actual: trans_cov.nrows(),
        });
    }

    Ok(Heterogeneity {
        alpha_i: scale_by_covariates(alpha0, trans_coeffs, trans_cov),
        beta_i: scale_by_covariates(beta0, life_coeffs, life_cov),
    })
}

fn scale_by_covariates(base: f64, coeffs: ArrayView1<f64>, cov: ArrayView2<f64>) -> Array1<f64> {
    if cov.ncols() == 0 {
        return Array1::from_elem(cov.nrows(), base);
    }
    cov.dot(&coeffs).mapv(|eta| base * (-eta).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Covariate matrices reject mismatched names, duplicates and NaNs.
    fn covariate_matrix_validation() {
        assert!(matches!(
            CovariateMatrix::new(vec!["a".into()], Array2::zeros((2, 2))),
            Err(CLVError::DimensionMismatch { what: "covariate names", .. })
        ));
        assert_eq!(
            CovariateMatrix::new(vec!["a".into(), "a".into()], Array2::zeros((2, 2))),
            Err(CLVError::DuplicateCovariate { name: "a".into() })
        );
        assert!(matches!(
            CovariateMatrix::new(vec!["a".into()], array![[1.0], [f64::INFINITY]]),
            Err(CLVError::NonFiniteData { index: 1, .. })
        ));
        let ok = CovariateMatrix::new(vec!["a".into(), "b".into()], array![[1.0, 2.0]]).unwrap();
        assert_eq!(ok.names(), ["a".to_string(), "b".to_string()]);
        assert_eq!((ok.n_rows(), ok.n_cols()), (1, 2));
    }

    #[test]
    // Purpose
    // -------
    // Without covariate columns the scales are the baseline constants.
    fn build_heterogeneity_without_covariates_is_constant() {
        // Arrange
        let empty = CovariateMatrix::empty(3);
        let none = Array1::<f64>::zeros(0);

        // Act
        let het =
            build_heterogeneity(2.0, 5.0, none.view(), none.view(), empty.view(), empty.view())
                .unwrap();

        // Assert
        assert_eq!(het, Heterogeneity::constant(3, 2.0, 5.0));
    }

    #[test]
    // Purpose
    // -------
    // Scales follow `base · exp(−X γ)` row by row.
    //
    // Given
    // -----
    // - Two customers, one trans covariate with γ = 0.5 and two life
    //   covariates with γ = (1, −1).
    //
    // Expect
    // ------
    // - alpha_i = 2·exp(−0.5·z_i), beta_i = 3·exp(−(w1 − w2)).
    fn build_heterogeneity_applies_linear_predictor() {
        // Arrange
        let trans = array![[1.0], [0.0]];
        let life = array![[1.0, 0.0], [0.5, 2.0]];
        let g_trans = array![0.5];
        let g_life = array![1.0, -1.0];

        // Act
        let het = build_heterogeneity(
            2.0,
            3.0,
            g_trans.view(),
            g_life.view(),
            trans.view(),
            life.view(),
        )
        .unwrap();

        // Assert
        assert!((het.alpha_i[0] - 2.0 * (-0.5f64).exp()).abs() < 1e-14);
        assert!((het.alpha_i[1] - 2.0).abs() < 1e-14);
        assert!((het.beta_i[0] - 3.0 * (-1.0f64).exp()).abs() < 1e-14);
        assert!((het.beta_i[1] - 3.0 * (1.5f64).exp()).abs() < 1e-14);
    }

    #[test]
    // Purpose
    // -------
    // Coefficient counts must match covariate columns.
    fn build_heterogeneity_rejects_wrong_coefficient_count() {
        let cov = array![[1.0, 2.0]];
        let one = array![0.1];
        let err =
            build_heterogeneity(1.0, 1.0, one.view(), one.view(), cov.view(), cov.view())
                .unwrap_err();
        assert_eq!(
            err,
            CLVError::DimensionMismatch { what: "trans coefficients", expected: 2, actual: 1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Shifting adds constants to both scales.
    fn heterogeneity_shifted_adds_offsets() {
        let het = Heterogeneity::constant(2, 1.0, 2.0).shifted(1.0, 0.0);
        assert_eq!(het.alpha_i, array![2.0, 2.0]);
        assert_eq!(het.beta_i, array![2.0, 2.0]);
    }
}
