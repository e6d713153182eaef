//! Model variants of the GGompertz/NBD family.
//!
//! A [`ModelVariant`] decides how data and parameters are interpreted:
//! which parameters exist ([`ModelVariant::layout`]), how start values map
//! to θ and back, and how per-customer scales are built from a full
//! parameter vector. Expectation and prediction metrics are computed on top
//! of [`ModelVariant::heterogeneity`] in `clv::models::prediction`.
use crate::{
    clv::{
        core::{
            covariates::{Heterogeneity, build_heterogeneity},
            data::CLVData,
            params::{FullParts, GGomNBDParams, NaturalParams, ParamLayout, StartValues},
        },
        errors::{CLVError, CLVResult},
        interlayers::InterlayerConfig,
    },
    optimization::loglik_optimizer::Theta,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    /// Same `alpha` and `beta` for every customer; covariates are ignored.
    NoCovariates,
    /// `alpha_i` and `beta_i` shifted by time-invariant covariates.
    StaticCovariates,
}

impl ModelVariant {
    /// `StaticCovariates` when the data carries covariate columns.
    pub fn for_data(data: &CLVData) -> Self {
        if data.has_covariates() {
            ModelVariant::StaticCovariates
        } else {
            ModelVariant::NoCovariates
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelVariant::NoCovariates => "ggomnbd",
            ModelVariant::StaticCovariates => "ggomnbd_staticcov",
        }
    }

    /// # Errors
    /// - [`CLVError::MissingCovariates`] for `StaticCovariates` without any
    ///   covariate column.
    pub fn check_data(&self, data: &CLVData) -> CLVResult<()> {
        match self {
            ModelVariant::NoCovariates => Ok(()),
            ModelVariant::StaticCovariates if !data.has_covariates() => {
                Err(CLVError::MissingCovariates)
            }
            ModelVariant::StaticCovariates => Ok(()),
        }
    }

    /// Parameter layout for `data` under `config`.
    ///
    /// # Errors
    /// - [`CLVError::UnknownConstraint`] for constraints on a model without
    ///   covariates, or on names missing from either covariate set.
    pub fn layout(&self, data: &CLVData, config: &InterlayerConfig) -> CLVResult<ParamLayout> {
        let constrained = config.constrained_names();
        match self {
            ModelVariant::NoCovariates => {
                if let Some(name) = constrained.first() {
                    return Err(CLVError::UnknownConstraint {
                        name: name.clone(),
                        reason: "the model has no covariates",
                    });
                }
                Ok(ParamLayout::without_covariates(config.correlation))
            }
            ModelVariant::StaticCovariates => ParamLayout::new(
                data.life.names(),
                data.trans.names(),
                constrained,
                config.correlation,
            ),
        }
    }

    pub fn transform(&self, layout: &ParamLayout, start: &StartValues) -> CLVResult<Theta> {
        layout.transform(start)
    }

    pub fn backtransform(&self, layout: &ParamLayout, theta: &Theta) -> CLVResult<NaturalParams> {
        layout.backtransform(theta.view())
    }

    /// Baseline parameters and per-customer scales for a full vector.
    ///
    /// # Errors
    /// - [`CLVError::DimensionMismatch`] if covariates and coefficients do
    ///   not conform.
    pub fn heterogeneity(
        &self, parts: &FullParts<'_>, data: &CLVData,
    ) -> CLVResult<(GGomNBDParams, Heterogeneity)> {
        let params = GGomNBDParams::from_log(parts.log_model)?;
        let het = match self {
            ModelVariant::NoCovariates => {
                Heterogeneity::constant(data.len(), params.alpha, params.beta)
            }
            ModelVariant::StaticCovariates => build_heterogeneity(
                params.alpha,
                params.beta,
                parts.trans,
                parts.life,
                data.trans.view(),
                data.life.view(),
            )?,
        };
        Ok((params, het))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clv::core::{covariates::CovariateMatrix, data::CBSData};
    use ndarray::array;

    fn cov_data() -> CLVData {
        let cbs = CBSData::new(array![1.0, 0.0], array![1.0, 0.0], array![3.0, 3.0]).unwrap();
        let life = CovariateMatrix::new(vec!["g".into()], array![[1.0], [0.0]]).unwrap();
        CLVData::new(cbs, life, CovariateMatrix::empty(2)).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The variant follows the data and rejects inconsistent requests.
    fn variant_checks_data_and_constraints() {
        // Arrange
        let data = cov_data();
        let plain = CLVData::without_covariates(data.cbs.clone());
        let constrained =
            InterlayerConfig { constraints: Some(vec!["g".into()]), ..InterlayerConfig::default() };

        // Act / Assert
        assert_eq!(ModelVariant::for_data(&data), ModelVariant::StaticCovariates);
        assert_eq!(ModelVariant::for_data(&plain), ModelVariant::NoCovariates);
        assert_eq!(
            ModelVariant::StaticCovariates.check_data(&plain),
            Err(CLVError::MissingCovariates)
        );
        assert!(matches!(
            ModelVariant::NoCovariates.layout(&plain, &constrained),
            Err(CLVError::UnknownConstraint { .. })
        ));
        // `g` is not a trans covariate.
        assert!(matches!(
            ModelVariant::StaticCovariates.layout(&data, &constrained),
            Err(CLVError::UnknownConstraint { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The no-covariate variant ignores covariate columns entirely.
    fn nocov_heterogeneity_is_constant() {
        // Arrange
        let data = cov_data();
        let layout = ModelVariant::NoCovariates.layout(&data, &InterlayerConfig::default()).unwrap();
        let full = array![0.0, 2.0f64.ln(), 0.0, 0.0, 3.0f64.ln()];
        let parts = layout.split_full(full.view()).unwrap();

        // Act
        let (params, het) = ModelVariant::NoCovariates.heterogeneity(&parts, &data).unwrap();

        // Assert
        assert!((params.alpha - 2.0).abs() < 1e-14);
        assert_eq!(het.len(), 2);
        assert_eq!(het.beta_i[0], het.beta_i[1]);
    }
}
