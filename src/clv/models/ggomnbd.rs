//! GGompertz/NBD model: interlayer objective wired to the optimizer.
//!
//! [`GGomNBDModel`] owns everything that stays fixed during a fit (variant,
//! options, parameter layout and assembled [`Pipeline`]) and borrows the
//! customer data per call, so it can implement [`LogLikelihood`] with
//! `Data = CLVData`.
//!
//! - `value` evaluates the pipeline with correlation bound checks on.
//! - `grad` is only supplied when correlation is estimated: it central-
//!   differences the pipeline with bound checks off. Otherwise the adapter's
//!   finite differences of the cost are used.
//! - After [`GGomNBDModel::fit`], predictions use the stored estimate.
use ndarray::Array1;

use crate::{
    clv::{
        core::{
            data::CLVData,
            options::EstimationOptions,
            params::{ParamLayout, StartValues},
        },
        errors::{CLVError, CLVResult},
        interlayers::{
            base::BaseLikelihood, config::LayerArgs, correlation::Correlation, pipeline::Pipeline,
        },
        models::{
            estimate::{EstimationResult, estimate},
            prediction::{self, PredictionTable},
            variant::ModelVariant,
        },
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Grad, LogLikelihood, Theta, central_gradient},
    },
};

/// GGompertz/NBD model with optional covariates, regularization,
/// constraints and correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct GGomNBDModel {
    /// Model variant (with or without covariates).
    pub variant: ModelVariant,
    /// Optimizer, interlayer and quadrature settings.
    pub options: EstimationOptions,
    layout: ParamLayout,
    pipeline: Pipeline,
    /// Fit results (populated after `fit`).
    pub results: Option<EstimationResult>,
}

impl GGomNBDModel {
    /// Build a model for `data` under `options`.
    ///
    /// # Errors
    /// - [`CLVError::MissingCovariates`] for a covariate variant on plain data.
    /// - [`CLVError::UnknownConstraint`] for constraints the covariates do
    ///   not support.
    pub fn new(
        variant: ModelVariant, options: EstimationOptions, data: &CLVData,
    ) -> CLVResult<Self> {
        variant.check_data(data)?;
        let layout = variant.layout(data, &options.interlayers)?;
        let pipeline = Pipeline::from_config(&options.interlayers, &layout);
        Ok(Self { variant, options, layout, pipeline, results: None })
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Optimizer-space parameter names.
    pub fn names(&self) -> Vec<String> {
        self.layout.names()
    }

    /// Map start values into optimizer space.
    pub fn start_theta(&self, start: &StartValues) -> CLVResult<Theta> {
        self.variant.transform(&self.layout, start)
    }

    /// Cost `−ℓ(θ) + penalties` of the full interlayer chain.
    ///
    /// # Errors
    /// - [`CLVError::DimensionMismatch`] if `data` does not match the
    ///   covariates the model was built for.
    pub fn cost(&self, theta: &Theta, data: &CLVData, args: LayerArgs) -> CLVResult<f64> {
        self.check_columns(data)?;
        self.pipeline.evaluate(theta.view(), &self.base(data), args)
    }

    /// Per-customer log-likelihoods at θ, in customer order.
    ///
    /// Regularization is not part of these values; the correlated model is
    /// evaluated without its admissibility check.
    pub fn individual_loglik(&self, theta: &Theta, data: &CLVData) -> CLVResult<Array1<f64>> {
        self.layout.check_theta(theta.view())?;
        self.check_columns(data)?;
        let full = self.layout.expand(theta.view());
        let base = self.base(data);
        if self.layout.has_correlation() {
            let ll = Correlation.individual(full.view(), &base, LayerArgs::unchecked())?;
            Ok(ll.unwrap_or_else(|| Array1::from_elem(data.len(), f64::NAN)))
        } else {
            base.individual(full.view())
        }
    }

    /// Fit by maximum likelihood and store the result in `self.results`.
    ///
    /// # Errors
    /// - Invalid start values, data or optimizer configuration.
    /// - Optimizer backend failures.
    pub fn fit(&mut self, start: &StartValues, data: &CLVData) -> OptResult<&EstimationResult> {
        let result = estimate(self, start, data)?;
        Ok(self.results.insert(result))
    }

    /// # Errors
    /// - [`CLVError::ModelNotFitted`] before a successful `fit`.
    pub fn fitted(&self) -> CLVResult<&EstimationResult> {
        self.results.as_ref().ok_or(CLVError::ModelNotFitted)
    }

    /// P(alive) and conditional expected transactions over `horizon` at the
    /// fitted estimate.
    ///
    /// # Errors
    /// - [`CLVError::ModelNotFitted`], [`CLVError::InvalidHorizon`] or shape
    ///   errors for data that does not match the model.
    pub fn predict(&self, data: &CLVData, horizon: f64) -> CLVResult<PredictionTable> {
        let full = self.fitted_full()?;
        self.check_columns(data)?;
        prediction::predict(&self.base(data), full.view(), horizon)
    }

    /// Unconditional expected transactions in `(0, t]` at the fitted
    /// estimate.
    pub fn expectation(&self, data: &CLVData, t: f64) -> CLVResult<Array1<f64>> {
        let full = self.fitted_full()?;
        self.check_columns(data)?;
        prediction::expectation(&self.base(data), full.view(), t)
    }

    /// Layer switches for finite differencing.
    pub(crate) fn differencing_args(&self) -> LayerArgs {
        if self.layout.has_correlation() { LayerArgs::unchecked() } else { LayerArgs::default() }
    }

    // ---- Helper methods ----

    fn base<'a>(&'a self, data: &'a CLVData) -> BaseLikelihood<'a> {
        BaseLikelihood::new(data, &self.layout, self.variant, self.options.quadrature)
    }

    fn fitted_full(&self) -> CLVResult<Array1<f64>> {
        let theta_hat = &self.fitted()?.optimization.theta_hat;
        Ok(self.layout.expand(theta_hat.view()))
    }

    fn check_columns(&self, data: &CLVData) -> CLVResult<()> {
        if self.variant == ModelVariant::NoCovariates {
            return Ok(());
        }
        let pairs = [
            ("life covariates", self.layout.life_names().len(), data.life.n_cols()),
            ("trans covariates", self.layout.trans_names().len(), data.trans.n_cols()),
        ];
        for (what, expected, actual) in pairs {
            if expected != actual {
                return Err(CLVError::DimensionMismatch { what, expected, actual });
            }
        }
        Ok(())
    }
}

impl LogLikelihood for GGomNBDModel {
    type Data = CLVData;

    /// `ℓ(θ)` minus penalties, i.e. the negated pipeline cost.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        Ok(-self.cost(theta, data, LayerArgs::default())?)
    }

    /// Length and finiteness of θ, plus data/variant consistency.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        self.layout.check_theta(theta.view())?;
        self.variant.check_data(data)?;
        self.check_columns(data)?;
        Ok(())
    }

    /// Central differences of the unchecked objective when correlation is
    /// estimated.
    ///
    /// Switching the bound check off keeps the difference stencil away from
    /// the penalty jump at the edge of the admissible region.
    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        if !self.layout.has_correlation() {
            return Err(OptError::GradientNotImplemented);
        }
        let objective =
            |th: &Theta| -> OptResult<f64> { Ok(self.cost(th, data, LayerArgs::unchecked())?) };
        Ok(-central_gradient(theta, &objective)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clv::{
        core::{
            covariates::CovariateMatrix,
            data::CBSData,
            likelihood::{likelihood_individual_nocov, likelihood_individual_staticcov},
            params::GGomNBDParams,
        },
        interlayers::config::InterlayerConfig,
    };
    use ndarray::array;

    fn cbs() -> CBSData {
        CBSData::new(array![0.0, 2.0, 5.0, 1.0], array![0.0, 4.0, 9.0, 1.5], array![
            10.0, 10.0, 10.0, 6.0
        ])
        .unwrap()
    }

    fn cov_data() -> CLVData {
        let life = CovariateMatrix::new(vec!["g".into()], array![[1.0], [0.0], [1.0], [0.0]])
            .unwrap();
        let trans =
            CovariateMatrix::new(vec!["h".into()], array![[0.5], [-0.5], [0.0], [1.0]]).unwrap();
        CLVData::new(cbs(), life, trans).unwrap()
    }

    fn start() -> StartValues {
        StartValues::new(GGomNBDParams::new(0.5, 2.0, 0.1, 1.0, 3.0).unwrap())
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `LogLikelihood` conformance: `check`, `value` and `grad` selection.
    // - Agreement of the model objective with the positional entry points.
    // - Prediction guards before fitting.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `value` equals the sum of the positional per-customer log-likelihoods
    // for both variants.
    fn value_matches_positional_entry_points() {
        // Arrange
        let plain = CLVData::without_covariates(cbs());
        let nocov =
            GGomNBDModel::new(ModelVariant::NoCovariates, EstimationOptions::default(), &plain)
                .unwrap();
        let data = cov_data();
        let staticcov =
            GGomNBDModel::new(ModelVariant::StaticCovariates, EstimationOptions::default(), &data)
                .unwrap();
        let theta0 = nocov.start_theta(&start()).unwrap();
        let theta1 = staticcov
            .start_theta(&start().with_coefficient("life.g", 0.3).with_coefficient("trans.h", -0.2))
            .unwrap();

        // Act
        let v0 = nocov.value(&theta0, &plain).unwrap();
        let v1 = staticcov.value(&theta1, &data).unwrap();

        // Assert
        let ref0 = likelihood_individual_nocov(theta0.view(), &plain.cbs).unwrap().sum();
        let ref1 = likelihood_individual_staticcov(
            theta1.view(),
            &data.cbs,
            data.life.view(),
            data.trans.view(),
        )
        .unwrap()
        .sum();
        assert!((v0 - ref0).abs() < 1e-10);
        assert!((v1 - ref1).abs() < 1e-10);
        assert_eq!(staticcov.names(), vec![
            "log.r",
            "log.alpha",
            "log.b",
            "log.s",
            "log.beta",
            "life.g",
            "trans.h"
        ]);
    }

    #[test]
    // Purpose
    // -------
    // `check` rejects wrong lengths, non-finite θ and mismatched data.
    fn check_rejects_invalid_inputs() {
        // Arrange
        let data = cov_data();
        let model =
            GGomNBDModel::new(ModelVariant::StaticCovariates, EstimationOptions::default(), &data)
                .unwrap();
        let plain = CLVData::without_covariates(cbs());

        // Act / Assert
        assert!(matches!(
            model.check(&Array1::zeros(3), &data),
            Err(OptError::ThetaLengthMismatch { expected: 7, actual: 3 })
        ));
        let mut bad = Array1::zeros(7);
        bad[2] = f64::NAN;
        assert!(matches!(model.check(&bad, &data), Err(OptError::InvalidThetaInput { index: 2, .. })));
        assert!(model.check(&Array1::zeros(7), &plain).is_err());
    }

    #[test]
    // Purpose
    // -------
    // The model gradient is only supplied with correlation; it then matches
    // the negated central difference of the cost.
    fn grad_is_supplied_only_with_correlation() {
        // Arrange
        let data = CLVData::without_covariates(cbs());
        let plain =
            GGomNBDModel::new(ModelVariant::NoCovariates, EstimationOptions::default(), &data)
                .unwrap();
        let options = EstimationOptions::default()
            .with_interlayers(InterlayerConfig { correlation: true, ..InterlayerConfig::default() });
        let correlated = GGomNBDModel::new(ModelVariant::NoCovariates, options, &data).unwrap();
        let theta = correlated.start_theta(&start().with_correlation(0.1)).unwrap();

        // Act
        let missing = plain.grad(&plain.start_theta(&start()).unwrap(), &data);
        let g = correlated.grad(&theta, &data).unwrap();

        // Assert
        assert_eq!(missing, Err(OptError::GradientNotImplemented));
        assert_eq!(g.len(), 6);
        let h = 1e-5;
        let mut plus = theta.clone();
        plus[0] += h;
        let mut minus = theta.clone();
        minus[0] -= h;
        let fd = (correlated.value(&plus, &data).unwrap() - correlated.value(&minus, &data).unwrap())
            / (2.0 * h);
        assert!((g[0] - fd).abs() < 1e-3 * (1.0 + fd.abs()));
    }

    #[test]
    // Purpose
    // -------
    // Predictions require a fitted model.
    fn predict_requires_fit() {
        let data = CLVData::without_covariates(cbs());
        let model =
            GGomNBDModel::new(ModelVariant::NoCovariates, EstimationOptions::default(), &data)
                .unwrap();
        assert_eq!(model.predict(&data, 5.0).unwrap_err(), CLVError::ModelNotFitted);
        assert_eq!(model.expectation(&data, 5.0).unwrap_err(), CLVError::ModelNotFitted);
        assert!(model.fitted().is_err());
    }
}
