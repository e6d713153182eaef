//! The ordered interlayer chain.
//!
//! A [`Pipeline`] is built once from an [`InterlayerConfig`] and always keeps
//! the order
//!
//! ```text
//! regularization → constraints → correlation → base likelihood
//! ```
//!
//! Each stage receives the vector produced by the stage before it:
//! regularization sees the optimizer vector θ, constraints expand θ into the
//! full vector, and correlation (or the base, when correlation is off)
//! evaluates on the full vector. Disabled layers are simply absent.
use ndarray::{Array1, ArrayView1};

use crate::clv::{
    core::params::ParamLayout,
    errors::CLVResult,
    interlayers::{
        base::BaseLikelihood,
        config::{InterlayerConfig, LayerArgs},
        constraints::Constraints,
        correlation::Correlation,
        regularization::Regularization,
    },
};

/// Objective value returned for inadmissible or non-finite evaluations.
pub const CONSTRAINT_PENALTY: f64 = 1e100;

/// One stage of the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Interlayer {
    Regularization(Regularization),
    Constraints(Constraints),
    Correlation(Correlation),
}

impl Interlayer {
    pub fn name(&self) -> &'static str {
        match self {
            Interlayer::Regularization(_) => "regularization",
            Interlayer::Constraints(_) => "constraints",
            Interlayer::Correlation(_) => "correlation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    layers: Vec<Interlayer>,
}

impl Pipeline {
    /// Assemble the enabled layers in their fixed order.
    ///
    /// The layout must have been built from the same configuration.
    pub fn from_config(config: &InterlayerConfig, layout: &ParamLayout) -> Self {
        let mut layers = Vec::with_capacity(3);
        if let Some(lambdas) = config.regularization {
            layers.push(Interlayer::Regularization(Regularization::new(lambdas, layout)));
        }
        if layout.has_constraints() {
            layers.push(Interlayer::Constraints(Constraints::new(layout)));
        }
        if config.correlation {
            layers.push(Interlayer::Correlation(Correlation));
        }
        Pipeline { layers }
    }

    pub fn layers(&self) -> &[Interlayer] {
        &self.layers
    }

    /// Names of the active layers, outermost first.
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(Interlayer::name).collect()
    }

    /// Evaluate the cost `−ℓ(θ) + penalties` through the whole chain.
    ///
    /// Never returns a non-finite value: inadmissible and non-finite points
    /// map to [`CONSTRAINT_PENALTY`] (plus any regularization term).
    ///
    /// # Errors
    /// - Shape errors from the base likelihood.
    pub fn evaluate(
        &self, theta: ArrayView1<f64>, base: &BaseLikelihood<'_>, args: LayerArgs,
    ) -> CLVResult<f64> {
        self.evaluate_from(0, theta.to_owned(), base, args)
    }

    fn evaluate_from(
        &self, depth: usize, params: Array1<f64>, base: &BaseLikelihood<'_>, args: LayerArgs,
    ) -> CLVResult<f64> {
        match self.layers.get(depth) {
            None => base.neg_sum(params.view()),
            Some(Interlayer::Regularization(reg)) => {
                let penalty = reg.penalty(params.view());
                Ok(self.evaluate_from(depth + 1, params, base, args)? + penalty)
            }
            Some(Interlayer::Constraints(constr)) => {
                let full = constr.expand(params.view());
                self.evaluate_from(depth + 1, full, base, args)
            }
            // Correlation always sits directly in front of the base.
            Some(Interlayer::Correlation(cor)) => cor.evaluate(params.view(), base, args),
        }
    }
}
