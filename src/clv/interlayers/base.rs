//! Base likelihood at the end of the interlayer chain.
//!
//! Resolves a full parameter vector into baseline parameters and
//! per-customer scales for the active model variant, evaluates the
//! likelihood branches and returns the negative-sum objective.
use log::debug;
use ndarray::{Array1, ArrayView1};

use crate::{
    clv::{
        core::{
            covariates::Heterogeneity,
            data::CLVData,
            likelihood::{LLBranches, ggomnbd_branches},
            params::{GGomNBDParams, ParamLayout},
        },
        errors::CLVResult,
        interlayers::pipeline::CONSTRAINT_PENALTY,
        models::variant::ModelVariant,
    },
    optimization::numerical_stability::surrogate_to_cor,
    quadrature::QuadratureOptions,
};

/// Full vector resolved into model quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub params: GGomNBDParams,
    pub het: Heterogeneity,
    /// Correlation `ρ` (already back-transformed), if estimated.
    pub rho: Option<f64>,
}

/// Borrowed view of everything the likelihood needs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct BaseLikelihood<'a> {
    pub data: &'a CLVData,
    pub layout: &'a ParamLayout,
    pub variant: ModelVariant,
    pub quadrature: QuadratureOptions,
}

impl<'a> BaseLikelihood<'a> {
    pub fn new(
        data: &'a CLVData, layout: &'a ParamLayout, variant: ModelVariant,
        quadrature: QuadratureOptions,
    ) -> Self {
        Self { data, layout, variant, quadrature }
    }

    /// Split a full vector and build the per-customer scales.
    ///
    /// # Errors
    /// - `CLVError::DimensionMismatch` if `full` does not match the layout or
    ///   the covariates.
    pub fn resolve(&self, full: ArrayView1<f64>) -> CLVResult<Resolved> {
        let parts = self.layout.split_full(full)?;
        let (params, het) = self.variant.heterogeneity(&parts, self.data)?;
        let rho = parts.cor_surrogate.map(surrogate_to_cor);
        Ok(Resolved { params, het, rho })
    }

    pub fn branches(&self, params: &GGomNBDParams, het: &Heterogeneity) -> CLVResult<LLBranches> {
        ggomnbd_branches(params, het, &self.data.cbs, &self.quadrature)
    }

    /// Per-customer log-likelihoods, ignoring any correlation entry.
    pub fn individual(&self, full: ArrayView1<f64>) -> CLVResult<Array1<f64>> {
        let resolved = self.resolve(full)?;
        Ok(self.branches(&resolved.params, &resolved.het)?.ll)
    }

    /// Negative sum of [`Self::individual`], with non-finite values absorbed.
    pub fn neg_sum(&self, full: ArrayView1<f64>) -> CLVResult<f64> {
        Ok(absorb_non_finite(-self.individual(full)?.sum()))
    }
}

/// Replace a non-finite objective value by [`CONSTRAINT_PENALTY`].
pub fn absorb_non_finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        debug!("Non-finite objective value {value} replaced by penalty");
        CONSTRAINT_PENALTY
    }
}
