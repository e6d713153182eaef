//! Regularization layer: ridge penalty on covariate coefficients.
//!
//! The penalty is computed on the optimizer vector, before constraint
//! expansion:
//!
//! ```text
//! λ_life·Σ life² + λ_trans·Σ trans² + (λ_life + λ_trans)·Σ constr²
//! ```
//!
//! A constrained coefficient stands for both its life and trans copy and is
//! therefore weighted with both lambdas. Model parameters and the
//! correlation surrogate are never penalized.
use std::ops::Range;

use ndarray::{ArrayView1, s};

use crate::clv::{core::params::ParamLayout, interlayers::config::RegularizationLambdas};

#[derive(Debug, Clone, PartialEq)]
pub struct Regularization {
    lambdas: RegularizationLambdas,
    life: Range<usize>,
    trans: Range<usize>,
    constr: Range<usize>,
}

impl Regularization {
    pub fn new(lambdas: RegularizationLambdas, layout: &ParamLayout) -> Self {
        Self {
            lambdas,
            life: layout.free_life_range(),
            trans: layout.free_trans_range(),
            constr: layout.constr_range(),
        }
    }

    /// Penalty added to the cost at θ.
    pub fn penalty(&self, theta: ArrayView1<f64>) -> f64 {
        let sq = |range: &Range<usize>| theta.slice(s![range.clone()]).mapv(|v| v * v).sum();
        let (l, t) = (self.lambdas.life(), self.lambdas.trans());
        l * sq(&self.life) + t * sq(&self.trans) + (l + t) * sq(&self.constr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Each coefficient block gets its own weight; model entries are free.
    //
    // Given
    // -----
    // - life = [a, c], trans = [b, c], c constrained, λ_life = 2, λ_trans = 3.
    // - θ coefficients: life.a = 1, trans.b = 2, constr.c = −1.
    //
    // Expect
    // ------
    // - 2·1 + 3·4 + 5·1 = 19, regardless of model entries.
    fn penalty_weights_blocks() {
        // Arrange
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let layout =
            ParamLayout::new(&names(&["a", "c"]), &names(&["b", "c"]), &names(&["c"]), true)
                .unwrap();
        let reg = Regularization::new(RegularizationLambdas::new(2.0, 3.0).unwrap(), &layout);
        let theta = array![5.0, -4.0, 3.0, 2.0, 1.0, 1.0, 2.0, -1.0, 7.0];

        // Act
        let penalty = reg.penalty(theta.view());

        // Assert
        assert_eq!(penalty, 19.0);
    }

    #[test]
    // Purpose
    // -------
    // Zero lambdas give a zero penalty.
    fn zero_lambdas_give_zero_penalty() {
        let layout = ParamLayout::new(&["a".to_string()], &[], &[], false).unwrap();
        let reg = Regularization::new(RegularizationLambdas::new(0.0, 0.0).unwrap(), &layout);
        assert_eq!(reg.penalty(array![1.0, 1.0, 1.0, 1.0, 1.0, 10.0].view()), 0.0);
    }
}
