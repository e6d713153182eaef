//! Constraint layer: equality constraints between life and trans coefficients.
//!
//! The optimizer carries one `constr.<name>` coefficient per constrained
//! covariate; this layer writes it into both the `life.<name>` and
//! `trans.<name>` positions of the full vector handed to the next stage.
use ndarray::{Array1, ArrayView1};

use crate::clv::core::params::ParamLayout;

#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
    layout: ParamLayout,
}

impl Constraints {
    pub fn new(layout: &ParamLayout) -> Self {
        Self { layout: layout.clone() }
    }

    /// Optimizer vector → full vector.
    pub fn expand(&self, theta: ArrayView1<f64>) -> Array1<f64> {
        self.layout.expand(theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // A single tied coefficient fills both blocks; free ones keep their place.
    fn expand_ties_coefficients() {
        // Arrange
        let life = vec!["x".to_string(), "y".to_string()];
        let trans = vec!["y".to_string()];
        let layout = ParamLayout::new(&life, &trans, &["y".to_string()], false).unwrap();
        let layer = Constraints::new(&layout);
        let theta = array![0.1, 0.2, 0.3, 0.4, 0.5, -2.0, 4.0];

        // Act
        let full = layer.expand(theta.view());

        // Assert
        assert_eq!(full.len(), layout.dim() + 1);
        assert_eq!(full, array![0.1, 0.2, 0.3, 0.4, 0.5, -2.0, 4.0, 4.0]);
    }
}
