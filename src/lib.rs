//! rust_clv — GGompertz/NBD customer-lifetime-value estimation with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the likelihood entry points and the estimator to Python via the `_rust_clv`
//! extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules as the public crate surface:
//!   - [`clv`]: data, covariates, parameter transforms, the likelihood
//!     evaluator, the interlayer pipeline, models, estimation and prediction;
//!   - [`quadrature`]: adaptive Gauss–Kronrod integration;
//!   - [`optimization`]: the argmin-backed log-likelihood maximizer and
//!     numerically stable transforms;
//!   - [`inference`]: covariance and standard errors from a Hessian.
//! - With `python-bindings`, define the four positional likelihood functions,
//!   the `GGomNBD` estimator class and the `#[pymodule]` initializer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is implemented in the inner Rust modules; the
//!   binding code performs only FFI glue, input validation and error mapping.
//! - Inputs converted from Python pass through the same validating
//!   constructors as Rust inputs.
//!
//! Conventions
//! -----------
//! - Errors from core Rust code travel as `CLVError` / `OptError` and are
//!   converted to `ValueError` at the PyO3 boundary.
//! - The library never installs a logger; diagnostics go through `log`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_ggomnbd_pipeline.rs`.

pub mod clv;
pub mod inference;
pub mod optimization;
pub mod quadrature;
#[cfg(feature = "python-bindings")]
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    clv::{
        core::{
            data::CLVData,
            likelihood::{
                likelihood_individual_nocov, likelihood_individual_staticcov, likelihood_sum_nocov,
                likelihood_sum_staticcov,
            },
            params::{GGomNBDParams, StartValues},
        },
        errors::CLVError,
        models::{ggomnbd::GGomNBDModel, variant::ModelVariant},
    },
    utils::{extract_cbs_data, extract_clv_data, extract_estimation_options, extract_matrix, extract_vector},
};

/// Per-customer log-likelihoods of the model without covariates.
///
/// `log_params = [ln r, ln alpha, ln b, ln s, ln beta]`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(log_params, x, t_x, t_cal, /)")]
pub fn ggomnbd_nocov_ll_ind<'py>(
    py: Python<'py>, log_params: &Bound<'py, PyAny>, x: &Bound<'py, PyAny>,
    t_x: &Bound<'py, PyAny>, t_cal: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let params = extract_vector(py, log_params, "log_params")?;
    let cbs = extract_cbs_data(py, x, t_x, t_cal)?;
    Ok(likelihood_individual_nocov(params.view(), &cbs)?.into_pyarray_bound(py))
}

/// Negative summed log-likelihood of the model without covariates.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(log_params, x, t_x, t_cal, /)")]
pub fn ggomnbd_nocov_ll_sum<'py>(
    py: Python<'py>, log_params: &Bound<'py, PyAny>, x: &Bound<'py, PyAny>,
    t_x: &Bound<'py, PyAny>, t_cal: &Bound<'py, PyAny>,
) -> PyResult<f64> {
    let params = extract_vector(py, log_params, "log_params")?;
    let cbs = extract_cbs_data(py, x, t_x, t_cal)?;
    Ok(likelihood_sum_nocov(params.view(), &cbs)?)
}

/// Per-customer log-likelihoods with static covariates.
///
/// `params = [ln r, ln alpha, ln b, ln s, ln beta, life coefficients…,
/// trans coefficients…]`; covariate matrices have one row per customer.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(params, x, t_x, t_cal, life_cov, trans_cov, /)")]
pub fn ggomnbd_staticcov_ll_ind<'py>(
    py: Python<'py>, params: &Bound<'py, PyAny>, x: &Bound<'py, PyAny>, t_x: &Bound<'py, PyAny>,
    t_cal: &Bound<'py, PyAny>, life_cov: &Bound<'py, PyAny>, trans_cov: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let params = extract_vector(py, params, "params")?;
    let cbs = extract_cbs_data(py, x, t_x, t_cal)?;
    let life = extract_matrix(life_cov, "life_cov")?;
    let trans = extract_matrix(trans_cov, "trans_cov")?;
    let ll = likelihood_individual_staticcov(params.view(), &cbs, life.view(), trans.view())?;
    Ok(ll.into_pyarray_bound(py))
}

/// Negative summed log-likelihood with static covariates.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(params, x, t_x, t_cal, life_cov, trans_cov, /)")]
pub fn ggomnbd_staticcov_ll_sum<'py>(
    py: Python<'py>, params: &Bound<'py, PyAny>, x: &Bound<'py, PyAny>, t_x: &Bound<'py, PyAny>,
    t_cal: &Bound<'py, PyAny>, life_cov: &Bound<'py, PyAny>, trans_cov: &Bound<'py, PyAny>,
) -> PyResult<f64> {
    let params = extract_vector(py, params, "params")?;
    let cbs = extract_cbs_data(py, x, t_x, t_cal)?;
    let life = extract_matrix(life_cov, "life_cov")?;
    let trans = extract_matrix(trans_cov, "trans_cov")?;
    Ok(likelihood_sum_staticcov(params.view(), &cbs, life.view(), trans.view())?)
}

/// GGomNBD — Python-facing estimator for GGompertz/NBD models.
///
/// Purpose
/// -------
/// Expose [`GGomNBDModel`] to Python: configure once, `fit` on customer
/// summaries (with optional covariates), then query estimates, standard
/// errors and forecasts.
///
/// Key behaviors
/// -------------
/// - The constructor only validates options; the model layout is built in
///   `fit` from the supplied covariates.
/// - The fitted data is kept so `predict` and `expectation` need only a
///   horizon.
///
/// Notes
/// -----
/// - Native Rust callers should use [`GGomNBDModel`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_clv.clv", unsendable)]
pub struct GGomNBD {
    options: crate::clv::core::options::EstimationOptions,
    model: Option<GGomNBDModel>,
    data: Option<CLVData>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl GGomNBD {
    #[new]
    #[pyo3(
        signature = (
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            regularization = None,
            constraints = None,
            correlation = false,
        ),
        text_signature = "(tol_grad=1e-6, tol_cost=None, max_iter=300, line_searcher='MoreThuente', \
                          lbfgs_mem=None, regularization=None, constraints=None, correlation=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<String>, lbfgs_mem: Option<usize>,
        regularization: Option<(f64, f64)>, constraints: Option<Vec<String>>, correlation: bool,
    ) -> PyResult<Self> {
        let (tol_grad, max_iter) = match (tol_grad, tol_cost, max_iter) {
            (None, None, None) => (Some(1e-6), Some(300)),
            _ => (tol_grad, max_iter),
        };
        let options = extract_estimation_options(
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher.as_deref(),
            lbfgs_mem,
            regularization,
            constraints,
            correlation,
        )?;
        Ok(GGomNBD { options, model: None, data: None })
    }

    #[pyo3(
        signature = (
            x,
            t_x,
            t_cal,
            start = (1.0, 1.0, 1.0, 1.0, 1.0),
            life = None,
            life_names = None,
            trans = None,
            trans_names = None,
            start_coefficients = None,
            start_correlation = None,
        ),
        text_signature = "(self, x, t_x, t_cal, /, start=(1, 1, 1, 1, 1), life=None, \
                          life_names=None, trans=None, trans_names=None, \
                          start_coefficients=None, start_correlation=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, x: &Bound<'py, PyAny>, t_x: &Bound<'py, PyAny>,
        t_cal: &Bound<'py, PyAny>, start: (f64, f64, f64, f64, f64),
        life: Option<&Bound<'py, PyAny>>, life_names: Option<Vec<String>>,
        trans: Option<&Bound<'py, PyAny>>, trans_names: Option<Vec<String>>,
        start_coefficients: Option<Vec<(String, f64)>>, start_correlation: Option<f64>,
    ) -> PyResult<()> {
        let data = extract_clv_data(py, x, t_x, t_cal, life, life_names, trans, trans_names)?;
        let (r, alpha, b, s, beta) = start;
        let mut start_values = StartValues::new(GGomNBDParams::new(r, alpha, b, s, beta)?);
        start_values.coefficients = start_coefficients.unwrap_or_default();
        start_values.correlation = start_correlation;

        let mut model =
            GGomNBDModel::new(ModelVariant::for_data(&data), self.options.clone(), &data)?;
        model.fit(&start_values, &data).map_err(CLVError::from)?;
        self.model = Some(model);
        self.data = Some(data);
        Ok(())
    }

    /// P(alive) and conditional expected transactions over `horizon`.
    pub fn predict<'py>(
        &self, py: Python<'py>, horizon: f64,
    ) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
        let (model, data) = self.fitted()?;
        let table = model.predict(data, horizon)?;
        Ok((table.palive.into_pyarray_bound(py), table.cet.into_pyarray_bound(py)))
    }

    /// Unconditional expected transactions in `(0, t]`.
    pub fn expectation<'py>(&self, py: Python<'py>, t: f64) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let (model, data) = self.fitted()?;
        Ok(model.expectation(data, t)?.into_pyarray_bound(py))
    }

    #[getter]
    pub fn names(&self) -> PyResult<Vec<String>> {
        Ok(self.result()?.natural.names.clone())
    }

    #[getter]
    pub fn estimates(&self) -> PyResult<Vec<f64>> {
        Ok(self.result()?.natural.values.to_vec())
    }

    #[getter]
    pub fn std_errors(&self) -> PyResult<Vec<f64>> {
        Ok(self.result()?.std_errors.to_vec())
    }

    #[getter]
    pub fn loglik(&self) -> PyResult<f64> {
        Ok(self.result()?.optimization.value)
    }

    #[getter]
    pub fn converged(&self) -> PyResult<bool> {
        Ok(self.result()?.optimization.converged)
    }

    #[getter]
    pub fn theta_hat(&self) -> PyResult<Vec<f64>> {
        Ok(self.result()?.optimization.theta_hat.to_vec())
    }

    #[getter]
    pub fn hessian(&self) -> PyResult<Vec<Vec<f64>>> {
        let hess = &self.result()?.optimization.hessian;
        Ok(hess.rows().into_iter().map(|row| row.to_vec()).collect())
    }

    /// `True` when the fit raised no estimation warning.
    #[getter]
    pub fn reliable(&self) -> PyResult<bool> {
        Ok(self.result()?.is_reliable())
    }

    #[getter]
    pub fn warnings(&self) -> PyResult<Vec<String>> {
        Ok(self.result()?.warnings.iter().map(ToString::to_string).collect())
    }
}

#[cfg(feature = "python-bindings")]
impl GGomNBD {
    fn fitted(&self) -> PyResult<(&GGomNBDModel, &CLVData)> {
        match (&self.model, &self.data) {
            (Some(model), Some(data)) => Ok((model, data)),
            _ => Err(CLVError::ModelNotFitted.into()),
        }
    }

    fn result(&self) -> PyResult<&crate::clv::models::estimate::EstimationResult> {
        let (model, _) = self.fitted()?;
        Ok(model.fitted()?)
    }
}

/// _rust_clv — PyO3 module initializer for the Python extension.
///
/// Registers the `clv` submodule (likelihood functions and the `GGomNBD`
/// class) and adds it to `sys.modules` so dotted imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_clv<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let clv_mod = PyModule::new_bound(_py, "clv")?;
    clv_models(_py, m, &clv_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import_bound("sys")?.getattr("modules")?.set_item("rust_clv.clv", &clv_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn clv_models<'py>(
    _py: Python, rust_clv: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ggomnbd_nocov_ll_ind, m)?)?;
    m.add_function(wrap_pyfunction!(ggomnbd_nocov_ll_sum, m)?)?;
    m.add_function(wrap_pyfunction!(ggomnbd_staticcov_ll_ind, m)?)?;
    m.add_function(wrap_pyfunction!(ggomnbd_staticcov_ll_sum, m)?)?;
    m.add_class::<GGomNBD>()?;
    rust_clv.add_submodule(m)?;
    Ok(())
}
