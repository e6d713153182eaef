//! Conversion helpers for the Python bindings.
//!
//! Python inputs (numpy arrays, pandas objects or plain sequences) are
//! copied into owned `ndarray` values and validated by the same
//! constructors Rust callers use, so every invariant of `clv::core` holds
//! once a conversion succeeds.
use std::str::FromStr;

use ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

use crate::{
    clv::{
        core::{
            covariates::CovariateMatrix,
            data::{CBSData, CLVData},
            options::EstimationOptions,
        },
        errors::CLVError,
        interlayers::config::{InterlayerConfig, RegularizationLambdas},
    },
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

/// Borrow or copy a 1-D float64 input as a contiguous numpy array.
///
/// Accepts numpy arrays, objects with `to_numpy()` (pandas) and sequences.
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray_bound(py).readonly())
}

/// Owned copy of a 1-D float64 input.
pub fn extract_vector<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, what: &str,
) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{what} must be a 1-D contiguous float64 array or sequence"))
    })?;
    Ok(Array1::from(slice.to_vec()))
}

/// Owned copy of a 2-D float64 input (rows = customers).
///
/// Accepts numpy arrays, pandas DataFrames and sequences of rows.
pub fn extract_matrix(raw_data: &Bound<'_, PyAny>, what: &str) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(format!("{what} must be a 2-D float64 array or a sequence of rows"))
    })?;
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != n_cols) {
        return Err(PyValueError::new_err(format!("{what} rows must all have the same length")));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .map_err(|e| PyValueError::new_err(format!("{what}: {e}")))
}

/// Validated customer summary from three 1-D inputs.
pub fn extract_cbs_data<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, t_x: &Bound<'py, PyAny>, t_cal: &Bound<'py, PyAny>,
) -> PyResult<CBSData> {
    let x = extract_vector(py, x, "x")?;
    let t_x = extract_vector(py, t_x, "t_x")?;
    let t_cal = extract_vector(py, t_cal, "t_cal")?;
    Ok(CBSData::new(x, t_x, t_cal)?)
}

/// Optional named covariate matrix; `None` gives an empty matrix.
pub fn extract_covariates(
    raw: Option<&Bound<'_, PyAny>>, names: Option<Vec<String>>, n_rows: usize, what: &str,
) -> PyResult<CovariateMatrix> {
    match raw {
        None => Ok(CovariateMatrix::empty(n_rows)),
        Some(raw) => {
            let data = extract_matrix(raw, what)?;
            let names = names.unwrap_or_else(|| {
                (0..data.ncols()).map(|j| format!("{what}{j}")).collect()
            });
            Ok(CovariateMatrix::new(names, data)?)
        }
    }
}

/// Customer data with optional life/trans covariates.
#[allow(clippy::too_many_arguments)]
pub fn extract_clv_data<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, t_x: &Bound<'py, PyAny>, t_cal: &Bound<'py, PyAny>,
    life: Option<&Bound<'py, PyAny>>, life_names: Option<Vec<String>>,
    trans: Option<&Bound<'py, PyAny>>, trans_names: Option<Vec<String>>,
) -> PyResult<CLVData> {
    let cbs = extract_cbs_data(py, x, t_x, t_cal)?;
    let n = cbs.len();
    let life = extract_covariates(life, life_names, n, "life")?;
    let trans = extract_covariates(trans, trans_names, n, "trans")?;
    Ok(CLVData::new(cbs, life, trans)?)
}

/// Optimizer options from keyword arguments.
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    // Tolerances::new -> OptResult<Tolerances> -> CLVError -> PyErr
    let tols = Tolerances::new(tol_grad, tol_cost, max_iter).map_err(CLVError::from)?;

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(CLVError::from)?,
        None => LineSearcher::MoreThuente,
    };

    Ok(MLEOptions::new(tols, ls, lbfgs_mem).map_err(CLVError::from)?)
}

/// Full estimation options from keyword arguments.
#[allow(clippy::too_many_arguments)]
pub fn extract_estimation_options(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, regularization: Option<(f64, f64)>,
    constraints: Option<Vec<String>>, correlation: bool,
) -> PyResult<EstimationOptions> {
    let mle_opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
    let regularization = match regularization {
        Some((life, trans)) => Some(RegularizationLambdas::new(life, trans)?),
        None => None,
    };
    let interlayers = InterlayerConfig { regularization, constraints, correlation };
    Ok(EstimationOptions::default().with_mle_opts(mle_opts).with_interlayers(interlayers))
}
