//! Integration tests for the GGompertz/NBD likelihood, estimation and
//! prediction pipeline.
//!
//! Purpose
//! -------
//! - Validate the path from validated customer summaries, through the
//!   likelihood entry points and the interlayer pipeline, to a fitted model
//!   with a Hessian, natural-scale estimates and forecasts.
//! - Cross-check the likelihood against an independent Simpson-rule
//!   evaluation of the closed form plus integral.
//!
//! Coverage
//! --------
//! - `clv::core::likelihood`: sum/individual consistency, covariate-free
//!   equivalence at zero coefficients, ordering, identical customers,
//!   monotonicity in the transaction count and a numeric reference value.
//! - `clv::core::params`: start-value transform and backtransform.
//! - `clv::interlayers`: regularization and constraint layers seen through
//!   `GGomNBDModel::cost`, and finiteness of the cost in extreme regions.
//! - `clv::models`: a short fit, then `predict` and `expectation`.
//!
//! Exclusions
//! ----------
//! - Quadrature internals and optimizer configuration errors are covered by
//!   unit tests.
//! - Python bindings are exercised from the Python side.
use ndarray::{Array1, Array2, array};
use rust_clv::{
    clv::{
        core::{
            covariates::CovariateMatrix,
            data::{CBSData, CLVData},
            likelihood::{
                likelihood_individual_nocov, likelihood_individual_staticcov, likelihood_sum_nocov,
                likelihood_sum_staticcov,
            },
            options::EstimationOptions,
            params::{GGomNBDParams, StartValues},
        },
        interlayers::{InterlayerConfig, RegularizationLambdas},
        models::{ggomnbd::GGomNBDModel, variant::ModelVariant},
    },
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

/// Log of `[r, alpha, b, s, beta]`.
fn log_params(r: f64, alpha: f64, b: f64, s: f64, beta: f64) -> Array1<f64> {
    array![r.ln(), alpha.ln(), b.ln(), s.ln(), beta.ln()]
}

/// Six customers with a mix of zero and repeat buyers.
fn small_cbs() -> CBSData {
    CBSData::new(
        array![0.0, 1.0, 4.0, 2.0, 7.0, 0.0],
        array![0.0, 3.5, 9.0, 6.0, 11.5, 0.0],
        array![12.0, 12.0, 10.0, 8.0, 12.0, 9.0],
    )
    .unwrap()
}

/// One life and one trans covariate column for [`small_cbs`].
fn small_covariates() -> (Array2<f64>, Array2<f64>) {
    let life = array![[0.2], [-1.0], [0.5], [1.3], [0.0], [-0.4]];
    let trans = array![[1.0], [0.0], [-0.7], [0.3], [0.9], [-1.1]];
    (life, trans)
}

/// Data with a shared covariate `z` on both processes.
fn shared_covariate_data() -> CLVData {
    let (life, trans) = small_covariates();
    CLVData::new(
        small_cbs(),
        CovariateMatrix::new(vec!["z".into()], life).unwrap(),
        CovariateMatrix::new(vec!["z".into()], trans).unwrap(),
    )
    .unwrap()
}

/// Composite Simpson rule on `[a, b]` with `n` (even) intervals.
fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let mut acc = f(a) + f(b);
    for k in 1..n {
        let w = if k % 2 == 1 { 4.0 } else { 2.0 };
        acc += w * f(a + k as f64 * h);
    }
    acc * h / 3.0
}

/// Route `log` output through the test harness; repeated calls are no-ops.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn short_options(max_iter: usize) -> EstimationOptions {
    let tols = Tolerances::new(Some(1e-4), None, Some(max_iter)).unwrap();
    EstimationOptions::default()
        .with_mle_opts(MLEOptions::new(tols, LineSearcher::MoreThuente, None).unwrap())
}

/// Forty customers with an uneven purchase pattern.
fn fit_data() -> CLVData {
    let n = 40;
    let x = Array1::from_shape_fn(n, |i| ((i * 7) % 5) as f64);
    let t_cal = Array1::from_shape_fn(n, |i| 10.0 + (i % 4) as f64);
    let t_x = Array1::from_shape_fn(n, |i| {
        if x[i] == 0.0 { 0.0 } else { t_cal[i] - 0.75 * (i % 6) as f64 }
    });
    CLVData::without_covariates(CBSData::new(x, t_x, t_cal).unwrap())
}

// -----------------------------------------------------------------------------
// Likelihood entry points
// -----------------------------------------------------------------------------

#[test]
// Purpose
// -------
// The summed objective is the negative sum of the per-customer values, with
// and without covariates.
fn sum_is_negative_sum_of_individuals() {
    // Arrange
    let cbs = small_cbs();
    let (life, trans) = small_covariates();
    let p = log_params(0.8, 2.0, 0.05, 1.2, 3.0);
    let mut full = Array1::zeros(7);
    full.slice_mut(ndarray::s![..5]).assign(&p);
    full[5] = 0.4;
    full[6] = -0.3;

    // Act
    let ind = likelihood_individual_nocov(p.view(), &cbs).unwrap();
    let sum = likelihood_sum_nocov(p.view(), &cbs).unwrap();
    let ind_cov =
        likelihood_individual_staticcov(full.view(), &cbs, life.view(), trans.view()).unwrap();
    let sum_cov = likelihood_sum_staticcov(full.view(), &cbs, life.view(), trans.view()).unwrap();

    // Assert
    assert_eq!(ind.len(), 6);
    assert!(ind.iter().all(|v| v.is_finite()));
    assert!((sum + ind.sum()).abs() < 1e-12 * (1.0 + sum.abs()));
    assert!((sum_cov + ind_cov.sum()).abs() < 1e-12 * (1.0 + sum_cov.abs()));
}

#[test]
// Purpose
// -------
// Zero covariate coefficients reproduce the covariate-free likelihood.
fn zero_coefficients_match_no_covariates() {
    let cbs = small_cbs();
    let (life, trans) = small_covariates();
    let p = log_params(0.6, 1.5, 0.2, 0.9, 2.5);
    let mut full = Array1::zeros(7);
    full.slice_mut(ndarray::s![..5]).assign(&p);

    let plain = likelihood_individual_nocov(p.view(), &cbs).unwrap();
    let cov =
        likelihood_individual_staticcov(full.view(), &cbs, life.view(), trans.view()).unwrap();

    for (a, b) in plain.iter().zip(cov.iter()) {
        assert!((a - b).abs() < 1e-12, "{a} vs {b}");
    }
}

#[test]
// Purpose
// -------
// Output order follows customer order under a permutation.
fn output_follows_customer_order() {
    let cbs = small_cbs();
    let perm = [3usize, 0, 5, 1, 4, 2];
    let pick = |v: &Array1<f64>| Array1::from_iter(perm.iter().map(|&i| v[i]));
    let permuted = CBSData::new(pick(&cbs.x), pick(&cbs.t_x), pick(&cbs.t_cal)).unwrap();
    let p = log_params(0.7, 1.1, 0.1, 1.5, 0.8);

    let base = likelihood_individual_nocov(p.view(), &cbs).unwrap();
    let shuffled = likelihood_individual_nocov(p.view(), &permuted).unwrap();

    for (k, &i) in perm.iter().enumerate() {
        assert!((shuffled[k] - base[i]).abs() < 1e-12);
    }
}

#[test]
// Purpose
// -------
// Identical customers receive identical log-likelihoods.
fn identical_customers_identical_values() {
    let cbs = CBSData::new(
        Array1::from_elem(5, 3.0),
        Array1::from_elem(5, 6.5),
        Array1::from_elem(5, 10.0),
    ).unwrap();
    let ll = likelihood_individual_nocov(log_params(1.0, 2.0, 0.3, 0.7, 1.4).view(), &cbs).unwrap();
    assert!(ll.iter().all(|&v| v == ll[0]));
}

#[test]
// Purpose
// -------
// A zero-repeat customer matches a direct numeric evaluation.
//
// Given
// -----
// - x = 0, t_x = 0, T = 10, r = 0.5, alpha = 1, b = 0.1, s = 0.5, beta = 1.
//
// Expect
// ------
// - With beta = 1, `beta − 1 + e^{by} = e^{by}`, so
//   `L = (1/11)^{0.5}·e^{−0.5} + b·s·∫₀¹⁰ (1+y)^{−0.5} e^{−0.05y} dy`
//   up to 1e-8 relative error.
fn zero_repeat_customer_matches_numeric_reference() {
    let (r, alpha, b, s, beta) = (0.5, 1.0, 0.1, 0.5, 1.0);
    let cbs = CBSData::new(array![0.0], array![0.0], array![10.0]).unwrap();

    let ll = likelihood_individual_nocov(log_params(r, alpha, b, s, beta).view(), &cbs).unwrap();

    let closed = (alpha / (alpha + 10.0)).powf(r) * (-s * b * 10.0).exp();
    let integral = simpson(
        |y: f64| (y + alpha).powf(-r) * (-(s + 1.0) * b * y).exp() * (b * y).exp(),
        0.0,
        10.0,
        4000,
    );
    let expected = (closed + b * s * alpha.powf(r) * integral).ln();
    assert!((ll[0] - expected).abs() < 1e-8 * expected.abs().max(1.0), "{} vs {expected}", ll[0]);
}

#[test]
// Purpose
// -------
// For a fixed recency and horizon, more transactions never raise the
// likelihood in a regime where each extra purchase is unlikely.
//
// Given
// -----
// - r = 1, alpha = 1, b = 0.01, s = 1, beta = 1, t_x = 5, T = 10,
//   x = 0..=4.
//
// Expect
// ------
// - Each value matches a Simpson evaluation of L1 and L2 within 1e-6.
// - Values are non-increasing in x.
fn loglik_non_increasing_in_transactions() {
    let xs = array![0.0, 1.0, 2.0, 3.0, 4.0];
    let cbs = CBSData::new(xs, Array1::from_elem(5, 5.0), Array1::from_elem(5, 10.0)).unwrap();
    let ll = likelihood_individual_nocov(log_params(1.0, 1.0, 0.01, 1.0, 1.0).view(), &cbs).unwrap();

    let (alpha, b, t_x, t_cal) = (1.0_f64, 0.01_f64, 5.0_f64, 10.0_f64);
    let mut ln_fact = 0.0;
    for (k, &got) in ll.iter().enumerate() {
        let x = k as f64;
        if k > 0 {
            ln_fact += x.ln();
        }
        // r = 1, so ln Γ(r + x) − ln Γ(r) = ln x!; beta = 1 turns the
        // Gompertz factor into e^{−s·b·T}.
        let ln_ratio = ln_fact;
        let l1 = ln_ratio + alpha.ln() - (1.0 + x) * (t_cal + alpha).ln() - b * t_cal;
        let ln_g = |y: f64| -(1.0 + x) * (y + alpha).ln() - 2.0 * b * y + b * y;
        let shift = ln_g(t_x).max(ln_g(t_cal));
        let integral = simpson(|y| (ln_g(y) - shift).exp(), t_x, t_cal, 4000);
        let l2 = ln_ratio + b.ln() + alpha.ln() + integral.ln() + shift;
        let hi = l1.max(l2);
        let expected = hi + ((l1 - hi).exp() + (l2 - hi).exp()).ln();
        assert!((got - expected).abs() < 1e-6, "x = {x}: {got} vs {expected}");
    }

    for k in 1..ll.len() {
        assert!(ll[k] <= ll[k - 1], "{ll:?}");
    }
}

// -----------------------------------------------------------------------------
// Parameter transforms and interlayers
// -----------------------------------------------------------------------------

#[test]
// Purpose
// -------
// Start values survive the transform to optimizer space and back.
fn start_values_round_trip() {
    let data = shared_covariate_data();
    let options = EstimationOptions::default().with_interlayers(InterlayerConfig {
        correlation: true,
        ..Default::default()
    });
    let model = GGomNBDModel::new(ModelVariant::StaticCovariates, options, &data).unwrap();
    let start = StartValues::new(GGomNBDParams::new(0.7, 3.0, 0.05, 1.4, 2.2).unwrap())
        .with_coefficient("life.z", 0.25)
        .with_coefficient("trans.z", -0.5)
        .with_correlation(0.3);

    let theta = model.start_theta(&start).unwrap();
    let natural = model.variant.backtransform(model.layout(), &theta).unwrap();

    let expect = [
        ("r", 0.7),
        ("alpha", 3.0),
        ("b", 0.05),
        ("s", 1.4),
        ("beta", 2.2),
        ("life.z", 0.25),
        ("trans.z", -0.5),
        ("cor", 0.3),
    ];
    for (name, value) in expect {
        let got = natural.get(name).unwrap();
        assert!((got - value).abs() < 1e-12, "{name}: {got} vs {value}");
    }
}

#[test]
// Purpose
// -------
// The ridge layer adds exactly `λ_life·Σ life² + λ_trans·Σ trans²`.
fn regularization_adds_ridge_penalty() {
    let data = shared_covariate_data();
    let plain =
        GGomNBDModel::new(ModelVariant::StaticCovariates, EstimationOptions::default(), &data)
            .unwrap();
    let ridge_opts = EstimationOptions::default().with_interlayers(InterlayerConfig {
        regularization: Some(RegularizationLambdas::new(2.0, 3.0).unwrap()),
        ..Default::default()
    });
    let ridge = GGomNBDModel::new(ModelVariant::StaticCovariates, ridge_opts, &data).unwrap();
    let start = StartValues::default()
        .with_coefficient("life.z", 0.3)
        .with_coefficient("trans.z", -0.2);
    let theta = plain.start_theta(&start).unwrap();

    let c_plain = plain.cost(&theta, &data, Default::default()).unwrap();
    let c_ridge = ridge.cost(&theta, &data, Default::default()).unwrap();

    let expected = 2.0 * 0.09 + 3.0 * 0.04;
    assert!((c_ridge - c_plain - expected).abs() < 1e-9);
}

#[test]
// Purpose
// -------
// A constrained coefficient behaves like equal free life and trans
// coefficients.
fn constraint_equals_shared_free_coefficients() {
    let data = shared_covariate_data();
    let free =
        GGomNBDModel::new(ModelVariant::StaticCovariates, EstimationOptions::default(), &data)
            .unwrap();
    let constrained_opts = EstimationOptions::default().with_interlayers(InterlayerConfig {
        constraints: Some(vec!["z".into()]),
        ..Default::default()
    });
    let constrained =
        GGomNBDModel::new(ModelVariant::StaticCovariates, constrained_opts, &data).unwrap();
    assert_eq!(constrained.layout().dim(), 6);

    let free_theta = free
        .start_theta(
            &StartValues::default()
                .with_coefficient("life.z", 0.35)
                .with_coefficient("trans.z", 0.35),
        )
        .unwrap();
    let constr_theta = constrained
        .start_theta(&StartValues::default().with_coefficient("constr.z", 0.35))
        .unwrap();

    let a = free.cost(&free_theta, &data, Default::default()).unwrap();
    let b = constrained.cost(&constr_theta, &data, Default::default()).unwrap();
    assert!((a - b).abs() < 1e-10 * a.abs().max(1.0));
}

#[test]
// Purpose
// -------
// The pipeline cost stays finite in extreme regions, including an almost
// perfect correlation.
fn pipeline_cost_is_always_finite() {
    init_logging();
    let data = shared_covariate_data();
    let options = EstimationOptions::default().with_interlayers(InterlayerConfig {
        correlation: true,
        ..Default::default()
    });
    let model = GGomNBDModel::new(ModelVariant::StaticCovariates, options, &data).unwrap();
    let dim = model.layout().dim();

    let mut extreme = Array1::zeros(dim);
    extreme[2] = 40.0;
    extreme[dim - 1] = 30.0;
    let near_one = model.start_theta(&StartValues::default().with_correlation(0.999)).unwrap();

    for theta in [extreme, near_one] {
        let cost = model.cost(&theta, &data, Default::default()).unwrap();
        assert!(cost.is_finite(), "{theta:?} -> {cost}");
    }
}

// -----------------------------------------------------------------------------
// Estimation and prediction
// -----------------------------------------------------------------------------

#[test]
// Purpose
// -------
// A short fit produces a symmetric Hessian, named natural estimates and
// usable forecasts.
//
// Given
// -----
// - 40 customers, no covariates, at most 8 L-BFGS iterations.
//
// Expect
// ------
// - ℓ(θ̂) ≥ ℓ(θ₀); Hessian 5 × 5 and symmetric.
// - P(alive) in [0, 1], non-negative conditional expectations.
// - Unconditional expectations are non-decreasing in t.
fn short_fit_then_forecast() {
    // Arrange
    init_logging();
    let data = fit_data();
    let mut model = GGomNBDModel::new(ModelVariant::NoCovariates, short_options(8), &data).unwrap();
    let start = StartValues::new(GGomNBDParams::new(1.0, 2.0, 0.1, 1.0, 1.0).unwrap());
    let theta0 = model.start_theta(&start).unwrap();
    let ll0 = -model.cost(&theta0, &data, Default::default()).unwrap();

    // Act
    let value = model.fit(&start, &data).unwrap().optimization.value;
    let table = model.predict(&data, 26.0).unwrap();
    let e_short = model.expectation(&data, 5.0).unwrap();
    let e_long = model.expectation(&data, 20.0).unwrap();

    // Assert
    assert!(value >= ll0 - 1e-8);
    let result = model.fitted().unwrap();
    let h = &result.optimization.hessian;
    assert_eq!(h.dim(), (5, 5));
    for i in 0..5 {
        for j in 0..i {
            if h[[i, j]].is_finite() {
                assert_eq!(h[[i, j]], h[[j, i]]);
            }
        }
    }
    assert_eq!(result.natural.names, vec!["r", "alpha", "b", "s", "beta"]);

    assert_eq!(table.palive.len(), 40);
    assert!(table.palive.iter().all(|&p| (0.0..=1.0).contains(&p)));
    assert!(table.cet.iter().all(|&c| c >= 0.0 && c.is_finite()));
    for (a, b) in e_short.iter().zip(e_long.iter()) {
        assert!(*a >= 0.0 && b >= a);
    }
}
