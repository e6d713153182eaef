//! Adaptive bisection driver on top of the 21-point Gauss–Kronrod rule.
//!
//! The workspace keeps every live subinterval with its estimate and error.
//! Each step bisects the interval with the largest error, replaces it by its
//! two halves, and stops once the summed error meets the tolerance or the
//! workspace is full.
//!
//! This is plain QAG: unlike QUADPACK's QAGS there is no Wynn ε-algorithm
//! extrapolation, so endpoint singularities converge slowly. The
//! likelihood integrands are smooth on finite intervals.
use crate::quadrature::{QuadratureOptions, gauss_kronrod::qk21};

/// Result of a single integration call.
///
/// - `value`: best estimate of the integral.
/// - `abs_error`: estimate of `|value − ∫f|`.
/// - `intervals`: number of subintervals used.
/// - `converged`: `true` if the tolerance test passed before the workspace
///   limit was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEstimate {
    pub value: f64,
    pub abs_error: f64,
    pub intervals: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// Reusable subinterval storage for [`integrate`].
///
/// A workspace must be used by one integration at a time; parallel callers
/// give each worker its own instance.
#[derive(Debug, Clone)]
pub struct QagWorkspace {
    limit: usize,
    segments: Vec<Segment>,
}

impl QagWorkspace {
    /// Allocate a workspace able to hold `limit` subintervals.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self { limit, segments: Vec::with_capacity(limit) }
    }

    /// Workspace capacity.
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn reset(&mut self) {
        self.segments.clear();
    }

    fn largest_error_index(&self) -> usize {
        let mut idx = 0;
        let mut max_err = f64::NEG_INFINITY;
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.error > max_err {
                max_err = seg.error;
                idx = i;
            }
        }
        idx
    }

    fn totals(&self) -> (f64, f64) {
        self.segments.iter().fold((0.0, 0.0), |(v, e), seg| (v + seg.value, e + seg.error))
    }
}

/// Integrate `f` over `[a, b]` adaptively.
///
/// # Behavior
/// - `a == b` returns an exact zero without evaluating `f`.
/// - The effective capacity is `min(opts.limit, workspace.limit())`.
/// - Bisection stops when `abs_error ≤ max(eps_abs, eps_rel·|value|)`, when
///   the workspace is full, or when the worst interval can no longer be
///   split in `f64` arithmetic. The best estimate is always returned.
/// - Non-finite integrand values propagate into `value`; the caller decides
///   how to treat them.
pub fn integrate<F: Fn(f64) -> f64>(
    f: &F, a: f64, b: f64, opts: &QuadratureOptions, workspace: &mut QagWorkspace,
) -> QuadEstimate {
    workspace.reset();
    if a == b {
        return QuadEstimate { value: 0.0, abs_error: 0.0, intervals: 0, converged: true };
    }
    let limit = opts.limit.min(workspace.limit);

    let first = qk21(f, a, b);
    workspace.segments.push(Segment { a, b, value: first.value, error: first.abs_error });
    let tolerance = |value: f64| opts.eps_abs.max(opts.eps_rel * value.abs());

    let round_off = 50.0 * f64::EPSILON * first.res_abs;
    if first.abs_error <= round_off && first.abs_error > tolerance(first.value) {
        // Requested accuracy is below what the rule can deliver here.
        return QuadEstimate {
            value: first.value,
            abs_error: first.abs_error,
            intervals: 1,
            converged: false,
        };
    }
    if first.abs_error <= tolerance(first.value) || !first.value.is_finite() {
        return QuadEstimate {
            value: first.value,
            abs_error: first.abs_error,
            intervals: 1,
            converged: first.value.is_finite(),
        };
    }

    let (mut value, mut abs_error) = (first.value, first.abs_error);
    while workspace.segments.len() < limit {
        let worst_idx = workspace.largest_error_index();
        let worst = workspace.segments[worst_idx];
        let mid = 0.5 * (worst.a + worst.b);
        if mid <= worst.a.min(worst.b) || mid >= worst.a.max(worst.b) {
            break;
        }

        let left = qk21(f, worst.a, mid);
        let right = qk21(f, mid, worst.b);
        workspace.segments[worst_idx] =
            Segment { a: worst.a, b: mid, value: left.value, error: left.abs_error };
        workspace.segments.push(Segment {
            a: mid,
            b: worst.b,
            value: right.value,
            error: right.abs_error,
        });

        (value, abs_error) = workspace.totals();
        if !value.is_finite() {
            break;
        }
        if abs_error <= tolerance(value) {
            return QuadEstimate {
                value,
                abs_error,
                intervals: workspace.segments.len(),
                converged: true,
            };
        }
    }

    QuadEstimate { value, abs_error, intervals: workspace.segments.len(), converged: false }
}
