// src/utils/quadrature.rs

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use crate::utils::errors::GravityError;

/// Kronrod abscissae on [0, 1]; odd indices are the embedded Gauss nodes.
const XGK: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144845693013,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.000000000000000000000000000000000,
];

const WGK: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

/// Gauss weights; the last one belongs to the centre node.
const WG: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

/// Tolerances and workspace bound for [`integrate_adaptive`].
#[derive(Debug, Clone, Copy)]
pub struct QuadratureConfig {
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
    /// Maximum number of subintervals kept at once.
    pub workspace: usize,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            abs_tolerance: crate::utils::QUADRATURE_ABS_TOLERANCE,
            rel_tolerance: 0.0,
            workspace: crate::utils::QUADRATURE_WORKSPACE,
        }
    }
}

/// Result of a converged integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    pub value: f64,
    pub abs_error: f64,
    pub subintervals: usize,
}

/// Subinterval ordered by its error estimate, so the heap top is the worst one.
#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// Applies the 15-point Kronrod rule on `[lower, upper]`.
///
/// Returns the Kronrod estimate and `|K15 - G7|` as the error estimate.
fn gauss_kronrod_15<F>(f: &F, lower: f64, upper: f64) -> (f64, f64)
where
    F: Fn(f64) -> f64,
{
    let center = 0.5 * (lower + upper);
    let half_length = 0.5 * (upper - lower);

    let f_center = f(center);
    let mut kronrod = f_center * WGK[7];
    let mut gauss = f_center * WG[3];

    for j in 0..7 {
        let dx = half_length * XGK[j];
        let pair = f(center - dx) + f(center + dx);
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    let value = kronrod * half_length;
    let error = ((kronrod - gauss) * half_length).abs();
    (value, error)
}

/// Globally adaptive integration of `f` over `[lower, upper]`.
///
/// The segment with the largest error estimate is bisected until the summed
/// error satisfies `max(abs_tolerance, rel_tolerance * |value|)`.
///
/// # Errors
/// Returns `GravityError::QuadratureDidNotConverge` when the workspace is
/// exhausted, a segment can no longer be split in floating point, or the
/// integrand produces non-finite values.
///
/// # Example
/// ```
/// use rs_gravity::utils::{integrate_adaptive, QuadratureConfig};
///
/// let integral = integrate_adaptive(|x: f64| x.sin(), 0.0, std::f64::consts::PI, &QuadratureConfig::default())
///     .expect("sin integrates cleanly");
/// assert!((integral.value - 2.0).abs() < 1e-10);
/// ```
pub fn integrate_adaptive<F>(f: F, lower: f64, upper: f64, config: &QuadratureConfig) -> Result<Integral, GravityError>
where
    F: Fn(f64) -> f64,
{
    if !lower.is_finite() || !upper.is_finite() {
        return Err(GravityError::InvalidParameter(format!(
            "integration bounds must be finite, got [{}, {}]",
            lower, upper
        )));
    }
    if config.workspace == 0 {
        return Err(GravityError::InvalidParameter("quadrature workspace must be positive".to_string()));
    }
    if lower == upper {
        return Ok(Integral { value: 0.0, abs_error: 0.0, subintervals: 1 });
    }

    let (value, error) = gauss_kronrod_15(&f, lower, upper);
    let mut segments = BinaryHeap::with_capacity(config.workspace.min(1024));
    segments.push(Segment { lower, upper, value, error });
    let mut total_value = value;
    let mut total_error = error;

    loop {
        if !total_value.is_finite() || !total_error.is_finite() {
            return Err(not_converged(lower, upper, total_error, segments.len()));
        }
        let tolerance = config.abs_tolerance.max(config.rel_tolerance * total_value.abs());
        if total_error <= tolerance {
            // Drop the rounding drift of the running totals.
            let value = segments.iter().map(|s| s.value).sum();
            let abs_error = segments.iter().map(|s| s.error).sum();
            return Ok(Integral { value, abs_error, subintervals: segments.len() });
        }
        if segments.len() >= config.workspace {
            return Err(not_converged(lower, upper, total_error, segments.len()));
        }

        let Some(segment) = segments.pop() else {
            return Err(not_converged(lower, upper, total_error, 0));
        };

        let mid = 0.5 * (segment.lower + segment.upper);
        if mid <= segment.lower || mid >= segment.upper {
            // Interval collapsed to adjacent floats.
            return Err(not_converged(lower, upper, total_error, segments.len() + 1));
        }

        let (left_value, left_error) = gauss_kronrod_15(&f, segment.lower, mid);
        let (right_value, right_error) = gauss_kronrod_15(&f, mid, segment.upper);

        segments.push(Segment { lower: segment.lower, upper: mid, value: left_value, error: left_error });
        segments.push(Segment { lower: mid, upper: segment.upper, value: right_value, error: right_error });

        total_value += left_value + right_value - segment.value;
        total_error += left_error + right_error - segment.error;
    }
}

fn not_converged(lower: f64, upper: f64, abs_error: f64, subintervals: usize) -> GravityError {
    GravityError::QuadratureDidNotConverge { lower, upper, abs_error, subintervals }
}
