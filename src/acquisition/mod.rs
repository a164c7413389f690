//! Acquisition functions, Bayesian model averaging, and gradient ascent.
//!
//! An [`AcquisitionFunction`] scores one `(mean, variance)` prediction
//! against a reference value. [`AcquisitionSurface`] sums that score over
//! every posterior [`ParameterSample`](crate::surrogate::ParameterSample),
//! approximating the acquisition integrated over the hyperparameter
//! posterior. [`AcquisitionMaximizer`] climbs the summed surface with Adam.
//!
//! All acquisition functions here use the minimization framing: lower
//! predicted means are better and the reference is the best (smallest)
//! observation so far.
//!
//! | Function | Value |
//! |----------|-------|
//! | [`ExpectedImprovement`] | `(ref − μ) Φ(z) + σ φ(z)`, `z = (ref − μ) / σ` |
//! | [`ProbabilityOfImprovement`] | `Φ(z)` |
//! | [`LowerConfidenceBound`] | `κ σ − μ` |

mod maximizer;
mod surface;

pub use maximizer::{AcquisitionMaximizer, AcquisitionMaximizerBuilder, Proposal};
pub use surface::AcquisitionSurface;

/// Standard deviations below this are treated as zero.
const MIN_STD: f64 = 1e-12;

/// Value of an acquisition function and its partial derivatives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcquisitionValue {
    /// Acquisition value.
    pub value: f64,
    /// ∂value/∂mean.
    pub d_mean: f64,
    /// ∂value/∂variance.
    pub d_variance: f64,
}

impl AcquisitionValue {
    /// Zero value with zero gradient: the limit at vanishing variance.
    pub const ZERO: Self = Self {
        value: 0.0,
        d_mean: 0.0,
        d_variance: 0.0,
    };

    /// Returns `true` if both partial derivatives are zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_flat(&self) -> bool {
        self.d_mean == 0.0 && self.d_variance == 0.0
    }
}

/// A scalar score over one predictive distribution.
///
/// Implementations must never return NaN: where the formula is undefined
/// (zero variance, non-finite inputs) they return the limiting value.
pub trait AcquisitionFunction: Send + Sync {
    /// Scores the prediction `(mean, variance)` against `reference`.
    fn evaluate(&self, mean: f64, variance: f64, reference: f64) -> AcquisitionValue;
}

/// Expected Improvement below the reference value.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpectedImprovement;

impl AcquisitionFunction for ExpectedImprovement {
    fn evaluate(&self, mean: f64, variance: f64, reference: f64) -> AcquisitionValue {
        let Some(std) = usable_std(mean, variance) else {
            return AcquisitionValue::ZERO;
        };
        let z = (reference - mean) / std;
        let cdf = norm_cdf(z);
        let pdf = norm_pdf(z);
        let value = std * scaled_improvement(z);
        if value.is_nan() || value <= 0.0 {
            return AcquisitionValue::ZERO;
        }
        AcquisitionValue {
            value,
            d_mean: -cdf,
            d_variance: pdf / (2.0 * std),
        }
    }
}

/// Probability that the objective falls below the reference value.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbabilityOfImprovement;

impl AcquisitionFunction for ProbabilityOfImprovement {
    fn evaluate(&self, mean: f64, variance: f64, reference: f64) -> AcquisitionValue {
        let Some(std) = usable_std(mean, variance) else {
            return AcquisitionValue::ZERO;
        };
        let z = (reference - mean) / std;
        let pdf = norm_pdf(z);
        AcquisitionValue {
            value: norm_cdf(z),
            d_mean: -pdf / std,
            d_variance: -pdf * z / (2.0 * variance),
        }
    }
}

/// Negated lower confidence bound `κσ − μ`.
///
/// Ignores the reference value.
#[derive(Clone, Copy, Debug)]
pub struct LowerConfidenceBound {
    /// Exploration weight on the predictive standard deviation.
    pub kappa: f64,
}

impl Default for LowerConfidenceBound {
    fn default() -> Self {
        Self { kappa: 2.0 }
    }
}

impl AcquisitionFunction for LowerConfidenceBound {
    fn evaluate(&self, mean: f64, variance: f64, _reference: f64) -> AcquisitionValue {
        if !mean.is_finite() {
            return AcquisitionValue::ZERO;
        }
        match usable_std(mean, variance) {
            Some(std) => AcquisitionValue {
                value: self.kappa * std - mean,
                d_mean: -1.0,
                d_variance: self.kappa / (2.0 * std),
            },
            None => AcquisitionValue {
                value: -mean,
                d_mean: -1.0,
                d_variance: 0.0,
            },
        }
    }
}

/// `Some(σ)` when the prediction is finite and the variance is usable.
fn usable_std(mean: f64, variance: f64) -> Option<f64> {
    if !mean.is_finite() || !variance.is_finite() {
        return None;
    }
    let std = variance.max(0.0).sqrt();
    (std >= MIN_STD).then_some(std)
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Beyond this many standard deviations the tail is evaluated through the
/// Mills-ratio continued fraction.
const TAIL_START: f64 = 3.0;

/// Depth of the Mills-ratio continued fraction.
const TAIL_TERMS: u32 = 64;

/// Standard normal PDF.
pub(crate) fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF with small relative error in both tails.
pub(crate) fn norm_cdf(x: f64) -> f64 {
    if x < -TAIL_START {
        let t = -x;
        return norm_pdf(t) / (t + mills_remainder(t));
    }
    if x > TAIL_START {
        return 1.0 - norm_pdf(x) / (x + mills_remainder(x));
    }

    // Φ(x) = 1/2 + φ(x) (x + x³/3 + x⁵/15 + …)
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    for k in 1..200_u32 {
        term *= x2 / f64::from(2 * k + 1);
        if term.abs() <= 1e-17 * sum.abs() {
            break;
        }
        sum += term;
    }
    norm_pdf(x).mul_add(sum, 0.5)
}

/// `φ(z) + z Φ(z)`: Expected Improvement for unit standard deviation.
///
/// In the lower tail both terms nearly cancel, so there it is evaluated as
/// `φ(t) c / (t + c)` with `t = −z` and `c` from [`mills_remainder`].
fn scaled_improvement(z: f64) -> f64 {
    if z < -TAIL_START {
        let t = -z;
        let c = mills_remainder(t);
        return norm_pdf(t) * c / (t + c);
    }
    z.mul_add(norm_cdf(z), norm_pdf(z))
}

/// `c(t) = 1 / (t + 2 / (t + 3 / (t + …)))`, so that the upper tail
/// `1 − Φ(t) = φ(t) / (t + c(t))` for `t > 0`.
fn mills_remainder(t: f64) -> f64 {
    let mut c = 0.0;
    for k in (2..=TAIL_TERMS).rev() {
        c = f64::from(k) / (t + c);
    }
    1.0 / (t + c)
}
