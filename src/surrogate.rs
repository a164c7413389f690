//! Contracts between the optimization core and its surrogate model.
//!
//! The core never looks inside the model. It needs three things:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`Surrogate`] | Predictive mean and variance at a batch of points, conditioned on one [`ParameterSample`]. |
//! | [`Inference`] | Produce a fresh set of parameter samples (restart optima or MCMC draws). |
//! | [`SurrogateModel`] | Bind the model to the current dataset, yielding something that is both of the above. |
//!
//! [`GpModel`](crate::gp::GpModel) is the reference implementation. Any
//! other surrogate can be plugged into
//! [`SphereOptimizer`](crate::bo::SphereOptimizer) by implementing these
//! traits.

use crate::error::{Error, Result};

/// One flat vector of surrogate hyperparameters.
///
/// Samples are immutable values. A set of them approximates the
/// hyperparameter posterior; how many there are and whether they are point
/// estimates or Monte-Carlo draws is up to the [`Inference`] implementation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSample(Vec<f64>);

impl ParameterSample {
    /// Wraps a parameter vector.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The parameters as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the sample holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the sample and returns the parameter vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for ParameterSample {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Predictive mean and variance at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    /// Predictive mean.
    pub mean: f64,
    /// Predictive variance (never negative).
    pub variance: f64,
}

/// A [`Prediction`] together with its gradients with respect to the point.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionGradient {
    /// Predictive mean.
    pub mean: f64,
    /// Predictive variance.
    pub variance: f64,
    /// ∂mean/∂x.
    pub mean_grad: Vec<f64>,
    /// ∂variance/∂x.
    pub variance_grad: Vec<f64>,
}

/// Relative step for the finite-difference fallback.
const FD_STEP: f64 = 1e-6;

/// Predictive interface of a surrogate model.
///
/// Implementations must be `Send + Sync`: the averaged acquisition queries
/// several parameter samples concurrently.
pub trait Surrogate: Send + Sync {
    /// Predictive mean and variance for every point in `points`,
    /// conditioned on `sample`.
    ///
    /// # Errors
    ///
    /// Implementation-defined, typically [`Error::DimensionMismatch`] for
    /// malformed points or [`Error::Numerical`] for an ill-conditioned model.
    fn predict(&self, points: &[Vec<f64>], sample: &ParameterSample) -> Result<Vec<Prediction>>;

    /// Prediction plus gradients with respect to `point`.
    ///
    /// The default uses central finite differences over
    /// [`predict`](Surrogate::predict) in a single batched call. Override it
    /// when an analytic gradient is available.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`predict`](Surrogate::predict).
    fn predict_with_gradient(
        &self,
        point: &[f64],
        sample: &ParameterSample,
    ) -> Result<PredictionGradient> {
        let d = point.len();
        let steps: Vec<f64> = point.iter().map(|v| FD_STEP * v.abs().max(1.0)).collect();

        let mut batch = Vec::with_capacity(2 * d + 1);
        batch.push(point.to_vec());
        for (i, &h) in steps.iter().enumerate() {
            let mut plus = point.to_vec();
            plus[i] += h;
            let mut minus = point.to_vec();
            minus[i] -= h;
            batch.push(plus);
            batch.push(minus);
        }

        let predictions = self.predict(&batch, sample)?;
        if predictions.len() != batch.len() {
            return Err(Error::DimensionMismatch {
                expected: batch.len(),
                got: predictions.len(),
            });
        }

        let center = predictions[0];
        let mut mean_grad = Vec::with_capacity(d);
        let mut variance_grad = Vec::with_capacity(d);
        for (i, &h) in steps.iter().enumerate() {
            let plus = predictions[1 + 2 * i];
            let minus = predictions[2 + 2 * i];
            mean_grad.push((plus.mean - minus.mean) / (2.0 * h));
            variance_grad.push((plus.variance - minus.variance) / (2.0 * h));
        }

        Ok(PredictionGradient {
            mean: center.mean,
            variance: center.variance,
            mean_grad,
            variance_grad,
        })
    }
}

/// Parameter learning and posterior sampling for a bound surrogate.
pub trait Inference: Surrogate {
    /// Point-estimate fitting from `restarts` random starts.
    ///
    /// Returns one or more local optima, best first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fit`] if no restart produces a usable estimate, or
    /// [`Error::InvalidConfig`] for `restarts == 0`.
    fn learn_parameters(
        &self,
        restarts: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<ParameterSample>>;

    /// MCMC posterior sampling starting from `start` (or from an
    /// implementation-chosen state when `None`).
    ///
    /// After `n_burnin` discarded sweeps, one sample is kept every `n_thin`
    /// sweeps until `n_samples` have been collected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fit`] if sampling cannot start, or
    /// [`Error::InvalidConfig`] for `n_samples == 0` or `n_thin == 0`.
    fn sample_posterior_from(
        &self,
        start: Option<&ParameterSample>,
        n_samples: usize,
        n_burnin: usize,
        n_thin: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<ParameterSample>>;

    /// MCMC posterior sampling from the implementation's default start.
    ///
    /// # Errors
    ///
    /// See [`sample_posterior_from`](Inference::sample_posterior_from).
    fn sample_posterior(
        &self,
        n_samples: usize,
        n_burnin: usize,
        n_thin: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<ParameterSample>> {
        self.sample_posterior_from(None, n_samples, n_burnin, n_thin, rng)
    }
}

/// A surrogate model that can be conditioned on a dataset.
pub trait SurrogateModel: Send + Sync {
    /// The model bound to a particular dataset.
    type Bound: Inference;

    /// Conditions the model on `inputs` and `outputs`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoObservations`] for an empty dataset,
    /// [`Error::DimensionMismatch`] for ragged inputs or mismatched lengths,
    /// and [`Error::Numerical`] for non-finite data.
    fn bind(&self, inputs: &[Vec<f64>], outputs: &[f64]) -> Result<Self::Bound>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mean `Σ xᵢ²`, variance `1 + x₀`.
    struct Quadratic;

    impl Surrogate for Quadratic {
        fn predict(
            &self,
            points: &[Vec<f64>],
            _sample: &ParameterSample,
        ) -> Result<Vec<Prediction>> {
            Ok(points
                .iter()
                .map(|p| Prediction {
                    mean: p.iter().map(|v| v * v).sum(),
                    variance: 1.0 + p[0],
                })
                .collect())
        }
    }

    #[test]
    fn test_finite_difference_gradient() {
        let sample = ParameterSample::new(vec![]);
        let g = Quadratic
            .predict_with_gradient(&[1.0, -2.0, 0.5], &sample)
            .unwrap();
        assert!((g.mean - 5.25).abs() < 1e-12);
        assert!((g.variance - 2.0).abs() < 1e-12);
        let expected = [2.0, -4.0, 1.0];
        for (got, want) in g.mean_grad.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} vs {want}");
        }
        assert!((g.variance_grad[0] - 1.0).abs() < 1e-6);
        assert!(g.variance_grad[1].abs() < 1e-6);
    }

    #[test]
    fn test_parameter_sample_accessors() {
        let s = ParameterSample::from(vec![1.0, 2.0]);
        assert_eq!(s.len(), 2);
        assert!(!s.is_empty());
        assert_eq!(s.as_slice(), &[1.0, 2.0]);
        assert_eq!(s.into_inner(), vec![1.0, 2.0]);
    }
}
