//! Acquisition averaged over posterior parameter samples.
//!
//! Each sample's prediction and gradient are computed on the rayon pool and
//! summed, so the surface approximates the acquisition integrated over the
//! hyperparameter posterior.

use rayon::prelude::*;

use super::AcquisitionFunction;
use crate::error::{Error, Result};
use crate::surrogate::{ParameterSample, Prediction, Surrogate};

/// Acquisition summed over a set of posterior parameter samples.
///
/// The sum approximates the acquisition integrated over the hyperparameter
/// posterior (up to a positive factor, which gradient ascent ignores). Each
/// sample is queried independently on the rayon pool and the results are
/// added, so evaluation order does not matter.
///
/// The surface borrows everything it needs and is rebuilt every iteration.
pub struct AcquisitionSurface<'a, S: Surrogate + ?Sized> {
    surrogate: &'a S,
    samples: &'a [ParameterSample],
    acquisition: &'a dyn AcquisitionFunction,
    reference: f64,
}

impl<'a, S: Surrogate + ?Sized> AcquisitionSurface<'a, S> {
    /// Builds a surface over `samples`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySamples`] if `samples` is empty.
    pub fn new(
        surrogate: &'a S,
        samples: &'a [ParameterSample],
        acquisition: &'a dyn AcquisitionFunction,
        reference: f64,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptySamples);
        }
        Ok(Self {
            surrogate,
            samples,
            acquisition,
            reference,
        })
    }

    /// Number of parameter samples averaged over.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// The improvement baseline.
    #[must_use]
    pub fn reference(&self) -> f64 {
        self.reference
    }

    /// Summed acquisition value at `candidate`.
    ///
    /// # Errors
    ///
    /// Propagates surrogate prediction errors.
    pub fn evaluate(&self, candidate: &[f64]) -> Result<f64> {
        let batch = [candidate.to_vec()];
        self.samples
            .par_iter()
            .map(|sample| {
                let predictions = self.surrogate.predict(&batch, sample)?;
                let Some(&Prediction { mean, variance }) = predictions.first() else {
                    return Err(Error::Numerical(
                        "surrogate returned no prediction".to_string(),
                    ));
                };
                Ok(self.acquisition.evaluate(mean, variance, self.reference).value)
            })
            .try_reduce(|| 0.0, |a, b| Ok(a + b))
    }

    /// Summed acquisition value and its gradient with respect to `candidate`.
    ///
    /// # Errors
    ///
    /// Propagates surrogate prediction errors.
    pub fn value_and_gradient(&self, candidate: &[f64]) -> Result<(f64, Vec<f64>)> {
        let dim = candidate.len();
        self.samples
            .par_iter()
            .map(|sample| {
                let pred = self.surrogate.predict_with_gradient(candidate, sample)?;
                let acq = self
                    .acquisition
                    .evaluate(pred.mean, pred.variance, self.reference);
                if acq.is_flat() {
                    return Ok((acq.value, vec![0.0; dim]));
                }
                if pred.mean_grad.len() != dim || pred.variance_grad.len() != dim {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        got: pred.mean_grad.len().min(pred.variance_grad.len()),
                    });
                }
                let grad = pred
                    .mean_grad
                    .iter()
                    .zip(&pred.variance_grad)
                    .map(|(dm, dv)| acq.d_mean * dm + acq.d_variance * dv)
                    .collect();
                Ok((acq.value, grad))
            })
            .try_reduce(
                || (0.0, vec![0.0; dim]),
                |(va, mut ga), (vb, gb)| {
                    for (a, b) in ga.iter_mut().zip(gb) {
                        *a += b;
                    }
                    Ok((va + vb, ga))
                },
            )
    }
}
