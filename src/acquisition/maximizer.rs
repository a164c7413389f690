//! Gradient ascent on an [`AcquisitionSurface`].
//!
//! Adam runs for a fixed number of steps from each start point; with several
//! starts the proposal with the highest acquisition wins.

use super::{AcquisitionFunction, AcquisitionSurface, ExpectedImprovement};
use crate::adam::Adam;
use crate::error::{Error, Result};
use crate::surrogate::{ParameterSample, Surrogate};

/// Default number of Adam steps per ascent.
const DEFAULT_STEPS: usize = 100;
/// Default Adam learning rate.
const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Result of an acquisition ascent.
#[derive(Clone, Debug, PartialEq)]
pub struct Proposal {
    /// The proposed point, in the surrogate's input coordinates.
    pub point: Vec<f64>,
    /// Summed acquisition value at `point`.
    pub acquisition: f64,
}

/// Fixed-budget gradient ascent on an [`AcquisitionSurface`].
///
/// Runs Adam on the negated summed acquisition for exactly `steps` steps
/// from each starting point. There is no convergence check; the result is a
/// local optimum near the start, so callers should pick sensible starts
/// (the current best observation, or a few random restarts through
/// [`propose_with_restarts`](Self::propose_with_restarts)).
///
/// # Examples
///
/// ```
/// use hypersphere::acquisition::{AcquisitionMaximizer, ProbabilityOfImprovement};
///
/// let maximizer = AcquisitionMaximizer::builder()
///     .steps(50)
///     .learning_rate(0.05)
///     .acquisition(ProbabilityOfImprovement)
///     .build()
///     .unwrap();
/// assert_eq!(maximizer.steps(), 50);
/// ```
pub struct AcquisitionMaximizer {
    steps: usize,
    learning_rate: f64,
    acquisition: Box<dyn AcquisitionFunction>,
}

impl AcquisitionMaximizer {
    /// Creates a maximizer with default settings (100 steps, learning rate
    /// 0.01, Expected Improvement).
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            learning_rate: DEFAULT_LEARNING_RATE,
            acquisition: Box::new(ExpectedImprovement),
        }
    }

    /// Creates a builder for configuring an `AcquisitionMaximizer`.
    #[must_use]
    pub fn builder() -> AcquisitionMaximizerBuilder {
        AcquisitionMaximizerBuilder::new()
    }

    /// Number of Adam steps per ascent.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Adam learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// The acquisition function being maximized.
    #[must_use]
    pub fn acquisition(&self) -> &dyn AcquisitionFunction {
        self.acquisition.as_ref()
    }

    /// Climbs the summed acquisition from `initial_guess` and returns the
    /// final point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySamples`] without samples,
    /// [`Error::Numerical`] if the acquisition value or gradient becomes
    /// non-finite, and propagates surrogate errors.
    pub fn propose<S: Surrogate + ?Sized>(
        &self,
        surrogate: &S,
        samples: &[ParameterSample],
        reference: f64,
        initial_guess: &[f64],
    ) -> Result<Vec<f64>> {
        let surface = AcquisitionSurface::new(surrogate, samples, self.acquisition(), reference)?;
        Ok(self.ascend(&surface, initial_guess)?.point)
    }

    /// Runs one ascent per start and returns the proposal with the highest
    /// final acquisition. Ties keep the earlier start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `starts` is empty; otherwise as
    /// [`propose`](Self::propose). The first failing ascent aborts the call.
    pub fn propose_with_restarts<S: Surrogate + ?Sized>(
        &self,
        surrogate: &S,
        samples: &[ParameterSample],
        reference: f64,
        starts: &[Vec<f64>],
    ) -> Result<Proposal> {
        let surface = AcquisitionSurface::new(surrogate, samples, self.acquisition(), reference)?;
        let mut best: Option<Proposal> = None;
        for start in starts {
            let proposal = self.ascend(&surface, start)?;
            trace_debug!(acquisition = proposal.acquisition, "ascent finished");
            if best
                .as_ref()
                .is_none_or(|b| proposal.acquisition > b.acquisition)
            {
                best = Some(proposal);
            }
        }
        best.ok_or(Error::InvalidConfig("at least one start is required"))
    }

    fn ascend<S: Surrogate + ?Sized>(
        &self,
        surface: &AcquisitionSurface<'_, S>,
        start: &[f64],
    ) -> Result<Proposal> {
        let mut x = start.to_vec();
        let mut adam = Adam::new(self.learning_rate);
        let mut descent = vec![0.0; x.len()];

        for step in 0..self.steps {
            let (value, grad) = surface.value_and_gradient(&x)?;
            if !value.is_finite() || grad.iter().any(|g| !g.is_finite()) {
                return Err(Error::Numerical(format!(
                    "non-finite acquisition gradient at step {step}"
                )));
            }
            for (d, g) in descent.iter_mut().zip(&grad) {
                *d = -g;
            }
            adam.step(&mut x, &descent);
        }

        let acquisition = surface.evaluate(&x)?;
        if !acquisition.is_finite() {
            return Err(Error::Numerical(
                "non-finite acquisition at the proposed point".to_string(),
            ));
        }
        Ok(Proposal {
            point: x,
            acquisition,
        })
    }
}

impl Default for AcquisitionMaximizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring an [`AcquisitionMaximizer`].
///
/// Defaults:
/// - `steps`: 100
/// - `learning_rate`: 0.01
/// - `acquisition`: [`ExpectedImprovement`]
#[derive(Default)]
pub struct AcquisitionMaximizerBuilder {
    steps: Option<usize>,
    learning_rate: Option<f64>,
    acquisition: Option<Box<dyn AcquisitionFunction>>,
}

impl AcquisitionMaximizerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of Adam steps per ascent.
    ///
    /// Default: 100.
    #[must_use]
    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Sets the Adam learning rate.
    ///
    /// Default: 0.01.
    #[must_use]
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = Some(lr);
        self
    }

    /// Sets the acquisition function.
    ///
    /// Default: [`ExpectedImprovement`].
    #[must_use]
    pub fn acquisition(mut self, acquisition: impl AcquisitionFunction + 'static) -> Self {
        self.acquisition = Some(Box::new(acquisition));
        self
    }

    /// Builds the configured [`AcquisitionMaximizer`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the learning rate is not positive
    /// and finite.
    pub fn build(self) -> Result<AcquisitionMaximizer> {
        let learning_rate = self.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE);
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(
                "learning rate must be positive and finite",
            ));
        }
        Ok(AcquisitionMaximizer {
            steps: self.steps.unwrap_or(DEFAULT_STEPS),
            learning_rate,
            acquisition: self
                .acquisition
                .unwrap_or_else(|| Box::new(ExpectedImprovement)),
        })
    }
}
