//! The sequential Bayesian-optimization loop over spherical coordinates.
//!
//! [`SphereOptimizer`] minimizes a black-box [`Objective`] inside a ball of
//! radius `R` centered at the origin. The surrogate is fitted on the
//! spherical coordinates of the evaluated points, so a kernel that is
//! stationary in `(r, φ)` concentrates its resolution near the center of
//! the search region.
//!
//! # Loop
//!
//! ```text
//! Initializing ─► Fitting ─► Proposing ─► Evaluating ─┐
//!                    ▲                                │
//!                    └────────────────────────────────┘
//!                                     … ─► Terminated
//! ```
//!
//! 1. **Initializing** evaluates the center `0` and the diagonal point
//!    `min(R/√d, half_side)·1`.
//! 2. **Fitting** binds the [`SurrogateModel`] to every observation and
//!    draws posterior parameter samples, warm-started from the previous
//!    iteration's last sample.
//! 3. **Proposing** climbs the sample-averaged acquisition from the current
//!    best point (plus optional random restarts); the proposed radius is
//!    folded to `|r| mod R`.
//! 4. **Evaluating** converts the proposal to Euclidean coordinates, calls
//!    the objective once and appends the observation.
//!
//! Any error aborts the iteration before the dataset is touched.
//!
//! # Examples
//!
//! ```
//! use hypersphere::prelude::*;
//!
//! let mut optimizer = SphereOptimizer::builder(2)
//!     .search_radius(1.5)
//!     .n_samples(3)
//!     .n_thin(2)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! optimizer
//!     .optimize(3, &|x: &[f64]| {
//!         Ok::<_, Error>((x[0] - 0.3).powi(2) + (x[1] + 0.2).powi(2))
//!     })
//!     .unwrap();
//!
//! assert_eq!(optimizer.dataset().len(), 5);
//! assert_eq!(optimizer.phase(), LoopPhase::Terminated);
//! let best = optimizer.best().unwrap();
//! assert!(best.value <= 0.13 + 1e-12); // never worse than the center
//! ```

mod builder;
mod dataset;

use core::ops::ControlFlow;

pub use builder::SphereOptimizerBuilder;
pub use dataset::{Dataset, Observation};

use crate::acquisition::AcquisitionMaximizer;
use crate::error::{Error, Result};
use crate::gp::GpModel;
use crate::objective::Objective;
use crate::rng_util;
use crate::surrogate::{Inference, ParameterSample, SurrogateModel};
use crate::transform::{self, AxisOrder, DegeneratePolicy};

/// Where the loop currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopPhase {
    /// The initial design has not been evaluated.
    Initializing,
    /// A proposal is being evaluated.
    Evaluating,
    /// The surrogate is being fitted (also the resting state between
    /// iterations).
    Fitting,
    /// The acquisition is being maximized.
    Proposing,
    /// The run is over; no further iterations are accepted.
    Terminated,
}

/// Bayesian optimizer over a ball in hyperspherical coordinates.
///
/// Owns its dataset exclusively; iterations are strictly sequential.
pub struct SphereOptimizer<M = GpModel> {
    dim: usize,
    search_radius: f64,
    cube_half_side: f64,
    n_samples: usize,
    n_burnin: usize,
    n_thin: usize,
    n_restarts: usize,
    maximizer: AcquisitionMaximizer,
    axis_order: AxisOrder,
    degenerate_policy: DegeneratePolicy,
    model: M,
    rng: fastrand::Rng,
    dataset: Dataset,
    phase: LoopPhase,
    samples: Vec<ParameterSample>,
    iterations: usize,
}

impl SphereOptimizer<GpModel> {
    /// Creates a builder for a `dim`-dimensional search.
    #[must_use]
    pub fn builder(dim: usize) -> SphereOptimizerBuilder<GpModel> {
        SphereOptimizerBuilder::new(dim)
    }
}

impl<M: SurrogateModel> SphereOptimizer<M> {
    /// Search dimension `d`.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Radius `R` of the search ball.
    #[must_use]
    pub fn search_radius(&self) -> f64 {
        self.search_radius
    }

    /// Axis permutation applied before the spherical transform.
    #[must_use]
    pub fn axis_order(&self) -> &AxisOrder {
        &self.axis_order
    }

    /// The surrogate model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Current loop phase.
    #[must_use]
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Every observation so far, design points first.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The observation with the smallest value.
    #[must_use]
    pub fn best(&self) -> Option<&Observation> {
        self.dataset.best()
    }

    /// Number of completed proposal iterations.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Parameter samples from the most recent fit.
    #[must_use]
    pub fn posterior_samples(&self) -> &[ParameterSample] {
        &self.samples
    }

    /// The two design points: the center and `min(R/√d, half_side)·1`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn initial_design(&self) -> Vec<Vec<f64>> {
        let c = (self.search_radius / (self.dim as f64).sqrt()).min(self.cube_half_side);
        vec![vec![0.0; self.dim], vec![c; self.dim]]
    }

    /// Evaluates the initial design and records it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the design was already evaluated
    /// and [`Error::Objective`] if the objective fails or returns a
    /// non-finite value. Nothing is recorded on error.
    pub fn initialize<O: Objective + ?Sized>(&mut self, objective: &O) -> Result<()> {
        if self.phase != LoopPhase::Initializing {
            return Err(Error::InvalidConfig("initial design already evaluated"));
        }

        let design = self.initial_design();
        let values = design
            .iter()
            .map(|x| evaluate(objective, x))
            .collect::<Result<Vec<f64>>>()?;

        let mut spherical = transform::to_spherical_with_policy(
            &design,
            &self.axis_order,
            self.degenerate_policy,
            &mut self.rng,
        )?;
        transform::replace_nan(&mut spherical);

        for ((euclidean, spherical), value) in design.into_iter().zip(spherical).zip(values) {
            trace_info!(value, "design point evaluated");
            self.dataset.push(Observation {
                euclidean,
                spherical,
                value,
            });
        }
        self.phase = LoopPhase::Fitting;
        Ok(())
    }

    /// Runs one fit → propose → evaluate iteration and returns the new
    /// observation.
    ///
    /// On error the dataset is unchanged and the run is terminated, the same
    /// as in [`optimize`](Self::optimize). Calling `step` before
    /// [`initialize`](Self::initialize) is rejected without terminating.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] before [`initialize`](Self::initialize) or
    ///   after termination.
    /// - [`Error::Fit`] if the surrogate cannot be bound or sampled.
    /// - [`Error::Numerical`] if the acquisition ascent diverges.
    /// - [`Error::Objective`] if the objective fails or returns a non-finite
    ///   value.
    pub fn step<O: Objective + ?Sized>(&mut self, objective: &O) -> Result<&Observation> {
        if let Err(e) = self.iterate(objective) {
            trace_debug!(error = %e, "iteration failed");
            if self.phase != LoopPhase::Initializing {
                self.phase = LoopPhase::Terminated;
            }
            return Err(e);
        }
        self.dataset.last().ok_or(Error::NoObservations)
    }

    /// Runs the initial design (if pending) and then `n_iterations`
    /// iterations, after which the run is terminated.
    ///
    /// [`Objective::after_evaluation`] may stop the run early. Any error
    /// also terminates the run.
    ///
    /// # Errors
    ///
    /// See [`initialize`](Self::initialize) and [`step`](Self::step).
    pub fn optimize<O: Objective + ?Sized>(
        &mut self,
        n_iterations: usize,
        objective: &O,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("optimize", n_iterations, dim = self.dim).entered();

        if self.phase == LoopPhase::Terminated {
            return Err(Error::InvalidConfig("the optimization run has terminated"));
        }

        if self.phase == LoopPhase::Initializing {
            if let Err(e) = self.initialize(objective) {
                self.phase = LoopPhase::Terminated;
                return Err(e);
            }
            if self.should_stop(objective) {
                self.phase = LoopPhase::Terminated;
                return Ok(());
            }
        }

        for _ in 0..n_iterations {
            if let Err(e) = self.iterate(objective) {
                trace_debug!(error = %e, "iteration failed");
                self.phase = LoopPhase::Terminated;
                return Err(e);
            }
            if self.should_stop(objective) {
                break;
            }
        }

        self.phase = LoopPhase::Terminated;
        Ok(())
    }

    fn should_stop<O: Objective + ?Sized>(&self, objective: &O) -> bool {
        self.dataset.last().is_some_and(|latest| {
            matches!(
                objective.after_evaluation(&self.dataset, latest),
                ControlFlow::Break(())
            )
        })
    }

    fn iterate<O: Objective + ?Sized>(&mut self, objective: &O) -> Result<()> {
        match self.phase {
            LoopPhase::Initializing => {
                return Err(Error::InvalidConfig("initial design not evaluated yet"));
            }
            LoopPhase::Terminated => {
                return Err(Error::InvalidConfig("the optimization run has terminated"));
            }
            _ => {}
        }
        let previous_best = self.dataset.best_value();

        // Fitting
        self.phase = LoopPhase::Fitting;
        let bound = self
            .model
            .bind(&self.dataset.spherical_inputs(), &self.dataset.values())
            .map_err(Error::into_fit)?;
        let samples = bound
            .sample_posterior_from(
                self.samples.last(),
                self.n_samples,
                self.n_burnin,
                self.n_thin,
                &mut self.rng,
            )
            .map_err(Error::into_fit)?;
        trace_debug!(n_samples = samples.len(), "posterior sampled");

        // Proposing
        self.phase = LoopPhase::Proposing;
        let (reference, initial_guess) = match self.dataset.best() {
            Some(best) => (best.value, best.spherical.clone()),
            None => return Err(Error::NoObservations),
        };
        let starts = self.restart_points(initial_guess)?;
        let proposal =
            self.maximizer
                .propose_with_restarts(&bound, &samples, reference, &starts)?;
        let mut point = proposal.point;
        point[0] = point[0].abs() % self.search_radius;
        trace_debug!(acquisition = proposal.acquisition, radius = point[0], "proposal made");

        // Evaluating
        self.phase = LoopPhase::Evaluating;
        let euclidean = transform::to_euclidean(&[point], &self.axis_order)?
            .pop()
            .ok_or_else(|| Error::Numerical("empty transform result".to_string()))?;
        let value = evaluate(objective, &euclidean)?;
        let spherical = transform::to_spherical_with_policy(
            core::slice::from_ref(&euclidean),
            &self.axis_order,
            self.degenerate_policy,
            &mut self.rng,
        )?
        .pop()
        .ok_or_else(|| Error::Numerical("empty transform result".to_string()))?;

        self.dataset.push(Observation {
            euclidean,
            spherical,
            value,
        });
        self.samples = samples;
        self.iterations += 1;
        self.phase = LoopPhase::Fitting;

        trace_info!(iteration = self.iterations, value, "point evaluated");
        if previous_best.is_some_and(|b| value < b) {
            trace_info!(iteration = self.iterations, value, "new best value found");
        }
        Ok(())
    }

    /// The best point followed by `n_restarts - 1` uniform draws mapped from
    /// the unit cube.
    fn restart_points(&mut self, best: Vec<f64>) -> Result<Vec<Vec<f64>>> {
        let cube: Vec<Vec<f64>> = (1..self.n_restarts)
            .map(|_| {
                (0..self.dim)
                    .map(|_| rng_util::f64_range(&mut self.rng, 0.0, 1.0))
                    .collect()
            })
            .collect();
        let mut starts = Vec::with_capacity(self.n_restarts);
        starts.push(best);
        starts.extend(transform::from_unit_cube(&cube, self.search_radius)?);
        Ok(starts)
    }
}

/// Calls the objective once and rejects non-finite values.
fn evaluate<O: Objective + ?Sized>(objective: &O, x: &[f64]) -> Result<f64> {
    let value = objective
        .evaluate(x)
        .map_err(|e| Error::Objective(e.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::Objective(format!(
            "objective returned non-finite value {value}"
        )))
    }
}
