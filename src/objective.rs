//! The [`Objective`] trait defines what gets optimized.
//!
//! Closures of the form `Fn(&[f64]) -> Result<f64, E>` implement it
//! directly, so the common case needs no extra type:
//!
//! ```
//! use hypersphere::prelude::*;
//!
//! let mut optimizer = SphereOptimizer::builder(2).seed(1).build().unwrap();
//! optimizer
//!     .optimize(2, &|x: &[f64]| Ok::<_, Error>(x.iter().map(|v| v * v).sum()))
//!     .unwrap();
//! assert_eq!(optimizer.dataset().len(), 4);
//! ```
//!
//! For early stopping, implement [`Objective`] on a struct and override
//! [`after_evaluation`](Objective::after_evaluation):
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use hypersphere::prelude::*;
//!
//! struct StopBelow(f64);
//!
//! impl Objective for StopBelow {
//!     type Error = Error;
//!
//!     fn evaluate(&self, x: &[f64]) -> Result<f64> {
//!         Ok(x.iter().map(|v| (v - 0.1).powi(2)).sum())
//!     }
//!
//!     fn after_evaluation(&self, _dataset: &Dataset, latest: &Observation) -> ControlFlow<()> {
//!         if latest.value < self.0 {
//!             ControlFlow::Break(())
//!         } else {
//!             ControlFlow::Continue(())
//!         }
//!     }
//! }
//!
//! let mut optimizer = SphereOptimizer::builder(2).seed(3).build().unwrap();
//! optimizer.optimize(3, &StopBelow(1.0)).unwrap();
//! // Every evaluation is below 1.0 inside the unit ball, so the loop stops
//! // right after the design points
//! assert_eq!(optimizer.dataset().len(), 2);
//! ```

use core::ops::ControlFlow;

use crate::bo::{Dataset, Observation};

/// A black-box function to minimize over Euclidean points.
///
/// The only required method is [`evaluate`](Objective::evaluate). The
/// optional [`after_evaluation`](Objective::after_evaluation) hook stops
/// the loop early.
///
/// The loop calls the objective synchronously, once per iteration, and
/// never retries.
pub trait Objective {
    /// The error type returned by [`evaluate`](Objective::evaluate).
    type Error: ToString + 'static;

    /// Evaluates the objective at the Euclidean point `x`.
    ///
    /// # Errors
    ///
    /// Any error whose type implements `ToString`. The loop reports it as
    /// [`Error::Objective`](crate::Error::Objective) and aborts.
    fn evaluate(&self, x: &[f64]) -> Result<f64, Self::Error>;

    /// Called once after the initial design is recorded, then after every
    /// proposed point is evaluated and recorded.
    ///
    /// Return `ControlFlow::Break(())` to stop the loop; the run is then
    /// marked terminated.
    ///
    /// Default: always continues.
    fn after_evaluation(&self, _dataset: &Dataset, _latest: &Observation) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F, E> Objective for F
where
    F: Fn(&[f64]) -> Result<f64, E>,
    E: ToString + 'static,
{
    type Error = E;

    fn evaluate(&self, x: &[f64]) -> Result<f64, E> {
        self(x)
    }
}
