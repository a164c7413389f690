#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Bayesian optimization over hyperspherical coordinates. Points of a search
//! ball are rewritten as `[r, φ₁, …, φ_{d-1}]`, a Gaussian-process surrogate
//! is fitted in that space, and the next point is chosen by gradient ascent
//! on an acquisition function averaged over posterior hyperparameter
//! samples.
//!
//! # Getting Started
//!
//! ```
//! use hypersphere::prelude::*;
//!
//! let mut optimizer = SphereOptimizer::builder(2)
//!     .n_samples(4)
//!     .n_thin(2)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! optimizer
//!     .optimize(5, &|x: &[f64]| {
//!         Ok::<_, Error>((x[0] - 0.2).powi(2) + (x[1] - 0.1).powi(2))
//!     })
//!     .unwrap();
//!
//! let best = optimizer.best().unwrap();
//! println!("x = {:?}, f(x) = {:.4}", best.euclidean, best.value);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`SphereOptimizer`] | Drive the loop: initial design, fit, propose, evaluate. |
//! | [`Objective`] | The black-box function being minimized. |
//! | [`transform`] | Euclidean ↔ spherical ↔ unit-cube conversions with an [`AxisOrder`](transform::AxisOrder). |
//! | [`AcquisitionFunction`](acquisition::AcquisitionFunction) | Scores a predictive distribution: Expected Improvement, Probability of Improvement, Lower Confidence Bound. |
//! | [`Surrogate`](surrogate::Surrogate) / [`Inference`](surrogate::Inference) | Contracts for the surrogate model and its hyperparameter posterior. |
//! | [`GpModel`](gp::GpModel) | Reference Matérn 5/2 GP with slice-sampled hyperparameters. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on observations, datasets, parameter samples and enums | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key optimization points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
pub mod adam;
pub mod bo;
mod error;
pub mod gp;
pub mod objective;
mod rng_util;
pub mod surrogate;
pub mod transform;

pub use bo::{Dataset, LoopPhase, Observation, SphereOptimizer, SphereOptimizerBuilder};
pub use error::{Error, Result};
pub use objective::Objective;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use hypersphere::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::{
        AcquisitionFunction, ExpectedImprovement, LowerConfidenceBound, ProbabilityOfImprovement,
    };
    pub use crate::bo::{Dataset, LoopPhase, Observation, SphereOptimizer, SphereOptimizerBuilder};
    pub use crate::error::{Error, Result};
    pub use crate::gp::{GpModel, IdentityMap, InputMap, PeriodicMap};
    pub use crate::objective::Objective;
    pub use crate::surrogate::{Inference, ParameterSample, Surrogate, SurrogateModel};
    pub use crate::transform::{AxisOrder, DegeneratePolicy};
}
