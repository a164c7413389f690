use super::{Dataset, LoopPhase, SphereOptimizer};
use crate::acquisition::{AcquisitionFunction, AcquisitionMaximizerBuilder};
use crate::error::{Error, Result};
use crate::gp::GpModel;
use crate::surrogate::SurrogateModel;
use crate::transform::{AxisOrder, DegeneratePolicy};

/// Default search-ball radius.
const DEFAULT_SEARCH_RADIUS: f64 = 1.0;
/// Default half side length of the cube bounding the initial design.
const DEFAULT_CUBE_HALF_SIDE: f64 = 1.0;
/// Default number of posterior samples per iteration.
const DEFAULT_N_SAMPLES: usize = 10;
/// Default number of discarded sampler sweeps.
const DEFAULT_N_BURNIN: usize = 0;
/// Default sweeps between kept samples.
const DEFAULT_N_THIN: usize = 10;
/// Default number of acquisition ascents per iteration.
const DEFAULT_N_RESTARTS: usize = 1;

/// A builder for constructing [`SphereOptimizer`] instances.
///
/// Created via [`SphereOptimizer::builder()`].
///
/// # Defaults
///
/// | Option | Default | Description |
/// |--------|---------|-------------|
/// | `search_radius` | 1.0 | Radius `R` of the search ball; proposed radii are folded into `[0, R)` |
/// | `cube_half_side` | 1.0 | Bounds the diagonal design point `min(R/√d, half_side)·1` |
/// | `n_samples` | 10 | Posterior samples averaged by the acquisition |
/// | `n_burnin` | 0 | Sampler sweeps discarded before the first kept sample |
/// | `n_thin` | 10 | Sampler sweeps between kept samples |
/// | `n_restarts` | 1 | Acquisition ascents; extra starts are uniform in the unit cube |
/// | `steps` | 100 | Adam steps per ascent |
/// | `learning_rate` | 0.01 | Adam learning rate |
/// | `acquisition` | [`ExpectedImprovement`](crate::acquisition::ExpectedImprovement) | Acquisition function |
/// | `axis_order` | identity | Axis permutation applied before the spherical transform |
/// | `degenerate_policy` | [`FirstCanonical`](DegeneratePolicy::FirstCanonical) | Angles for zero-radius points |
/// | `seed` | random | RNG seed for reproducibility |
/// | `model` | [`GpModel::periodic()`] | Surrogate model |
///
/// # Examples
///
/// ```
/// use hypersphere::acquisition::LowerConfidenceBound;
/// use hypersphere::prelude::*;
///
/// let optimizer = SphereOptimizer::builder(3)
///     .search_radius(2.0)
///     .n_samples(5)
///     .n_restarts(3)
///     .acquisition(LowerConfidenceBound { kappa: 1.5 })
///     .seed(42)
///     .build()
///     .unwrap();
/// assert_eq!(optimizer.dim(), 3);
/// assert_eq!(optimizer.phase(), LoopPhase::Initializing);
/// ```
pub struct SphereOptimizerBuilder<M = GpModel> {
    dim: usize,
    search_radius: Option<f64>,
    cube_half_side: Option<f64>,
    n_samples: Option<usize>,
    n_burnin: Option<usize>,
    n_thin: Option<usize>,
    n_restarts: Option<usize>,
    maximizer: AcquisitionMaximizerBuilder,
    axis_order: Option<AxisOrder>,
    shuffle_axes: bool,
    degenerate_policy: Option<DegeneratePolicy>,
    seed: Option<u64>,
    model: M,
}

impl SphereOptimizerBuilder<GpModel> {
    pub(super) fn new(dim: usize) -> Self {
        Self {
            dim,
            search_radius: None,
            cube_half_side: None,
            n_samples: None,
            n_burnin: None,
            n_thin: None,
            n_restarts: None,
            maximizer: AcquisitionMaximizerBuilder::new(),
            axis_order: None,
            shuffle_axes: false,
            degenerate_policy: None,
            seed: None,
            model: GpModel::periodic(),
        }
    }
}

impl<M: SurrogateModel> SphereOptimizerBuilder<M> {
    /// Sets the radius of the search ball.
    ///
    /// Default: 1.0.
    #[must_use]
    pub fn search_radius(mut self, radius: f64) -> Self {
        self.search_radius = Some(radius);
        self
    }

    /// Sets the half side length of the cube bounding the initial design.
    ///
    /// Default: 1.0.
    #[must_use]
    pub fn cube_half_side(mut self, half_side: f64) -> Self {
        self.cube_half_side = Some(half_side);
        self
    }

    /// Sets the number of posterior samples drawn per iteration.
    ///
    /// Default: 10.
    #[must_use]
    pub fn n_samples(mut self, n: usize) -> Self {
        self.n_samples = Some(n);
        self
    }

    /// Sets the number of discarded sampler sweeps.
    ///
    /// Default: 0.
    #[must_use]
    pub fn n_burnin(mut self, n: usize) -> Self {
        self.n_burnin = Some(n);
        self
    }

    /// Sets the number of sampler sweeps between kept samples.
    ///
    /// Default: 10.
    #[must_use]
    pub fn n_thin(mut self, n: usize) -> Self {
        self.n_thin = Some(n);
        self
    }

    /// Sets the number of acquisition ascents per iteration.
    ///
    /// The first always starts at the current best observation.
    ///
    /// Default: 1.
    #[must_use]
    pub fn n_restarts(mut self, n: usize) -> Self {
        self.n_restarts = Some(n);
        self
    }

    /// Sets the number of Adam steps per ascent.
    ///
    /// Default: 100.
    #[must_use]
    pub fn steps(mut self, steps: usize) -> Self {
        self.maximizer = self.maximizer.steps(steps);
        self
    }

    /// Sets the Adam learning rate of the ascent.
    ///
    /// Default: 0.01.
    #[must_use]
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.maximizer = self.maximizer.learning_rate(lr);
        self
    }

    /// Sets the acquisition function.
    ///
    /// Default: [`ExpectedImprovement`](crate::acquisition::ExpectedImprovement).
    #[must_use]
    pub fn acquisition(mut self, acquisition: impl AcquisitionFunction + 'static) -> Self {
        self.maximizer = self.maximizer.acquisition(acquisition);
        self
    }

    /// Sets an explicit axis permutation.
    ///
    /// Default: identity.
    #[must_use]
    pub fn axis_order(mut self, order: AxisOrder) -> Self {
        self.axis_order = Some(order);
        self.shuffle_axes = false;
        self
    }

    /// Draws a random axis permutation from the optimizer's RNG at build
    /// time.
    #[must_use]
    pub fn shuffle_axes(mut self) -> Self {
        self.axis_order = None;
        self.shuffle_axes = true;
        self
    }

    /// Sets how zero-radius points get their angles.
    ///
    /// Default: [`DegeneratePolicy::FirstCanonical`].
    #[must_use]
    pub fn degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = Some(policy);
        self
    }

    /// Sets the RNG seed.
    ///
    /// Default: random.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the surrogate model.
    ///
    /// Default: [`GpModel::periodic()`].
    #[must_use]
    pub fn model<N: SurrogateModel>(self, model: N) -> SphereOptimizerBuilder<N> {
        SphereOptimizerBuilder {
            dim: self.dim,
            search_radius: self.search_radius,
            cube_half_side: self.cube_half_side,
            n_samples: self.n_samples,
            n_burnin: self.n_burnin,
            n_thin: self.n_thin,
            n_restarts: self.n_restarts,
            maximizer: self.maximizer,
            axis_order: self.axis_order,
            shuffle_axes: self.shuffle_axes,
            degenerate_policy: self.degenerate_policy,
            seed: self.seed,
            model,
        }
    }

    /// Builds the [`SphereOptimizer`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] for `dim == 0`, zero `n_samples`, `n_thin`
    ///   or `n_restarts`, or a non-positive learning rate.
    /// - [`Error::InvalidRadius`] for a search radius or cube half side that
    ///   is not positive and finite.
    /// - [`Error::DimensionMismatch`] if the axis order does not have `dim`
    ///   axes.
    pub fn build(self) -> Result<SphereOptimizer<M>> {
        if self.dim == 0 {
            return Err(Error::InvalidConfig("dimension must be at least 1"));
        }
        let search_radius = positive(self.search_radius.unwrap_or(DEFAULT_SEARCH_RADIUS))?;
        let cube_half_side = positive(self.cube_half_side.unwrap_or(DEFAULT_CUBE_HALF_SIDE))?;

        let n_samples = self.n_samples.unwrap_or(DEFAULT_N_SAMPLES);
        if n_samples == 0 {
            return Err(Error::InvalidConfig("n_samples must be at least 1"));
        }
        let n_thin = self.n_thin.unwrap_or(DEFAULT_N_THIN);
        if n_thin == 0 {
            return Err(Error::InvalidConfig("n_thin must be at least 1"));
        }
        let n_restarts = self.n_restarts.unwrap_or(DEFAULT_N_RESTARTS);
        if n_restarts == 0 {
            return Err(Error::InvalidConfig("n_restarts must be at least 1"));
        }

        let maximizer = self.maximizer.build()?;
        let mut rng = self
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        let axis_order = match self.axis_order {
            Some(order) if order.dim() != self.dim => {
                return Err(Error::DimensionMismatch {
                    expected: self.dim,
                    got: order.dim(),
                });
            }
            Some(order) => order,
            None if self.shuffle_axes => AxisOrder::shuffled(self.dim, &mut rng),
            None => AxisOrder::identity(self.dim),
        };

        Ok(SphereOptimizer {
            dim: self.dim,
            search_radius,
            cube_half_side,
            n_samples,
            n_burnin: self.n_burnin.unwrap_or(DEFAULT_N_BURNIN),
            n_thin,
            n_restarts,
            maximizer,
            axis_order,
            degenerate_policy: self.degenerate_policy.unwrap_or_default(),
            model: self.model,
            rng,
            dataset: Dataset::new(),
            phase: LoopPhase::Initializing,
            samples: Vec::new(),
            iterations: 0,
        })
    }
}

fn positive(radius: f64) -> Result<f64> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(Error::InvalidRadius(radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opt = SphereOptimizerBuilder::new(2).seed(0).build().unwrap();
        assert_eq!(opt.dim(), 2);
        assert!((opt.search_radius() - 1.0).abs() < f64::EPSILON);
        assert!(opt.axis_order().is_identity());
        assert_eq!(opt.phase(), LoopPhase::Initializing);
        assert!(opt.dataset().is_empty());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            SphereOptimizerBuilder::new(0).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SphereOptimizerBuilder::new(2).search_radius(-1.0).build(),
            Err(Error::InvalidRadius(_))
        ));
        assert!(matches!(
            SphereOptimizerBuilder::new(2).cube_half_side(f64::NAN).build(),
            Err(Error::InvalidRadius(_))
        ));
        assert!(matches!(
            SphereOptimizerBuilder::new(2).n_thin(0).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SphereOptimizerBuilder::new(2).n_restarts(0).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SphereOptimizerBuilder::new(2).learning_rate(-0.1).build(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_axis_order_dimension_checked() {
        let result = SphereOptimizerBuilder::new(3)
            .axis_order(AxisOrder::identity(2))
            .build();
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn test_shuffled_axes_reproducible() {
        let a = SphereOptimizerBuilder::new(5)
            .shuffle_axes()
            .seed(9)
            .build()
            .unwrap();
        let b = SphereOptimizerBuilder::new(5)
            .shuffle_axes()
            .seed(9)
            .build()
            .unwrap();
        assert_eq!(a.axis_order(), b.axis_order());
        assert_eq!(a.axis_order().dim(), 5);
    }
}
