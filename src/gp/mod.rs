//! Reference Gaussian-process surrogate.
//!
//! Implements the [`SurrogateModel`] / [`Inference`] contracts with a GP
//! using a **Matérn 5/2 kernel** (ARD lengthscales), a constant mean and
//! Gaussian observation noise, optionally composed with an [`InputMap`].
//!
//! # Model
//!
//! Outputs are standardized (zero mean, unit variance) when the model is
//! bound to a dataset; predictions are returned on the original scale. The
//! predictive variance is that of the latent function (observation noise is
//! excluded).
//!
//! Hyperparameters live in a flat [`ParameterSample`] with layout
//! `[log_amp, log_ls_1, …, log_ls_m, mean, log_noise]` (see [`GpParams`]),
//! each with an independent normal prior and hard box bounds.
//!
//! # Inference
//!
//! - [`learn_parameters`](Inference::learn_parameters) runs Adam on the
//!   negative log posterior from the prior mode and from random prior
//!   draws, and returns the optima best first.
//! - [`sample_posterior`](Inference::sample_posterior) runs a
//!   coordinate-wise slice sampler.
//!
//! Cholesky factors are cached per sample, so repeated predictions during
//! acquisition maximization only pay for triangular solves.
//!
//! # Examples
//!
//! ```
//! use hypersphere::gp::GpModel;
//! use hypersphere::surrogate::{Surrogate, SurrogateModel};
//!
//! let inputs = vec![vec![0.0], vec![0.5], vec![1.0]];
//! let outputs = vec![1.0, 0.2, 0.8];
//!
//! let model = GpModel::new();
//! let gp = model.bind(&inputs, &outputs).unwrap();
//! let sample = model.default_sample(1);
//! let pred = gp.predict(&[vec![0.5]], &sample).unwrap();
//! assert!((pred[0].mean - 0.2).abs() < 0.05);
//! ```

mod input_map;
mod kernel;
mod params;
mod slice;

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::linalg::Cholesky;
use nalgebra::{DVector, Dyn};
use parking_lot::Mutex;

pub use input_map::{IdentityMap, InputMap, PeriodicMap};
pub use params::GpParams;

use self::kernel::{kernel_matrix, kernel_vector, matern52_with_gradient};
use self::slice::SliceSampler;
use crate::adam::Adam;
use crate::error::{Error, Result};
use crate::surrogate::{
    Inference, ParameterSample, Prediction, PredictionGradient, Surrogate, SurrogateModel,
};

/// Default diagonal jitter added to the kernel matrix.
const DEFAULT_JITTER: f64 = 1e-8;
/// Adam steps per hyperparameter-learning restart.
const LEARN_STEPS: usize = 100;
/// Adam learning rate for hyperparameter learning.
const LEARN_RATE: f64 = 0.05;
/// Central-difference step on the log posterior.
const LEARN_FD_STEP: f64 = 1e-5;
/// Restarts used to pick a sampler start when none is given.
const INIT_RESTARTS: usize = 3;
/// Factorizations kept per binding before the cache is flushed.
const MAX_CACHED_FACTORS: usize = 64;

/// `ln(2π) / 2`.
const HALF_LN_2PI: f64 = 0.918_938_533_204_672_8;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Unbound GP surrogate: kernel configuration without data.
///
/// # Examples
///
/// ```
/// use hypersphere::gp::GpModel;
///
/// let model = GpModel::periodic().jitter(1e-6);
/// assert_eq!(model.n_params(3), 7); // amp + 4 lengthscales + mean + noise
/// ```
#[derive(Clone, Debug)]
pub struct GpModel {
    input_map: Arc<dyn InputMap>,
    jitter: f64,
}

impl GpModel {
    /// GP on the raw inputs.
    #[must_use]
    pub fn new() -> Self {
        Self::with_input_map(IdentityMap)
    }

    /// GP whose kernel is periodic in the final input coordinate.
    #[must_use]
    pub fn periodic() -> Self {
        Self::with_input_map(PeriodicMap)
    }

    /// GP composed with a custom input map.
    #[must_use]
    pub fn with_input_map(input_map: impl InputMap + 'static) -> Self {
        Self {
            input_map: Arc::new(input_map),
            jitter: DEFAULT_JITTER,
        }
    }

    /// Sets the diagonal jitter added to the kernel matrix.
    ///
    /// Default: 1e-8.
    #[must_use]
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    /// The input map.
    #[must_use]
    pub fn input_map(&self) -> &dyn InputMap {
        self.input_map.as_ref()
    }

    /// Number of hyperparameters for inputs of dimension `input_dim`.
    #[must_use]
    pub fn n_params(&self, input_dim: usize) -> usize {
        GpParams::n_params(self.input_map.mapped_dim(input_dim))
    }

    /// The prior-mode parameter sample for inputs of dimension `input_dim`.
    #[must_use]
    pub fn default_sample(&self, input_dim: usize) -> ParameterSample {
        GpParams::default_for(self.input_map.mapped_dim(input_dim)).to_sample()
    }
}

impl Default for GpModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SurrogateModel for GpModel {
    type Bound = GpInference;

    #[allow(clippy::cast_precision_loss)]
    fn bind(&self, inputs: &[Vec<f64>], outputs: &[f64]) -> Result<GpInference> {
        let Some(first) = inputs.first() else {
            return Err(Error::NoObservations);
        };
        if inputs.len() != outputs.len() {
            return Err(Error::DimensionMismatch {
                expected: inputs.len(),
                got: outputs.len(),
            });
        }
        let input_dim = first.len();
        if input_dim == 0 {
            return Err(Error::DimensionMismatch {
                expected: 1,
                got: 0,
            });
        }
        for row in inputs {
            if row.len() != input_dim {
                return Err(Error::DimensionMismatch {
                    expected: input_dim,
                    got: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::Numerical("non-finite surrogate input".to_string()));
            }
        }
        if outputs.iter().any(|v| !v.is_finite()) {
            return Err(Error::Numerical("non-finite surrogate output".to_string()));
        }

        // Standardize y
        let n = outputs.len();
        let y_mean = outputs.iter().sum::<f64>() / n as f64;
        let y_var = if n > 1 {
            outputs.iter().map(|&y| (y - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            1.0
        };
        let y_scale = y_var.sqrt().max(1e-10);
        let targets = outputs.iter().map(|&y| (y - y_mean) / y_scale).collect();

        let mapped_inputs = inputs.iter().map(|x| self.input_map.map(x)).collect();

        Ok(GpInference {
            input_map: Arc::clone(&self.input_map),
            jitter: self.jitter,
            input_dim,
            mapped_dim: self.input_map.mapped_dim(input_dim),
            mapped_inputs,
            targets,
            y_mean,
            y_scale,
            factors: Mutex::new(HashMap::new()),
        })
    }
}

// ---------------------------------------------------------------------------
// Bound model
// ---------------------------------------------------------------------------

/// Cholesky factorization of `K + (σ²_n + jitter) I` for one sample.
struct Factor {
    params: GpParams,
    lengthscales: Vec<f64>,
    cholesky: Cholesky<f64, Dyn>,
    /// `(K + σ²I)^{-1} (y - m)`
    alpha: DVector<f64>,
}

/// A [`GpModel`] conditioned on a dataset.
pub struct GpInference {
    input_map: Arc<dyn InputMap>,
    jitter: f64,
    input_dim: usize,
    mapped_dim: usize,
    mapped_inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
    y_mean: f64,
    y_scale: f64,
    factors: Mutex<HashMap<Vec<u64>, Arc<Factor>>>,
}

impl GpInference {
    /// Number of training points.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.targets.len()
    }

    /// Dimension of the unmapped inputs.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Number of hyperparameters.
    #[must_use]
    pub fn n_params(&self) -> usize {
        GpParams::n_params(self.mapped_dim)
    }

    /// Negative log marginal likelihood of the standardized outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a sample of the wrong length
    /// and [`Error::Numerical`] if the kernel matrix is not positive
    /// definite.
    pub fn negative_log_marginal_likelihood(&self, sample: &ParameterSample) -> Result<f64> {
        let params = GpParams::from_sample(sample, self.mapped_dim)?;
        let factor = self.factorize(params)?;
        Ok(self.nlml(&factor))
    }

    /// Unnormalized log posterior: log prior minus the negative log marginal
    /// likelihood. `-∞` outside the prior bounds or when the kernel matrix
    /// cannot be factorized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a sample of the wrong length.
    pub fn log_posterior(&self, sample: &ParameterSample) -> Result<f64> {
        let params = GpParams::from_sample(sample, self.mapped_dim)?;
        Ok(self.log_posterior_of(params))
    }

    fn log_posterior_of(&self, params: GpParams) -> f64 {
        let prior = params.log_prior();
        if !prior.is_finite() {
            return f64::NEG_INFINITY;
        }
        match self.factorize(params) {
            Ok(factor) => {
                let value = prior - self.nlml(&factor);
                if value.is_nan() {
                    f64::NEG_INFINITY
                } else {
                    value
                }
            }
            Err(_) => f64::NEG_INFINITY,
        }
    }

    fn log_posterior_flat(&self, values: &[f64]) -> f64 {
        GpParams::from_sample(&ParameterSample::new(values.to_vec()), self.mapped_dim)
            .map_or(f64::NEG_INFINITY, |p| self.log_posterior_of(p))
    }

    #[allow(clippy::cast_precision_loss)]
    fn nlml(&self, factor: &Factor) -> f64 {
        let n = self.targets.len();
        let l = factor.cholesky.l_dirty();
        let half_log_det: f64 = (0..n).map(|i| l[(i, i)].ln()).sum();
        let centered = DVector::from_iterator(
            n,
            self.targets.iter().map(|y| y - factor.params.mean),
        );
        0.5 * centered.dot(&factor.alpha) + half_log_det + n as f64 * HALF_LN_2PI
    }

    fn factorize(&self, params: GpParams) -> Result<Factor> {
        let lengthscales = params.lengthscales();
        let k = kernel_matrix(
            &self.mapped_inputs,
            &lengthscales,
            params.amplitude(),
            params.noise_variance() + self.jitter,
        );
        let cholesky = Cholesky::new(k).ok_or_else(|| {
            Error::Numerical("kernel matrix is not positive definite".to_string())
        })?;
        let centered = DVector::from_iterator(
            self.targets.len(),
            self.targets.iter().map(|y| y - params.mean),
        );
        let alpha = cholesky.solve(&centered);
        Ok(Factor {
            params,
            lengthscales,
            cholesky,
            alpha,
        })
    }

    /// Cached factorization for `sample`.
    fn factor(&self, sample: &ParameterSample) -> Result<Arc<Factor>> {
        let key: Vec<u64> = sample.as_slice().iter().map(|v| v.to_bits()).collect();
        if let Some(factor) = self.factors.lock().get(&key) {
            return Ok(Arc::clone(factor));
        }

        let params = GpParams::from_sample(sample, self.mapped_dim)?;
        let factor = Arc::new(self.factorize(params)?);

        let mut cache = self.factors.lock();
        if cache.len() >= MAX_CACHED_FACTORS {
            cache.clear();
        }
        cache.insert(key, Arc::clone(&factor));
        Ok(factor)
    }

    fn check_point(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.input_dim {
            return Err(Error::DimensionMismatch {
                expected: self.input_dim,
                got: x.len(),
            });
        }
        Ok(())
    }

    /// Adam on the negative log posterior with central-difference gradients.
    ///
    /// Returns the best iterate seen, start included.
    fn descend(&self, start: Vec<f64>, bounds: &[(f64, f64)]) -> (f64, Vec<f64>) {
        let mut x = start;
        let mut adam = Adam::new(LEARN_RATE);
        let mut grad = vec![0.0; x.len()];
        let mut probe = x.clone();
        let mut best = (-self.log_posterior_flat(&x), x.clone());

        for _ in 0..LEARN_STEPS {
            let mut usable = true;
            for (i, g) in grad.iter_mut().enumerate() {
                probe[i] = x[i] + LEARN_FD_STEP;
                let plus = -self.log_posterior_flat(&probe);
                probe[i] = x[i] - LEARN_FD_STEP;
                let minus = -self.log_posterior_flat(&probe);
                probe[i] = x[i];
                *g = (plus - minus) / (2.0 * LEARN_FD_STEP);
                usable &= g.is_finite();
            }
            if !usable {
                break;
            }
            adam.step(&mut x, &grad);
            for (v, (lo, hi)) in x.iter_mut().zip(bounds) {
                *v = v.clamp(*lo, *hi);
            }
            probe.copy_from_slice(&x);

            let loss = -self.log_posterior_flat(&x);
            if loss < best.0 || !best.0.is_finite() {
                best = (loss, x.clone());
            }
        }

        best
    }
}

impl Surrogate for GpInference {
    fn predict(&self, points: &[Vec<f64>], sample: &ParameterSample) -> Result<Vec<Prediction>> {
        let factor = self.factor(sample)?;
        let amp = factor.params.amplitude();
        let var_scale = self.y_scale * self.y_scale;

        points
            .iter()
            .map(|x| {
                self.check_point(x)?;
                let z = self.input_map.map(x);
                let k_star = kernel_vector(&z, &self.mapped_inputs, &factor.lengthscales, amp);

                // Mean: m + k*^T α
                let mean = factor.params.mean + k_star.dot(&factor.alpha);
                // Variance: k(x*, x*) - k*^T (K + σ²I)^{-1} k*
                let v = factor.cholesky.solve(&k_star);
                let variance = (amp - k_star.dot(&v)).max(0.0);

                Ok(Prediction {
                    mean: self.y_mean + self.y_scale * mean,
                    variance: var_scale * variance,
                })
            })
            .collect()
    }

    fn predict_with_gradient(
        &self,
        point: &[f64],
        sample: &ParameterSample,
    ) -> Result<PredictionGradient> {
        self.check_point(point)?;
        let factor = self.factor(sample)?;
        let amp = factor.params.amplitude();
        let z = self.input_map.map(point);
        let n = self.mapped_inputs.len();
        let m = z.len();

        let mut k_star = DVector::zeros(n);
        let mut jacobian = Vec::with_capacity(n);
        for (i, xi) in self.mapped_inputs.iter().enumerate() {
            let (k, dk) = matern52_with_gradient(&z, xi, &factor.lengthscales, amp);
            k_star[i] = k;
            jacobian.push(dk);
        }

        let v = factor.cholesky.solve(&k_star);
        let raw_variance = amp - k_star.dot(&v);
        let clipped = raw_variance <= 0.0;

        let mut mean_grad_z = vec![0.0; m];
        let mut var_grad_z = vec![0.0; m];
        for (i, dk) in jacobian.iter().enumerate() {
            for ((mg, vg), d) in mean_grad_z.iter_mut().zip(var_grad_z.iter_mut()).zip(dk) {
                *mg += factor.alpha[i] * d;
                if !clipped {
                    *vg -= 2.0 * v[i] * d;
                }
            }
        }

        let var_scale = self.y_scale * self.y_scale;
        let mean_grad = self
            .input_map
            .pullback(point, &mean_grad_z)
            .into_iter()
            .map(|g| self.y_scale * g)
            .collect();
        let variance_grad = self
            .input_map
            .pullback(point, &var_grad_z)
            .into_iter()
            .map(|g| var_scale * g)
            .collect();

        Ok(PredictionGradient {
            mean: self.y_mean + self.y_scale * (factor.params.mean + k_star.dot(&factor.alpha)),
            variance: var_scale * raw_variance.max(0.0),
            mean_grad,
            variance_grad,
        })
    }
}

impl Inference for GpInference {
    fn learn_parameters(
        &self,
        restarts: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<ParameterSample>> {
        if restarts == 0 {
            return Err(Error::InvalidConfig("restarts must be at least 1"));
        }
        let bounds = params::bounds(self.mapped_dim);

        let mut optima: Vec<(f64, Vec<f64>)> = (0..restarts)
            .map(|r| {
                let start = if r == 0 {
                    GpParams::default_for(self.mapped_dim)
                } else {
                    GpParams::sample_prior(self.mapped_dim, rng)
                };
                self.descend(start.to_sample().into_inner(), &bounds)
            })
            .filter(|(loss, _)| loss.is_finite())
            .collect();

        if optima.is_empty() {
            return Err(Error::Fit(
                "no restart reached a finite log posterior".to_string(),
            ));
        }
        optima.sort_by(|a, b| a.0.total_cmp(&b.0));
        trace_debug!(
            restarts,
            best_loss = optima[0].0,
            "GP hyperparameters learned"
        );
        Ok(optima
            .into_iter()
            .map(|(_, x)| ParameterSample::new(x))
            .collect())
    }

    fn sample_posterior_from(
        &self,
        start: Option<&ParameterSample>,
        n_samples: usize,
        n_burnin: usize,
        n_thin: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<ParameterSample>> {
        if n_samples == 0 {
            return Err(Error::InvalidConfig("n_samples must be at least 1"));
        }
        if n_thin == 0 {
            return Err(Error::InvalidConfig("n_thin must be at least 1"));
        }

        let (mut x, mut current) = self.initial_state(start, rng)?;
        let bounds = params::bounds(self.mapped_dim);
        let sampler = SliceSampler::default();

        let mut samples = Vec::with_capacity(n_samples);
        let mut sweep = 0usize;
        while samples.len() < n_samples {
            current = sampler.sweep(&mut x, current, &bounds, rng, |p| {
                self.log_posterior_flat(p)
            });
            sweep += 1;
            if sweep > n_burnin && (sweep - n_burnin) % n_thin == 0 {
                samples.push(ParameterSample::new(x.clone()));
            }
        }

        trace_debug!(
            n_samples,
            sweeps = sweep,
            log_posterior = current,
            "GP posterior sampled"
        );
        Ok(samples)
    }
}

impl GpInference {
    /// Picks a sampler start with a finite log posterior.
    fn initial_state(
        &self,
        start: Option<&ParameterSample>,
        rng: &mut fastrand::Rng,
    ) -> Result<(Vec<f64>, f64)> {
        if let Some(sample) = start
            && sample.len() == self.n_params()
        {
            let value = self.log_posterior_flat(sample.as_slice());
            if value.is_finite() {
                return Ok((sample.as_slice().to_vec(), value));
            }
        }

        if let Ok(learned) = self.learn_parameters(INIT_RESTARTS, rng)
            && let Some(best) = learned.into_iter().next()
        {
            let value = self.log_posterior_flat(best.as_slice());
            if value.is_finite() {
                return Ok((best.into_inner(), value));
            }
        }

        let fallback = GpParams::default_for(self.mapped_dim).to_sample().into_inner();
        let value = self.log_posterior_flat(&fallback);
        if value.is_finite() {
            Ok((fallback, value))
        } else {
            Err(Error::Fit(
                "log posterior is not finite at any starting point".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_1d() -> (Vec<Vec<f64>>, Vec<f64>) {
        let inputs: Vec<Vec<f64>> = [0.0, 0.25, 0.5, 0.75, 1.0].iter().map(|&x| vec![x]).collect();
        let outputs = inputs.iter().map(|x| (3.0 * x[0]).sin()).collect();
        (inputs, outputs)
    }

    #[test]
    fn test_bind_rejects_bad_data() {
        let model = GpModel::new();
        assert!(matches!(model.bind(&[], &[]), Err(Error::NoObservations)));
        assert!(matches!(
            model.bind(&[vec![0.0]], &[1.0, 2.0]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            model.bind(&[vec![0.0], vec![0.0, 1.0]], &[1.0, 2.0]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            model.bind(&[vec![0.0]], &[f64::NAN]),
            Err(Error::Numerical(_))
        ));
    }

    #[test]
    fn test_interpolates_training_points() {
        let (inputs, outputs) = data_1d();
        let model = GpModel::new();
        let gp = model.bind(&inputs, &outputs).unwrap();
        let sample = model.default_sample(1);
        let preds = gp.predict(&inputs, &sample).unwrap();
        for (p, y) in preds.iter().zip(&outputs) {
            assert!((p.mean - y).abs() < 0.05, "{} vs {y}", p.mean);
            assert!(p.variance < 0.05);
        }
    }

    #[test]
    fn test_variance_grows_away_from_data() {
        let (inputs, outputs) = data_1d();
        let model = GpModel::new();
        let gp = model.bind(&inputs, &outputs).unwrap();
        let sample = model.default_sample(1);
        let near = gp.predict(&[vec![0.5]], &sample).unwrap()[0];
        let far = gp.predict(&[vec![6.0]], &sample).unwrap()[0];
        assert!(far.variance > near.variance);
        assert!(far.variance > 0.0);
    }

    #[test]
    fn test_prediction_dimension_check() {
        let (inputs, outputs) = data_1d();
        let model = GpModel::new();
        let gp = model.bind(&inputs, &outputs).unwrap();
        let result = gp.predict(&[vec![0.1, 0.2]], &model.default_sample(1));
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 1,
                got: 2
            })
        ));
        let result = gp.predict(&[vec![0.1]], &ParameterSample::new(vec![0.0]));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_analytic_gradient_matches_finite_difference() {
        let inputs = vec![
            vec![0.2, 0.5, 1.0],
            vec![0.8, 1.5, 4.0],
            vec![0.5, 2.5, 2.0],
            vec![0.9, 0.3, 5.5],
        ];
        let outputs = vec![0.3, -1.0, 0.5, 2.0];
        let model = GpModel::periodic();
        let gp = model.bind(&inputs, &outputs).unwrap();
        let sample = model.default_sample(3);

        let point = [0.6, 1.2, 3.0];
        let g = gp.predict_with_gradient(&point, &sample).unwrap();
        let center = gp.predict(&[point.to_vec()], &sample).unwrap()[0];
        assert!((g.mean - center.mean).abs() < 1e-10);
        assert!((g.variance - center.variance).abs() < 1e-10);

        let h = 1e-6;
        for (j, (gm, gv)) in g.mean_grad.iter().zip(&g.variance_grad).enumerate() {
            let mut plus = point.to_vec();
            plus[j] += h;
            let mut minus = point.to_vec();
            minus[j] -= h;
            let preds = gp.predict(&[plus, minus], &sample).unwrap();
            let dm = (preds[0].mean - preds[1].mean) / (2.0 * h);
            let dv = (preds[0].variance - preds[1].variance) / (2.0 * h);
            assert!((gm - dm).abs() < 1e-4, "mean dim {j}: {gm} vs {dm}");
            assert!((gv - dv).abs() < 1e-4, "variance dim {j}: {gv} vs {dv}");
        }
    }

    #[test]
    fn test_periodic_model_wraps_final_angle() {
        let inputs = vec![vec![0.5, 0.1], vec![0.7, 3.0], vec![0.2, 5.0]];
        let outputs = vec![1.0, 0.0, -1.0];
        let model = GpModel::periodic();
        let gp = model.bind(&inputs, &outputs).unwrap();
        let sample = model.default_sample(2);
        let preds = gp
            .predict(
                &[vec![0.4, 1.0], vec![0.4, 1.0 + core::f64::consts::TAU]],
                &sample,
            )
            .unwrap();
        assert!((preds[0].mean - preds[1].mean).abs() < 1e-9);
        assert!((preds[0].variance - preds[1].variance).abs() < 1e-9);
    }

    #[test]
    fn test_learned_parameters_sorted_best_first() {
        let (inputs, outputs) = data_1d();
        let gp = GpModel::new().bind(&inputs, &outputs).unwrap();
        let mut rng = fastrand::Rng::with_seed(5);
        let learned = gp.learn_parameters(3, &mut rng).unwrap();
        assert!(!learned.is_empty());
        let scores: Vec<f64> = learned
            .iter()
            .map(|s| gp.log_posterior(s).unwrap())
            .collect();
        assert!(scores.iter().all(|s| s.is_finite()));
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        // Learning should not end worse than the prior mode it starts from
        let default = gp.log_posterior(&GpModel::new().default_sample(1)).unwrap();
        assert!(scores[0] >= default - 1e-6);
    }

    #[test]
    fn test_learn_requires_restart() {
        let (inputs, outputs) = data_1d();
        let gp = GpModel::new().bind(&inputs, &outputs).unwrap();
        let mut rng = fastrand::Rng::with_seed(0);
        assert!(matches!(
            gp.learn_parameters(0, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_posterior_samples_in_bounds() {
        let (inputs, outputs) = data_1d();
        let model = GpModel::new();
        let gp = model.bind(&inputs, &outputs).unwrap();
        let mut rng = fastrand::Rng::with_seed(17);
        let start = model.default_sample(1);
        let samples = gp
            .sample_posterior_from(Some(&start), 4, 2, 3, &mut rng)
            .unwrap();
        assert_eq!(samples.len(), 4);
        let bounds = params::bounds(1);
        for s in &samples {
            assert_eq!(s.len(), gp.n_params());
            assert!(gp.log_posterior(s).unwrap().is_finite());
            for (v, (lo, hi)) in s.as_slice().iter().zip(&bounds) {
                assert!((*lo..=*hi).contains(v));
            }
        }
    }

    #[test]
    fn test_posterior_rejects_zero_thin() {
        let (inputs, outputs) = data_1d();
        let gp = GpModel::new().bind(&inputs, &outputs).unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(matches!(
            gp.sample_posterior(3, 0, 0, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            gp.sample_posterior(0, 0, 1, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_observation() {
        let model = GpModel::new();
        let gp = model.bind(&[vec![0.3]], &[2.0]).unwrap();
        let pred = gp.predict(&[vec![0.3]], &model.default_sample(1)).unwrap()[0];
        assert!((pred.mean - 2.0).abs() < 0.05);
    }
}
