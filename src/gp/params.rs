use super::HALF_LN_2PI;
use crate::error::{Error, Result};
use crate::rng_util;
use crate::surrogate::ParameterSample;

/// Independent normal prior with hard box bounds on one parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Prior {
    pub(crate) mean: f64,
    pub(crate) std: f64,
    pub(crate) low: f64,
    pub(crate) high: f64,
}

impl Prior {
    fn log_density(&self, x: f64) -> f64 {
        if !(self.low..=self.high).contains(&x) {
            return f64::NEG_INFINITY;
        }
        let z = (x - self.mean) / self.std;
        -0.5 * z * z - self.std.ln() - HALF_LN_2PI
    }

    fn draw(&self, rng: &mut fastrand::Rng) -> f64 {
        (self.mean + self.std * rng_util::standard_normal(rng)).clamp(self.low, self.high)
    }
}

/// Log signal variance of the standardized outputs.
const LOG_AMP: Prior = Prior {
    mean: 0.0,
    std: 1.0,
    low: -6.0,
    high: 6.0,
};

/// Log ARD lengthscale, shared by every mapped input dimension.
const LOG_LENGTHSCALE: Prior = Prior {
    mean: 0.0,
    std: 1.0,
    low: -6.9,
    high: 4.6,
};

/// Constant prior mean of the standardized outputs.
const MEAN: Prior = Prior {
    mean: 0.0,
    std: 1.0,
    low: -10.0,
    high: 10.0,
};

/// Log observation noise variance; the lower bound is `ln 1e-4`.
const LOG_NOISE: Prior = Prior {
    mean: -6.0,
    std: 2.0,
    low: -9.210_340_371_976_182,
    high: 2.0,
};

/// Hyperparameters of the reference GP in named form.
///
/// The flat [`ParameterSample`] layout is
/// `[log_amp, log_ls_1, …, log_ls_m, mean, log_noise]`, `m` being the mapped
/// input dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct GpParams {
    /// Log signal variance.
    pub log_amp: f64,
    /// Log ARD lengthscales, one per mapped input dimension.
    pub log_lengthscales: Vec<f64>,
    /// Constant prior mean (standardized output scale).
    pub mean: f64,
    /// Log observation noise variance.
    pub log_noise: f64,
}

impl GpParams {
    /// Number of flat parameters for `mapped_dim` mapped inputs.
    #[must_use]
    pub fn n_params(mapped_dim: usize) -> usize {
        mapped_dim + 3
    }

    /// Prior mode: unit amplitude and lengthscales, zero mean, small noise.
    #[must_use]
    pub fn default_for(mapped_dim: usize) -> Self {
        Self {
            log_amp: LOG_AMP.mean,
            log_lengthscales: vec![LOG_LENGTHSCALE.mean; mapped_dim],
            mean: MEAN.mean,
            log_noise: LOG_NOISE.mean,
        }
    }

    /// Draws every parameter from its prior, clamped into its bounds.
    pub fn sample_prior(mapped_dim: usize, rng: &mut fastrand::Rng) -> Self {
        Self {
            log_amp: LOG_AMP.draw(rng),
            log_lengthscales: (0..mapped_dim).map(|_| LOG_LENGTHSCALE.draw(rng)).collect(),
            mean: MEAN.draw(rng),
            log_noise: LOG_NOISE.draw(rng),
        }
    }

    /// Unpacks a flat sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the sample length is not
    /// `mapped_dim + 3`.
    pub fn from_sample(sample: &ParameterSample, mapped_dim: usize) -> Result<Self> {
        let values = sample.as_slice();
        let expected = Self::n_params(mapped_dim);
        if values.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                got: values.len(),
            });
        }
        Ok(Self {
            log_amp: values[0],
            log_lengthscales: values[1..=mapped_dim].to_vec(),
            mean: values[mapped_dim + 1],
            log_noise: values[mapped_dim + 2],
        })
    }

    /// Packs into the flat layout.
    #[must_use]
    pub fn to_sample(&self) -> ParameterSample {
        let mut values = Vec::with_capacity(Self::n_params(self.log_lengthscales.len()));
        values.push(self.log_amp);
        values.extend_from_slice(&self.log_lengthscales);
        values.push(self.mean);
        values.push(self.log_noise);
        ParameterSample::new(values)
    }

    /// Sum of the independent prior log densities; `-∞` outside the bounds.
    #[must_use]
    pub fn log_prior(&self) -> f64 {
        LOG_AMP.log_density(self.log_amp)
            + self
                .log_lengthscales
                .iter()
                .map(|&l| LOG_LENGTHSCALE.log_density(l))
                .sum::<f64>()
            + MEAN.log_density(self.mean)
            + LOG_NOISE.log_density(self.log_noise)
    }

    /// Signal variance `exp(log_amp)`.
    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.log_amp.exp()
    }

    /// Lengthscales `exp(log_ls)`.
    #[must_use]
    pub fn lengthscales(&self) -> Vec<f64> {
        self.log_lengthscales.iter().map(|l| l.exp()).collect()
    }

    /// Noise variance `exp(log_noise)`.
    #[must_use]
    pub fn noise_variance(&self) -> f64 {
        self.log_noise.exp()
    }
}

/// Box bounds of every flat parameter, in layout order.
pub(crate) fn bounds(mapped_dim: usize) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(GpParams::n_params(mapped_dim));
    out.push((LOG_AMP.low, LOG_AMP.high));
    out.extend(core::iter::repeat_n(
        (LOG_LENGTHSCALE.low, LOG_LENGTHSCALE.high),
        mapped_dim,
    ));
    out.push((MEAN.low, MEAN.high));
    out.push((LOG_NOISE.low, LOG_NOISE.high));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_log_density_is_normal() {
        // N(0, 1) at its mode: −ln(2π)/2
        assert!((LOG_AMP.log_density(0.0) + 0.918_938_533_204_672_8).abs() < 1e-15);
        let wide = Prior {
            mean: 1.0,
            std: 2.0,
            low: -10.0,
            high: 10.0,
        };
        let expected = -0.5 - 2.0_f64.ln() - 0.918_938_533_204_672_8;
        assert!((wide.log_density(3.0) - expected).abs() < 1e-15);
        assert!(wide.log_density(11.0).is_infinite());
    }

    #[test]
    fn test_layout_round_trip() {
        let params = GpParams {
            log_amp: 0.5,
            log_lengthscales: vec![-1.0, 0.2, 1.5],
            mean: 0.1,
            log_noise: -5.0,
        };
        let sample = params.to_sample();
        assert_eq!(sample.as_slice(), &[0.5, -1.0, 0.2, 1.5, 0.1, -5.0]);
        assert_eq!(GpParams::from_sample(&sample, 3).unwrap(), params);
    }

    #[test]
    fn test_from_sample_length_check() {
        let sample = ParameterSample::new(vec![0.0; 4]);
        assert!(matches!(
            GpParams::from_sample(&sample, 2),
            Err(Error::DimensionMismatch {
                expected: 5,
                got: 4
            })
        ));
    }

    #[test]
    fn test_log_prior_out_of_bounds() {
        let mut params = GpParams::default_for(2);
        assert!(params.log_prior().is_finite());
        params.log_noise = -20.0;
        assert_eq!(params.log_prior(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_default_is_prior_mode() {
        let mode = GpParams::default_for(1);
        let mut shifted = mode.clone();
        shifted.log_amp += 0.3;
        assert!(mode.log_prior() > shifted.log_prior());
    }

    #[test]
    fn test_prior_draws_within_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        let bounds = bounds(2);
        for _ in 0..200 {
            let sample = GpParams::sample_prior(2, &mut rng).to_sample();
            for (v, (lo, hi)) in sample.as_slice().iter().zip(&bounds) {
                assert!((*lo..=*hi).contains(v));
            }
        }
    }
}
