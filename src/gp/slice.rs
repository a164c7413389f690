//! Coordinate-wise univariate slice sampling (Neal, 2003).

/// Slice sampler with stepping out and shrinkage.
///
/// Both loops are bounded: stepping out expands at most `max_steps_out`
/// widths and shrinkage tries at most `max_shrink` points. When shrinkage
/// runs out the coordinate keeps its current value.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SliceSampler {
    width: f64,
    max_steps_out: usize,
    max_shrink: usize,
}

impl Default for SliceSampler {
    fn default() -> Self {
        Self {
            width: 1.0,
            max_steps_out: 16,
            max_shrink: 64,
        }
    }
}

impl SliceSampler {
    /// Updates every coordinate of `x` once, in order.
    ///
    /// `log_density` must be finite at `x` on entry, with that value passed
    /// as `current`. Returns the log density at the updated `x`. Proposals
    /// never leave `bounds`.
    pub(crate) fn sweep<F>(
        &self,
        x: &mut [f64],
        current: f64,
        bounds: &[(f64, f64)],
        rng: &mut fastrand::Rng,
        mut log_density: F,
    ) -> f64
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut current = current;
        let mut scratch = x.to_vec();

        for (i, xi) in x.iter_mut().enumerate() {
            let (low, high) = bounds.get(i).copied().unwrap_or((f64::MIN, f64::MAX));
            let x0 = *xi;
            let level = current + (1.0 - rng.f64()).ln();

            let mut at = |v: f64, scratch: &mut [f64]| {
                scratch[i] = v;
                log_density(scratch)
            };

            // Randomly placed initial interval, then step out
            let mut left = x0 - self.width * rng.f64();
            let mut right = left + self.width;
            let mut steps_left = rng.usize(..=self.max_steps_out);
            let mut steps_right = self.max_steps_out - steps_left;
            while steps_left > 0 && left > low && at(left, &mut scratch) > level {
                left -= self.width;
                steps_left -= 1;
            }
            while steps_right > 0 && right < high && at(right, &mut scratch) > level {
                right += self.width;
                steps_right -= 1;
            }
            left = left.max(low);
            right = right.min(high);

            let mut accepted = None;
            for _ in 0..self.max_shrink {
                let proposal = left + rng.f64() * (right - left);
                let value = at(proposal, &mut scratch);
                if value > level {
                    accepted = Some((proposal, value));
                    break;
                }
                if proposal < x0 {
                    left = proposal;
                } else {
                    right = proposal;
                }
            }

            match accepted {
                Some((v, value)) => {
                    *xi = v;
                    scratch[i] = v;
                    current = value;
                }
                None => scratch[i] = x0,
            }
        }

        current
    }
}
