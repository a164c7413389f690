//! Adam: first-order optimizer with momentum and per-coordinate scaling.
//!
//! Used for acquisition maximization (descending the negated acquisition)
//! and for the restart-based hyperparameter learning of the reference GP.
//!
//! ```text
//! m_t = β₁ m_{t-1} + (1 − β₁) g
//! v_t = β₂ v_{t-1} + (1 − β₂) g²
//! θ_t = θ_{t-1} − lr · √(1 − β₂ᵗ) / (1 − β₁ᵗ) · m_t / (√v_t + ε)
//! ```

/// Adam optimizer over a flat `f64` parameter vector.
#[derive(Clone, Debug)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    /// Creates an optimizer with the usual defaults `β₁ = 0.9`,
    /// `β₂ = 0.999`, `ε = 1e-8`.
    #[must_use]
    pub fn new(lr: f64) -> Self {
        Self::with_betas(lr, 0.9, 0.999, 1e-8)
    }

    /// Creates an optimizer with explicit moment decay rates.
    #[must_use]
    pub fn with_betas(lr: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Learning rate.
    #[must_use]
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn step_count(&self) -> i32 {
        self.t
    }

    /// Applies one descent step to `params` using gradient `grad`.
    ///
    /// Moment buffers are (re)initialized to zero whenever the parameter
    /// length changes.
    pub fn step(&mut self, params: &mut [f64], grad: &[f64]) {
        debug_assert_eq!(params.len(), grad.len());
        if self.m.len() != params.len() {
            self.m = vec![0.0; params.len()];
            self.v = vec![0.0; params.len()];
            self.t = 0;
        }
        self.t = self.t.saturating_add(1);

        // Bias correction folded into the step size
        let lr_t =
            self.lr * (1.0 - self.beta2.powi(self.t)).sqrt() / (1.0 - self.beta1.powi(self.t));

        for (i, (p, &g)) in params.iter_mut().zip(grad).enumerate() {
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * g;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * g * g;
            *p -= lr_t * self.m[i] / (self.v[i].sqrt() + self.epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.1);
        let mut x = [1.0, -1.0];
        adam.step(&mut x, &[3.0, -0.5]);
        // After bias correction the first step is lr · sign(g)
        assert!((x[0] - 0.9).abs() < 1e-6);
        assert!((x[1] + 0.9).abs() < 1e-6);
        assert_eq!(adam.step_count(), 1);
    }

    #[test]
    fn test_zero_gradient_does_not_move() {
        let mut adam = Adam::new(0.1);
        let mut x = [2.0];
        for _ in 0..10 {
            adam.step(&mut x, &[0.0]);
        }
        assert!((x[0] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::new(0.05);
        let mut x = [3.0, -4.0];
        for _ in 0..2000 {
            let grad = [2.0 * (x[0] - 1.0), 2.0 * (x[1] + 2.0)];
            adam.step(&mut x, &grad);
        }
        assert!((x[0] - 1.0).abs() < 5e-2, "x0 = {}", x[0]);
        assert!((x[1] + 2.0).abs() < 5e-2, "x1 = {}", x[1]);
    }

    #[test]
    fn test_resets_on_length_change() {
        let mut adam = Adam::new(0.1);
        let mut a = [0.0];
        adam.step(&mut a, &[1.0]);
        let mut b = [0.0, 0.0];
        adam.step(&mut b, &[1.0, 1.0]);
        assert_eq!(adam.step_count(), 1);
        assert!((b[0] + 0.1).abs() < 1e-6);
    }
}
