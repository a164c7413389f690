use core::fmt::Debug;

/// Feature map applied to surrogate inputs before the kernel.
///
/// The GP sees `map(x)`; gradients with respect to the mapped point are
/// pulled back through [`pullback`](InputMap::pullback).
pub trait InputMap: Debug + Send + Sync {
    /// Dimension of `map(x)` for inputs of dimension `input_dim`.
    fn mapped_dim(&self, input_dim: usize) -> usize;

    /// Returns `true` if the map leaves inputs unchanged.
    fn is_identity(&self) -> bool {
        false
    }

    /// Maps one input point.
    fn map(&self, x: &[f64]) -> Vec<f64>;

    /// Converts a gradient with respect to `map(x)` into one with respect
    /// to `x`.
    fn pullback(&self, x: &[f64], mapped_grad: &[f64]) -> Vec<f64>;
}

/// The no-op map.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityMap;

impl InputMap for IdentityMap {
    fn mapped_dim(&self, input_dim: usize) -> usize {
        input_dim
    }

    fn is_identity(&self) -> bool {
        true
    }

    fn map(&self, x: &[f64]) -> Vec<f64> {
        x.to_vec()
    }

    fn pullback(&self, _x: &[f64], mapped_grad: &[f64]) -> Vec<f64> {
        mapped_grad.to_vec()
    }
}

/// Replaces the final coordinate `t` by `(cos t, sin t)`.
///
/// Makes the kernel `2π`-periodic in the final spherical angle. Inputs with
/// fewer than two coordinates carry only a radius and pass through
/// unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodicMap;

impl InputMap for PeriodicMap {
    fn mapped_dim(&self, input_dim: usize) -> usize {
        if input_dim < 2 { input_dim } else { input_dim + 1 }
    }

    fn map(&self, x: &[f64]) -> Vec<f64> {
        let Some((&t, head)) = x.split_last() else {
            return Vec::new();
        };
        if head.is_empty() {
            return x.to_vec();
        }
        let mut out = Vec::with_capacity(x.len() + 1);
        out.extend_from_slice(head);
        out.push(t.cos());
        out.push(t.sin());
        out
    }

    fn pullback(&self, x: &[f64], mapped_grad: &[f64]) -> Vec<f64> {
        if x.len() < 2 {
            return mapped_grad.to_vec();
        }
        let d = x.len();
        let t = x[d - 1];
        let mut out = mapped_grad[..d - 1].to_vec();
        out.push(-t.sin() * mapped_grad[d - 1] + t.cos() * mapped_grad[d]);
        out
    }
}
