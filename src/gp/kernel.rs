use nalgebra::{DMatrix, DVector};

/// √5.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Matérn 5/2 kernel with ARD lengthscales.
///
/// `k(x1, x2) = σ² (1 + √5 r + 5/3 r²) exp(-√5 r)`
/// where `r = sqrt(Σ ((x1_i - x2_i) / l_i)²)`
pub(crate) fn matern52(x1: &[f64], x2: &[f64], lengthscales: &[f64], signal_var: f64) -> f64 {
    let r_sq = scaled_sq_dist(x1, x2, lengthscales);
    let r = r_sq.sqrt();
    let sqrt5_r = SQRT_5 * r;
    signal_var * (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * (-sqrt5_r).exp()
}

/// Kernel value and its gradient with respect to `x_star`.
///
/// `∂k/∂x*_j = -(5/3) σ² (1 + √5 r) exp(-√5 r) (x*_j - x_j) / l_j²`,
/// which is finite at `r = 0`.
pub(crate) fn matern52_with_gradient(
    x_star: &[f64],
    x: &[f64],
    lengthscales: &[f64],
    signal_var: f64,
) -> (f64, Vec<f64>) {
    let r_sq = scaled_sq_dist(x_star, x, lengthscales);
    let r = r_sq.sqrt();
    let sqrt5_r = SQRT_5 * r;
    let decay = (-sqrt5_r).exp();
    let value = signal_var * (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * decay;
    let factor = -5.0 / 3.0 * signal_var * (1.0 + sqrt5_r) * decay;
    let grad = x_star
        .iter()
        .zip(x)
        .zip(lengthscales)
        .map(|((a, b), l)| factor * (a - b) / (l * l))
        .collect();
    (value, grad)
}

fn scaled_sq_dist(x1: &[f64], x2: &[f64], lengthscales: &[f64]) -> f64 {
    x1.iter()
        .zip(x2)
        .zip(lengthscales)
        .map(|((a, b), l)| {
            let diff = (a - b) / l;
            diff * diff
        })
        .sum()
}

/// Build the kernel matrix `K + σ²I`.
pub(crate) fn kernel_matrix(
    x: &[Vec<f64>],
    lengthscales: &[f64],
    signal_var: f64,
    noise_var: f64,
) -> DMatrix<f64> {
    let n = x.len();
    DMatrix::from_fn(n, n, |i, j| {
        let k = matern52(&x[i], &x[j], lengthscales, signal_var);
        if i == j { k + noise_var } else { k }
    })
}

/// Compute the kernel vector k(x*, X) for a test point.
pub(crate) fn kernel_vector(
    x_star: &[f64],
    x_train: &[Vec<f64>],
    lengthscales: &[f64],
    signal_var: f64,
) -> DVector<f64> {
    DVector::from_fn(x_train.len(), |i, _| {
        matern52(x_star, &x_train[i], lengthscales, signal_var)
    })
}
