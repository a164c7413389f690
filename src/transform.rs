//! Euclidean ↔ hyperspherical coordinate transforms.
//!
//! A Euclidean point `x ∈ ℝ^d` is written as `[r, φ₁, …, φ_{d-1}]` where
//! `r = ‖x‖`, the interior angles `φ₁ … φ_{d-2}` lie in `[0, π]` and the
//! final angle `φ_{d-1}` lies in `[0, 2π)`. Before the conversion the
//! coordinates are permuted by an [`AxisOrder`], which decides which
//! Euclidean axis feeds which angular slot.
//!
//! ```text
//! x₀ = r cos φ₁
//! x₁ = r sin φ₁ cos φ₂
//! …
//! x_{d-2} = r sin φ₁ … sin φ_{d-2} cos φ_{d-1}
//! x_{d-1} = r sin φ₁ … sin φ_{d-2} sin φ_{d-1}
//! ```
//!
//! # Degenerate points
//!
//! At `r = 0` every angle is undefined. [`to_spherical`] resolves this with a
//! [`DegeneratePolicy`]: by default the first zero-radius row of a batch gets
//! the canonical direction (every angle `π/2`) and every further zero-radius
//! row gets uniformly random angles, so a batch of origin points does not
//! collapse onto one direction. These rows are the only non-deterministic
//! part of the transform.
//!
//! When `r > 0` but a trailing block of coordinates is zero, the angles that
//! only describe that block are set to `0`; they multiply a vanishing
//! `sin` factor, so the round trip stays exact.
//!
//! # Unit cube
//!
//! [`to_unit_cube`] / [`from_unit_cube`] map spherical points into `[0, 1]^d`
//! for box-constrained search:
//!
//! | Slot | Spherical | Cube |
//! |------|-----------|------|
//! | radius | `r ∈ [0, R]` | `u = acos(1 − 2r/R) / π` |
//! | interior angle | `φ ∈ [0, π]` | `φ / π` |
//! | final angle | `φ ∈ [0, 2π)` | `φ / 2π` |
//!
//! The radius map `r = R (1 − cos πu) / 2` concentrates resolution near the
//! center and near the boundary.
//!
//! # One dimension
//!
//! With `d = 1` there are no angles and the spherical point is `[r]`. The
//! sign of `x` is not representable, so only the half-line `x ≥ 0` round
//! trips.
//!
//! # Examples
//!
//! ```
//! use hypersphere::transform::{AxisOrder, to_euclidean, to_spherical};
//!
//! let order = AxisOrder::identity(3);
//! let mut rng = fastrand::Rng::with_seed(7);
//! let x = vec![vec![1.0, -2.0, 0.5]];
//!
//! let rphi = to_spherical(&x, &order, &mut rng).unwrap();
//! let back = to_euclidean(&rphi, &order).unwrap();
//! for (a, b) in x[0].iter().zip(&back[0]) {
//!     assert!((a - b).abs() < 1e-12);
//! }
//! ```

use core::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::{Error, Result};
use crate::rng_util;

/// A permutation of the Euclidean axes applied before the spherical
/// conversion.
///
/// Slot `i` of the shuffled vector reads axis `order[i]` of the original.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisOrder {
    order: Vec<usize>,
}

impl AxisOrder {
    /// The identity order `0, 1, …, dim − 1`.
    #[must_use]
    pub fn identity(dim: usize) -> Self {
        Self {
            order: (0..dim).collect(),
        }
    }

    /// Creates an axis order from an explicit permutation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAxisOrder`] if `order` is not a permutation
    /// of `0..order.len()`.
    pub fn new(order: Vec<usize>) -> Result<Self> {
        let mut seen = vec![false; order.len()];
        for &axis in &order {
            match seen.get_mut(axis) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(Error::InvalidAxisOrder(order)),
            }
        }
        Ok(Self { order })
    }

    /// A uniformly random permutation of `0..dim`.
    #[must_use]
    pub fn shuffled(dim: usize, rng: &mut fastrand::Rng) -> Self {
        let mut order: Vec<usize> = (0..dim).collect();
        rng.shuffle(&mut order);
        Self { order }
    }

    /// Number of axes.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.order.len()
    }

    /// The permutation as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    /// Returns `true` if this is the identity permutation.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.order.iter().enumerate().all(|(i, &axis)| i == axis)
    }

    /// The inverse permutation, so that `inverse().permute(permute(x)) == x`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut inverse = vec![0; self.order.len()];
        for (slot, &axis) in self.order.iter().enumerate() {
            inverse[axis] = slot;
        }
        Self { order: inverse }
    }

    /// Reorders `x` so that slot `i` holds `x[order[i]]`.
    fn permute(&self, x: &[f64]) -> Vec<f64> {
        self.order.iter().map(|&axis| x[axis]).collect()
    }

    /// Undoes [`permute`](Self::permute).
    fn unpermute(&self, shuffled: &[f64]) -> Vec<f64> {
        let mut x = vec![0.0; shuffled.len()];
        for (slot, &axis) in self.order.iter().enumerate() {
            x[axis] = shuffled[slot];
        }
        x
    }
}

/// How [`to_spherical`] assigns angles to zero-radius rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DegeneratePolicy {
    /// The first zero-radius row of a batch gets every angle `π/2`; later
    /// zero-radius rows get uniform angles in `[0, π)` (final angle
    /// `[0, 2π)`).
    #[default]
    FirstCanonical,
    /// Every zero-radius row gets every angle `π/2`.
    AllCanonical,
}

/// Converts a batch of Euclidean points to spherical coordinates using the
/// default [`DegeneratePolicy`].
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if a row does not have
/// `axis_order.dim()` coordinates (or the order is empty), and
/// [`Error::Numerical`] if a coordinate is not finite.
pub fn to_spherical(
    x: &[Vec<f64>],
    axis_order: &AxisOrder,
    rng: &mut fastrand::Rng,
) -> Result<Vec<Vec<f64>>> {
    to_spherical_with_policy(x, axis_order, DegeneratePolicy::default(), rng)
}

/// Converts a batch of Euclidean points to spherical coordinates.
///
/// `rng` is only consulted for zero-radius rows beyond the first under
/// [`DegeneratePolicy::FirstCanonical`].
///
/// # Errors
///
/// See [`to_spherical`].
#[allow(clippy::float_cmp)]
pub fn to_spherical_with_policy(
    x: &[Vec<f64>],
    axis_order: &AxisOrder,
    policy: DegeneratePolicy,
    rng: &mut fastrand::Rng,
) -> Result<Vec<Vec<f64>>> {
    let dim = axis_order.dim();
    check_rows(x, dim)?;

    let mut seen_degenerate = false;
    let mut out = Vec::with_capacity(x.len());
    for row in x {
        let mut rphi = spherical_row(&axis_order.permute(row));
        if rphi[0] == 0.0 {
            let canonical = match policy {
                DegeneratePolicy::FirstCanonical => !seen_degenerate,
                DegeneratePolicy::AllCanonical => true,
            };
            seen_degenerate = true;
            if canonical {
                rphi[1..].fill(FRAC_PI_2);
            } else {
                randomize_angles(&mut rphi, rng);
            }
        }
        out.push(rphi);
    }
    Ok(out)
}

/// Converts a batch of spherical points back to Euclidean coordinates.
///
/// Angles outside their canonical ranges are accepted; the map is evaluated
/// as written.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if a row does not have
/// `axis_order.dim()` entries, and [`Error::Numerical`] if an entry is not
/// finite.
pub fn to_euclidean(rphi: &[Vec<f64>], axis_order: &AxisOrder) -> Result<Vec<Vec<f64>>> {
    check_rows(rphi, axis_order.dim())?;
    Ok(rphi
        .iter()
        .map(|row| axis_order.unpermute(&euclidean_row(row)))
        .collect())
}

/// Maps spherical points with radius in `[0, max_radius]` into `[0, 1]^d`.
///
/// Radii beyond `max_radius` saturate at `1`.
///
/// # Errors
///
/// Returns [`Error::InvalidRadius`] for a non-positive or non-finite
/// `max_radius`, and the row errors of [`to_euclidean`].
pub fn to_unit_cube(rphi: &[Vec<f64>], max_radius: f64) -> Result<Vec<Vec<f64>>> {
    check_radius(max_radius)?;
    let Some(dim) = rphi.first().map(Vec::len) else {
        return Ok(Vec::new());
    };
    check_rows(rphi, dim)?;

    Ok(rphi
        .iter()
        .map(|row| {
            let last = row.len() - 1;
            row.iter()
                .enumerate()
                .map(|(i, &v)| match i {
                    0 => (1.0 - 2.0 * v / max_radius).clamp(-1.0, 1.0).acos() / PI,
                    _ if i == last => v / TAU,
                    _ => v / PI,
                })
                .collect()
        })
        .collect())
}

/// Inverse of [`to_unit_cube`].
///
/// # Errors
///
/// Same as [`to_unit_cube`].
pub fn from_unit_cube(cube: &[Vec<f64>], max_radius: f64) -> Result<Vec<Vec<f64>>> {
    check_radius(max_radius)?;
    let Some(dim) = cube.first().map(Vec::len) else {
        return Ok(Vec::new());
    };
    check_rows(cube, dim)?;

    Ok(cube
        .iter()
        .map(|row| {
            let last = row.len() - 1;
            row.iter()
                .enumerate()
                .map(|(i, &u)| match i {
                    0 => 0.5 * (1.0 - (PI * u).cos()) * max_radius,
                    _ if i == last => u * TAU,
                    _ => u * PI,
                })
                .collect()
        })
        .collect())
}

/// Checks that every row is a valid spherical point.
///
/// # Errors
///
/// Returns [`Error::Numerical`] for non-finite entries and
/// [`Error::Domain`] for a negative radius, an interior angle outside
/// `[0, π]`, or a final angle outside `[0, 2π]`.
pub fn validate(rphi: &[Vec<f64>]) -> Result<()> {
    for (n, row) in rphi.iter().enumerate() {
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::Numerical(format!(
                "row {n} has a non-finite coordinate"
            )));
        }
        let Some((&radius, angles)) = row.split_first() else {
            continue;
        };
        if radius < 0.0 {
            return Err(Error::Domain(format!("row {n} has negative radius {radius}")));
        }
        if let Some((&last, interior)) = angles.split_last() {
            if let Some(bad) = interior.iter().find(|a| !(0.0..=PI).contains(*a)) {
                return Err(Error::Domain(format!(
                    "row {n} has interior angle {bad} outside [0, π]"
                )));
            }
            if !(0.0..=TAU).contains(&last) {
                return Err(Error::Domain(format!(
                    "row {n} has final angle {last} outside [0, 2π]"
                )));
            }
        }
    }
    Ok(())
}

/// Replaces every NaN entry with `0`.
pub(crate) fn replace_nan(rows: &mut [Vec<f64>]) {
    for v in rows.iter_mut().flatten() {
        if v.is_nan() {
            *v = 0.0;
        }
    }
}

/// Spherical coordinates of an already-permuted, non-empty row.
fn spherical_row(x: &[f64]) -> Vec<f64> {
    let d = x.len();

    // tail[k] = ‖(x_k, …, x_{d-1})‖, accumulated with hypot to avoid overflow
    let mut tail = vec![0.0; d];
    let mut acc = 0.0_f64;
    for k in (0..d).rev() {
        acc = acc.hypot(x[k]);
        tail[k] = acc;
    }

    let mut rphi = Vec::with_capacity(d);
    rphi.push(tail[0]);
    for k in 0..d - 1 {
        let angle = if tail[k] > 0.0 {
            (x[k] / tail[k]).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };
        rphi.push(angle);
    }

    if d >= 2 && x[d - 1] < 0.0 {
        rphi[d - 1] = TAU - rphi[d - 1];
        if rphi[d - 1] >= TAU {
            rphi[d - 1] = 0.0;
        }
    }
    rphi
}

/// Euclidean coordinates (still permuted) of a spherical row.
fn euclidean_row(rphi: &[f64]) -> Vec<f64> {
    let mut x = Vec::with_capacity(rphi.len());
    let mut scale = rphi[0];
    for &angle in &rphi[1..] {
        x.push(scale * angle.cos());
        scale *= angle.sin();
    }
    x.push(scale);
    x
}

fn randomize_angles(rphi: &mut [f64], rng: &mut fastrand::Rng) {
    let last = rphi.len() - 1;
    for (i, angle) in rphi.iter_mut().enumerate().skip(1) {
        let high = if i == last { TAU } else { PI };
        *angle = rng_util::f64_range(rng, 0.0, high);
    }
}

fn check_rows(rows: &[Vec<f64>], dim: usize) -> Result<()> {
    if dim == 0 {
        return Err(Error::DimensionMismatch {
            expected: 1,
            got: 0,
        });
    }
    for (n, row) in rows.iter().enumerate() {
        if row.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                got: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::Numerical(format!(
                "row {n} has a non-finite coordinate"
            )));
        }
    }
    Ok(())
}

fn check_radius(max_radius: f64) -> Result<()> {
    if max_radius.is_finite() && max_radius > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidRadius(max_radius))
    }
}
