//! Vertical derivative of one field with respect to another.
//!
//! When the natural vertical coordinate is a model field such as pressure, the
//! levels are monotone but not evenly spaced. The same three-zone stencil as
//! [`super::derivative`] is applied along `Axis::Z`, but instead of dividing by
//! a constant spacing the weighted differences of `field` are divided by the
//! matching weighted differences of the reference:
//!
//! ```text
//! d(field)/d(ref) at level i = numerator(field, i) / numerator(ref, i)
//! ```
//!
//! # Preconditions
//!
//! The reference must be monotone along the vertical and its local
//! differences must be non-zero. Neither condition is enforced: a plateau in
//! the reference yields Inf or NaN in the output. Callers that cannot rule out
//! repeated levels should build the difference field with
//! [`reference_differences`], clean it with [`substitute_small_differences`]
//! and call [`derivative_wrt_variable_delta`].

use rayon::prelude::*;
use tracing::{debug, warn};

use super::stencil::{require_stencil_extent, Stencil};
use crate::core_types::{Axis, Grid3D};
use crate::error::{FieldError, FieldResult};

/// Replacement magnitude used for vanishing reference differences
pub const DEFAULT_DIFFERENCE_EPSILON: f32 = 1.0e-7;

/// d(field)/d(reference) along the vertical, differences of `reference` inline
///
/// # Errors
/// - `ShapeMismatch` if the grids differ in shape
/// - `InsufficientExtent` if there are fewer than 7 vertical levels
pub fn derivative_wrt_variable(field: &Grid3D, reference: &Grid3D) -> FieldResult<Grid3D> {
    field.ensure_same_shape(reference, "derivative_wrt_variable")?;
    require_stencil_extent(Axis::Z, field.shape().nz)?;
    if field.is_empty() {
        return Ok(field.clone());
    }
    debug!(shape = %field.shape(), "vertical derivative against reference field");
    warn_if_not_monotone(reference);

    let f = field.as_slice();
    let r = reference.as_slice();
    Ok(vertical_stencil_map(field, |stencil, i, at_level| {
        stencil.numerator(i, |k| f[at_level(k)]) / stencil.numerator(i, |k| r[at_level(k)])
    }))
}

/// d(field)/d(reference) along the vertical using precomputed local spacings
///
/// `delta_reference` holds the local level spacing of `reference` at every
/// sample (see [`reference_differences`]). `reference` itself is only used to
/// validate shapes and, in debug builds, monotonicity.
///
/// # Errors
/// - `ShapeMismatch` if the three grids differ in shape
/// - `InsufficientExtent` if there are fewer than 7 vertical levels
pub fn derivative_wrt_variable_delta(
    field: &Grid3D,
    reference: &Grid3D,
    delta_reference: &Grid3D,
) -> FieldResult<Grid3D> {
    field.ensure_same_shape(reference, "derivative_wrt_variable_delta")?;
    field.ensure_same_shape(delta_reference, "derivative_wrt_variable_delta")?;
    require_stencil_extent(Axis::Z, field.shape().nz)?;
    if field.is_empty() {
        return Ok(field.clone());
    }
    debug!(shape = %field.shape(), "vertical derivative against reference spacing");
    warn_if_not_monotone(reference);

    let f = field.as_slice();
    let delta = delta_reference.as_slice();
    Ok(vertical_stencil_map(field, |stencil, i, at_level| {
        stencil.numerator(i, |k| f[at_level(k)]) / (stencil.denominator() * delta[at_level(i)])
    }))
}

/// Local level spacing of `reference` along the vertical
///
/// Forward difference at the bottom level, half the centred difference in the
/// interior and backward difference at the top level.
///
/// # Errors
/// Returns `InsufficientExtent` if there are fewer than 2 levels.
pub fn reference_differences(reference: &Grid3D) -> FieldResult<Grid3D> {
    let shape = reference.shape();
    if reference.is_empty() {
        return Ok(reference.clone());
    }
    if shape.nz < 2 {
        return Err(FieldError::InsufficientExtent {
            axis: Axis::Z,
            length: shape.nz,
            required: 2,
        });
    }
    let r = reference.as_slice();
    let layer = shape.layer_len();
    let top = shape.nz - 1;
    Ok(Grid3D::from_index_fn(shape, |idx| {
        let iz = idx / layer;
        if iz == 0 {
            r[idx + layer] - r[idx]
        } else if iz == top {
            r[idx] - r[idx - layer]
        } else {
            0.5 * (r[idx + layer] - r[idx - layer])
        }
    }))
}

/// Replace differences smaller than `epsilon` in magnitude by `±epsilon`
///
/// Keeps the sign of the original entry (`+epsilon` for `+0.0`).
#[must_use]
pub fn substitute_small_differences(delta: &Grid3D, epsilon: f32) -> Grid3D {
    let epsilon = epsilon.abs();
    delta.map(|d| if d.abs() < epsilon { epsilon.copysign(d) } else { d })
}

/// True if every column of `reference` is non-increasing or non-decreasing
#[must_use]
pub fn is_vertically_monotone(reference: &Grid3D) -> bool {
    let shape = reference.shape();
    let layer = shape.layer_len();
    let r = reference.as_slice();
    (0..layer).into_par_iter().all(|col| {
        let mut rising = false;
        let mut falling = false;
        for iz in 1..shape.nz {
            let step = r[iz * layer + col] - r[(iz - 1) * layer + col];
            rising |= step > 0.0;
            falling |= step < 0.0;
        }
        !(rising && falling)
    })
}

fn warn_if_not_monotone(reference: &Grid3D) {
    if cfg!(debug_assertions) && !is_vertically_monotone(reference) {
        warn!(
            shape = %reference.shape(),
            "reference field is not monotone along z; derivative will be meaningless"
        );
    }
}

/// Evaluate `kernel(stencil, i, at_level)` at every sample, where `i` is the
/// vertical level and `at_level(k)` maps level `k` of the same column to a
/// flat index.
fn vertical_stencil_map<K>(field: &Grid3D, kernel: K) -> Grid3D
where
    K: Fn(Stencil, usize, &dyn Fn(usize) -> usize) -> f32 + Sync + Send,
{
    let shape = field.shape();
    let layer_len = shape.layer_len();
    let nz = shape.nz;
    let mut out = Grid3D::new(shape);

    out.as_mut_slice()
        .par_chunks_mut(layer_len)
        .enumerate()
        .for_each(|(iz, out_layer)| {
            let stencil = Stencil::select(iz, nz);
            for (col, value) in out_layer.iter_mut().enumerate() {
                let at_level = |k: usize| k * layer_len + col;
                *value = kernel(stencil, iz, &at_level);
            }
        });

    out
}
