//! Vertical shear of the horizontal wind.

use tracing::debug;

use crate::core_types::{Axis, Grid3D};
use crate::error::FieldResult;
use crate::operators::stencil::require_spacing;

/// Magnitude of the level-to-level horizontal wind difference over `dz`
///
/// ```text
/// shear[k] = √((u[k+1] − u[k])² + (v[k+1] − v[k])²) / dz   for k < nz − 1
/// shear[nz − 1] = 0
/// ```
///
/// Winds below terrain should be zeroed by the caller.
///
/// # Errors
/// - `ShapeMismatch` if `u` and `v` differ in shape
/// - `DegenerateSpacing` if `dz` is zero or non-finite
pub fn wind_shear(u: &Grid3D, v: &Grid3D, dz: f32) -> FieldResult<Grid3D> {
    u.ensure_same_shape(v, "wind_shear")?;
    require_spacing(Axis::Z, dz)?;
    debug!(shape = %u.shape(), dz, "wind shear");

    let shape = u.shape();
    let layer = shape.layer_len();
    let top = shape.nz.saturating_sub(1);
    let (us, vs) = (u.as_slice(), v.as_slice());

    Ok(Grid3D::from_index_fn(shape, |i| {
        if i / layer >= top {
            return 0.0;
        }
        let du = us[i + layer] - us[i];
        let dv = vs[i + layer] - vs[i];
        (du * du + dv * dv).sqrt() / dz
    }))
}
