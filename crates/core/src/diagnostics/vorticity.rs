//! Ertel potential vorticity on the model grid
//!
//! ```text
//! PV = −g · ( ∂θ/∂p · (∂v/∂x − ∂u/∂y + f) − ∂v/∂p · ∂θ/∂x + ∂u/∂p · ∂θ/∂y ) · 1e4
//! ```
//!
//! with pressure in hPa, so the `1e4` factor yields PVU. Horizontal
//! derivatives run along the grid axes at constant model level rather than on
//! pressure surfaces. Vertical derivatives are taken against pressure using
//! the local level spacing, with vanishing spacings replaced by a small
//! epsilon.

use tracing::debug;

use super::{total_pressure, GRAVITY};
use crate::core_types::{Axis, Grid2D, Grid3D};
use crate::error::FieldResult;
use crate::operators::{
    derivative, derivative_wrt_variable_delta, reference_differences, substitute_small_differences,
    Spacing, DEFAULT_DIFFERENCE_EPSILON,
};

const PVU_SCALE: f32 = 1.0e4;

/// WRF fields read by [`potential_vorticity`]
#[derive(Debug, Clone, Copy)]
pub struct VorticityInputs<'a> {
    /// Perturbation pressure `P` in Pa
    pub p: &'a Grid3D,
    /// Base-state pressure `PB` in Pa
    pub pb: &'a Grid3D,
    /// Perturbation potential temperature `T`
    pub theta: &'a Grid3D,
    /// x wind component `U` in m/s
    pub u: &'a Grid3D,
    /// y wind component `V` in m/s
    pub v: &'a Grid3D,
    /// Coriolis parameter `F`
    pub coriolis: &'a Grid2D,
}

/// Potential vorticity in PVU
///
/// # Errors
/// - `ShapeMismatch` if the 3D fields differ in shape or `coriolis` does not
///   match their horizontal shape
/// - `DegenerateSpacing` or `InsufficientExtent` from the underlying
///   derivatives
pub fn potential_vorticity(inputs: &VorticityInputs<'_>, spacing: &Spacing) -> FieldResult<Grid3D> {
    const OP: &str = "potential_vorticity";
    let VorticityInputs {
        p,
        pb,
        theta,
        u,
        v,
        coriolis,
    } = *inputs;
    p.ensure_same_shape(pb, OP)?;
    p.ensure_same_shape(theta, OP)?;
    p.ensure_same_shape(u, OP)?;
    p.ensure_same_shape(v, OP)?;
    p.ensure_horizontal(coriolis, OP)?;
    debug!(shape = %p.shape(), ?spacing, "potential vorticity");

    let pressure_hpa = total_pressure(p, pb)?.map(|pa| 0.01 * pa);
    let dp = substitute_small_differences(&reference_differences(&pressure_hpa)?, DEFAULT_DIFFERENCE_EPSILON);

    let dthdp = derivative_wrt_variable_delta(theta, &pressure_hpa, &dp)?;
    let dudp = derivative_wrt_variable_delta(u, &pressure_hpa, &dp)?;
    let dvdp = derivative_wrt_variable_delta(v, &pressure_hpa, &dp)?;
    let dthdx = derivative(theta, Axis::X, spacing.dx)?;
    let dthdy = derivative(theta, Axis::Y, spacing.dy)?;
    let dudy = derivative(u, Axis::Y, spacing.dy)?;
    let dvdx = derivative(v, Axis::X, spacing.dx)?;

    let layer = p.shape().layer_len();
    let f = coriolis.as_slice();
    let (dthdp, dudp, dvdp) = (dthdp.as_slice(), dudp.as_slice(), dvdp.as_slice());
    let (dthdx, dthdy) = (dthdx.as_slice(), dthdy.as_slice());
    let (dudy, dvdx) = (dudy.as_slice(), dvdx.as_slice());

    Ok(Grid3D::from_index_fn(p.shape(), |i| {
        let absolute_vorticity = dvdx[i] - dudy[i] + f[i % layer];
        -GRAVITY * (dthdp[i] * absolute_vorticity - dvdp[i] * dthdx[i] + dudp[i] * dthdy[i]) * PVU_SCALE
    }))
}
