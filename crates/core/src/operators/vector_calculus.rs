//! Curl, divergence and gradient built from [`derivative`].
//!
//! Vector fields are passed as their three physical components `(a, b, c)` =
//! `(x, y, z)`. Each partial derivative is taken along the matching [`Axis`]
//! with the spacing resolved by
//! [`GridGeometry`](crate::grid::GridGeometry), so no stencil logic lives here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::derivative::derivative;
use crate::core_types::{Axis, Grid3D, Vec3};
use crate::error::FieldResult;

/// Physical grid spacing along x, y and z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    /// Spacing along x
    pub dx: f32,
    /// Spacing along y
    pub dy: f32,
    /// Spacing along z
    pub dz: f32,
}

impl Spacing {
    /// Create a spacing triple
    #[must_use]
    pub fn new(dx: f32, dy: f32, dz: f32) -> Self {
        Self { dx, dy, dz }
    }

    /// Same spacing on all three axes
    #[must_use]
    pub fn uniform(h: f32) -> Self {
        Self::new(h, h, h)
    }

    /// Spacing along one axis
    #[must_use]
    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.dx,
            Axis::Y => self.dy,
            Axis::Z => self.dz,
        }
    }

    /// Spacing as a vector in (x, y, z) order
    #[must_use]
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.dx, self.dy, self.dz)
    }
}

impl From<Vec3> for Spacing {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Three components of a vector field on a common grid
#[derive(Debug, Clone, PartialEq)]
pub struct VectorGrid {
    /// x component
    pub x: Grid3D,
    /// y component
    pub y: Grid3D,
    /// z component
    pub z: Grid3D,
}

impl VectorGrid {
    /// Components in (x, y, z) order
    #[must_use]
    pub fn into_components(self) -> (Grid3D, Grid3D, Grid3D) {
        (self.x, self.y, self.z)
    }
}

#[inline]
fn partial(field: &Grid3D, axis: Axis, spacing: &Spacing) -> FieldResult<Grid3D> {
    derivative(field, axis, spacing.along(axis))
}

fn ensure_components(a: &Grid3D, b: &Grid3D, c: &Grid3D, operation: &'static str) -> FieldResult<()> {
    a.ensure_same_shape(b, operation)?;
    a.ensure_same_shape(c, operation)
}

/// Curl of the vector field `(a, b, c)`
///
/// ```text
/// x = ∂c/∂y − ∂b/∂z
/// y = ∂a/∂z − ∂c/∂x
/// z = ∂b/∂x − ∂a/∂y
/// ```
///
/// # Errors
/// `ShapeMismatch` if the components differ in shape, plus any error of
/// [`derivative`] for the axes involved.
pub fn curl(a: &Grid3D, b: &Grid3D, c: &Grid3D, spacing: &Spacing) -> FieldResult<VectorGrid> {
    ensure_components(a, b, c, "curl")?;
    debug!(shape = %a.shape(), ?spacing, "curl");

    let x = partial(c, Axis::Y, spacing)?.zip_map(&partial(b, Axis::Z, spacing)?, "curl", |p, q| p - q)?;
    let y = partial(a, Axis::Z, spacing)?.zip_map(&partial(c, Axis::X, spacing)?, "curl", |p, q| p - q)?;
    let z = partial(b, Axis::X, spacing)?.zip_map(&partial(a, Axis::Y, spacing)?, "curl", |p, q| p - q)?;

    Ok(VectorGrid { x, y, z })
}

/// Divergence of the vector field `(a, b, c)`: `∂c/∂z + ∂b/∂y + ∂a/∂x`
///
/// # Errors
/// `ShapeMismatch` if the components differ in shape, plus any error of
/// [`derivative`].
pub fn divergence(a: &Grid3D, b: &Grid3D, c: &Grid3D, spacing: &Spacing) -> FieldResult<Grid3D> {
    ensure_components(a, b, c, "divergence")?;
    debug!(shape = %a.shape(), ?spacing, "divergence");

    let dc_dz = partial(c, Axis::Z, spacing)?;
    let db_dy = partial(b, Axis::Y, spacing)?;
    let da_dx = partial(a, Axis::X, spacing)?;
    dc_dz
        .zip_map(&db_dy, "divergence", |p, q| p + q)?
        .zip_map(&da_dx, "divergence", |p, q| p + q)
}

/// Gradient of the scalar field `a`: `(∂a/∂x, ∂a/∂y, ∂a/∂z)`
///
/// # Errors
/// Any error of [`derivative`] along the three axes.
pub fn gradient(a: &Grid3D, spacing: &Spacing) -> FieldResult<VectorGrid> {
    debug!(shape = %a.shape(), ?spacing, "gradient");
    Ok(VectorGrid {
        x: partial(a, Axis::X, spacing)?,
        y: partial(a, Axis::Y, spacing)?,
        z: partial(a, Axis::Z, spacing)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Shape3;
    use crate::error::FieldError;
    use approx::assert_relative_eq;

    fn cube() -> Shape3 {
        Shape3::new(9, 8, 7)
    }

    #[test]
    fn test_curl_of_solid_rotation() {
        // (−y, x, 0) rotates about z with curl (0, 0, 2)
        let spacing = Spacing::new(0.5, 0.25, 1.0);
        let a = Grid3D::from_fn(cube(), |_, iy, _| -(iy as f32) * spacing.dy);
        let b = Grid3D::from_fn(cube(), |ix, _, _| ix as f32 * spacing.dx);
        let c = Grid3D::new(cube());

        let w = curl(&a, &b, &c, &spacing).unwrap();
        for i in 0..a.len() {
            assert_relative_eq!(w.x.as_slice()[i], 0.0, epsilon = 1e-5);
            assert_relative_eq!(w.y.as_slice()[i], 0.0, epsilon = 1e-5);
            assert_relative_eq!(w.z.as_slice()[i], 2.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_divergence_of_expansion() {
        // (x, 2y, 3z) has divergence 6
        let spacing = Spacing::uniform(1.0);
        let a = Grid3D::from_fn(cube(), |ix, _, _| ix as f32);
        let b = Grid3D::from_fn(cube(), |_, iy, _| 2.0 * iy as f32);
        let c = Grid3D::from_fn(cube(), |_, _, iz| 3.0 * iz as f32);
        let div = divergence(&a, &b, &c, &spacing).unwrap();
        for &v in div.as_slice() {
            assert_relative_eq!(v, 6.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_gradient_components_follow_axes() {
        let spacing = Spacing::new(2.0, 3.0, 4.0);
        let a = Grid3D::from_fn(cube(), |ix, iy, iz| {
            ix as f32 * 2.0 * 5.0 + iy as f32 * 3.0 * 7.0 - iz as f32 * 4.0
        });
        let g = gradient(&a, &spacing).unwrap();
        assert_relative_eq!(g.x.get(4, 4, 3), 5.0, epsilon = 1e-4);
        assert_relative_eq!(g.y.get(4, 4, 3), 7.0, epsilon = 1e-4);
        assert_relative_eq!(g.z.get(4, 4, 3), -1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_component_shapes_must_agree() {
        let a = Grid3D::new(cube());
        let b = Grid3D::new(Shape3::new(9, 8, 8));
        assert!(matches!(
            divergence(&a, &b, &a, &Spacing::uniform(1.0)),
            Err(FieldError::ShapeMismatch { operation: "divergence", .. })
        ));
    }

    #[test]
    fn test_spacing_lookup() {
        let s = Spacing::from(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.along(Axis::Y), 2.0);
        assert_eq!(s.as_vec3(), Vec3::new(1.0, 2.0, 3.0));
    }
}
