//! Pointwise and column utilities: magnitudes, interpolation to a surface of
//! constant reference value, and horizontal wind rotation.

use nalgebra::{Rotation2, Vector2};
use rayon::prelude::*;
use tracing::debug;

use crate::core_types::{Grid2D, Grid3D};
use crate::error::FieldResult;

/// Elementwise √(a² + b²) of two 2D fields
///
/// # Errors
/// Returns `ShapeMismatch` if the fields differ in shape.
pub fn magnitude_2d(a: &Grid2D, b: &Grid2D) -> FieldResult<Grid2D> {
    a.ensure_same_shape(b, "magnitude_2d")?;
    let (a, b, shape) = (a.as_slice(), b.as_slice(), a.shape());
    Ok(Grid2D::from_index_fn(shape, |i| (a[i] * a[i] + b[i] * b[i]).sqrt()))
}

/// Elementwise √(a² + b² + c²) of three 3D fields
///
/// # Errors
/// Returns `ShapeMismatch` if the fields differ in shape.
pub fn magnitude_3d(a: &Grid3D, b: &Grid3D, c: &Grid3D) -> FieldResult<Grid3D> {
    a.ensure_same_shape(b, "magnitude_3d")?;
    a.ensure_same_shape(c, "magnitude_3d")?;
    let shape = a.shape();
    let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_slice());
    Ok(Grid3D::from_index_fn(shape, |i| {
        (a[i] * a[i] + b[i] * b[i] + c[i] * c[i]).sqrt()
    }))
}

/// Interpolate `field` onto the surface where `reference == target`
///
/// Each column is scanned upward from level 0 for the first level `k` with
/// `reference[k] < target` (the reference is expected to decrease with
/// height, as pressure does). The result is the linear interpolation between
/// levels `k - 1` and `k`:
///
/// ```text
/// ratio  = (target − ref[k]) / (ref[k−1] − ref[k])
/// result = ratio · field[k−1] + (1 − ratio) · field[k]
/// ```
///
/// A target equal to a level's reference value therefore returns that
/// level's field value. If the bottom level is already below the target the
/// bottom value is returned, and columns that never drop below the target take
/// the value at the top level. Neither fallback extrapolates.
///
/// # Errors
/// Returns `ShapeMismatch` if the grids differ in shape.
pub fn interpolate_to_surface(field: &Grid3D, reference: &Grid3D, target: f32) -> FieldResult<Grid2D> {
    field.ensure_same_shape(reference, "interpolate_to_surface")?;
    let shape = field.shape();
    let layer = shape.layer_len();
    let nz = shape.nz;
    let f = field.as_slice();
    let r = reference.as_slice();

    debug!(%shape, target, "interpolating to constant-reference surface");

    if nz == 0 {
        return Ok(Grid2D::new(shape.horizontal()));
    }

    Ok(Grid2D::from_index_fn(shape.horizontal(), |col| {
        let at = |k: usize| k * layer + col;
        match (0..nz).find(|&k| r[at(k)] < target) {
            Some(0) => f[at(0)],
            Some(k) => {
                let (lower, upper) = (at(k - 1), at(k));
                let ratio = (target - r[upper]) / (r[lower] - r[upper]);
                ratio * f[lower] + (1.0 - ratio) * f[upper]
            }
            None => f[at(nz - 1)],
        }
    }))
}

/// Rotate horizontal wind from grid-relative to earth-relative components
///
/// Every level of a column is rotated by that column's `angle_rad`, and the
/// rotated u-component is divided by `cos(latitude)` to undo the map-projection
/// scaling:
///
/// ```text
/// u' = ( cosθ·u + sinθ·v) / cos(lat)
/// v' =  −sinθ·u + cosθ·v
/// ```
///
/// # Errors
/// Returns `ShapeMismatch` if `u` and `v` differ in shape or the 2D fields do
/// not match their horizontal shape.
pub fn rotate_vector(
    angle_rad: &Grid2D,
    latitude_deg: &Grid2D,
    u: &Grid3D,
    v: &Grid3D,
) -> FieldResult<(Grid3D, Grid3D)> {
    u.ensure_same_shape(v, "rotate_vector")?;
    u.ensure_horizontal(angle_rad, "rotate_vector")?;
    u.ensure_horizontal(latitude_deg, "rotate_vector")?;

    let shape = u.shape();
    let layer = shape.layer_len();
    let angle = angle_rad.as_slice();
    let lat = latitude_deg.as_slice();
    let (us, vs) = (u.as_slice(), v.as_slice());

    let (rotated_u, rotated_v): (Vec<f32>, Vec<f32>) = (0..shape.len())
        .into_par_iter()
        .map(|idx| {
            let col = idx % layer;
            // Rotation by −θ gives (cosθ·u + sinθ·v, −sinθ·u + cosθ·v)
            let rotated = Rotation2::new(-angle[col]) * Vector2::new(us[idx], vs[idx]);
            let scale = lat[col].to_radians().cos();
            (rotated.x / scale, rotated.y)
        })
        .unzip();

    Ok((
        Grid3D::from_vec(shape, rotated_u)?,
        Grid3D::from_vec(shape, rotated_v)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Shape2, Shape3};
    use crate::error::FieldError;
    use approx::assert_relative_eq;

    #[test]
    fn test_magnitudes() {
        let a = Grid2D::filled(Shape2::new(3, 2), 3.0);
        let b = Grid2D::filled(Shape2::new(3, 2), 4.0);
        assert!(magnitude_2d(&a, &b).unwrap().as_slice().iter().all(|&m| m == 5.0));

        let shape = Shape3::new(2, 2, 2);
        let m = magnitude_3d(
            &Grid3D::filled(shape, 2.0),
            &Grid3D::filled(shape, 3.0),
            &Grid3D::filled(shape, 6.0),
        )
        .unwrap();
        assert!(m.as_slice().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_magnitude_shape_check() {
        let a = Grid2D::new(Shape2::new(3, 2));
        let b = Grid2D::new(Shape2::new(2, 3));
        assert!(matches!(magnitude_2d(&a, &b), Err(FieldError::ShapeMismatch { .. })));
    }

    /// Pressure falls by 100 per level from 1000, field rises by 10 per level
    fn column(shape: Shape3) -> (Grid3D, Grid3D) {
        let p = Grid3D::from_fn(shape, |_, _, iz| 1000.0 - 100.0 * iz as f32);
        let f = Grid3D::from_fn(shape, |_, _, iz| 10.0 * iz as f32);
        (f, p)
    }

    #[test]
    fn test_interpolation_between_levels() {
        let (f, p) = column(Shape3::new(2, 2, 6));
        let out = interpolate_to_surface(&f, &p, 850.0).unwrap();
        for &v in out.as_slice() {
            assert_relative_eq!(v, 15.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_interpolation_at_exact_level() {
        let (f, p) = column(Shape3::new(2, 2, 6));
        let out = interpolate_to_surface(&f, &p, 700.0).unwrap();
        for &v in out.as_slice() {
            assert_eq!(v, 30.0);
        }
    }

    #[test]
    fn test_interpolation_fallbacks() {
        let (f, p) = column(Shape3::new(1, 1, 6));
        // Never drops below 100: top value
        assert_eq!(interpolate_to_surface(&f, &p, 100.0).unwrap().get(0, 0), 50.0);
        // Bottom already below 1100: bottom value
        assert_eq!(interpolate_to_surface(&f, &p, 1100.0).unwrap().get(0, 0), 0.0);
    }

    #[test]
    fn test_rotation_on_equator() {
        let shape = Shape3::new(2, 1, 3);
        let angle = Grid2D::filled(shape.horizontal(), std::f32::consts::FRAC_PI_2);
        let lat = Grid2D::new(shape.horizontal());
        let u = Grid3D::filled(shape, 1.0);
        let v = Grid3D::filled(shape, 0.0);
        let (ur, vr) = rotate_vector(&angle, &lat, &u, &v).unwrap();
        for i in 0..ur.len() {
            assert_relative_eq!(ur.as_slice()[i], 0.0, epsilon = 1e-6);
            assert_relative_eq!(vr.as_slice()[i], -1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rotation_latitude_scaling() {
        let shape = Shape3::new(1, 1, 2);
        let angle = Grid2D::new(shape.horizontal());
        let lat = Grid2D::filled(shape.horizontal(), 60.0);
        let u = Grid3D::filled(shape, 3.0);
        let v = Grid3D::filled(shape, 4.0);
        let (ur, vr) = rotate_vector(&angle, &lat, &u, &v).unwrap();
        assert_relative_eq!(ur.get(0, 0, 1), 6.0, epsilon = 1e-4);
        assert_relative_eq!(vr.get(0, 0, 1), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_rejects_wrong_surface_shape() {
        let shape = Shape3::new(2, 2, 2);
        let angle = Grid2D::new(Shape2::new(3, 2));
        let lat = Grid2D::new(shape.horizontal());
        let u = Grid3D::new(shape);
        assert!(rotate_vector(&angle, &lat, &u, &u).is_err());
    }
}
