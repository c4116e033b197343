//! First derivative of a 3D field along one axis.
//!
//! The derivative uses the three-zone sixth-order stencil from
//! [`super::stencil`] on a uniformly spaced axis. Axis directions follow the
//! fixed storage mapping documented on [`Axis`]: `Axis::X` differences the
//! innermost (contiguous) storage axis, `Axis::Z` the outermost.

use rayon::prelude::*;
use tracing::debug;

use super::stencil::{require_spacing, require_stencil_extent, Stencil};
use crate::core_types::{Axis, Grid3D};
use crate::error::FieldResult;

/// ∂field/∂axis with uniform `spacing` along `axis`
///
/// The output has the same shape as `field`; the input is left untouched.
/// Positions 0..2 along the axis use the forward stencil, the last three use
/// the backward stencil and everything in between uses the centred stencil.
///
/// # Errors
/// - `DegenerateSpacing` if `spacing` is zero or not finite
/// - `InsufficientExtent` if the axis has fewer than 7 samples
pub fn derivative(field: &Grid3D, axis: Axis, spacing: f32) -> FieldResult<Grid3D> {
    require_spacing(axis, spacing)?;
    let shape = field.shape();
    let n = axis.len(shape);
    require_stencil_extent(axis, n)?;
    if field.is_empty() {
        return Ok(field.clone());
    }

    debug!(%axis, spacing, %shape, "sixth-order derivative");

    let stride = axis.stride(shape);
    let layer_len = shape.layer_len();
    let src = field.as_slice();
    let mut out = Grid3D::new(shape);

    // Each z-layer of the output is independent
    out.as_mut_slice()
        .par_chunks_mut(layer_len)
        .enumerate()
        .for_each(|(iz, out_layer)| {
            let layer_start = iz * layer_len;
            for (offset, value) in out_layer.iter_mut().enumerate() {
                let idx = layer_start + offset;
                let i = (idx / stride) % n;
                let line_start = idx - i * stride;
                let stencil = Stencil::select(i, n);
                let numerator = stencil.numerator(i, |k| src[line_start + k * stride]);
                *value = numerator / (stencil.denominator() * spacing);
            }
        });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Shape3;
    use crate::error::FieldError;
    use approx::assert_relative_eq;

    #[test]
    fn test_cubic_along_x() {
        let shape = Shape3::new(10, 2, 7);
        let field = Grid3D::from_fn(shape, |ix, _, _| (ix as f32).powi(3));
        let d = derivative(&field, Axis::X, 1.0).unwrap();

        for ix in 0..10 {
            let expected = 3.0 * (ix as f32).powi(2);
            assert_relative_eq!(d.get(ix, 1, 3), expected, epsilon = 1e-3, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_spacing_scales_result() {
        let shape = Shape3::new(8, 8, 8);
        let field = Grid3D::from_fn(shape, |_, iy, _| 2.0 * iy as f32);
        let d = derivative(&field, Axis::Y, 0.5).unwrap();
        for &v in d.as_slice() {
            assert_relative_eq!(v, 4.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_z_axis_uses_layer_stride() {
        let shape = Shape3::new(3, 3, 9);
        let field = Grid3D::from_fn(shape, |ix, iy, iz| (iz * iz) as f32 + (ix + iy) as f32);
        let d = derivative(&field, Axis::Z, 1.0).unwrap();
        for iz in 0..9 {
            assert_relative_eq!(d.get(2, 1, iz), 2.0 * iz as f32, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_rejects_short_axis() {
        let field = Grid3D::new(Shape3::new(6, 10, 10));
        assert_eq!(
            derivative(&field, Axis::X, 1.0).unwrap_err(),
            FieldError::InsufficientExtent {
                axis: Axis::X,
                length: 6,
                required: 7
            }
        );
        // Other axes are long enough
        assert!(derivative(&field, Axis::Y, 1.0).is_ok());
    }

    #[test]
    fn test_rejects_zero_spacing() {
        let field = Grid3D::new(Shape3::new(8, 8, 8));
        assert!(matches!(
            derivative(&field, Axis::Z, 0.0),
            Err(FieldError::DegenerateSpacing { axis: Axis::Z, .. })
        ));
    }

    #[test]
    fn test_empty_grid_passes_through() {
        let field = Grid3D::new(Shape3::new(0, 8, 8));
        let d = derivative(&field, Axis::Y, 1.0).unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn test_empty_grid_still_checks_axis_length() {
        let field = Grid3D::new(Shape3::new(0, 3, 10));
        assert_eq!(
            derivative(&field, Axis::Y, 1.0).unwrap_err(),
            FieldError::InsufficientExtent {
                axis: Axis::Y,
                length: 3,
                required: 7
            }
        );
        // The empty axis itself is shorter than the stencil too
        assert!(matches!(
            derivative(&field, Axis::X, 1.0),
            Err(FieldError::InsufficientExtent { axis: Axis::X, length: 0, .. })
        ));
    }
}
