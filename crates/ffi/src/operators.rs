use wrf_diag_core::operators::{
    curl, derivative, derivative_wrt_variable, divergence, gradient, interpolate_to_surface,
    magnitude_3d,
};
use wrf_diag_core::{Spacing, VectorGrid};

use crate::error::WrfDiagErrorCode;
use crate::grid::{axis_from_raw, GridDims, WrfDiagSpacing};
use crate::helpers::{grid_from_raw, handle_ffi_result_error, require_non_null, write_grid, write_surface};

#[no_mangle]
/// Differentiate `field` along one axis with the sixth-order stencil.
///
/// Returns
/// - `WrfDiagErrorCode::Ok` (0) on success with `out` filled
/// - `WrfDiagErrorCode::NullPointer` if `field` or `out` is null
/// - `WrfDiagErrorCode::DegenerateSpacing` if `spacing` is zero or non-finite
/// - `WrfDiagErrorCode::InsufficientExtent` if the axis has fewer than 7 samples
/// - `WrfDiagErrorCode::InvalidParameter` if `axis` is not a `WrfDiagAxis` value
///
/// # Safety
///
/// - `field` must point to `nx * ny * nz` readable floats.
/// - `out` must point to `nx * ny * nz` writable floats not overlapping `field`.
pub unsafe extern "C" fn wrf_diag_derivative(
    dims: GridDims,
    field: *const f32,
    axis: u8,
    spacing: f32,
    out: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out.cast_const(), "out")?;
        let axis = axis_from_raw(axis)?;
        let field = unsafe { grid_from_raw(dims, field, "field") }?;
        let result = derivative(&field, axis, spacing)?;
        unsafe { write_grid(&result, out) };
        Ok(())
    })
}

#[no_mangle]
/// Vertical derivative of `field` with respect to `reference` (e.g. pressure).
///
/// `reference` must be monotone along z with non-zero level differences;
/// violations produce Inf or NaN in `out` rather than an error.
///
/// Returns
/// - `WrfDiagErrorCode::Ok` (0) on success with `out` filled
/// - `WrfDiagErrorCode::NullPointer` if any pointer is null
/// - `WrfDiagErrorCode::InsufficientExtent` if `nz < 7`
///
/// # Safety
///
/// - `field` and `reference` must each point to `nx * ny * nz` readable floats.
/// - `out` must point to `nx * ny * nz` writable floats not overlapping the inputs.
pub unsafe extern "C" fn wrf_diag_derivative_wrt_variable(
    dims: GridDims,
    field: *const f32,
    reference: *const f32,
    out: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out.cast_const(), "out")?;
        let field = unsafe { grid_from_raw(dims, field, "field") }?;
        let reference = unsafe { grid_from_raw(dims, reference, "reference") }?;
        let result = derivative_wrt_variable(&field, &reference)?;
        unsafe { write_grid(&result, out) };
        Ok(())
    })
}

/// Write the three components of a vector result.
///
/// # Safety
/// Each output must point to `vector.x.len()` writable floats.
unsafe fn write_vector(vector: &VectorGrid, out_x: *mut f32, out_y: *mut f32, out_z: *mut f32) {
    unsafe {
        write_grid(&vector.x, out_x);
        write_grid(&vector.y, out_y);
        write_grid(&vector.z, out_z);
    }
}

#[no_mangle]
/// Curl of the vector field `(a, b, c)` = `(x, y, z)` components.
///
/// Returns
/// - `WrfDiagErrorCode::Ok` (0) on success with `out_x`, `out_y`, `out_z` filled
/// - `WrfDiagErrorCode::NullPointer` if any pointer is null
/// - `WrfDiagErrorCode::DegenerateSpacing` or `InsufficientExtent` on invalid geometry
///
/// # Safety
///
/// - `a`, `b`, `c` must each point to `nx * ny * nz` readable floats.
/// - `out_x`, `out_y`, `out_z` must each point to `nx * ny * nz` writable floats.
pub unsafe extern "C" fn wrf_diag_curl(
    dims: GridDims,
    a: *const f32,
    b: *const f32,
    c: *const f32,
    spacing: WrfDiagSpacing,
    out_x: *mut f32,
    out_y: *mut f32,
    out_z: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out_x.cast_const(), "out_x")?;
        require_non_null(out_y.cast_const(), "out_y")?;
        require_non_null(out_z.cast_const(), "out_z")?;
        let a = unsafe { grid_from_raw(dims, a, "a") }?;
        let b = unsafe { grid_from_raw(dims, b, "b") }?;
        let c = unsafe { grid_from_raw(dims, c, "c") }?;
        let result = curl(&a, &b, &c, &Spacing::from(spacing))?;
        unsafe { write_vector(&result, out_x, out_y, out_z) };
        Ok(())
    })
}

#[no_mangle]
/// Divergence of the vector field `(a, b, c)`.
///
/// # Safety
///
/// - `a`, `b`, `c` must each point to `nx * ny * nz` readable floats.
/// - `out` must point to `nx * ny * nz` writable floats.
pub unsafe extern "C" fn wrf_diag_divergence(
    dims: GridDims,
    a: *const f32,
    b: *const f32,
    c: *const f32,
    spacing: WrfDiagSpacing,
    out: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out.cast_const(), "out")?;
        let a = unsafe { grid_from_raw(dims, a, "a") }?;
        let b = unsafe { grid_from_raw(dims, b, "b") }?;
        let c = unsafe { grid_from_raw(dims, c, "c") }?;
        let result = divergence(&a, &b, &c, &Spacing::from(spacing))?;
        unsafe { write_grid(&result, out) };
        Ok(())
    })
}

#[no_mangle]
/// Gradient of the scalar field `a`.
///
/// # Safety
///
/// - `a` must point to `nx * ny * nz` readable floats.
/// - `out_x`, `out_y`, `out_z` must each point to `nx * ny * nz` writable floats.
pub unsafe extern "C" fn wrf_diag_gradient(
    dims: GridDims,
    a: *const f32,
    spacing: WrfDiagSpacing,
    out_x: *mut f32,
    out_y: *mut f32,
    out_z: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out_x.cast_const(), "out_x")?;
        require_non_null(out_y.cast_const(), "out_y")?;
        require_non_null(out_z.cast_const(), "out_z")?;
        let a = unsafe { grid_from_raw(dims, a, "a") }?;
        let result = gradient(&a, &Spacing::from(spacing))?;
        unsafe { write_vector(&result, out_x, out_y, out_z) };
        Ok(())
    })
}

#[no_mangle]
/// Elementwise magnitude `sqrt(a² + b² + c²)`.
///
/// # Safety
///
/// - `a`, `b`, `c` must each point to `nx * ny * nz` readable floats.
/// - `out` must point to `nx * ny * nz` writable floats.
pub unsafe extern "C" fn wrf_diag_magnitude3d(
    dims: GridDims,
    a: *const f32,
    b: *const f32,
    c: *const f32,
    out: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out.cast_const(), "out")?;
        let a = unsafe { grid_from_raw(dims, a, "a") }?;
        let b = unsafe { grid_from_raw(dims, b, "b") }?;
        let c = unsafe { grid_from_raw(dims, c, "c") }?;
        let result = magnitude_3d(&a, &b, &c)?;
        unsafe { write_grid(&result, out) };
        Ok(())
    })
}

#[no_mangle]
/// Interpolate `field` to the surface where `reference == target`.
///
/// The reference is expected to decrease upward (pressure). Columns that never
/// cross `target` take the top-level value.
///
/// # Safety
///
/// - `field` and `reference` must each point to `nx * ny * nz` readable floats.
/// - `out` must point to `nx * ny` writable floats.
pub unsafe extern "C" fn wrf_diag_interpolate_to_surface(
    dims: GridDims,
    field: *const f32,
    reference: *const f32,
    target: f32,
    out: *mut f32,
) -> WrfDiagErrorCode {
    handle_ffi_result_error(|| {
        require_non_null(out.cast_const(), "out")?;
        let field = unsafe { grid_from_raw(dims, field, "field") }?;
        let reference = unsafe { grid_from_raw(dims, reference, "reference") }?;
        let result = interpolate_to_surface(&field, &reference, target)?;
        unsafe { write_surface(&result, out) };
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{wrf_diag_get_last_error, wrf_diag_get_last_error_code};
    use crate::grid::WrfDiagAxis;
    use std::ffi::CStr;
    use std::ptr;

    const DIMS: GridDims = GridDims { nx: 8, ny: 7, nz: 9 };

    fn len() -> usize {
        DIMS.nx * DIMS.ny * DIMS.nz
    }

    fn linear_in(axis: usize, slope: f32) -> Vec<f32> {
        (0..len())
            .map(|idx| {
                let coords = [idx % DIMS.nx, (idx / DIMS.nx) % DIMS.ny, idx / (DIMS.nx * DIMS.ny)];
                slope * coords[axis] as f32
            })
            .collect()
    }

    fn last_error_message() -> String {
        let msg = wrf_diag_get_last_error();
        assert!(!msg.is_null());
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }

    #[test]
    fn test_derivative_fills_caller_buffer() {
        let field = linear_in(2, 3.0);
        let mut out = vec![0.0_f32; len()];
        let code = unsafe { wrf_diag_derivative(DIMS, field.as_ptr(), WrfDiagAxis::Z as u8, 0.5, out.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::Ok);
        assert!(out.iter().all(|&v| (v - 6.0).abs() < 1e-4));
        assert_eq!(wrf_diag_get_last_error_code(), WrfDiagErrorCode::Ok);
        assert!(wrf_diag_get_last_error().is_null());
    }

    #[test]
    fn test_null_pointer_is_reported() {
        let mut out = vec![0.0_f32; len()];
        let code = unsafe { wrf_diag_derivative(DIMS, ptr::null(), WrfDiagAxis::X as u8, 1.0, out.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::NullPointer);
        assert_eq!(wrf_diag_get_last_error_code(), WrfDiagErrorCode::NullPointer);
        assert_eq!(last_error_message(), "Parameter 'field' cannot be null");
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        let field = linear_in(0, 1.0);
        let mut out = vec![0.0_f32; len()];
        let code = unsafe { wrf_diag_derivative(DIMS, field.as_ptr(), WrfDiagAxis::X as u8, 0.0, out.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::DegenerateSpacing);

        let short = GridDims { nx: 8, ny: 7, nz: 5 };
        let code = unsafe { wrf_diag_derivative(short, field.as_ptr(), WrfDiagAxis::Z as u8, 1.0, out.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::InsufficientExtent);
        assert!(last_error_message().contains("axis z"));
    }

    #[test]
    fn test_vector_operators() {
        let spacing = WrfDiagSpacing { dx: 1.0, dy: 1.0, dz: 1.0 };
        let a = linear_in(1, -1.0);
        let b = linear_in(0, 1.0);
        let c = vec![0.0_f32; len()];
        let (mut x, mut y, mut z) = (vec![0.0; len()], vec![0.0; len()], vec![0.0; len()]);
        let code = unsafe {
            wrf_diag_curl(
                DIMS,
                a.as_ptr(),
                b.as_ptr(),
                c.as_ptr(),
                spacing,
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                z.as_mut_ptr(),
            )
        };
        assert_eq!(code, WrfDiagErrorCode::Ok);
        assert!(z.iter().all(|&v| (v - 2.0).abs() < 1e-4));

        let mut div = vec![1.0_f32; len()];
        let code = unsafe { wrf_diag_divergence(DIMS, a.as_ptr(), b.as_ptr(), c.as_ptr(), spacing, div.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::Ok);
        assert!(div.iter().all(|&v| v.abs() < 1e-4));

        let code = unsafe {
            wrf_diag_gradient(DIMS, b.as_ptr(), spacing, x.as_mut_ptr(), y.as_mut_ptr(), ptr::null_mut())
        };
        assert_eq!(code, WrfDiagErrorCode::NullPointer);
        assert_eq!(last_error_message(), "Parameter 'out_z' cannot be null");
    }

    #[test]
    fn test_magnitude_and_interpolation() {
        let three = vec![3.0_f32; len()];
        let four = vec![4.0_f32; len()];
        let zero = vec![0.0_f32; len()];
        let mut out = vec![0.0_f32; len()];
        let code = unsafe {
            wrf_diag_magnitude3d(DIMS, three.as_ptr(), four.as_ptr(), zero.as_ptr(), out.as_mut_ptr())
        };
        assert_eq!(code, WrfDiagErrorCode::Ok);
        assert!(out.iter().all(|&v| v == 5.0));

        let pressure: Vec<f32> = linear_in(2, -100.0).iter().map(|p| p + 1000.0).collect();
        let height = linear_in(2, 10.0);
        let mut surface = vec![0.0_f32; DIMS.nx * DIMS.ny];
        let code = unsafe {
            wrf_diag_interpolate_to_surface(
                DIMS,
                height.as_ptr(),
                pressure.as_ptr(),
                700.0,
                surface.as_mut_ptr(),
            )
        };
        assert_eq!(code, WrfDiagErrorCode::Ok);
        assert!(surface.iter().all(|&v| (v - 30.0).abs() < 1e-4));
    }

    #[test]
    fn test_derivative_wrt_variable_through_abi() {
        let reference: Vec<f32> = linear_in(2, -25.0).iter().map(|p| p + 1000.0).collect();
        let field: Vec<f32> = reference.iter().map(|p| 0.5 * p).collect();
        let mut out = vec![0.0_f32; len()];
        let code = unsafe {
            wrf_diag_derivative_wrt_variable(DIMS, field.as_ptr(), reference.as_ptr(), out.as_mut_ptr())
        };
        assert_eq!(code, WrfDiagErrorCode::Ok);
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_overflowing_dims_rejected() {
        let field = [0.0_f32; 4];
        let mut out = [0.0_f32; 4];
        let huge = GridDims { nx: usize::MAX, ny: 2, nz: 1 };
        let code = unsafe { wrf_diag_derivative(huge, field.as_ptr(), WrfDiagAxis::X as u8, 1.0, out.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::InvalidParameter);
    }

    #[test]
    fn test_out_of_range_axis_rejected() {
        let field = linear_in(0, 1.0);
        let mut out = vec![0.0_f32; len()];
        for raw in [0_u8, 4, 255] {
            let code = unsafe { wrf_diag_derivative(DIMS, field.as_ptr(), raw, 1.0, out.as_mut_ptr()) };
            assert_eq!(code, WrfDiagErrorCode::InvalidParameter);
            assert!(last_error_message().contains(&format!("got {raw}")));
        }
        let code = unsafe { wrf_diag_derivative(DIMS, field.as_ptr(), WrfDiagAxis::Y as u8, 1.0, out.as_mut_ptr()) };
        assert_eq!(code, WrfDiagErrorCode::Ok);
    }
}
