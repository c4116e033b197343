use crate::error::{with_last_error_mut, DefaultWrfDiagError, WrfDiagError, WrfDiagErrorCode};
use crate::grid::GridDims;
use std::ffi::CString;
use std::ptr;
use std::slice;
use wrf_diag_core::{Grid2D, Grid3D};

/// Set the thread-local error message and code.
/// Accepts any type implementing `WrfDiagError` trait.
pub(crate) fn set_last_error(error: &impl WrfDiagError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl WrfDiagError) -> WrfDiagErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = WrfDiagErrorCode::Ok;
    });
}

/// Run a fallible FFI body, recording the error or clearing the last error.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> WrfDiagErrorCode
where
    F: FnOnce() -> Result<(), DefaultWrfDiagError>,
{
    match f() {
        Ok(()) => {
            clear_last_error();
            WrfDiagErrorCode::Ok
        }
        Err(error) => track_error(&error),
    }
}

/// Reject a null pointer parameter.
#[inline]
pub(crate) fn require_non_null<T>(ptr: *const T, param_name: &str) -> Result<(), DefaultWrfDiagError> {
    if ptr.is_null() {
        Err(DefaultWrfDiagError::null_pointer(param_name))
    } else {
        Ok(())
    }
}

/// Copy a caller-owned buffer of `dims.len()` samples into a `Grid3D`.
///
/// # Safety
/// `data` must be null or point to at least `dims.len()` readable `f32` values.
pub(crate) unsafe fn grid_from_raw(
    dims: GridDims,
    data: *const f32,
    param_name: &str,
) -> Result<Grid3D, DefaultWrfDiagError> {
    require_non_null(data, param_name)?;
    let shape = dims.shape()?;
    let values = unsafe { slice::from_raw_parts(data, shape.len()) }.to_vec();
    Ok(Grid3D::from_vec(shape, values)?)
}

/// Copy a 3D result into a caller-owned buffer of `grid.len()` samples.
///
/// # Safety
/// `out` must point to at least `grid.len()` writable `f32` values and must
/// not overlap the grid's storage.
pub(crate) unsafe fn write_grid(grid: &Grid3D, out: *mut f32) {
    unsafe { ptr::copy_nonoverlapping(grid.as_slice().as_ptr(), out, grid.len()) };
}

/// Copy a 2D result into a caller-owned buffer of `grid.len()` samples.
///
/// # Safety
/// `out` must point to at least `grid.len()` writable `f32` values.
pub(crate) unsafe fn write_surface(grid: &Grid2D, out: *mut f32) {
    unsafe { ptr::copy_nonoverlapping(grid.as_slice().as_ptr(), out, grid.len()) };
}
