//! C ABI for the WRF diagnostics core.
//!
//! Every function takes caller-allocated input and output buffers laid out
//! with x contiguous (`iz * ny * nx + iy * nx + ix`) and returns a
//! `WrfDiagErrorCode`. On failure the message is available from
//! `wrf_diag_get_last_error()` on the same thread until the next call.
//!
//! ```c
//! GridDims dims = { nx, ny, nz };
//! WrfDiagErrorCode err = wrf_diag_derivative(dims, theta, WrfDiagAxis_Z, 500.0f, dtheta_dz);
//! if (err != WrfDiagErrorCode_Ok) {
//!     fprintf(stderr, "%s\n", wrf_diag_get_last_error());
//! }
//! ```

mod error;
mod grid;
mod helpers;
mod operators;

pub use error::{wrf_diag_get_last_error, wrf_diag_get_last_error_code, WrfDiagErrorCode};
pub use grid::{GridDims, WrfDiagAxis, WrfDiagSpacing};
pub use operators::{
    wrf_diag_curl, wrf_diag_derivative, wrf_diag_derivative_wrt_variable, wrf_diag_divergence,
    wrf_diag_gradient, wrf_diag_interpolate_to_surface, wrf_diag_magnitude3d,
};
