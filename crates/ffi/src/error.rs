use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use wrf_diag_core::FieldError;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
///
/// # Example
/// ```rust,ignore
/// let err = DefaultWrfDiagError::null_pointer("field");
/// assert_eq!(err.code(), WrfDiagErrorCode::NullPointer);
/// assert_eq!(err.msg(), "Parameter 'field' cannot be null");
/// ```
pub(crate) trait WrfDiagError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> WrfDiagErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `WrfDiagError` for common FFI error scenarios.
///
/// Wraps a `WrfDiagErrorCode` with a message and provides constructors for
/// the failures detected at the boundary. Errors raised by the core library
/// convert through `From<FieldError>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultWrfDiagError {
    code: WrfDiagErrorCode,
    msg: String,
}

impl DefaultWrfDiagError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"field"`, `"out"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: WrfDiagErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: WrfDiagErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl From<FieldError> for DefaultWrfDiagError {
    fn from(error: FieldError) -> Self {
        let code = match error {
            FieldError::ShapeMismatch { .. } | FieldError::LengthMismatch { .. } => {
                WrfDiagErrorCode::ShapeMismatch
            }
            FieldError::DegenerateSpacing { .. } => WrfDiagErrorCode::DegenerateSpacing,
            FieldError::InsufficientExtent { .. } => WrfDiagErrorCode::InsufficientExtent,
            FieldError::InvalidExtent(_) | FieldError::MissingVariable { .. } => {
                WrfDiagErrorCode::InvalidParameter
            }
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

impl WrfDiagError for DefaultWrfDiagError {
    fn code(&self) -> WrfDiagErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by diagnostic functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrfDiagErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Input grids do not share the same dimensions.
    ShapeMismatch = 2,

    /// Grid spacing is zero or non-finite.
    DegenerateSpacing = 3,

    /// An axis is too short for the 7-point stencil.
    InsufficientExtent = 4,

    /// Invalid parameter passed to function.
    InvalidParameter = 5,
}

impl From<DefaultWrfDiagError> for WrfDiagErrorCode {
    fn from(error: DefaultWrfDiagError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored to prevent memory leaks when returning raw pointers via FFI.
    static LAST_ERROR: RefCell<(Option<CString>, WrfDiagErrorCode)> = const { RefCell::new((None, WrfDiagErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, WrfDiagErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, WrfDiagErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded or the message cannot be converted to a C string.
///
/// # Thread Safety
/// Error messages are stored per-thread (thread-local storage), so this is thread-safe.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread or
/// until the thread terminates.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// WrfDiagErrorCode err = wrf_diag_derivative(dims, field, WrfDiagAxis_Z, 500.0f, out);
/// if (err != WrfDiagErrorCode_Ok) {
///     const char* error = wrf_diag_get_last_error();
///     if (error) {
///         fprintf(stderr, "derivative failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn wrf_diag_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns:
/// - `WrfDiagErrorCode::Ok` (0) if the last call on this thread succeeded
/// - The specific error code from the last failed operation
#[no_mangle]
pub extern "C" fn wrf_diag_get_last_error_code() -> WrfDiagErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
