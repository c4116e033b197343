//! Sixth-order finite-difference operators and grid utilities
//!
//! Every operator borrows its inputs, validates shapes and extents before
//! doing any arithmetic, and returns freshly allocated output grids.
//!
//! # Example
//!
//! ```rust
//! use wrf_diag_core::core_types::{Axis, Grid3D, Shape3};
//! use wrf_diag_core::operators::{derivative, gradient, Spacing};
//!
//! let shape = Shape3::new(10, 10, 10);
//! let field = Grid3D::from_fn(shape, |ix, _, _| ix as f32);
//! let dfdx = derivative(&field, Axis::X, 1.0).unwrap();
//! assert!((dfdx.get(5, 5, 5) - 1.0).abs() < 1e-5);
//!
//! let grad = gradient(&field, &Spacing::uniform(1.0)).unwrap();
//! assert!(grad.y.get(5, 5, 5).abs() < 1e-5);
//! ```

mod derivative;
mod scalar;
pub mod stencil;
mod variable;
mod vector_calculus;

pub use derivative::derivative;
pub use scalar::{interpolate_to_surface, magnitude_2d, magnitude_3d, rotate_vector};
pub use stencil::{Stencil, MIN_STENCIL_LEN};
pub use variable::{
    derivative_wrt_variable, derivative_wrt_variable_delta, is_vertically_monotone,
    reference_differences, substitute_small_differences, DEFAULT_DIFFERENCE_EPSILON,
};
pub use vector_calculus::{curl, divergence, gradient, Spacing, VectorGrid};
