//! WRF Diagnostics Core Library
//!
//! Sixth-order finite-difference operators on regular 3D grids and the WRF
//! diagnostic fields built on top of them.
//!
//! ## Operators
//!
//! - Axis derivative with a 7-point centred stencil and 4-point one-sided
//!   stencils in the three samples next to each boundary
//! - Vertical derivative with respect to another field (e.g. pressure)
//! - Curl, divergence and gradient
//! - Magnitudes, interpolation to a constant-reference surface and wind
//!   rotation
//!
//! ## Diagnostics
//!
//! Temperature, dewpoint, relative humidity, equivalent potential temperature,
//! simulated reflectivity, potential vorticity, wind shear, sea-level pressure
//! and cloud-top temperature, evaluated directly or by variable name through a
//! [`DiagnosticSession`].
//!
//! ## Storage
//!
//! Grids are flat `f32` buffers indexed `iz * (ny * nx) + iy * nx + ix`, with
//! x contiguous and z vertical (level 0 at the bottom).

// Core types and utilities
pub mod core_types;
pub mod error;

// Numerical operators and grid description
pub mod grid;
pub mod operators;

// WRF diagnostic formulas
pub mod diagnostics;

// Re-export core types
pub use core_types::{Axis, Grid2D, Grid3D, Shape2, Shape3, Vec3, Vec3d};
pub use error::{FieldError, FieldResult};

// Re-export grid and operator types
pub use grid::{
    CoordinateMapping, DerivationContext, GridGeometry, MemoryProvider, RegularMapping,
    SubRegionExtent, VariableProvider,
};
pub use operators::{Spacing, VectorGrid};

// Re-export diagnostics
pub use diagnostics::{DiagnosticSession, IceWater, ReflectivityOptions};
