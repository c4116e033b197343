//! Core data types shared by the operators and diagnostics.

pub mod axis;
pub mod grid;
pub mod vec3;

pub use axis::Axis;
pub use grid::{Grid2D, Grid3D, Shape2, Shape3};
pub use vec3::{Vec3, Vec3d};
