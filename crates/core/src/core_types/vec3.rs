//! Vector type aliases for physical coordinates and spacings.

use nalgebra::Vector3;

/// 3D vector type for spacings and small physical quantities.
///
/// This is a simple alias for `nalgebra::Vector3<f32>`, matching the
/// precision of the grid samples.
pub type Vec3 = Vector3<f32>;

/// Double-precision 3D vector for physical (user) coordinates.
///
/// Model domains span thousands of kilometres, so corner coordinates are kept
/// in f64 until the per-axis spacing has been formed.
pub type Vec3d = Vector3<f64>;
