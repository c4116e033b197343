//! Physical axes and their mapping onto grid storage.
//!
//! Grids are stored with x varying fastest and z slowest, so the mapping from
//! physical direction to storage axis is fixed:
//!
//! | `Axis` | storage axis | stride      | legacy direction |
//! |--------|--------------|-------------|------------------|
//! | `X`    | innermost    | `1`         | 1                |
//! | `Y`    | middle       | `nx`        | 2                |
//! | `Z`    | outermost    | `nx * ny`   | 3                |
//!
//! Every operator in the crate relies on this table; `Z` is the vertical axis
//! with index 0 at the bottom of the column.

use serde::{Deserialize, Serialize};

use super::grid::Shape3;

/// Physical direction of a grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// West-east, contiguous in memory
    X,
    /// South-north
    Y,
    /// Bottom-top (vertical)
    Z,
}

impl Axis {
    /// All axes in physical (x, y, z) order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in physical (x, y, z) order
    #[must_use]
    pub fn physical_index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Resolve a legacy 1-based direction number (1 = x, 2 = y, 3 = z).
    #[must_use]
    pub fn from_direction(direction: u8) -> Option<Self> {
        match direction {
            1 => Some(Axis::X),
            2 => Some(Axis::Y),
            3 => Some(Axis::Z),
            _ => None,
        }
    }

    /// Number of samples along this axis for a given shape
    #[must_use]
    pub fn len(self, shape: Shape3) -> usize {
        match self {
            Axis::X => shape.nx,
            Axis::Y => shape.ny,
            Axis::Z => shape.nz,
        }
    }

    /// Distance in the flat buffer between neighbours along this axis
    #[must_use]
    pub fn stride(self, shape: Shape3) -> usize {
        match self {
            Axis::X => 1,
            Axis::Y => shape.nx,
            Axis::Z => shape.nx * shape.ny,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_follow_storage_order() {
        let shape = Shape3::new(6, 5, 4);
        assert_eq!(Axis::X.stride(shape), 1);
        assert_eq!(Axis::Y.stride(shape), 6);
        assert_eq!(Axis::Z.stride(shape), 30);
        assert_eq!(Axis::X.len(shape), 6);
        assert_eq!(Axis::Z.len(shape), 4);
    }

    #[test]
    fn test_legacy_direction_numbers() {
        assert_eq!(Axis::from_direction(1), Some(Axis::X));
        assert_eq!(Axis::from_direction(3), Some(Axis::Z));
        assert_eq!(Axis::from_direction(0), None);
        assert_eq!(Axis::from_direction(4), None);
    }
}
