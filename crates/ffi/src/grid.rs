use crate::error::DefaultWrfDiagError;
use wrf_diag_core::{Axis, Shape3, Spacing};

/// Grid dimensions shared by every buffer passed to one call.
///
/// Buffers are laid out with x contiguous: sample `(ix, iy, iz)` lives at
/// `iz * ny * nx + iy * nx + ix`. Level 0 is the bottom.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    /// Samples along x (innermost)
    pub nx: usize,
    /// Samples along y
    pub ny: usize,
    /// Samples along z (outermost, vertical)
    pub nz: usize,
}

impl GridDims {
    /// Validate the dimensions and convert to a core shape.
    pub(crate) fn shape(self) -> Result<Shape3, DefaultWrfDiagError> {
        self.nx
            .checked_mul(self.ny)
            .and_then(|layer| layer.checked_mul(self.nz))
            .ok_or_else(|| {
                DefaultWrfDiagError::invalid_parameter(format!(
                    "grid dimensions {}x{}x{} overflow the address space",
                    self.nx, self.ny, self.nz
                ))
            })?;
        Ok(Shape3::new(self.nx, self.ny, self.nz))
    }
}

/// Axis numbers accepted by the `axis` parameter of `wrf_diag_derivative`.
///
/// The ABI takes the raw `u8` so that any value a C caller passes is defined;
/// numbers outside 1..=3 are rejected with `InvalidParameter`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrfDiagAxis {
    /// Innermost storage axis
    X = 1,
    /// Middle storage axis
    Y = 2,
    /// Outermost storage axis (vertical)
    Z = 3,
}

/// Resolve a raw axis number from the ABI.
pub(crate) fn axis_from_raw(raw: u8) -> Result<Axis, DefaultWrfDiagError> {
    Axis::from_direction(raw).ok_or_else(|| {
        DefaultWrfDiagError::invalid_parameter(format!(
            "axis must be 1 (x), 2 (y) or 3 (z), got {raw}"
        ))
    })
}

/// Physical spacing along each axis.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrfDiagSpacing {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

impl From<WrfDiagSpacing> for Spacing {
    fn from(s: WrfDiagSpacing) -> Self {
        Spacing::new(s.dx, s.dy, s.dz)
    }
}
