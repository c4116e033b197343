//! Physical grid spacing for a sampled sub-region.
//!
//! The spacing along each axis is recovered from the coordinate mapping of the
//! data collection by mapping the two corner voxels of the sub-region and
//! dividing the physical extent by the voxel extent:
//!
//! ```text
//! spacing[axis] = (user_max[axis] − user_min[axis]) / (vox_max[axis] − vox_min[axis])
//! ```
//!
//! This assumes uniform spacing across the sub-region. Stretched source grids
//! are outside what the operators support.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::DerivationContext;
use crate::core_types::{Axis, Shape3, Vec3d};
use crate::error::{FieldError, FieldResult};
use crate::operators::Spacing;

/// Inclusive voxel bounds of a sub-region, in physical (x, y, z) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRegionExtent {
    /// Lowest voxel index per axis
    pub min: [usize; 3],
    /// Highest voxel index per axis
    pub max: [usize; 3],
}

impl SubRegionExtent {
    /// Create an extent, rejecting inverted bounds
    ///
    /// # Errors
    /// Returns `InvalidExtent` if `min[axis] > max[axis]` on any axis.
    pub fn new(min: [usize; 3], max: [usize; 3]) -> FieldResult<Self> {
        let extent = Self { min, max };
        extent.validate()?;
        Ok(extent)
    }

    /// Extent covering a whole grid of the given shape
    #[must_use]
    pub fn covering(shape: Shape3) -> Self {
        Self {
            min: [0; 3],
            max: [
                shape.nx.saturating_sub(1),
                shape.ny.saturating_sub(1),
                shape.nz.saturating_sub(1),
            ],
        }
    }

    fn validate(&self) -> FieldResult<()> {
        for axis in Axis::ALL {
            let i = axis.physical_index();
            if self.min[i] > self.max[i] {
                return Err(FieldError::InvalidExtent(format!(
                    "min {} exceeds max {} along {axis}",
                    self.min[i], self.max[i]
                )));
            }
        }
        Ok(())
    }

    /// Number of voxel intervals spanned along each axis
    ///
    /// # Errors
    /// Returns `InvalidExtent` for inverted bounds.
    pub fn voxel_extent(&self) -> FieldResult<[usize; 3]> {
        self.validate()?;
        Ok([
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ])
    }

    /// Shape of the grid sampled over this extent
    ///
    /// # Errors
    /// Returns `InvalidExtent` for inverted bounds.
    pub fn sample_shape(&self) -> FieldResult<Shape3> {
        let [ex, ey, ez] = self.voxel_extent()?;
        Ok(Shape3::new(ex + 1, ey + 1, ez + 1))
    }

    /// Horizontal (x, y) lower bounds
    #[must_use]
    pub fn horizontal_min(&self) -> [usize; 2] {
        [self.min[0], self.min[1]]
    }

    /// Horizontal (x, y) upper bounds
    #[must_use]
    pub fn horizontal_max(&self) -> [usize; 2] {
        [self.max[0], self.max[1]]
    }
}

/// Voxel-to-physical coordinate mapping of a data collection
pub trait CoordinateMapping {
    /// Physical (x, y, z) coordinate of `voxel` at a refinement level and
    /// level of detail
    fn map_voxel_to_physical(&self, voxel: [usize; 3], refinement: u32, lod: u32) -> Vec3d;
}

/// Uniform box domain sampled on a refinement hierarchy
///
/// The finest level (`max_refinement`) has `full_dims` samples per axis
/// spanning `[origin, corner]`; each coarser level halves the number of
/// intervals. Level of detail (compression) does not change geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularMapping {
    origin: Vec3d,
    corner: Vec3d,
    full_dims: [usize; 3],
    max_refinement: u32,
}

impl RegularMapping {
    /// Create a mapping for a box domain
    ///
    /// # Errors
    /// Returns `InvalidExtent` if any dimension is zero.
    pub fn new(origin: Vec3d, corner: Vec3d, full_dims: [usize; 3], max_refinement: u32) -> FieldResult<Self> {
        if full_dims.contains(&0) {
            return Err(FieldError::InvalidExtent(format!(
                "domain dimensions {full_dims:?} must be non-zero"
            )));
        }
        Ok(Self {
            origin,
            corner,
            full_dims,
            max_refinement,
        })
    }

    /// Samples per axis at a refinement level (clamped to the finest level)
    #[must_use]
    pub fn dims_at(&self, refinement: u32) -> [usize; 3] {
        let shift = self.max_refinement - refinement.min(self.max_refinement);
        self.full_dims.map(|d| ((d - 1) >> shift) + 1)
    }
}

impl CoordinateMapping for RegularMapping {
    fn map_voxel_to_physical(&self, voxel: [usize; 3], refinement: u32, _lod: u32) -> Vec3d {
        let dims = self.dims_at(refinement);
        Vec3d::from_fn(|i, _| {
            let intervals = dims[i] - 1;
            if intervals == 0 {
                self.origin[i]
            } else {
                let frac = voxel[i] as f64 / intervals as f64;
                self.origin[i] + (self.corner[i] - self.origin[i]) * frac
            }
        })
    }
}

/// Resolves per-axis spacing for the sub-region of a [`DerivationContext`]
pub struct GridGeometry<'a, M: CoordinateMapping + ?Sized> {
    mapping: &'a M,
}

impl<'a, M: CoordinateMapping + ?Sized> GridGeometry<'a, M> {
    /// Wrap a coordinate mapping
    pub fn new(mapping: &'a M) -> Self {
        Self { mapping }
    }

    /// Physical coordinates of the lower and upper corners of the region
    pub fn physical_bounds(&self, context: &DerivationContext) -> (Vec3d, Vec3d) {
        let region = &context.region;
        let lo = self
            .mapping
            .map_voxel_to_physical(region.min, context.refinement, context.lod);
        let hi = self
            .mapping
            .map_voxel_to_physical(region.max, context.refinement, context.lod);
        (lo, hi)
    }

    /// Spacing (dx, dy, dz) of the context's sub-region
    ///
    /// # Errors
    /// - `InvalidExtent` if the region bounds are inverted
    /// - `DegenerateSpacing` if an axis spans zero voxels or maps to a zero or
    ///   non-finite physical spacing
    pub fn resolve_spacing(&self, context: &DerivationContext) -> FieldResult<Spacing> {
        let extent = context.region.voxel_extent()?;
        let (lo, hi) = self.physical_bounds(context);

        let mut spacing = [0.0_f32; 3];
        for axis in Axis::ALL {
            let i = axis.physical_index();
            if extent[i] == 0 {
                return Err(FieldError::DegenerateSpacing {
                    axis,
                    spacing: f32::NAN,
                });
            }
            let h = ((hi[i] - lo[i]) / extent[i] as f64) as f32;
            if h == 0.0 || !h.is_finite() {
                return Err(FieldError::DegenerateSpacing { axis, spacing: h });
            }
            spacing[i] = h;
        }

        let resolved = Spacing::new(spacing[0], spacing[1], spacing[2]);
        debug!(?resolved, region = ?context.region, refinement = context.refinement, "resolved grid spacing");
        Ok(resolved)
    }
}
