//! Where and at what resolution a derivation is evaluated.

use serde::{Deserialize, Serialize};

use super::geometry::SubRegionExtent;

/// Timestep, refinement, level of detail and voxel sub-region of a request
///
/// Every input fetched for one derivation must share the same context so that
/// the grids line up sample for sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationContext {
    /// Timestep index into the data collection
    pub timestep: usize,
    /// Refinement level of the multiresolution hierarchy
    pub refinement: u32,
    /// Level of detail (compression level)
    pub lod: u32,
    /// Inclusive voxel bounds of the sub-region
    pub region: SubRegionExtent,
}

impl Default for DerivationContext {
    /// A 7×7×7 region at the origin of timestep 0, the smallest box every
    /// stencil in the crate can run on
    fn default() -> Self {
        Self {
            timestep: 0,
            refinement: 0,
            lod: 0,
            region: SubRegionExtent {
                min: [0; 3],
                max: [6; 3],
            },
        }
    }
}

impl DerivationContext {
    /// Context for a region at a timestep, finest refinement and LOD 0
    #[must_use]
    pub fn new(timestep: usize, region: SubRegionExtent) -> Self {
        Self {
            timestep,
            region,
            ..Default::default()
        }
    }

    /// Same request at another refinement level
    #[must_use]
    pub fn with_refinement(mut self, refinement: u32) -> Self {
        self.refinement = refinement;
        self
    }

    /// Same request at another level of detail
    #[must_use]
    pub fn with_lod(mut self, lod: u32) -> Self {
        self.lod = lod;
        self
    }
}
