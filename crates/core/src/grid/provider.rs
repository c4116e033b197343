//! Named-variable access for derivations.
//!
//! A [`VariableProvider`] hands out grids for a variable name at the timestep
//! and sub-region of a [`DerivationContext`]. [`MemoryProvider`] is the
//! in-process implementation: whole-domain grids keyed by `(timestep, name)`,
//! cropped to the requested region on every fetch.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::context::DerivationContext;
use crate::core_types::{Grid2D, Grid3D};
use crate::error::{FieldError, FieldResult};

/// Source of named 3D and 2D variables
pub trait VariableProvider {
    /// True if `name` can be fetched at `timestep` in either dimensionality
    fn variable_exists(&self, timestep: usize, name: &str) -> bool;

    /// Fetch a 3D variable over the context's sub-region
    ///
    /// # Errors
    /// `MissingVariable` if the variable is absent, `InvalidExtent` if the
    /// region does not fit the stored grid.
    fn get_3d(&self, name: &str, context: &DerivationContext) -> FieldResult<Grid3D>;

    /// Fetch a 2D variable over the horizontal part of the context's
    /// sub-region
    ///
    /// # Errors
    /// `MissingVariable` if the variable is absent, `InvalidExtent` if the
    /// region does not fit the stored grid.
    fn get_2d(&self, name: &str, context: &DerivationContext) -> FieldResult<Grid2D>;
}

/// In-memory provider backed by hash maps of whole-domain grids
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    fields_3d: FxHashMap<(usize, String), Grid3D>,
    fields_2d: FxHashMap<(usize, String), Grid2D>,
}

impl MemoryProvider {
    /// Empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a 3D variable, replacing any previous grid under the same key
    pub fn insert_3d(&mut self, timestep: usize, name: impl Into<String>, grid: Grid3D) {
        self.fields_3d.insert((timestep, name.into()), grid);
    }

    /// Store a 2D variable, replacing any previous grid under the same key
    pub fn insert_2d(&mut self, timestep: usize, name: impl Into<String>, grid: Grid2D) {
        self.fields_2d.insert((timestep, name.into()), grid);
    }

    /// Builder form of [`insert_3d`](Self::insert_3d)
    #[must_use]
    pub fn with_3d(mut self, timestep: usize, name: impl Into<String>, grid: Grid3D) -> Self {
        self.insert_3d(timestep, name, grid);
        self
    }

    /// Builder form of [`insert_2d`](Self::insert_2d)
    #[must_use]
    pub fn with_2d(mut self, timestep: usize, name: impl Into<String>, grid: Grid2D) -> Self {
        self.insert_2d(timestep, name, grid);
        self
    }

    /// Number of stored variables across all timesteps
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields_3d.len() + self.fields_2d.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn missing(name: &str, timestep: usize) -> FieldError {
        FieldError::MissingVariable {
            name: name.to_string(),
            timestep,
        }
    }
}

impl VariableProvider for MemoryProvider {
    fn variable_exists(&self, timestep: usize, name: &str) -> bool {
        let key = (timestep, name.to_string());
        self.fields_3d.contains_key(&key) || self.fields_2d.contains_key(&key)
    }

    fn get_3d(&self, name: &str, context: &DerivationContext) -> FieldResult<Grid3D> {
        let grid = self
            .fields_3d
            .get(&(context.timestep, name.to_string()))
            .ok_or_else(|| Self::missing(name, context.timestep))?;
        trace!(name, timestep = context.timestep, region = ?context.region, "fetching 3D variable");
        grid.crop(context.region.min, context.region.max)
    }

    fn get_2d(&self, name: &str, context: &DerivationContext) -> FieldResult<Grid2D> {
        let grid = self
            .fields_2d
            .get(&(context.timestep, name.to_string()))
            .ok_or_else(|| Self::missing(name, context.timestep))?;
        trace!(name, timestep = context.timestep, region = ?context.region, "fetching 2D variable");
        grid.crop(context.region.horizontal_min(), context.region.horizontal_max())
    }
}
