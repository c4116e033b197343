//! Grid geometry, derivation context and variable access

pub mod context;
pub mod geometry;
pub mod provider;

// Re-export main types
pub use context::DerivationContext;
pub use geometry::{CoordinateMapping, GridGeometry, RegularMapping, SubRegionExtent};
pub use provider::{MemoryProvider, VariableProvider};
