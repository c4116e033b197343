//! WRF-derived diagnostic fields
//!
//! Formula functions take the raw WRF variables as borrowed grids on a common
//! shape and return new grids. Pressures are the sum of perturbation `P` and
//! base state `PB` in Pa, and `T` is perturbation potential temperature
//! (θ − 300 K), as written by WRF.
//!
//! [`DiagnosticSession`] binds a [`VariableProvider`](crate::grid::VariableProvider),
//! a [`CoordinateMapping`](crate::grid::CoordinateMapping) and a
//! [`DerivationContext`](crate::grid::DerivationContext) and fetches the
//! variables each formula needs by name.
//!
//! # Formulas
//!
//! | Function | Output | Units |
//! |----------|--------|-------|
//! | [`temperature_kelvin`] | 3D | K |
//! | [`dewpoint_celsius`] | 3D | °C |
//! | [`relative_humidity`] | 3D | % |
//! | [`equivalent_potential_temperature`] | 3D | K |
//! | [`reflectivity`], [`max_reflectivity`] | 3D, 2D | dBZ |
//! | [`potential_vorticity`] | 3D | PVU |
//! | [`wind_shear`] | 3D | s⁻¹ |
//! | [`sea_level_pressure`] | 2D | hPa |
//! | [`cloud_top_temperature`] | 2D | °C |

mod cloud_top;
mod reflectivity;
mod sea_level;
mod session;
mod shear;
mod thermo;
mod vorticity;

pub use cloud_top::{cloud_top_temperature, CloudTopInputs, IceWater};
pub use reflectivity::{max_reflectivity, reflectivity, ReflectivityInputs, ReflectivityOptions};
pub use sea_level::{sea_level_pressure, SeaLevelInputs};
pub use session::DiagnosticSession;
pub use shear::wind_shear;
pub use thermo::{
    dewpoint_celsius, equivalent_potential_temperature, relative_humidity, temperature_kelvin,
};
pub use vorticity::{potential_vorticity, VorticityInputs};

use crate::core_types::Grid3D;
use crate::error::FieldResult;

/// WRF variable names read by [`DiagnosticSession`]
pub mod names {
    /// Perturbation pressure (Pa)
    pub const P: &str = "P";
    /// Base-state pressure (Pa)
    pub const PB: &str = "PB";
    /// Perturbation potential temperature (K)
    pub const T: &str = "T";
    /// Water vapour mixing ratio (kg/kg)
    pub const QVAPOR: &str = "QVAPOR";
    /// Cloud water mixing ratio (kg/kg)
    pub const QCLOUD: &str = "QCLOUD";
    /// Cloud ice mixing ratio (kg/kg)
    pub const QICE: &str = "QICE";
    /// Rain mixing ratio (kg/kg)
    pub const QRAIN: &str = "QRAIN";
    /// Snow mixing ratio (kg/kg)
    pub const QSNOW: &str = "QSNOW";
    /// Graupel mixing ratio (kg/kg)
    pub const QGRAUP: &str = "QGRAUP";
    /// Grid-relative x wind (m/s)
    pub const U: &str = "U";
    /// Grid-relative y wind (m/s)
    pub const V: &str = "V";
    /// Coriolis parameter (1/s), 2D
    pub const F: &str = "F";
    /// Height of every sample above sea level (m)
    pub const ELEVATION: &str = "ELEVATION";
}

/// Poisson exponent R/cp used throughout WRF post-processing
pub(crate) const KAPPA: f32 = 2.0 / 7.0;
/// Celsius to Kelvin offset
pub(crate) const CELKEL: f32 = 273.15;
/// Gravitational acceleration (m/s²)
pub(crate) const GRAVITY: f32 = 9.81;
/// Gas constant of dry air (J/(kg·K))
pub(crate) const R_DRY: f32 = 287.04;
/// Ratio of molecular weights of water vapour and dry air
pub(crate) const EPSILON_VAPOR: f32 = 0.622;

/// Temperature in K from WRF perturbation potential temperature and total
/// pressure in Pa
#[inline]
pub(crate) fn kelvin(theta_perturbation: f32, pressure_pa: f32) -> f32 {
    (theta_perturbation + 300.0) * (pressure_pa * 1.0e-5).powf(KAPPA)
}

/// `P + PB` in Pa
pub(crate) fn total_pressure(p: &Grid3D, pb: &Grid3D) -> FieldResult<Grid3D> {
    p.zip_map(pb, "total_pressure", |a, b| a + b)
}
