//! Cloud-top temperature from accumulated optical depth
//!
//! Each column is swept from the level below the top down to the surface,
//! accumulating optical depth
//!
//! ```text
//! τ += (k_w · q_cloud + k_i · q_ice) · Δp / g
//! ```
//!
//! with mixing ratios in g/kg and Δp in Pa. The temperature of the first level
//! where τ crosses 1 is the cloud top. Columns that never reach τ = 1 report
//! the surface temperature.

use rayon::prelude::*;
use tracing::debug;

use super::{kelvin, CELKEL, GRAVITY};
use crate::core_types::{Grid2D, Grid3D};
use crate::error::FieldResult;

/// Absorption coefficient of cloud water (m²/g)
const ABSCOEF_WATER: f32 = 0.145;
/// Absorption coefficient of cloud ice (m²/g)
const ABSCOEF_ICE: f32 = 0.272;
const GRAMS_PER_KILOGRAM: f32 = 1000.0;

/// How cloud ice enters the optical depth
#[derive(Debug, Clone, Copy)]
pub enum IceWater<'a> {
    /// Ice mixing ratio is available and absorbs alongside cloud water
    Explicit(&'a Grid3D),
    /// No ice field: cloud water below freezing absorbs as ice
    Diagnosed,
}

/// WRF fields read by [`cloud_top_temperature`]
#[derive(Debug, Clone, Copy)]
pub struct CloudTopInputs<'a> {
    /// Perturbation pressure `P` in Pa
    pub p: &'a Grid3D,
    /// Base-state pressure `PB` in Pa
    pub pb: &'a Grid3D,
    /// Perturbation potential temperature `T` in K
    pub t: &'a Grid3D,
    /// Cloud water mixing ratio `QCLOUD` in kg/kg
    pub qcloud: &'a Grid3D,
}

/// Cloud-top temperature in °C
///
/// # Errors
/// Returns `ShapeMismatch` if the inputs (and the explicit ice field) differ
/// in shape.
pub fn cloud_top_temperature(inputs: &CloudTopInputs<'_>, ice: IceWater<'_>) -> FieldResult<Grid2D> {
    const OP: &str = "cloud_top_temperature";
    let CloudTopInputs { p, pb, t, qcloud } = *inputs;
    p.ensure_same_shape(pb, OP)?;
    p.ensure_same_shape(t, OP)?;
    p.ensure_same_shape(qcloud, OP)?;
    if let IceWater::Explicit(qice) = ice {
        p.ensure_same_shape(qice, OP)?;
    }

    let shape = p.shape();
    debug!(%shape, explicit_ice = matches!(ice, IceWater::Explicit(_)), "cloud-top temperature");
    if shape.is_empty() {
        return Ok(Grid2D::new(shape.horizontal()));
    }

    let layer = shape.layer_len();
    let nz = shape.nz;
    let (p, pb, t, qc) = (p.as_slice(), pb.as_slice(), t.as_slice(), qcloud.as_slice());
    let qi = match ice {
        IceWater::Explicit(qice) => Some(qice.as_slice()),
        IceWater::Diagnosed => None,
    };
    let pressure = |idx: usize| p[idx] + pb[idx];

    let values: Vec<f32> = (0..layer)
        .into_par_iter()
        .map(|col| {
            let mut ctt = kelvin(t[col], pressure(col)) - CELKEL;
            let mut depth_above = 0.0_f32;
            for k in (0..nz.saturating_sub(1)).rev() {
                let idx = k * layer + col;
                let dp = pressure(idx) - pressure(idx + layer);
                let tk = kelvin(t[idx], pressure(idx));
                let cloud = GRAMS_PER_KILOGRAM * qc[idx];
                let absorption = match qi {
                    Some(qi) => ABSCOEF_WATER * cloud + ABSCOEF_ICE * GRAMS_PER_KILOGRAM * qi[idx],
                    None if tk < CELKEL => ABSCOEF_ICE * cloud,
                    None => ABSCOEF_WATER * cloud,
                };
                let depth = depth_above + absorption * dp / GRAVITY;
                if depth > 1.0 && depth_above <= 1.0 {
                    ctt = tk - CELKEL;
                }
                depth_above = depth;
            }
            ctt
        })
        .collect();

    Grid2D::from_vec(shape.horizontal(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Shape3;
    use crate::error::FieldError;
    use approx::assert_relative_eq;

    fn shape() -> Shape3 {
        Shape3::new(2, 3, 10)
    }

    /// 100 hPa per level from 1000 hPa, θ = 300 K
    fn atmosphere() -> (Grid3D, Grid3D, Grid3D) {
        (
            Grid3D::new(shape()),
            Grid3D::from_fn(shape(), |_, _, iz| 100_000.0 - 10_000.0 * iz as f32),
            Grid3D::new(shape()),
        )
    }

    fn level_celsius(iz: usize) -> f32 {
        kelvin(0.0, 100_000.0 - 10_000.0 * iz as f32) - CELKEL
    }

    fn layers(levels: &[(usize, f32)]) -> Grid3D {
        Grid3D::from_fn(shape(), |_, _, iz| {
            levels.iter().find(|(k, _)| *k == iz).map_or(0.0, |(_, q)| *q)
        })
    }

    #[test]
    fn test_clear_sky_reports_surface_temperature() {
        let (p, pb, t) = atmosphere();
        let thin = layers(&[(5, 1.0e-6)]);
        let inputs = CloudTopInputs {
            p: &p,
            pb: &pb,
            t: &t,
            qcloud: &thin,
        };
        let ctt = cloud_top_temperature(&inputs, IceWater::Diagnosed).unwrap();
        for &v in ctt.as_slice() {
            assert_relative_eq!(v, level_celsius(0), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_highest_thick_layer_sets_cloud_top() {
        let (p, pb, t) = atmosphere();
        let qcloud = layers(&[(2, 1.0e-3), (6, 1.0e-3)]);
        let inputs = CloudTopInputs {
            p: &p,
            pb: &pb,
            t: &t,
            qcloud: &qcloud,
        };
        let ctt = cloud_top_temperature(&inputs, IceWater::Diagnosed).unwrap();
        assert_relative_eq!(ctt.get(1, 2), level_celsius(6), epsilon = 1e-4);
    }

    #[test]
    fn test_explicit_ice_cloud() {
        let (p, pb, t) = atmosphere();
        let qcloud = Grid3D::new(shape());
        let qice = layers(&[(7, 5.0e-4)]);
        let inputs = CloudTopInputs {
            p: &p,
            pb: &pb,
            t: &t,
            qcloud: &qcloud,
        };
        let with_ice = cloud_top_temperature(&inputs, IceWater::Explicit(&qice)).unwrap();
        let without = cloud_top_temperature(&inputs, IceWater::Diagnosed).unwrap();
        assert_relative_eq!(with_ice.get(0, 0), level_celsius(7), epsilon = 1e-4);
        assert_relative_eq!(without.get(0, 0), level_celsius(0), epsilon = 1e-4);
    }

    #[test]
    fn test_ice_shape_checked() {
        let (p, pb, t) = atmosphere();
        let wrong = Grid3D::new(Shape3::new(2, 3, 9));
        let inputs = CloudTopInputs {
            p: &p,
            pb: &pb,
            t: &t,
            qcloud: &t,
        };
        assert!(matches!(
            cloud_top_temperature(&inputs, IceWater::Explicit(&wrong)),
            Err(FieldError::ShapeMismatch { .. })
        ));
    }
}
