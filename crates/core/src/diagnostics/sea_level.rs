//! Sea-level pressure reduction
//!
//! For each column the first level at least 100 hPa above the surface is
//! found and the virtual temperature and height at exactly 100 hPa above the
//! surface are log-pressure interpolated between that level and the one
//! below. A standard lapse rate then extrapolates a surface and a sea-level
//! temperature, and the hypsometric equation reduces the surface pressure to
//! sea level.
//!
//! Warm sea-level temperatures are capped by the MM5 correction
//! (`TC = 290.66 K`), retained for compatibility with RIP and NCL output.

use rayon::prelude::*;
use tracing::{debug, warn};

use super::{kelvin, GRAVITY, R_DRY};
use crate::core_types::{Axis, Grid2D, Grid3D};
use crate::error::{FieldError, FieldResult};

const LAPSE_RATE: f32 = 0.0065;
const TC: f32 = 273.16 + 17.5;
const PCONST: f32 = 10_000.0;

/// WRF fields read by [`sea_level_pressure`]
#[derive(Debug, Clone, Copy)]
pub struct SeaLevelInputs<'a> {
    /// Perturbation pressure `P` in Pa
    pub p: &'a Grid3D,
    /// Base-state pressure `PB` in Pa
    pub pb: &'a Grid3D,
    /// Perturbation potential temperature `T` in K
    pub t: &'a Grid3D,
    /// Water vapour mixing ratio `QVAPOR` in kg/kg
    pub qvapor: &'a Grid3D,
    /// Height of every sample above sea level in m
    pub elevation: &'a Grid3D,
}

/// Sea-level pressure in hPa
///
/// Columns too shallow to reach 100 hPa above the surface fall back to the
/// two topmost levels and are reported once with `tracing::warn!`.
///
/// # Errors
/// - `ShapeMismatch` if the inputs differ in shape
/// - `InsufficientExtent` if there are fewer than 2 vertical levels
pub fn sea_level_pressure(inputs: &SeaLevelInputs<'_>) -> FieldResult<Grid2D> {
    const OP: &str = "sea_level_pressure";
    let SeaLevelInputs {
        p,
        pb,
        t,
        qvapor,
        elevation,
    } = *inputs;
    p.ensure_same_shape(pb, OP)?;
    p.ensure_same_shape(t, OP)?;
    p.ensure_same_shape(qvapor, OP)?;
    p.ensure_same_shape(elevation, OP)?;

    let shape = p.shape();
    if shape.is_empty() {
        return Ok(Grid2D::new(shape.horizontal()));
    }
    if shape.nz < 2 {
        return Err(FieldError::InsufficientExtent {
            axis: Axis::Z,
            length: shape.nz,
            required: 2,
        });
    }
    debug!(%shape, "sea-level pressure");

    let layer = shape.layer_len();
    let nz = shape.nz;
    let (p, pb, t, q, z) = (
        p.as_slice(),
        pb.as_slice(),
        t.as_slice(),
        qvapor.as_slice(),
        elevation.as_slice(),
    );
    let pressure = |k: usize, col: usize| p[k * layer + col] + pb[k * layer + col];
    let virtual_temperature = |k: usize, col: usize| {
        let idx = k * layer + col;
        kelvin(t[idx], pressure(k, col)) * (1.0 + 0.608 * q[idx])
    };

    let (values, fallbacks): (Vec<f32>, Vec<bool>) = (0..layer)
        .into_par_iter()
        .map(|col| {
            let surface_p = pressure(0, col);
            let p_at_pconst = surface_p - PCONST;

            let found = (0..nz).find(|&k| pressure(k, col) < p_at_pconst);
            let (lo, hi) = match found {
                Some(k) => (k.saturating_sub(1), k),
                None => (nz - 2, nz - 1),
            };

            let (plo, phi) = (pressure(lo, col), pressure(hi, col));
            let (tlo, thi) = (virtual_temperature(lo, col), virtual_temperature(hi, col));
            let (zlo, zhi) = (z[lo * layer + col], z[hi * layer + col]);

            let weight = (p_at_pconst / phi).ln() / (plo / phi).ln();
            let t_at_pconst = thi - (thi - tlo) * weight;
            let z_at_pconst = zhi - (zhi - zlo) * weight;

            let t_surf = t_at_pconst * (surface_p / p_at_pconst).powf(LAPSE_RATE * R_DRY / GRAVITY);
            let t_sea_level = t_at_pconst + LAPSE_RATE * z_at_pconst;

            let t_sea_level = if t_surf <= TC && t_sea_level >= TC {
                TC
            } else {
                TC - 0.005 * (t_surf - TC).powi(2)
            };

            let slp = 0.01 * surface_p * (2.0 * GRAVITY * z[col] / (R_DRY * (t_sea_level + t_surf))).exp();
            (slp, found.is_none())
        })
        .unzip();

    let shallow = fallbacks.iter().filter(|&&f| f).count();
    if shallow > 0 {
        warn!(
            columns = shallow,
            "no level 100 hPa above the surface; used the top two levels"
        );
    }

    Grid2D::from_vec(shape.horizontal(), values)
}
