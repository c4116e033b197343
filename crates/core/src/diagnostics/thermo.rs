//! Pointwise thermodynamic diagnostics: TK, TD, RH and θe.

use tracing::debug;

use super::{kelvin, CELKEL, EPSILON_VAPOR};
use crate::core_types::Grid3D;
use crate::error::FieldResult;

const SVP1: f32 = 0.6112;
const SVP2: f32 = 17.67;
const SVP3: f32 = 29.65;

// Bolton (1980) constants for the LCL temperature and θe exponent
const TLCL_C1: f32 = 2840.0;
const TLCL_C2: f32 = 3.5;
const TLCL_C3: f32 = 4.805;
const TLCL_C4: f32 = 55.0;
const THETAE_C1: f32 = 3376.0;
const THETAE_C2: f32 = 2.54;
const THETAE_C3: f32 = 0.81;
const GAMMA_DRY: f32 = 287.04 / 1004.0;
const GAMMA_MOIST: f32 = 0.608 - 0.887;

/// Temperature in K: `(T + 300) · ((P + PB) · 1e-5)^(2/7)`
///
/// # Errors
/// Returns `ShapeMismatch` if the inputs differ in shape.
pub fn temperature_kelvin(p: &Grid3D, pb: &Grid3D, t: &Grid3D) -> FieldResult<Grid3D> {
    p.ensure_same_shape(pb, "temperature_kelvin")?;
    p.ensure_same_shape(t, "temperature_kelvin")?;
    debug!(shape = %p.shape(), "temperature");
    let shape = p.shape();
    let (p, pb, t) = (p.as_slice(), pb.as_slice(), t.as_slice());
    Ok(Grid3D::from_index_fn(shape, |i| kelvin(t[i], p[i] + pb[i])))
}

/// Dewpoint in °C from vapour pressure
///
/// Vapour pressure `e = qv·p / (0.622 + qv)` in hPa, with `qv` floored at 0 and
/// `e` floored at 0.001 hPa, then `TD = (243.5·ln e − 440.8) / (19.48 − ln e)`.
///
/// # Errors
/// Returns `ShapeMismatch` if the inputs differ in shape.
pub fn dewpoint_celsius(p: &Grid3D, pb: &Grid3D, qvapor: &Grid3D) -> FieldResult<Grid3D> {
    p.ensure_same_shape(pb, "dewpoint_celsius")?;
    p.ensure_same_shape(qvapor, "dewpoint_celsius")?;
    debug!(shape = %p.shape(), "dewpoint");
    let shape = p.shape();
    let (p, pb, q) = (p.as_slice(), pb.as_slice(), qvapor.as_slice());
    Ok(Grid3D::from_index_fn(shape, |i| {
        let qv = q[i].max(0.0);
        let e = (0.01 * qv * (p[i] + pb[i]) / (EPSILON_VAPOR + qv)).max(0.001);
        let ln_e = e.ln();
        (243.5 * ln_e - 440.8) / (19.48 - ln_e)
    }))
}

/// Relative humidity in %, clamped to `[0, 100]`
///
/// Saturation vapour pressure follows Bolton's fit in hPa,
/// `es = 6.112 · exp(17.67 (T − 273.15) / (T − 29.65))`.
///
/// # Errors
/// Returns `ShapeMismatch` if the inputs differ in shape.
pub fn relative_humidity(p: &Grid3D, pb: &Grid3D, t: &Grid3D, qvapor: &Grid3D) -> FieldResult<Grid3D> {
    p.ensure_same_shape(pb, "relative_humidity")?;
    p.ensure_same_shape(t, "relative_humidity")?;
    p.ensure_same_shape(qvapor, "relative_humidity")?;
    debug!(shape = %p.shape(), "relative humidity");
    let shape = p.shape();
    let (p, pb, t, q) = (p.as_slice(), pb.as_slice(), t.as_slice(), qvapor.as_slice());
    Ok(Grid3D::from_index_fn(shape, |i| {
        let press = p[i] + pb[i];
        let tk = kelvin(t[i], press);
        let es = 10.0 * SVP1 * (SVP2 * (tk - CELKEL) / (tk - SVP3)).exp();
        let qvs = EPSILON_VAPOR * es / (0.01 * press - (1.0 - EPSILON_VAPOR) * es);
        100.0 * (q[i] / qvs).clamp(0.0, 1.0)
    }))
}

/// Equivalent potential temperature in K (Bolton 1980)
///
/// Mixing ratio is floored at 1e-15 so the LCL temperature stays defined in
/// dry air, where θe reduces to θ.
///
/// # Errors
/// Returns `ShapeMismatch` if the inputs differ in shape.
pub fn equivalent_potential_temperature(
    p: &Grid3D,
    pb: &Grid3D,
    t: &Grid3D,
    qvapor: &Grid3D,
) -> FieldResult<Grid3D> {
    p.ensure_same_shape(pb, "equivalent_potential_temperature")?;
    p.ensure_same_shape(t, "equivalent_potential_temperature")?;
    p.ensure_same_shape(qvapor, "equivalent_potential_temperature")?;
    debug!(shape = %p.shape(), "equivalent potential temperature");
    let shape = p.shape();
    let (p, pb, t, q) = (p.as_slice(), pb.as_slice(), t.as_slice(), qvapor.as_slice());
    Ok(Grid3D::from_index_fn(shape, |i| {
        let press_hpa = 0.01 * (p[i] + pb[i]);
        let tk = kelvin(t[i], p[i] + pb[i]);
        let qv = q[i].max(1.0e-15);
        let e = qv * press_hpa / (EPSILON_VAPOR + qv);
        let tlcl = TLCL_C4 + TLCL_C1 / ((tk.powf(TLCL_C2) / e).ln() - TLCL_C3);
        let exponent = (THETAE_C1 / tlcl - THETAE_C2) * qv * (1.0 + THETAE_C3 * qv);
        tk * (1000.0 / press_hpa).powf(GAMMA_DRY * (1.0 + GAMMA_MOIST * qv)) * exponent.exp()
    }))
}
