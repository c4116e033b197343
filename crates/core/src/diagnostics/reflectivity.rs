//! Simulated radar reflectivity (Stoelinga's method)
//!
//! Equivalent reflectivity factor is the sum of rain, snow and graupel
//! contributions, each assuming an exponential (Marshall-Palmer) size
//! distribution:
//!
//! ```text
//! Z_e = Σ factor_x · (ρ_air · q_x)^1.75 / N0_x^0.75
//! dBZ = 10 · log10(max(Z_e, 0.001))
//! ```
//!
//! Snow and graupel are optional. Without a snow field, rain below freezing is
//! treated as snow. Without a graupel field a negligible 1e-30 mixing ratio is
//! used so the graupel term stays finite.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{kelvin, CELKEL, R_DRY};
use crate::core_types::{Grid2D, Grid3D};
use crate::error::FieldResult;

const R1: f64 = 1.0e-15;
const RON2: f64 = 1.0e10;
const GON: f64 = 5.0e7;
const RON_MIN: f64 = 8.0e6;
const RON_QR0: f64 = 0.0001;
const RON_DELQR0: f64 = 0.25 * RON_QR0;
const RON_CONST1R: f64 = (RON2 - RON_MIN) * 0.5;
const RON_CONST2R: f64 = (RON2 + RON_MIN) * 0.5;
const RN0_R: f64 = 8.0e6;
const RN0_S: f64 = 2.0e7;
const RN0_G: f64 = 4.0e6;
const GAMMA_SEVEN: f64 = 720.0;
const RHO_WATER: f64 = 1000.0;
const RHO_SNOW: f64 = 100.0;
const RHO_GRAUPEL: f64 = 400.0;
const ALPHA: f64 = 0.224;
const ABSENT_GRAUPEL: f64 = 1.0e-30;
const MIN_Z_E: f64 = 0.001;

/// Switches of the reflectivity computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectivityOptions {
    /// Frozen particles above freezing scatter as liquid
    pub liquid_skin: bool,
    /// Temperature and mixing-ratio dependent intercept parameters
    /// (Thompson, Rasmussen and Manning 2004) instead of constants
    pub variable_intercepts: bool,
}

/// WRF fields read by [`reflectivity`]
#[derive(Debug, Clone, Copy)]
pub struct ReflectivityInputs<'a> {
    /// Perturbation pressure `P` in Pa
    pub p: &'a Grid3D,
    /// Base-state pressure `PB` in Pa
    pub pb: &'a Grid3D,
    /// Perturbation potential temperature `T` in K
    pub t: &'a Grid3D,
    /// Water vapour mixing ratio `QVAPOR` in kg/kg
    pub qvapor: &'a Grid3D,
    /// Rain mixing ratio `QRAIN` in kg/kg
    pub qrain: &'a Grid3D,
    /// Snow mixing ratio `QSNOW`, if the run carries it
    pub qsnow: Option<&'a Grid3D>,
    /// Graupel mixing ratio `QGRAUP`, if the run carries it
    pub qgraup: Option<&'a Grid3D>,
}

impl ReflectivityInputs<'_> {
    fn validate(&self, operation: &'static str) -> FieldResult<()> {
        let p = self.p;
        p.ensure_same_shape(self.pb, operation)?;
        p.ensure_same_shape(self.t, operation)?;
        p.ensure_same_shape(self.qvapor, operation)?;
        p.ensure_same_shape(self.qrain, operation)?;
        if let Some(qsnow) = self.qsnow {
            p.ensure_same_shape(qsnow, operation)?;
        }
        if let Some(qgraup) = self.qgraup {
            p.ensure_same_shape(qgraup, operation)?;
        }
        Ok(())
    }
}

/// Scattering prefactors of the three hydrometeor classes
struct Factors {
    rain: f64,
    snow: f64,
    graupel: f64,
}

impl Factors {
    fn new() -> Self {
        let pi = std::f64::consts::PI;
        let base = |rho: f64| GAMMA_SEVEN * 1.0e18 * (1.0 / (pi * rho)).powf(1.75);
        Self {
            rain: base(RHO_WATER),
            snow: base(RHO_SNOW) * (RHO_SNOW / RHO_WATER).powf(2.0 * ALPHA),
            graupel: base(RHO_GRAUPEL) * (RHO_GRAUPEL / RHO_WATER).powf(2.0 * ALPHA),
        }
    }
}

/// Reflectivity in dBZ at every sample
///
/// # Errors
/// Returns `ShapeMismatch` if any supplied field differs in shape from `p`.
pub fn reflectivity(inputs: &ReflectivityInputs<'_>, options: &ReflectivityOptions) -> FieldResult<Grid3D> {
    inputs.validate("reflectivity")?;
    debug!(
        shape = %inputs.p.shape(),
        snow = inputs.qsnow.is_some(),
        graupel = inputs.qgraup.is_some(),
        ?options,
        "reflectivity"
    );

    let factors = Factors::new();
    let (p, pb, t) = (inputs.p.as_slice(), inputs.pb.as_slice(), inputs.t.as_slice());
    let (qvapor, qrain) = (inputs.qvapor.as_slice(), inputs.qrain.as_slice());
    let qsnow = inputs.qsnow.map(Grid3D::as_slice);
    let qgraup = inputs.qgraup.map(Grid3D::as_slice);
    let celkel = f64::from(CELKEL);
    let pi = std::f64::consts::PI;

    Ok(Grid3D::from_index_fn(inputs.p.shape(), |i| {
        let press = f64::from(p[i] + pb[i]);
        let tk = f64::from(kelvin(t[i], p[i] + pb[i]));
        let qv = f64::from(qvapor[i].max(0.0));
        let mut qr = f64::from(qrain[i].max(0.0));
        let mut qs = qsnow.map_or(0.0, |s| f64::from(s[i].max(0.0)));
        let qg = qgraup.map_or(ABSENT_GRAUPEL, |g| f64::from(g[i].max(0.0)));

        if qsnow.is_none() && tk < celkel {
            qs = qr;
            qr = 0.0;
        }

        let virtual_t = tk * (0.622 + qv) / (0.622 * (1.0 + qv));
        let rho_air = press / (f64::from(R_DRY) * virtual_t);

        let (factor_s, factor_g) = if options.liquid_skin && tk > celkel {
            (factors.snow / ALPHA, factors.graupel / ALPHA)
        } else {
            (factors.snow, factors.graupel)
        };

        let (ronv, sonv, gonv) = if options.variable_intercepts {
            let temp_c = (tk - celkel).min(-0.001);
            let sonv = (2.0e6 * (-0.12 * temp_c).exp()).min(2.0e8);
            let gonv = if qg > R1 {
                (2.38 * (pi * RHO_GRAUPEL / (rho_air * qg)).powf(0.92)).clamp(1.0e4, GON)
            } else {
                GON
            };
            let ronv = if qr > R1 {
                RON_CONST1R * ((RON_QR0 - qr) / RON_DELQR0).tanh() + RON_CONST2R
            } else {
                RON2
            };
            (ronv, sonv, gonv)
        } else {
            (RN0_R, RN0_S, RN0_G)
        };

        let z_e = factors.rain * (rho_air * qr).powf(1.75) / ronv.powf(0.75)
            + factor_s * (rho_air * qs).powf(1.75) / sonv.powf(0.75)
            + factor_g * (rho_air * qg).powf(1.75) / gonv.powf(0.75);

        (10.0 * z_e.max(MIN_Z_E).log10()) as f32
    }))
}

/// Column maximum of [`reflectivity`]
///
/// # Errors
/// Returns `ShapeMismatch` if any supplied field differs in shape from `p`.
pub fn max_reflectivity(inputs: &ReflectivityInputs<'_>, options: &ReflectivityOptions) -> FieldResult<Grid2D> {
    Ok(reflectivity(inputs, options)?.column_max())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Shape3;
    use approx::assert_relative_eq;

    struct Fields {
        p: Grid3D,
        pb: Grid3D,
        t: Grid3D,
        qvapor: Grid3D,
    }

    fn shape() -> Shape3 {
        Shape3::new(2, 2, 3)
    }

    /// Saturated-ish air at 1000 hPa with the given temperature in K
    fn fields(tk: f32) -> Fields {
        Fields {
            p: Grid3D::new(shape()),
            pb: Grid3D::filled(shape(), 100_000.0),
            t: Grid3D::filled(shape(), tk - 300.0),
            qvapor: Grid3D::filled(shape(), 0.01),
        }
    }

    fn inputs<'a>(
        f: &'a Fields,
        qrain: &'a Grid3D,
        qsnow: Option<&'a Grid3D>,
        qgraup: Option<&'a Grid3D>,
    ) -> ReflectivityInputs<'a> {
        ReflectivityInputs {
            p: &f.p,
            pb: &f.pb,
            t: &f.t,
            qvapor: &f.qvapor,
            qrain,
            qsnow,
            qgraup,
        }
    }

    #[test]
    fn test_clear_air_hits_floor() {
        let f = fields(290.0);
        let zero = Grid3D::new(shape());
        let dbz = reflectivity(&inputs(&f, &zero, Some(&zero), None), &ReflectivityOptions::default()).unwrap();
        for &v in dbz.as_slice() {
            assert_relative_eq!(v, -30.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_rain_reflectivity_is_plausible_and_monotone() {
        let f = fields(290.0);
        let light = Grid3D::filled(shape(), 0.2e-3);
        let heavy = Grid3D::filled(shape(), 1.0e-3);
        let opts = ReflectivityOptions::default();
        let light_dbz = reflectivity(&inputs(&f, &light, None, None), &opts).unwrap();
        let heavy_dbz = reflectivity(&inputs(&f, &heavy, None, None), &opts).unwrap();
        let (l, h) = (light_dbz.get(0, 0, 0), heavy_dbz.get(0, 0, 0));
        assert!((35.0..55.0).contains(&h), "heavy rain gave {h} dBZ");
        assert!(l < h);
    }

    #[test]
    fn test_cold_rain_counts_as_snow_without_snow_field() {
        let f = fields(263.0);
        let rain = Grid3D::filled(shape(), 1.0e-3);
        let zero = Grid3D::new(shape());
        let opts = ReflectivityOptions::default();
        let implicit = reflectivity(&inputs(&f, &rain, None, None), &opts).unwrap();
        let explicit = reflectivity(&inputs(&f, &zero, Some(&rain), None), &opts).unwrap();
        for (a, b) in implicit.as_slice().iter().zip(explicit.as_slice()) {
            assert_relative_eq!(a, b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_liquid_skin_raises_warm_snow() {
        let f = fields(278.0);
        let zero = Grid3D::new(shape());
        let snow = Grid3D::filled(shape(), 1.0e-3);
        let dry = reflectivity(&inputs(&f, &zero, Some(&snow), None), &ReflectivityOptions::default()).unwrap();
        let wet = reflectivity(
            &inputs(&f, &zero, Some(&snow), None),
            &ReflectivityOptions {
                liquid_skin: true,
                ..Default::default()
            },
        )
        .unwrap();
        let gain = wet.get(1, 1, 2) - dry.get(1, 1, 2);
        assert_relative_eq!(gain, 10.0 * (1.0 / 0.224_f32).log10(), epsilon = 1e-3);
    }

    #[test]
    fn test_variable_intercepts_reduce_rain_reflectivity() {
        let f = fields(290.0);
        // At 0.1 g/kg the rain intercept sits midway between its bounds
        let rain = Grid3D::filled(shape(), 1.0e-4);
        let constant = reflectivity(&inputs(&f, &rain, None, None), &ReflectivityOptions::default()).unwrap();
        let variable = reflectivity(
            &inputs(&f, &rain, None, None),
            &ReflectivityOptions {
                variable_intercepts: true,
                ..Default::default()
            },
        )
        .unwrap();
        let (c, v) = (constant.get(0, 0, 0), variable.get(0, 0, 0));
        assert!(v.is_finite());
        assert!(v < c, "variable {v} vs constant {c}");
    }

    #[test]
    fn test_max_reflectivity_takes_column_peak() {
        let f = fields(290.0);
        let rain = Grid3D::from_fn(shape(), |_, _, iz| if iz == 1 { 1.0e-3 } else { 0.0 });
        let opts = ReflectivityOptions::default();
        let full = reflectivity(&inputs(&f, &rain, None, None), &opts).unwrap();
        let peak = max_reflectivity(&inputs(&f, &rain, None, None), &opts).unwrap();
        assert_eq!(peak.get(1, 0), full.get(1, 0, 1));
    }

    #[test]
    fn test_absent_graupel_matches_zero_graupel() {
        let f = fields(290.0);
        let rain = Grid3D::filled(shape(), 0.5e-3);
        let zero = Grid3D::new(shape());
        let opts = ReflectivityOptions::default();
        let absent = reflectivity(&inputs(&f, &rain, Some(&zero), None), &opts).unwrap();
        let present = reflectivity(&inputs(&f, &rain, Some(&zero), Some(&zero)), &opts).unwrap();
        for (a, b) in absent.as_slice().iter().zip(present.as_slice()) {
            assert_relative_eq!(a, b, epsilon = 1e-5);
        }
    }
}
