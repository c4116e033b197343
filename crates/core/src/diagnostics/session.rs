//! Named-variable front end for the diagnostic formulas.

use tracing::{debug, info};

use super::names;
use super::{
    cloud_top_temperature, dewpoint_celsius, equivalent_potential_temperature, max_reflectivity,
    potential_vorticity, reflectivity, relative_humidity, sea_level_pressure, temperature_kelvin,
    total_pressure, wind_shear, CloudTopInputs, IceWater, ReflectivityInputs, ReflectivityOptions,
    SeaLevelInputs, VorticityInputs,
};
use crate::core_types::{Axis, Grid2D, Grid3D};
use crate::error::FieldResult;
use crate::grid::{CoordinateMapping, DerivationContext, GridGeometry, VariableProvider};
use crate::operators::{self, Spacing, VectorGrid};

/// Evaluates diagnostics for one [`DerivationContext`]
///
/// Every input is fetched from the provider over the context's sub-region,
/// and spacing comes from the coordinate mapping of the same region. Optional
/// hydrometeor fields are looked up with
/// [`VariableProvider::variable_exists`] once per call.
pub struct DiagnosticSession<'a, P: VariableProvider + ?Sized, M: CoordinateMapping + ?Sized> {
    provider: &'a P,
    mapping: &'a M,
    context: DerivationContext,
}

impl<'a, P: VariableProvider + ?Sized, M: CoordinateMapping + ?Sized> DiagnosticSession<'a, P, M> {
    /// Bind a provider and a mapping to the sub-region described by `context`
    pub fn new(provider: &'a P, mapping: &'a M, context: DerivationContext) -> Self {
        info!(
            timestep = context.timestep,
            refinement = context.refinement,
            lod = context.lod,
            region = ?context.region,
            "diagnostic session"
        );
        Self {
            provider,
            mapping,
            context,
        }
    }

    /// Context the session currently evaluates
    #[must_use]
    pub fn context(&self) -> &DerivationContext {
        &self.context
    }

    /// Move the session to another timestep or region
    pub fn set_context(&mut self, context: DerivationContext) {
        debug!(?context, "diagnostic session context changed");
        self.context = context;
    }

    /// Grid spacing of the current sub-region
    ///
    /// # Errors
    /// See [`GridGeometry::resolve_spacing`].
    pub fn spacing(&self) -> FieldResult<Spacing> {
        GridGeometry::new(self.mapping).resolve_spacing(&self.context)
    }

    /// True if the provider has `name` at the current timestep
    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.provider.variable_exists(self.context.timestep, name)
    }

    /// Fetch a 3D variable over the current sub-region
    ///
    /// # Errors
    /// `MissingVariable` or `InvalidExtent` from the provider.
    pub fn fetch_3d(&self, name: &str) -> FieldResult<Grid3D> {
        self.provider.get_3d(name, &self.context)
    }

    /// Fetch a 2D variable over the horizontal part of the sub-region
    ///
    /// # Errors
    /// `MissingVariable` or `InvalidExtent` from the provider.
    pub fn fetch_2d(&self, name: &str) -> FieldResult<Grid2D> {
        self.provider.get_2d(name, &self.context)
    }

    fn fetch_optional(&self, name: &str) -> FieldResult<Option<Grid3D>> {
        if self.has_variable(name) {
            self.fetch_3d(name).map(Some)
        } else {
            Ok(None)
        }
    }

    fn pressure_pair(&self) -> FieldResult<(Grid3D, Grid3D)> {
        Ok((self.fetch_3d(names::P)?, self.fetch_3d(names::PB)?))
    }

    /// `P + PB` in hPa
    ///
    /// # Errors
    /// Provider errors, or `ShapeMismatch` if `P` and `PB` disagree.
    pub fn pressure_hpa(&self) -> FieldResult<Grid3D> {
        let (p, pb) = self.pressure_pair()?;
        Ok(total_pressure(&p, &pb)?.map(|pa| 0.01 * pa))
    }

    /// Temperature (K) from `P`, `PB`, `T`
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn temperature_kelvin(&self) -> FieldResult<Grid3D> {
        let (p, pb) = self.pressure_pair()?;
        temperature_kelvin(&p, &pb, &self.fetch_3d(names::T)?)
    }

    /// Dewpoint (°C) from `P`, `PB`, `QVAPOR`
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn dewpoint_celsius(&self) -> FieldResult<Grid3D> {
        let (p, pb) = self.pressure_pair()?;
        dewpoint_celsius(&p, &pb, &self.fetch_3d(names::QVAPOR)?)
    }

    /// Relative humidity (%) from `P`, `PB`, `T`, `QVAPOR`
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn relative_humidity(&self) -> FieldResult<Grid3D> {
        let (p, pb) = self.pressure_pair()?;
        relative_humidity(&p, &pb, &self.fetch_3d(names::T)?, &self.fetch_3d(names::QVAPOR)?)
    }

    /// Equivalent potential temperature (K) from `P`, `PB`, `T`, `QVAPOR`
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn equivalent_potential_temperature(&self) -> FieldResult<Grid3D> {
        let (p, pb) = self.pressure_pair()?;
        equivalent_potential_temperature(&p, &pb, &self.fetch_3d(names::T)?, &self.fetch_3d(names::QVAPOR)?)
    }

    fn with_reflectivity_inputs<R>(
        &self,
        f: impl FnOnce(&ReflectivityInputs<'_>) -> FieldResult<R>,
    ) -> FieldResult<R> {
        let (p, pb) = self.pressure_pair()?;
        let t = self.fetch_3d(names::T)?;
        let qvapor = self.fetch_3d(names::QVAPOR)?;
        let qrain = self.fetch_3d(names::QRAIN)?;
        let qsnow = self.fetch_optional(names::QSNOW)?;
        let qgraup = self.fetch_optional(names::QGRAUP)?;
        debug!(
            snow = qsnow.is_some(),
            graupel = qgraup.is_some(),
            "resolved hydrometeor fields"
        );
        f(&ReflectivityInputs {
            p: &p,
            pb: &pb,
            t: &t,
            qvapor: &qvapor,
            qrain: &qrain,
            qsnow: qsnow.as_ref(),
            qgraup: qgraup.as_ref(),
        })
    }

    /// Reflectivity (dBZ); `QSNOW` and `QGRAUP` are used when present
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn reflectivity(&self, options: &ReflectivityOptions) -> FieldResult<Grid3D> {
        self.with_reflectivity_inputs(|inputs| reflectivity(inputs, options))
    }

    /// Column-maximum reflectivity (dBZ)
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn max_reflectivity(&self, options: &ReflectivityOptions) -> FieldResult<Grid2D> {
        self.with_reflectivity_inputs(|inputs| max_reflectivity(inputs, options))
    }

    /// Potential vorticity (PVU) from `P`, `PB`, `T`, `U`, `V` and 2D `F`
    ///
    /// # Errors
    /// Provider, geometry or formula errors.
    pub fn potential_vorticity(&self) -> FieldResult<Grid3D> {
        let spacing = self.spacing()?;
        let (p, pb) = self.pressure_pair()?;
        let theta = self.fetch_3d(names::T)?;
        let u = self.fetch_3d(names::U)?;
        let v = self.fetch_3d(names::V)?;
        let coriolis = self.fetch_2d(names::F)?;
        potential_vorticity(
            &VorticityInputs {
                p: &p,
                pb: &pb,
                theta: &theta,
                u: &u,
                v: &v,
                coriolis: &coriolis,
            },
            &spacing,
        )
    }

    /// Vertical wind shear (1/s) of `U`, `V` over the region's vertical spacing
    ///
    /// # Errors
    /// Provider, geometry or formula errors.
    pub fn wind_shear(&self) -> FieldResult<Grid3D> {
        let dz = self.spacing()?.dz;
        wind_shear(&self.fetch_3d(names::U)?, &self.fetch_3d(names::V)?, dz)
    }

    /// Sea-level pressure (hPa) from `P`, `PB`, `T`, `QVAPOR`, `ELEVATION`
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn sea_level_pressure(&self) -> FieldResult<Grid2D> {
        let (p, pb) = self.pressure_pair()?;
        let t = self.fetch_3d(names::T)?;
        let qvapor = self.fetch_3d(names::QVAPOR)?;
        let elevation = self.fetch_3d(names::ELEVATION)?;
        sea_level_pressure(&SeaLevelInputs {
            p: &p,
            pb: &pb,
            t: &t,
            qvapor: &qvapor,
            elevation: &elevation,
        })
    }

    /// Cloud-top temperature (°C)
    ///
    /// `QICE` absorbs explicitly only when both `QICE` and `QSNOW` exist at
    /// the current timestep; otherwise ice is diagnosed from temperature.
    ///
    /// # Errors
    /// Provider errors or formula validation errors.
    pub fn cloud_top_temperature(&self) -> FieldResult<Grid2D> {
        let (p, pb) = self.pressure_pair()?;
        let t = self.fetch_3d(names::T)?;
        let qcloud = self.fetch_3d(names::QCLOUD)?;
        let qice = if self.has_variable(names::QSNOW) {
            self.fetch_optional(names::QICE)?
        } else {
            None
        };
        let ice = qice.as_ref().map_or(IceWater::Diagnosed, IceWater::Explicit);
        cloud_top_temperature(
            &CloudTopInputs {
                p: &p,
                pb: &pb,
                t: &t,
                qcloud: &qcloud,
            },
            ice,
        )
    }

    /// Interpolate a 3D variable to a pressure level in hPa
    ///
    /// # Errors
    /// Provider errors or `ShapeMismatch`.
    pub fn interpolate_to_pressure(&self, name: &str, target_hpa: f32) -> FieldResult<Grid2D> {
        let field = self.fetch_3d(name)?;
        operators::interpolate_to_surface(&field, &self.pressure_hpa()?, target_hpa)
    }

    /// Derivative of a 3D variable along one axis at the region's spacing
    ///
    /// # Errors
    /// Provider, geometry or operator errors.
    pub fn derivative(&self, name: &str, axis: Axis) -> FieldResult<Grid3D> {
        let h = self.spacing()?.along(axis);
        operators::derivative(&self.fetch_3d(name)?, axis, h)
    }

    /// Gradient of a 3D variable
    ///
    /// # Errors
    /// Provider, geometry or operator errors.
    pub fn gradient(&self, name: &str) -> FieldResult<VectorGrid> {
        operators::gradient(&self.fetch_3d(name)?, &self.spacing()?)
    }

    /// Curl of the vector field with components named `[x, y, z]`
    ///
    /// # Errors
    /// Provider, geometry or operator errors.
    pub fn curl(&self, components: [&str; 3]) -> FieldResult<VectorGrid> {
        let [a, b, c] = components;
        operators::curl(&self.fetch_3d(a)?, &self.fetch_3d(b)?, &self.fetch_3d(c)?, &self.spacing()?)
    }

    /// Divergence of the vector field with components named `[x, y, z]`
    ///
    /// # Errors
    /// Provider, geometry or operator errors.
    pub fn divergence(&self, components: [&str; 3]) -> FieldResult<Grid3D> {
        let [a, b, c] = components;
        operators::divergence(&self.fetch_3d(a)?, &self.fetch_3d(b)?, &self.fetch_3d(c)?, &self.spacing()?)
    }
}
