use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wrf_diag_core::{
    diagnostics::names, Axis, DerivationContext, DiagnosticSession, FieldResult, Grid2D, Grid3D,
    MemoryProvider, ReflectivityOptions, RegularMapping, Shape3, SubRegionExtent, Vec3d,
};

/// Headless WRF diagnostics demo on a synthetic atmosphere
#[derive(Parser, Debug)]
#[command(name = "wrf-diag-demo")]
#[command(about = "Evaluate WRF diagnostics on a synthetic atmosphere", long_about = None)]
struct Args {
    /// Samples along x
    #[arg(long, default_value_t = 40)]
    nx: usize,

    /// Samples along y
    #[arg(long, default_value_t = 32)]
    ny: usize,

    /// Vertical levels
    #[arg(long, default_value_t = 20)]
    nz: usize,

    /// Horizontal grid spacing in meters
    #[arg(long, default_value_t = 3000.0)]
    dx: f64,

    /// Vertical grid spacing in meters
    #[arg(long, default_value_t = 500.0)]
    dz: f64,

    /// Pressure level for the interpolated fields in hPa
    #[arg(short, long, default_value_t = 500.0)]
    level: f32,

    /// Surface temperature anomaly amplitude of the warm bubble in K
    #[arg(long, default_value_t = 3.0)]
    bubble: f32,

    /// Evaluate a centred quarter of the domain instead of the whole grid
    #[arg(short, long)]
    subregion: bool,

    /// Use variable rain, snow and graupel intercepts for reflectivity
    #[arg(long)]
    variable_intercepts: bool,
}

/// Hydrostatic-ish column: pressure falls about 8% per kilometre, θ rises
/// 4 K/km, a westerly jet peaks at mid levels and a warm moist bubble sits
/// in the centre of the domain with a cloud deck above it.
fn build_atmosphere(args: &Args, shape: Shape3) -> MemoryProvider {
    let (cx, cy) = (shape.nx as f32 / 2.0, shape.ny as f32 / 2.0);
    let radius = (shape.nx.min(shape.ny) as f32 / 4.0).max(1.0);
    let dz = args.dz as f32;
    let top = shape.nz.saturating_sub(1).max(1) as f32;
    let bubble = |ix: usize, iy: usize| {
        let r2 = ((ix as f32 - cx).powi(2) + (iy as f32 - cy).powi(2)) / (radius * radius);
        (-r2).exp()
    };

    let height = |iz: usize| dz * iz as f32;
    let base_pressure = |iz: usize| 100_000.0 * (-height(iz) / 8000.0).exp();
    let amplitude = args.bubble;

    MemoryProvider::new()
        .with_3d(0, names::PB, Grid3D::from_fn(shape, |_, _, iz| base_pressure(iz)))
        .with_3d(
            0,
            names::P,
            Grid3D::from_fn(shape, |ix, iy, iz| -150.0 * bubble(ix, iy) * (1.0 - iz as f32 / top)),
        )
        .with_3d(
            0,
            names::T,
            Grid3D::from_fn(shape, |ix, iy, iz| {
                0.004 * height(iz) + amplitude * bubble(ix, iy) * (-(iz as f32) / 4.0).exp()
            }),
        )
        .with_3d(
            0,
            names::QVAPOR,
            Grid3D::from_fn(shape, |ix, iy, iz| {
                (0.012 + 0.004 * bubble(ix, iy)) * (-height(iz) / 2500.0).exp()
            }),
        )
        .with_3d(
            0,
            names::QCLOUD,
            Grid3D::from_fn(shape, |ix, iy, iz| {
                if (6..=8).contains(&iz) {
                    8.0e-4 * bubble(ix, iy)
                } else {
                    0.0
                }
            }),
        )
        .with_3d(
            0,
            names::QRAIN,
            Grid3D::from_fn(shape, |ix, iy, iz| {
                if iz < 6 {
                    1.0e-3 * bubble(ix, iy)
                } else {
                    0.0
                }
            }),
        )
        .with_3d(
            0,
            names::U,
            Grid3D::from_fn(shape, |_, _, iz| {
                let s = iz as f32 / top;
                5.0 + 30.0 * (std::f32::consts::PI * s).sin()
            }),
        )
        .with_3d(
            0,
            names::V,
            Grid3D::from_fn(shape, |ix, _, _| 2.0 * ((ix as f32 - cx) / radius).tanh()),
        )
        .with_3d(0, "W", Grid3D::from_fn(shape, |ix, iy, iz| 0.5 * bubble(ix, iy) * (iz as f32 / top)))
        .with_3d(0, names::ELEVATION, Grid3D::from_fn(shape, |_, _, iz| height(iz)))
        .with_2d(0, names::F, Grid2D::filled(shape.horizontal(), 1.0e-4))
}

fn summarize(label: &str, units: &str, values: &[f32]) {
    let finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        println!("  {label:<28} (no finite values)");
        return;
    }
    let min = finite.iter().copied().fold(f32::INFINITY, f32::min);
    let max = finite.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = finite.iter().sum::<f32>() / finite.len() as f32;
    println!("  {label:<28} min {min:>10.3}  mean {mean:>10.3}  max {max:>10.3} {units}");
}

fn run(args: &Args) -> FieldResult<()> {
    let shape = Shape3::new(args.nx, args.ny, args.nz);
    let provider = build_atmosphere(args, shape);
    let mapping = RegularMapping::new(
        Vec3d::zeros(),
        Vec3d::new(
            args.dx * (shape.nx.saturating_sub(1)) as f64,
            args.dx * (shape.ny.saturating_sub(1)) as f64,
            args.dz * (shape.nz.saturating_sub(1)) as f64,
        ),
        [shape.nx, shape.ny, shape.nz],
        0,
    )?;

    let region = if args.subregion {
        let (qx, qy) = (shape.nx / 4, shape.ny / 4);
        SubRegionExtent::new(
            [qx, qy, 0],
            [
                shape.nx.saturating_sub(qx + 1),
                shape.ny.saturating_sub(qy + 1),
                shape.nz.saturating_sub(1),
            ],
        )?
    } else {
        SubRegionExtent::covering(shape)
    };
    let session = DiagnosticSession::new(&provider, &mapping, DerivationContext::new(0, region));

    let spacing = session.spacing()?;
    println!("=== WRF Diagnostics Demo ===\n");
    println!("Grid: {}x{}x{} samples, region {:?}..={:?}", shape.nx, shape.ny, shape.nz, region.min, region.max);
    println!("Spacing: dx {:.1} m, dy {:.1} m, dz {:.1} m\n", spacing.dx, spacing.dy, spacing.dz);

    println!("Thermodynamics:");
    summarize("temperature", "K", session.temperature_kelvin()?.as_slice());
    summarize("dewpoint", "°C", session.dewpoint_celsius()?.as_slice());
    summarize("relative humidity", "%", session.relative_humidity()?.as_slice());
    summarize("theta-e", "K", session.equivalent_potential_temperature()?.as_slice());

    println!("\nDynamics:");
    summarize("potential vorticity", "PVU", session.potential_vorticity()?.as_slice());
    summarize("vertical wind shear", "1/s", session.wind_shear()?.as_slice());
    summarize("dU/dz", "1/s", session.derivative(names::U, Axis::Z)?.as_slice());
    let vorticity = session.curl([names::U, names::V, "W"])?;
    summarize("vertical vorticity", "1/s", vorticity.z.as_slice());
    summarize("divergence", "1/s", session.divergence([names::U, names::V, "W"])?.as_slice());

    println!("\nSurface diagnostics:");
    summarize("sea-level pressure", "hPa", session.sea_level_pressure()?.as_slice());
    summarize("cloud-top temperature", "°C", session.cloud_top_temperature()?.as_slice());
    let options = ReflectivityOptions {
        variable_intercepts: args.variable_intercepts,
        ..ReflectivityOptions::default()
    };
    summarize("composite reflectivity", "dBZ", session.max_reflectivity(&options)?.as_slice());

    println!("\nOn the {:.0} hPa surface:", args.level);
    summarize("theta perturbation", "K", session.interpolate_to_pressure(names::T, args.level)?.as_slice());
    summarize("u wind", "m/s", session.interpolate_to_pressure(names::U, args.level)?.as_slice());

    info!("demo complete");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
