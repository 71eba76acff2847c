use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hemisphere_histogram::constants::{DEFAULT_MAX_ZENITH_DISTANCE_DEG, DEFAULT_NUM_VERTICES};
use hemisphere_histogram::geometry::obj::{read_obj, write_obj, DEFAULT_MATERIAL};
use hemisphere_histogram::geometry::random_cap_directions;
use hemisphere_histogram::util::Timed;
use hemisphere_histogram::{
    HemisphereConfig, HemisphereGeometry, HistogramAccumulator, SolidAngleGeometry,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliSolidAngle {
    #[value(name = "spherical")]
    Spherical,
    #[value(name = "flat")]
    Flat,
}

impl From<CliSolidAngle> for SolidAngleGeometry {
    fn from(value: CliSolidAngle) -> Self {
        match value {
            CliSolidAngle::Spherical => SolidAngleGeometry::Spherical,
            CliSolidAngle::Flat => SolidAngleGeometry::Flat,
        }
    }
}

/// Bin random directions into a triangulated hemisphere
#[derive(Parser, Debug)]
#[command(name = "hemisphere-histogram", version, about)]
struct Cli {
    /// Guideline for the number of mesh vertices
    #[arg(long, default_value_t = DEFAULT_NUM_VERTICES)]
    num_vertices: usize,

    /// Maximum zenith distance of the mesh in degrees
    #[arg(long, default_value_t = DEFAULT_MAX_ZENITH_DISTANCE_DEG)]
    max_zenith_deg: f64,

    /// Random seed for the sampled directions
    #[arg(long)]
    seed: Option<u64>,

    /// Number of random directions to assign
    #[arg(long, default_value_t = 10_000)]
    num_directions: usize,

    /// Also assign a cone of this half angle (degrees) around every direction
    #[arg(long)]
    cone_half_angle_deg: Option<f64>,

    /// How face solid angles are computed
    #[arg(long, value_enum, default_value_t = CliSolidAngle::Spherical)]
    solid_angle: CliSolidAngle,

    /// Export the histogram snapshot (supports .json and .json.gz)
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Export the mesh as wavefront OBJ
    #[arg(long, value_name = "FILE")]
    obj: Option<PathBuf>,

    /// Build the geometry from a wavefront OBJ instead of generating it
    #[arg(long, value_name = "FILE")]
    import_obj: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = match &cli.import_obj {
        Some(path) => {
            let (vertices, faces) = read_obj(BufReader::new(File::open(path)?), DEFAULT_MATERIAL)?;
            HemisphereGeometry::from_mesh(vertices, faces)?
        }
        None => {
            let config = HemisphereConfig::from_degrees(cli.num_vertices, cli.max_zenith_deg);
            HemisphereGeometry::from_config(&config)?
        }
    };
    let geometry = Arc::new(geometry.with_solid_angle_geometry(cli.solid_angle.into()));
    log::info!("{} with {} faces", geometry, geometry.num_faces());

    if let Some(path) = &cli.obj {
        let mut writer = BufWriter::new(File::create(path)?);
        write_obj(geometry.vertices(), geometry.faces(), DEFAULT_MATERIAL, &mut writer)?;
        writer.flush()?;
        log::info!("wrote mesh to {}", path.display());
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // Sample the full hemisphere so directions past the mesh show up as overflow.
    let directions =
        random_cap_directions(cli.num_directions, std::f64::consts::FRAC_PI_2, &mut rng);

    let mut hist = HistogramAccumulator::new(geometry.clone());
    {
        let mut timer = Timed::info("Point assignment");
        hist.assign_par(&directions);
        timer.record(directions.len());
    }
    log::info!(
        "seed={}: {} directions, overflow {}, {:.6} sr hit of {:.6} sr",
        seed,
        directions.len(),
        hist.overflow(),
        hist.solid_angle(1),
        hist.solid_angle(0)
    );

    if let Some(deg) = cli.cone_half_angle_deg {
        let mut timer = Timed::info("Cone assignment");
        let mut cones = HistogramAccumulator::new(geometry);
        for &d in &directions {
            cones.assign_cone(d, deg.to_radians())?;
        }
        log::info!(
            "cones of {} deg: {:.6} sr touched",
            deg,
            cones.solid_angle(1)
        );
        timer.record(directions.len());
        hist.merge(&cones)?;
    }

    if let Some(path) = &cli.export {
        hist.to_snapshot().write_json(path)?;
        log::info!("exported snapshot to {}", path.display());
    }

    println!(
        "overflow={} solid_angle={:.6}",
        hist.overflow(),
        hist.solid_angle(1)
    );
    Ok(())
}
