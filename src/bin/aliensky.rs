use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aliensky::catalogs::exoplanet::read_exoplanet_archive_csv;
use aliensky::catalogs::gaia::read_gaia_csv;
use aliensky::catalogs::hipparcos::load_hipparcos_catalog_from_file;
use aliensky::time::{now, parse_epoch};
use aliensky::{
    hosts_only, project_ephemeris, project_sky, read_elements_table_csv, read_star_table_csv,
    stars_from_gaia, stars_from_hipparcos, write_chart_table_csv, write_pose_table_csv,
    BatchReport, DistanceUnit, Ephemeris, KeplerMethod, KeplerSolverConfig, MeanMotionSource,
    ObserverContext, ProjectionConfig, ProjectionMode, PropagationConfig, PropagationMode,
    StarRecord, StarTableConfig, NAKED_EYE_MAGNITUDE,
};

#[derive(Parser)]
#[command(name = "aliensky")]
#[command(about = "Night-sky charts as seen from exoplanets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propagate planets to an epoch and write their poses
    Poses(PosesArgs),
    /// Project stars into the sky of one planet (or every planet)
    Chart(ChartArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum StarFormat {
    /// Star table CSV
    Csv,
    /// Hipparcos new reduction hip2.dat
    Hipparcos,
    /// Gaia archive CSV export
    Gaia,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Au,
    Parsec,
    Meter,
}

impl From<UnitArg> for DistanceUnit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Au => DistanceUnit::AstronomicalUnits,
            UnitArg::Parsec => DistanceUnit::Parsecs,
            UnitArg::Meter => DistanceUnit::Meters,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    InclinationOnly,
    FullOrientation,
}

#[derive(Clone, Copy, ValueEnum)]
enum MeanMotionArg {
    HostMass,
    ObservedPeriod,
}

#[derive(Clone, Copy, ValueEnum)]
enum KeplerArg {
    FixedPoint,
    Newton,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProjectionArg {
    Translate,
    BodyFrame,
}

#[derive(Args)]
struct StarArgs {
    /// Star catalogue file
    #[arg(long)]
    stars: PathBuf,

    #[arg(long, value_enum, default_value = "csv")]
    star_format: StarFormat,

    /// Unit of the star table `distance` column
    #[arg(long, value_enum, default_value = "au")]
    distance_unit: UnitArg,

    /// Propagate Hipparcos proper motion to this year
    #[arg(long)]
    hip_epoch_year: Option<f64>,
}

#[derive(Args)]
struct PosesArgs {
    #[command(flatten)]
    stars: StarArgs,

    /// Orbital element table CSV
    #[arg(long)]
    planets: PathBuf,

    /// The planets file is a NASA Exoplanet Archive PS export
    #[arg(long)]
    exoplanet_archive: bool,

    /// Evaluation epoch (UTC), e.g. 2025-01-01 or 2025-01-01T12:00:00, or "now"
    #[arg(long, default_value = "now")]
    epoch: String,

    #[arg(long, value_enum, default_value = "inclination-only")]
    mode: ModeArg,

    #[arg(long, value_enum, default_value = "host-mass")]
    mean_motion: MeanMotionArg,

    #[arg(long, value_enum, default_value = "fixed-point")]
    kepler: KeplerArg,

    /// Reduce the mean anomaly modulo 2π before solving
    #[arg(long)]
    wrap_mean_anomaly: bool,

    /// Pose table output
    #[arg(long)]
    out_csv: Option<PathBuf>,

    /// Binary ephemeris output
    #[arg(long, default_value = "ephemeris.rkyv")]
    out_bin: PathBuf,
}

#[derive(Args)]
struct ChartArgs {
    #[command(flatten)]
    stars: StarArgs,

    /// Faintest magnitude to chart
    #[arg(long, default_value_t = NAKED_EYE_MAGNITUDE)]
    max_magnitude: f64,

    /// Binary ephemeris written by `poses`
    #[arg(long, default_value = "ephemeris.rkyv")]
    ephemeris: PathBuf,

    /// Planet to stand on; every planet when omitted
    #[arg(long)]
    planet: Option<String>,

    /// Observer latitude (deg)
    #[arg(long, default_value_t = 35.011665, allow_hyphen_values = true)]
    lat: f64,

    /// Observer longitude (deg)
    #[arg(long, default_value_t = 135.768326, allow_hyphen_values = true)]
    lon: f64,

    /// Observer height above the surface (m)
    #[arg(long, default_value_t = 0.0)]
    elevation: f64,

    /// Body radius in Earth radii. With --planet it overrides the catalogued
    /// planet radius; for a full run it only fills in missing radii.
    #[arg(long)]
    radius: Option<f64>,

    #[arg(long, value_enum, default_value = "translate")]
    projection: ProjectionArg,

    /// Chart table output
    #[arg(long, default_value = "chart.csv")]
    out_csv: PathBuf,

    /// PNG output (single planet only; needs the `plot` feature)
    #[arg(long)]
    png: Option<PathBuf>,
}

fn load_stars(args: &StarArgs, max_magnitude: Option<f64>) -> Result<(Vec<StarRecord>, BatchReport)> {
    let (stars, report) = match args.star_format {
        StarFormat::Csv => {
            let config = StarTableConfig {
                distance_unit: args.distance_unit.into(),
                max_magnitude: None,
            };
            read_star_table_csv(&args.stars, &config)?
        }
        StarFormat::Hipparcos => {
            let (catalog, parsed) = load_hipparcos_catalog_from_file(&args.stars)?;
            let (stars, converted) = stars_from_hipparcos(&catalog, args.hip_epoch_year);
            (stars, parsed.chain(&converted))
        }
        StarFormat::Gaia => {
            let (catalog, parsed) = read_gaia_csv(&args.stars)?;
            let (stars, converted) = stars_from_gaia(&catalog);
            (stars, parsed.chain(&converted))
        }
    };
    let stars = match max_magnitude {
        Some(limit) => aliensky::brighter_than(&stars, limit),
        None => stars,
    };
    Ok((stars, report))
}

fn run_poses(args: &PosesArgs) -> Result<()> {
    let (stars, star_report) = load_stars(&args.stars, None)?;
    let (planets, planet_report) = if args.exoplanet_archive {
        read_exoplanet_archive_csv(&args.planets)?
    } else {
        read_elements_table_csv(&args.planets)?
    };
    let hosts = hosts_only(&stars, &planets);
    info!(
        "{} stars ({}), {} of them host listed planets",
        stars.len(),
        star_report,
        hosts.len()
    );
    info!("{} planets ({})", planets.len(), planet_report);

    let epoch = if args.epoch.trim().eq_ignore_ascii_case("now") {
        now()?
    } else {
        parse_epoch(&args.epoch)?
    };

    let config = PropagationConfig {
        mode: match args.mode {
            ModeArg::InclinationOnly => PropagationMode::InclinationOnly,
            ModeArg::FullOrientation => PropagationMode::FullOrientation,
        },
        mean_motion: match args.mean_motion {
            MeanMotionArg::HostMass => MeanMotionSource::HostMass,
            MeanMotionArg::ObservedPeriod => MeanMotionSource::ObservedPeriod,
        },
        solver: KeplerSolverConfig {
            method: match args.kepler {
                KeplerArg::FixedPoint => KeplerMethod::FixedPoint,
                KeplerArg::Newton => KeplerMethod::Newton,
            },
            ..Default::default()
        },
        wrap_mean_anomaly: args.wrap_mean_anomaly,
    };

    let (ephemeris, report) = Ephemeris::compute(&planets, &hosts, epoch, &config);
    println!("Poses at {}: {}", epoch, report);

    ephemeris.save_to_file(&args.out_bin)?;
    if let Some(path) = &args.out_csv {
        write_pose_table_csv(path, &ephemeris)?;
    }
    Ok(())
}

#[cfg(feature = "plot")]
fn render_png(chart: &aliensky::SkyChart, observer: &ObserverContext, path: &Path) -> Result<()> {
    aliensky::render_chart(chart, observer, path, &aliensky::RenderConfig::default())
}

#[cfg(not(feature = "plot"))]
fn render_png(_chart: &aliensky::SkyChart, _observer: &ObserverContext, path: &Path) -> Result<()> {
    anyhow::bail!(
        "cannot write {}: aliensky was built without the `plot` feature",
        path.display()
    )
}

fn run_chart(args: &ChartArgs) -> Result<()> {
    let (stars, star_report) = load_stars(&args.stars, Some(args.max_magnitude))?;
    info!("{} stars at magnitude {} or brighter ({})", stars.len(), args.max_magnitude, star_report);

    let ephemeris = Ephemeris::load_from_file(&args.ephemeris)?;
    let base = ObserverContext {
        latitude_deg: args.lat,
        longitude_deg: args.lon,
        elevation_m: args.elevation,
        ..Default::default()
    };
    let config = ProjectionConfig {
        mode: match args.projection {
            ProjectionArg::Translate => ProjectionMode::Translate,
            ProjectionArg::BodyFrame => ProjectionMode::BodyFrame,
        },
        ..Default::default()
    };
    let with_radius = |mut observer: ObserverContext| {
        if let Some(r) = args.radius {
            observer.body_radius_earth = r;
        }
        observer
    };

    match &args.planet {
        Some(id) => {
            let planet = ephemeris
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("planet {id:?} is not in {}", args.ephemeris.display()))?;
            let observer = with_radius(base.on_planet(planet));
            let chart = project_sky(&planet.pose(), &stars, &observer, &config)?;
            println!(
                "{}: {} stars visible, {} below the horizon ({:.4}°), {}",
                chart.planet_id,
                chart.points.len(),
                chart.below_horizon,
                chart.threshold_deg,
                chart.report
            );
            write_chart_table_csv(&args.out_csv, &chart.points)?;
            if let Some(png) = &args.png {
                render_png(&chart, &observer, png)?;
            }
        }
        None => {
            if args.png.is_some() {
                anyhow::bail!("--png needs --planet");
            }
            let (charts, report) = project_ephemeris(&ephemeris, &stars, &with_radius(base), &config);
            println!("{} planets charted: {}", charts.len(), report);
            let points: Vec<_> = charts.into_iter().flat_map(|c| c.points).collect();
            write_chart_table_csv(&args.out_csv, &points)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Poses(args) => run_poses(args),
        Commands::Chart(args) => run_chart(args),
    }
}
