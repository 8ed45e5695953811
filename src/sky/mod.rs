//! The sky as seen from a planet.
//!
//! Stars are re-expressed relative to the planet, converted back to an
//! apparent RA/Dec, cut at the visible horizon and tagged with a marker size
//! and color. The output is a list of polar chart points: azimuth is the
//! apparent RA in radians, radius is `90° − Dec`.
//!
//! ```
//! use aliensky::{project_sky, ObserverContext, Pose, ProjectionConfig, StarRecord, Length};
//!
//! let stars = vec![StarRecord::new(1, 0.0, 0.0, Length::from_au(1.0), 1.0, Some(0.65)).unwrap()];
//! let chart = project_sky(
//!     &Pose::identity(),
//!     &stars,
//!     &ObserverContext::default(),
//!     &ProjectionConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(chart.points.len(), 1);
//! assert_eq!(chart.points[0].radius, 90.0);
//! ```

pub mod color;
pub mod horizon;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::coords::vector_to_radec;
use crate::ephemeris::Ephemeris;
use crate::error::{BatchReport, SkyError};
use crate::frame::Pose;
use crate::observer::ObserverContext;
use crate::star::StarRecord;

pub use color::{bv_to_rgb, magnitude_to_size, star_rgb, Rgb};
pub use horizon::{horizon_dip_deg, visible_declination_threshold_deg};

/// How star positions are brought into the observer's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// `star − planet`: equatorial axes are kept, only the origin moves.
    #[default]
    Translate,
    /// `Rᵀ·(star − t)`: the direction is also expressed in the planet's
    /// body axes.
    BodyFrame,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub mode: ProjectionMode,
    /// Alpha channel of every output color.
    pub alpha: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Translate,
            alpha: 1.0,
        }
    }
}

/// One visible star on a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyPoint {
    pub planet_id: String,
    pub star_id: u64,
    /// Apparent RA (rad)
    pub azimuth_rad: f64,
    /// `90 − apparent Dec` (deg)
    pub radius: f64,
    pub size: f64,
    pub rgba: [f64; 4],
    pub apparent_ra_deg: f64,
    pub apparent_dec_deg: f64,
}

/// Chart of one planet.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyChart {
    pub planet_id: String,
    /// Horizon cut applied (deg)
    pub threshold_deg: f64,
    /// Visible stars, in input order.
    pub points: Vec<SkyPoint>,
    /// Stars projected but below the horizon.
    pub below_horizon: usize,
    /// Per-star outcome: accepted stars were projected (visible or not).
    pub report: BatchReport,
}

/// Apparent RA/Dec (deg) of `star` seen from the pose origin.
pub fn apparent_radec(
    pose: &Pose,
    star: &StarRecord,
    mode: ProjectionMode,
) -> Result<(f64, f64), SkyError> {
    let star_abs = star.position();
    let relative = match mode {
        ProjectionMode::Translate => star_abs - pose.translation,
        ProjectionMode::BodyFrame => pose.inverse_transform_point(&star_abs),
    };
    vector_to_radec(&relative).map_err(|e| e.with_id(star.id.to_string()))
}

/// Project `stars` into the sky of the planet at `pose`.
///
/// Stars that cannot be projected are counted and dropped. The only
/// chart-level failure is an invalid observer.
pub fn project_sky(
    pose: &Pose,
    stars: &[StarRecord],
    observer: &ObserverContext,
    config: &ProjectionConfig,
) -> Result<SkyChart, SkyError> {
    observer.validate()?;
    let threshold = observer.horizon_threshold_deg();

    let mut report = BatchReport::default();
    let mut below_horizon = 0;
    let mut points = Vec::new();

    for star in stars {
        let (ra, dec) = match apparent_radec(pose, star, config.mode) {
            Ok(radec) => radec,
            Err(err) => {
                report.skip(&err);
                continue;
            }
        };
        report.accept();
        if dec < threshold {
            below_horizon += 1;
            continue;
        }
        let [r, g, b] = star_rgb(star.color_index);
        points.push(SkyPoint {
            planet_id: observer.planet_id.clone(),
            star_id: star.id,
            azimuth_rad: ra.to_radians(),
            radius: 90.0 - dec,
            size: magnitude_to_size(star.magnitude),
            rgba: [r, g, b, config.alpha],
            apparent_ra_deg: ra,
            apparent_dec_deg: dec,
        });
    }

    debug!(
        "{}: {} visible, {} below {:.4}°",
        observer.planet_id,
        points.len(),
        below_horizon,
        threshold
    );

    Ok(SkyChart {
        planet_id: observer.planet_id.clone(),
        threshold_deg: threshold,
        points,
        below_horizon,
        report,
    })
}

/// Charts for every planet of an ephemeris, in ephemeris order.
///
/// `observer` is moved onto each planet in turn (see
/// [`ObserverContext::on_planet`]). Planets run in parallel. Planets whose
/// observer is invalid are counted in the returned report and left out.
pub fn project_ephemeris(
    ephemeris: &Ephemeris,
    stars: &[StarRecord],
    observer: &ObserverContext,
    config: &ProjectionConfig,
) -> (Vec<SkyChart>, BatchReport) {
    let results: Vec<Result<SkyChart, SkyError>> = ephemeris
        .planets
        .par_iter()
        .map(|planet| project_sky(&planet.pose(), stars, &observer.on_planet(planet), config))
        .collect();

    let mut report = BatchReport::default();
    let mut charts = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(chart) => {
                report.accept();
                charts.push(chart);
            }
            Err(err) => report.skip(&err),
        }
    }
    info!("Charted {} planets against {} stars: {}", charts.len(), stars.len(), report);
    (charts, report)
}
