//! # aliensky
//!
//! The night sky as seen by an observer standing on an **exoplanet**.
//!
//! Star catalogue positions (RA/Dec and distance) are turned into Cartesian
//! vectors, each planet is placed on its Keplerian orbit around its host star,
//! and every star is re-projected into the sky of the chosen planet, cut at the
//! visible horizon and tagged with a marker size and color for plotting.
//!
//! ## Features
//!
//! - **Catalogue ingest** — Hipparcos `hip2.dat`, Gaia CSV exports, NASA
//!   Exoplanet Archive PS exports and plain star / orbital element tables
//! - **One length unit** — everything is meters internally; AU, parsecs and
//!   parallaxes are converted once at the boundary through [`Length`]
//! - **Kepler solver** — fixed-point or Newton iteration with a tolerance and an
//!   iteration cap, never a silent non-converged answer
//! - **SE(3) poses** — one rigid pose per planet per epoch, exportable as a
//!   4×4 matrix or 12 row-major floats
//! - **Batch-safe errors** — a bad star or planet is logged, counted in a
//!   [`BatchReport`] and dropped; the rest of the batch goes on
//! - **Zero-copy ephemeris files** — poses serialize with
//!   [rkyv](https://docs.rs/rkyv)
//! - **Polar star charts** — PNG rendering with `plotters` (feature `plot`)
//!
//! ## Example
//!
//! ```no_run
//! use aliensky::{
//!     project_sky, read_elements_table_csv, read_star_table_csv, Ephemeris, ObserverContext,
//!     ProjectionConfig, PropagationConfig, StarTableConfig,
//! };
//!
//! let (stars, _) = read_star_table_csv("data/stars.csv", &StarTableConfig::default()).unwrap();
//! let (planets, _) = read_elements_table_csv("data/planets.csv").unwrap();
//!
//! let epoch = aliensky::time::parse_epoch("2025-01-01").unwrap();
//! let (ephemeris, report) =
//!     Ephemeris::compute(&planets, &stars, epoch, &PropagationConfig::default());
//! println!("poses: {report}");
//!
//! let planet = ephemeris.get("HD 209458 b").unwrap();
//! let observer = ObserverContext::default().on_planet(planet);
//! let chart = project_sky(&planet.pose(), &stars, &observer, &ProjectionConfig::default()).unwrap();
//! println!("{} stars above the horizon", chart.points.len());
//! ```
//!
//! ## Pipeline
//!
//! 1. **Coordinate transform** — `(RA, Dec, d) → (x, y, z)` and back
//! 2. **Orbital propagation** — mean motion from host mass (or period), mean
//!    anomaly, Kepler's equation, true anomaly, orbital-plane position tilted by
//!    the inclination
//! 3. **Frame composition** — host position + orbit offset, rotation
//!    `R_y(i)·R_z(ν)`, collected into an [`Ephemeris`]
//! 4. **Sky projection** — star minus planet, apparent RA/Dec, horizon cut at
//!    the dip of the visible horizon, magnitude → size, B−V → RGB
//! 5. **Rendering** — polar scatter plot on a black background
//!

/// Raw star and planet catalogs; Hipparcos, Gaia and the NASA Exoplanet Archive
pub mod catalogs;
pub mod coords;
pub mod ephemeris;
mod error;
pub mod frame;
pub mod observer;
pub mod orbit;
#[cfg(feature = "plot")]
pub mod render;
pub mod sky;
pub mod star;
pub mod tables;
pub mod time;
pub mod units;

pub use coords::{to_cartesian, to_equatorial};
pub use ephemeris::{Ephemeris, PlanetPose};
pub use error::{BatchReport, ErrorKind, SkyError};
pub use frame::{compose, orbit_rotation, Pose};
pub use observer::ObserverContext;
pub use orbit::{
    propagate, KeplerMethod, KeplerSolverConfig, MeanMotionSource, OrbitState,
    OrbitalElementsRecord, PropagationConfig, PropagationMode,
};
#[cfg(feature = "plot")]
pub use render::{render_chart, RenderConfig};
pub use sky::{
    bv_to_rgb, magnitude_to_size, project_ephemeris, project_sky, visible_declination_threshold_deg,
    ProjectionConfig, ProjectionMode, SkyChart, SkyPoint,
};
pub use star::*;
pub use tables::{
    read_elements_table, read_elements_table_csv, read_pose_table, read_star_table,
    read_star_table_csv, write_chart_table, write_chart_table_csv, write_pose_table,
    write_pose_table_csv, StarTableConfig,
};
pub use units::{DistanceUnit, Length};

// Commonly used types
// Positions reach ~1e18 m for catalogue stars while planet offsets are
// ~1e9 m, so everything is f64.
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix4 = nalgebra::Matrix4<f64>;
