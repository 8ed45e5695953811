//! Polar star chart rendering.
//!
//! Charts follow the traditional star-chart orientation: azimuth runs
//! clockwise and the zero of azimuth is turned by the observer's longitude.
//! Each star is a colored glow under a small white core.

use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::observer::ObserverContext;
use crate::sky::SkyChart;

/// Rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Image side (px); charts are square.
    pub size_px: u32,
    /// Pixel radius per √size of a marker.
    pub marker_scale: f64,
    /// Opacity of the colored glow.
    pub glow_alpha: f64,
    /// Outer radius of the chart (deg from the pole). `None` fits the data.
    pub max_radius: Option<f64>,
    /// Draw the title line.
    pub caption: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size_px: 1024,
            marker_scale: 3.0,
            glow_alpha: 0.3,
            max_radius: None,
            caption: true,
        }
    }
}

/// Chart coordinates of a polar point. Azimuth (rad) grows clockwise from a
/// zero turned `offset_deg` counter-clockwise from +x.
pub fn polar_to_xy(azimuth_rad: f64, radius: f64, offset_deg: f64) -> (f64, f64) {
    let angle = offset_deg.to_radians() - azimuth_rad;
    (radius * angle.cos(), radius * angle.sin())
}

fn to_rgb(c: f64) -> u8 {
    (c * 255.0).clamp(0.0, 255.0) as u8
}

fn marker_px(size: f64, fraction: f64, scale: f64) -> i32 {
    ((size * fraction).sqrt() * scale).round().max(1.0) as i32
}

fn plot_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow::anyhow!("plotting failed: {:?}", e)
}

/// Render `chart` to a PNG at `path`.
pub fn render_chart<P: AsRef<Path>>(
    chart: &SkyChart,
    observer: &ObserverContext,
    path: P,
    config: &RenderConfig,
) -> anyhow::Result<()> {
    let extent = config.max_radius.unwrap_or_else(|| {
        chart
            .points
            .iter()
            .map(|p| p.radius)
            .fold(90.0_f64, f64::max)
    });

    let root = BitMapBackend::new(path.as_ref(), (config.size_px, config.size_px)).into_drawing_area();
    root.fill(&BLACK).map_err(plot_err)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(10);
    if config.caption {
        builder.caption(
            format!(
                "Star Map (Observer on {} at {}°N, {}°E, Elevation: {} m)",
                chart.planet_id, observer.latitude_deg, observer.longitude_deg, observer.elevation_m
            ),
            ("sans-serif", 20).into_font().color(&WHITE),
        );
    }
    let mut plot = builder
        .build_cartesian_2d(-extent..extent, -extent..extent)
        .map_err(plot_err)?;

    let offset = observer.longitude_deg;
    let xy = |p: &crate::sky::SkyPoint| polar_to_xy(p.azimuth_rad, p.radius, offset);

    plot.draw_series(chart.points.iter().map(|p| {
        let [r, g, b, _] = p.rgba;
        let color = RGBColor(to_rgb(r), to_rgb(g), to_rgb(b)).mix(config.glow_alpha);
        Circle::new(xy(p), marker_px(p.size, 0.3, config.marker_scale), color.filled())
    }))
    .map_err(plot_err)?;

    plot.draw_series(
        chart
            .points
            .iter()
            .map(|p| Circle::new(xy(p), marker_px(p.size, 0.1, config.marker_scale), WHITE.filled())),
    )
    .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!(
        "Rendered {} stars for {} to {}",
        chart.points.len(),
        chart.planet_id,
        path.as_ref().display()
    );
    Ok(())
}
