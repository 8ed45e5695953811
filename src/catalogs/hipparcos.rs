//! Types and helpers for working with Hipparcos catalog stars.
//!
//! This module contains the `HipparcosStar` representation, magnitude
//! conversion utilities, and a loader for the fixed-width catalog file.
//!
//! The Hipparcos catalog (new reduction, I/311) can be downloaded from
//! <http://cdsarc.u-strasbg.fr/ftp/I/311/hip2.dat.gz>.

use tracing::info;

use crate::error::{BatchReport, SkyError};

/// A star from the Hipparcos catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct HipparcosStar {
    pub hip: u32,
    pub ra_rad: f64,
    pub dec_rad: f64,
    /// Parallax (mas)
    pub plx: f64,
    /// Proper motion in RA, mu_alpha*cos(delta) (mas/yr)
    pub pm_ra: f64,
    /// Proper motion in Dec (mas/yr)
    pub pm_dec: f64,
    pub hpmag: f32,
    pub b_v: f32,
}

impl HipparcosStar {
    /// Convert Hipparcos Hp magnitude and Johnson B−V colour
    /// to Johnson V using the standard 4th-order polynomial.
    ///
    /// Reference: ESA SP-1200, Volume 1, Table 1.3.5 (magnitude transformations).
    ///
    /// Valid for roughly -0.2 < (B−V) < 1.8.
    pub fn hp_to_v(&self) -> f32 {
        let b = self.b_v;
        let delta = 0.304 * b - 0.202 * b * b + 0.107 * b * b * b - 0.045 * b * b * b * b;
        self.hpmag - delta
    }
}

/// Parse a single Hipparcos catalog record into a `HipparcosStar`.
fn parse_hipparcos_star(record: &str) -> Option<HipparcosStar> {
    if record.len() < 171 {
        return None;
    }

    Some(HipparcosStar {
        hip: record.get(0..6)?.trim().parse().ok()?,
        ra_rad: record.get(15..28)?.trim().parse().ok()?,
        dec_rad: record.get(29..42)?.trim().parse().ok()?,
        plx: record.get(43..50)?.trim().parse().ok()?,
        pm_ra: record.get(51..59)?.trim().parse().ok()?,
        pm_dec: record.get(60..68)?.trim().parse().ok()?,
        hpmag: record.get(129..136)?.trim().parse().ok()?,
        b_v: record.get(152..158)?.trim().parse().ok()?,
    })
}

/// Load the Hipparcos catalog from an in-memory string.
///
/// Blank lines are ignored; lines that do not parse are skipped and counted
/// as invalid.
pub fn load_hipparcos_catalog(data: &str) -> (Vec<HipparcosStar>, BatchReport) {
    let mut report = BatchReport::default();
    let mut stars = Vec::new();
    for (line, record) in data.lines().enumerate() {
        if record.trim().is_empty() {
            continue;
        }
        match parse_hipparcos_star(record) {
            Some(star) => {
                report.accept();
                stars.push(star);
            }
            None => report.skip(&SkyError::DataInvalid {
                id: record.get(0..6).unwrap_or(record).trim().to_string(),
                reason: format!("malformed hip2.dat line {}", line + 1),
            }),
        }
    }
    (stars, report)
}

pub fn load_hipparcos_catalog_from_file<P: AsRef<std::path::Path>>(
    path: P,
) -> anyhow::Result<(Vec<HipparcosStar>, BatchReport)> {
    let data = std::fs::read_to_string(path.as_ref())?;
    let (stars, report) = load_hipparcos_catalog(&data);
    info!(
        "Loaded Hipparcos entries from {}: {}",
        path.as_ref().display(),
        report
    );
    Ok((stars, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a fixed-width hip2.dat line with the fields this loader reads.
    fn hip2_line(hip: u32, ra: f64, dec: f64, plx: f64, hpmag: f32, b_v: f32) -> String {
        let mut line = vec![b' '; 276];
        let mut put = |start: usize, end: usize, text: String| {
            let width = end - start;
            let field = format!("{:>width$}", text, width = width);
            line[start..end].copy_from_slice(&field.as_bytes()[..width]);
        };
        put(0, 6, hip.to_string());
        put(15, 28, format!("{:.10}", ra));
        put(29, 42, format!("{:.10}", dec));
        put(43, 50, format!("{:.2}", plx));
        put(51, 59, format!("{:.2}", 1.5));
        put(60, 68, format!("{:.2}", -2.5));
        put(129, 136, format!("{:.4}", hpmag));
        put(152, 158, format!("{:.3}", b_v));
        String::from_utf8(line).unwrap()
    }

    #[test]
    fn parses_fixed_width_records() {
        let data = format!(
            "{}\n{}\nshort line\n\n",
            hip2_line(32349, 1.7677953616, -0.2917512845, 379.21, -1.0876, 0.009),
            hip2_line(91262, 4.8735614613, 0.6769030768, 130.23, 0.0868, -0.001),
        );
        let (stars, report) = load_hipparcos_catalog(&data);
        assert_eq!(stars.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.data_invalid, 1);
        assert_eq!(stars[0].hip, 32349);
        assert!((stars[0].plx - 379.21).abs() < 1e-9);
        assert!((stars[1].b_v - -0.001).abs() < 1e-6);
        assert!((stars[0].pm_dec - -2.5).abs() < 1e-9);
    }

    #[test]
    fn v_magnitude_correction_vanishes_for_zero_color() {
        let star = HipparcosStar {
            hip: 1,
            ra_rad: 0.0,
            dec_rad: 0.0,
            plx: 1.0,
            pm_ra: 0.0,
            pm_dec: 0.0,
            hpmag: 3.0,
            b_v: 0.0,
        };
        assert_eq!(star.hp_to_v(), 3.0);
    }
}
