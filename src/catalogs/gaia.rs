//! Gaia DR3 source export (CSV), as returned by the Gaia archive for
//! `SELECT source_id, ra, dec, phot_g_mean_mag, phot_bp_mean_mag,
//! phot_rp_mean_mag, parallax, pmra, pmdec`.

use std::path::Path;

use tracing::info;

use crate::error::{BatchReport, SkyError};

#[derive(Debug, Clone, PartialEq)]
pub struct GaiaStar {
    pub source_id: u64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub phot_g_mean_mag: f64,
    pub phot_bp_mean_mag: Option<f64>,
    pub phot_rp_mean_mag: Option<f64>,
    /// Parallax (mas)
    pub parallax: Option<f64>,
    pub pmra: Option<f64>,
    pub pmdec: Option<f64>,
}

fn optional(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    match record.get(idx) {
        Some(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_gaia_record(record: &csv::StringRecord) -> Option<GaiaStar> {
    Some(GaiaStar {
        source_id: record.get(0)?.trim().parse().ok()?,
        ra_deg: record.get(1)?.trim().parse().ok()?,
        dec_deg: record.get(2)?.trim().parse().ok()?,
        phot_g_mean_mag: record.get(3)?.trim().parse().ok()?,
        phot_bp_mean_mag: optional(record, 4),
        phot_rp_mean_mag: optional(record, 5),
        parallax: optional(record, 6),
        pmra: optional(record, 7),
        pmdec: optional(record, 8),
    })
}

/// Read Gaia sources from any CSV reader. The first line is the header.
///
/// Rows lacking an id, position or G magnitude are skipped and counted as
/// invalid.
pub fn read_gaia<R: std::io::Read>(reader: R) -> anyhow::Result<(Vec<GaiaStar>, BatchReport)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = BatchReport::default();
    let mut stars = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        match parse_gaia_record(&record) {
            Some(star) => {
                report.accept();
                stars.push(star);
            }
            None => report.skip(&SkyError::DataInvalid {
                id: record.get(0).unwrap_or_default().trim().to_string(),
                reason: format!("malformed Gaia row {}", line + 2),
            }),
        }
    }
    Ok((stars, report))
}

pub fn read_gaia_csv<P: AsRef<Path>>(file: P) -> anyhow::Result<(Vec<GaiaStar>, BatchReport)> {
    let (stars, report) = read_gaia(std::fs::File::open(file.as_ref())?)?;
    info!("Loaded Gaia sources from {}: {}", file.as_ref().display(), report);
    Ok((stars, report))
}
