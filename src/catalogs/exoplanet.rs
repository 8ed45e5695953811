//! NASA Exoplanet Archive "Planetary Systems" (PS) table export.
//!
//! The archive's CSV download starts with a `#` commented preamble followed
//! by a header line. The PS table holds one row per published solution, so a
//! planet appears once per reference; only the most recently updated row of
//! each planet is kept. Planets whose host has no Hipparcos designation
//! cannot be joined to the star catalogue and are dropped.
//!
//! Columns used: `pl_name, hostname, hip_name, pl_orbsmax, pl_orbper,
//! pl_orbeccen, pl_orbincl, st_mass, rowupdate, pl_rade` and, when present,
//! `pl_orblper`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use hifitime::Epoch;
use tracing::{debug, info};

use crate::error::{BatchReport, SkyError};
use crate::orbit::OrbitalElementsRecord;
use crate::tables::{cell, number, Columns};
use crate::time::parse_epoch;

/// One PS row, as published.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivePlanet {
    pub pl_name: String,
    pub hostname: String,
    pub hip_name: Option<String>,
    /// Semi-major axis (AU)
    pub pl_orbsmax: Option<f64>,
    /// Orbital period (days)
    pub pl_orbper: Option<f64>,
    pub pl_orbeccen: Option<f64>,
    /// Inclination (deg)
    pub pl_orbincl: Option<f64>,
    /// Host mass (solar masses)
    pub st_mass: Option<f64>,
    pub rowupdate: Epoch,
    /// Planet radius (Earth radii)
    pub pl_rade: Option<f64>,
    /// Argument of periapsis (deg)
    pub pl_orblper: Option<f64>,
}

/// HIP number from a designation such as `"HIP 113357"`. All non-digit
/// characters are discarded.
pub fn hip_number(hip_name: &str) -> Option<u64> {
    let digits: String = hip_name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl ArchivePlanet {
    /// Convert to orbital elements joined to the host's HIP number.
    pub fn to_elements(&self) -> Result<OrbitalElementsRecord, SkyError> {
        let host_id = self
            .hip_name
            .as_deref()
            .and_then(hip_number)
            .ok_or_else(|| SkyError::DataInvalid {
                id: self.pl_name.clone(),
                reason: format!("host {} has no usable hip_name", self.hostname),
            })?;
        Ok(OrbitalElementsRecord {
            planet_id: self.pl_name.clone(),
            host_id,
            semi_major_axis_au: self.pl_orbsmax,
            period_days: self.pl_orbper,
            eccentricity: self.pl_orbeccen,
            inclination_deg: self.pl_orbincl,
            host_mass_solar: self.st_mass,
            epoch: self.rowupdate,
            ascending_node_deg: None,
            argument_periapsis_deg: self.pl_orblper,
            radius_earth: self.pl_rade,
        })
    }
}

struct ArchiveColumns {
    pl_name: usize,
    hostname: usize,
    hip_name: usize,
    pl_orbsmax: usize,
    pl_orbper: usize,
    pl_orbeccen: usize,
    pl_orbincl: usize,
    st_mass: usize,
    rowupdate: usize,
    pl_rade: usize,
    pl_orblper: Option<usize>,
}

impl ArchiveColumns {
    fn locate(columns: &Columns) -> anyhow::Result<Self> {
        Ok(Self {
            pl_name: columns.require("pl_name")?,
            hostname: columns.require("hostname")?,
            hip_name: columns.require("hip_name")?,
            pl_orbsmax: columns.require("pl_orbsmax")?,
            pl_orbper: columns.require("pl_orbper")?,
            pl_orbeccen: columns.require("pl_orbeccen")?,
            pl_orbincl: columns.require("pl_orbincl")?,
            st_mass: columns.require("st_mass")?,
            rowupdate: columns.require("rowupdate")?,
            pl_rade: columns.require("pl_rade")?,
            pl_orblper: columns.get("pl_orblper"),
        })
    }

    fn parse(&self, record: &csv::StringRecord, row: usize) -> Result<ArchivePlanet, SkyError> {
        let pl_name = cell(record, Some(self.pl_name))
            .ok_or_else(|| SkyError::DataInvalid {
                id: format!("row {row}"),
                reason: "empty pl_name".into(),
            })?
            .to_string();
        let invalid = |reason: String| SkyError::DataInvalid {
            id: pl_name.clone(),
            reason,
        };
        let num = |idx: Option<usize>, name: &str| number(record, idx, name).map_err(invalid);

        let rowupdate = cell(record, Some(self.rowupdate))
            .ok_or_else(|| invalid("empty rowupdate".into()))
            .and_then(|s| parse_epoch(s).map_err(|e| invalid(e.to_string())))?;

        Ok(ArchivePlanet {
            hostname: cell(record, Some(self.hostname)).unwrap_or_default().to_string(),
            hip_name: cell(record, Some(self.hip_name)).map(str::to_string),
            pl_orbsmax: num(Some(self.pl_orbsmax), "pl_orbsmax")?,
            pl_orbper: num(Some(self.pl_orbper), "pl_orbper")?,
            pl_orbeccen: num(Some(self.pl_orbeccen), "pl_orbeccen")?,
            pl_orbincl: num(Some(self.pl_orbincl), "pl_orbincl")?,
            st_mass: num(Some(self.st_mass), "st_mass")?,
            rowupdate,
            pl_rade: num(Some(self.pl_rade), "pl_rade")?,
            pl_orblper: num(self.pl_orblper, "pl_orblper")?,
            pl_name,
        })
    }
}

/// Read every PS row. Rows that do not parse are counted and dropped.
pub fn read_archive_rows<R: Read>(reader: R) -> anyhow::Result<(Vec<ArchivePlanet>, BatchReport)> {
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);
    let columns = ArchiveColumns::locate(&Columns::new(rdr.headers()?))?;

    let mut report = BatchReport::default();
    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        match columns.parse(&result?, i + 1) {
            Ok(row) => {
                report.accept();
                rows.push(row);
            }
            Err(err) => report.skip(&err),
        }
    }
    Ok((rows, report))
}

/// Keep the most recently updated row of each planet, sorted by planet name.
/// Ties keep the row that came first.
pub fn latest_per_planet(rows: Vec<ArchivePlanet>) -> Vec<ArchivePlanet> {
    let mut latest: BTreeMap<String, ArchivePlanet> = BTreeMap::new();
    for row in rows {
        match latest.get(&row.pl_name) {
            Some(kept) if kept.rowupdate >= row.rowupdate => {
                debug!("{}: dropping older row from {}", row.pl_name, row.rowupdate);
            }
            _ => {
                latest.insert(row.pl_name.clone(), row);
            }
        }
    }
    latest.into_values().collect()
}

/// Read an archive export into orbital element records, one per planet.
///
/// The returned report covers both unparseable rows and planets without a
/// Hipparcos host; superseded duplicate rows are not counted.
pub fn read_exoplanet_archive<R: Read>(
    reader: R,
) -> anyhow::Result<(Vec<OrbitalElementsRecord>, BatchReport)> {
    let (rows, parse_report) = read_archive_rows(reader)?;
    // rows accepted by the parser are counted again below, once per planet
    let mut report = BatchReport {
        accepted: 0,
        ..parse_report
    };

    let mut planets = Vec::new();
    for row in latest_per_planet(rows) {
        match row.to_elements() {
            Ok(p) => {
                report.accept();
                planets.push(p);
            }
            Err(err) => report.skip(&err),
        }
    }
    Ok((planets, report))
}

pub fn read_exoplanet_archive_csv<P: AsRef<Path>>(
    path: P,
) -> anyhow::Result<(Vec<OrbitalElementsRecord>, BatchReport)> {
    let (planets, report) = read_exoplanet_archive(std::fs::File::open(path.as_ref())?)?;
    info!(
        "Loaded {} planets from archive export {}: {}",
        planets.len(),
        path.as_ref().display(),
        report
    );
    Ok((planets, report))
}
