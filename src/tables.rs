//! Plain CSV tables exchanged between pipeline stages.
//!
//! Inputs: the star table and the orbital element table. Outputs: the pose
//! table (one row per planet) and the chart table (one row per visible star
//! per planet). Columns are located by header name, so extra columns and any
//! column order are accepted. A missing required column fails the whole
//! file; a bad row is skipped and counted.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use crate::ephemeris::{Ephemeris, PlanetPose};
use crate::error::{BatchReport, SkyError};
use crate::orbit::OrbitalElementsRecord;
use crate::sky::SkyPoint;
use crate::star::{brighter_than, StarRecord};
use crate::time::parse_epoch;
use crate::units::{DistanceUnit, Length};

/// Header name → column index.
pub(crate) struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    pub(crate) fn new(headers: &csv::StringRecord) -> Self {
        Self {
            index: headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().to_string(), i))
                .collect(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn require(&self, name: &str) -> anyhow::Result<usize> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("missing required column `{}`", name))
    }
}

/// Trimmed cell, `None` when absent or blank.
pub(crate) fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    let s = record.get(idx?)?.trim();
    (!s.is_empty()).then_some(s)
}

/// Optional numeric cell. Blank is `None`; text that is not a number is an
/// error message naming the column.
pub(crate) fn number(
    record: &csv::StringRecord,
    idx: Option<usize>,
    name: &str,
) -> Result<Option<f64>, String> {
    match cell(record, idx) {
        None => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("column `{name}`: {s:?} is not a number")),
    }
}

fn required_number(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    number(record, Some(idx), name)?.ok_or_else(|| format!("column `{name}` is empty"))
}

fn input_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

/// How to read a star table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarTableConfig {
    /// Unit of the `distance` column. Ignored for `parallax_mas` tables.
    pub distance_unit: DistanceUnit,
    /// Drop stars fainter than this apparent magnitude.
    pub max_magnitude: Option<f64>,
}

impl Default for StarTableConfig {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::AstronomicalUnits,
            max_magnitude: None,
        }
    }
}

enum DistanceColumn {
    Distance(usize, DistanceUnit),
    Parallax(usize),
}

struct StarColumns {
    id: usize,
    ra: usize,
    dec: usize,
    distance: DistanceColumn,
    magnitude: usize,
    color_index: Option<usize>,
}

impl StarColumns {
    fn locate(columns: &Columns, unit: DistanceUnit) -> anyhow::Result<Self> {
        let distance = match (columns.get("distance"), columns.get("parallax_mas")) {
            (Some(i), _) => DistanceColumn::Distance(i, unit),
            (None, Some(i)) => DistanceColumn::Parallax(i),
            (None, None) => anyhow::bail!("star table needs a `distance` or `parallax_mas` column"),
        };
        Ok(Self {
            id: columns.require("id")?,
            ra: columns.require("ra_degrees")?,
            dec: columns.require("dec_degrees")?,
            distance,
            magnitude: columns.require("magnitude")?,
            color_index: columns.get("color_index"),
        })
    }

    fn parse(&self, record: &csv::StringRecord, row: usize) -> Result<StarRecord, SkyError> {
        let id: u64 = cell(record, Some(self.id))
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| SkyError::DataInvalid {
                id: format!("row {row}"),
                reason: "missing or non-integer star id".into(),
            })?;
        let invalid = |reason: String| SkyError::DataInvalid {
            id: id.to_string(),
            reason,
        };

        let ra = required_number(record, self.ra, "ra_degrees").map_err(invalid)?;
        let dec = required_number(record, self.dec, "dec_degrees").map_err(invalid)?;
        let magnitude = required_number(record, self.magnitude, "magnitude").map_err(invalid)?;
        let color_index = number(record, self.color_index, "color_index").map_err(invalid)?;
        let distance = match self.distance {
            DistanceColumn::Distance(i, unit) => {
                Length::from_unit(required_number(record, i, "distance").map_err(invalid)?, unit)
            }
            DistanceColumn::Parallax(i) => {
                Length::from_parallax_mas(id, required_number(record, i, "parallax_mas").map_err(invalid)?)?
            }
        };
        StarRecord::new(id, ra, dec, distance, magnitude, color_index)
    }
}

/// Read a star table `{id, ra_degrees, dec_degrees, distance | parallax_mas,
/// magnitude, color_index}`.
pub fn read_star_table<R: Read>(
    reader: R,
    config: &StarTableConfig,
) -> anyhow::Result<(Vec<StarRecord>, BatchReport)> {
    let mut rdr = input_reader(reader);
    let columns = StarColumns::locate(&Columns::new(rdr.headers()?), config.distance_unit)?;

    let mut report = BatchReport::default();
    let mut stars = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        match columns.parse(&result?, i + 2) {
            Ok(star) => {
                report.accept();
                stars.push(star);
            }
            Err(err) => report.skip(&err),
        }
    }

    if let Some(limit) = config.max_magnitude {
        stars = brighter_than(&stars, limit);
    }
    Ok((stars, report))
}

pub fn read_star_table_csv<P: AsRef<Path>>(
    path: P,
    config: &StarTableConfig,
) -> anyhow::Result<(Vec<StarRecord>, BatchReport)> {
    let (stars, report) = read_star_table(std::fs::File::open(path.as_ref())?, config)?;
    info!("Loaded {} stars from {}: {}", stars.len(), path.as_ref().display(), report);
    Ok((stars, report))
}

struct ElementColumns {
    planet_id: usize,
    host_id: usize,
    semi_major_axis_au: usize,
    eccentricity: usize,
    inclination_deg: usize,
    host_mass_solar: usize,
    epoch: usize,
    period_days: Option<usize>,
    radius_earth: Option<usize>,
    ascending_node_deg: Option<usize>,
    argument_periapsis_deg: Option<usize>,
}

impl ElementColumns {
    fn locate(columns: &Columns) -> anyhow::Result<Self> {
        Ok(Self {
            planet_id: columns.require("planet_id")?,
            host_id: columns.require("host_id")?,
            semi_major_axis_au: columns.require("semi_major_axis_au")?,
            eccentricity: columns.require("eccentricity")?,
            inclination_deg: columns.require("inclination_deg")?,
            host_mass_solar: columns.require("host_mass_solar")?,
            epoch: columns.require("epoch_timestamp")?,
            period_days: columns.get("period_days"),
            radius_earth: columns.get("radius_earth"),
            ascending_node_deg: columns.get("ascending_node_deg"),
            argument_periapsis_deg: columns.get("argument_periapsis_deg"),
        })
    }

    fn parse(&self, record: &csv::StringRecord, row: usize) -> Result<OrbitalElementsRecord, SkyError> {
        let planet_id = cell(record, Some(self.planet_id))
            .ok_or_else(|| SkyError::DataInvalid {
                id: format!("row {row}"),
                reason: "empty planet_id".into(),
            })?
            .to_string();
        let invalid = |reason: String| SkyError::DataInvalid {
            id: planet_id.clone(),
            reason,
        };

        let host_id = cell(record, Some(self.host_id))
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| invalid("missing or non-integer host_id".into()))?;
        let epoch_text = cell(record, Some(self.epoch))
            .ok_or_else(|| invalid("empty epoch_timestamp".into()))?;
        let epoch = parse_epoch(epoch_text).map_err(|e| invalid(e.to_string()))?;

        Ok(OrbitalElementsRecord {
            host_id,
            semi_major_axis_au: number(record, Some(self.semi_major_axis_au), "semi_major_axis_au")
                .map_err(&invalid)?,
            period_days: number(record, self.period_days, "period_days").map_err(&invalid)?,
            eccentricity: number(record, Some(self.eccentricity), "eccentricity").map_err(&invalid)?,
            inclination_deg: number(record, Some(self.inclination_deg), "inclination_deg")
                .map_err(&invalid)?,
            host_mass_solar: number(record, Some(self.host_mass_solar), "host_mass_solar")
                .map_err(&invalid)?,
            epoch,
            ascending_node_deg: number(record, self.ascending_node_deg, "ascending_node_deg")
                .map_err(&invalid)?,
            argument_periapsis_deg: number(record, self.argument_periapsis_deg, "argument_periapsis_deg")
                .map_err(&invalid)?,
            radius_earth: number(record, self.radius_earth, "radius_earth").map_err(&invalid)?,
            planet_id,
        })
    }
}

/// Read an orbital element table.
///
/// Element cells may be blank; whether a blank element matters is decided
/// at propagation time, according to the propagation config.
pub fn read_elements_table<R: Read>(
    reader: R,
) -> anyhow::Result<(Vec<OrbitalElementsRecord>, BatchReport)> {
    let mut rdr = input_reader(reader);
    let columns = ElementColumns::locate(&Columns::new(rdr.headers()?))?;

    let mut report = BatchReport::default();
    let mut planets = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        match columns.parse(&result?, i + 2) {
            Ok(planet) => {
                report.accept();
                planets.push(planet);
            }
            Err(err) => report.skip(&err),
        }
    }
    Ok((planets, report))
}

pub fn read_elements_table_csv<P: AsRef<Path>>(
    path: P,
) -> anyhow::Result<(Vec<OrbitalElementsRecord>, BatchReport)> {
    let (planets, report) = read_elements_table(std::fs::File::open(path.as_ref())?)?;
    info!(
        "Loaded {} orbital element rows from {}: {}",
        planets.len(),
        path.as_ref().display(),
        report
    );
    Ok((planets, report))
}

pub const POSE_TABLE_HEADER: [&str; 20] = [
    "planet_id",
    "host_id",
    "x_m",
    "y_m",
    "z_m",
    "true_anomaly_rad",
    "inclination_rad",
    "r11",
    "r12",
    "r13",
    "tx",
    "r21",
    "r22",
    "r23",
    "ty",
    "r31",
    "r32",
    "r33",
    "tz",
    "radius_earth",
];

/// Write one row per planet. Floats use Rust's shortest round-trip
/// formatting, so reading the table back restores them bit for bit.
pub fn write_pose_table<W: Write>(writer: W, ephemeris: &Ephemeris) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(POSE_TABLE_HEADER)?;
    for planet in &ephemeris.planets {
        let mut row = vec![planet.planet_id.clone(), planet.host_id.to_string()];
        row.extend(planet.position.iter().map(|v| v.to_string()));
        row.push(planet.true_anomaly.to_string());
        row.push(planet.inclination.to_string());
        row.extend(planet.pose().to_row_major().iter().map(|v| v.to_string()));
        row.push(planet.radius_earth.map(|r| r.to_string()).unwrap_or_default());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_pose_table_csv<P: AsRef<Path>>(path: P, ephemeris: &Ephemeris) -> anyhow::Result<()> {
    write_pose_table(std::fs::File::create(path.as_ref())?, ephemeris)?;
    info!("Wrote {} poses to {}", ephemeris.len(), path.as_ref().display());
    Ok(())
}

struct PoseColumns {
    planet_id: usize,
    host_id: usize,
    xyz: [usize; 3],
    true_anomaly: usize,
    inclination: usize,
    radius_earth: Option<usize>,
}

impl PoseColumns {
    fn locate(columns: &Columns) -> anyhow::Result<Self> {
        Ok(Self {
            planet_id: columns.require("planet_id")?,
            host_id: columns.require("host_id")?,
            xyz: [
                columns.require("x_m")?,
                columns.require("y_m")?,
                columns.require("z_m")?,
            ],
            true_anomaly: columns.require("true_anomaly_rad")?,
            inclination: columns.require("inclination_rad")?,
            radius_earth: columns.get("radius_earth"),
        })
    }

    fn parse(&self, record: &csv::StringRecord) -> Result<PlanetPose, String> {
        let id = cell(record, Some(self.planet_id)).ok_or("empty planet_id")?;
        let host_id = cell(record, Some(self.host_id))
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| format!("{id}: bad host_id"))?;
        let num = |idx: usize, name: &str| {
            required_number(record, idx, name).map_err(|e| format!("{id}: {e}"))
        };
        Ok(PlanetPose {
            planet_id: id.to_string(),
            host_id,
            position: [
                num(self.xyz[0], "x_m")?,
                num(self.xyz[1], "y_m")?,
                num(self.xyz[2], "z_m")?,
            ],
            true_anomaly: num(self.true_anomaly, "true_anomaly_rad")?,
            inclination: num(self.inclination, "inclination_rad")?,
            radius_earth: number(record, self.radius_earth, "radius_earth")
                .map_err(|e| format!("{id}: {e}"))?,
        })
    }
}

/// Read a pose table back into planet poses.
///
/// The rotation is rebuilt from the true anomaly and inclination; the
/// `r..`/`t.` columns are informational.
pub fn read_pose_table<R: Read>(reader: R) -> anyhow::Result<(Vec<PlanetPose>, BatchReport)> {
    let mut rdr = input_reader(reader);
    let columns = PoseColumns::locate(&Columns::new(rdr.headers()?))?;

    let mut report = BatchReport::default();
    let mut planets = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        match columns.parse(&result?) {
            Ok(p) => {
                report.accept();
                planets.push(p);
            }
            Err(reason) => report.skip(&SkyError::DataInvalid {
                id: format!("pose row {}", i + 2),
                reason,
            }),
        }
    }
    Ok((planets, report))
}

pub const CHART_TABLE_HEADER: [&str; 9] = [
    "planet_id",
    "star_id",
    "azimuth_rad",
    "radius",
    "size",
    "r",
    "g",
    "b",
    "a",
];

pub fn write_chart_table<W: Write>(writer: W, points: &[SkyPoint]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CHART_TABLE_HEADER)?;
    for p in points {
        let mut row = vec![
            p.planet_id.clone(),
            p.star_id.to_string(),
            p.azimuth_rad.to_string(),
            p.radius.to_string(),
            p.size.to_string(),
        ];
        row.extend(p.rgba.iter().map(|c| c.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_chart_table_csv<P: AsRef<Path>>(path: P, points: &[SkyPoint]) -> anyhow::Result<()> {
    write_chart_table(std::fs::File::create(path.as_ref())?, points)?;
    info!("Wrote {} chart rows to {}", points.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{AU_M, PARSEC_M};
    use approx::assert_relative_eq;
    use hifitime::Epoch;

    #[test]
    fn star_table_with_declared_unit() {
        let data = "\
id,ra_degrees,dec_degrees,distance,magnitude,color_index
32349,101.287,-16.716,2.64,-1.46,0.009
91262,279.234,38.783,7.68,0.03,
bad,1,1,1,1,1
70890,217.429,-62.680,0,11.13,1.82
";
        let config = StarTableConfig {
            distance_unit: DistanceUnit::Parsecs,
            ..Default::default()
        };
        let (stars, report) = read_star_table(data.as_bytes(), &config).unwrap();
        assert_eq!(stars.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.data_invalid, 2);
        assert_relative_eq!(stars[0].distance.meters(), 2.64 * PARSEC_M);
        assert_eq!(stars[1].color_index, None);
    }

    #[test]
    fn star_table_defaults_to_au() {
        let data = "id,ra_degrees,dec_degrees,distance,magnitude\n1,0,0,1,1\n";
        let (stars, _) = read_star_table(data.as_bytes(), &StarTableConfig::default()).unwrap();
        assert_eq!(stars[0].distance.meters(), AU_M);
        assert_eq!(stars[0].color_index, None);
    }

    #[test]
    fn star_table_from_parallax_with_magnitude_limit() {
        let data = "\
magnitude,id,ra_degrees,dec_degrees,parallax_mas,color_index
-1.46,32349,101.287,-16.716,379.21,0.009
7.2,1,10,10,10,0.5
4.0,2,10,10,-1,0.5
";
        let config = StarTableConfig {
            max_magnitude: Some(6.0),
            ..Default::default()
        };
        let (stars, report) = read_star_table(data.as_bytes(), &config).unwrap();
        assert_eq!(stars.len(), 1);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.data_invalid, 1);
        assert_relative_eq!(stars[0].distance.parsecs(), 1000.0 / 379.21, max_relative = 1e-12);
    }

    #[test]
    fn star_table_without_distance_is_rejected() {
        let data = "id,ra_degrees,dec_degrees,magnitude\n1,0,0,1\n";
        let err = read_star_table(data.as_bytes(), &StarTableConfig::default()).unwrap_err();
        assert!(err.to_string().contains("parallax_mas"));
    }

    #[test]
    fn elements_table_keeps_gaps_for_propagation() {
        let data = "\
planet_id,host_id,semi_major_axis_au,eccentricity,inclination_deg,host_mass_solar,epoch_timestamp,period_days
51 Peg b,113357,0.0527,0.013,80,1.09,2015-03-12,4.23
gap b,1,1.0,,90,1.0,2020-01-01,
bad b,x,1,0,0,1,2020-01-01,
late b,2,1,0,0,1,never,
";
        let (planets, report) = read_elements_table(data.as_bytes()).unwrap();
        assert_eq!(planets.len(), 2);
        assert_eq!(report.data_invalid, 2);
        assert_eq!(planets[0].planet_id, "51 Peg b");
        assert_eq!(planets[0].host_id, 113357);
        assert_eq!(planets[0].period_days, Some(4.23));
        assert_eq!(planets[0].epoch, Epoch::from_gregorian_utc_at_midnight(2015, 3, 12));
        assert_eq!(planets[0].radius_earth, None);
        assert_eq!(planets[1].eccentricity, None);
    }

    #[test]
    fn elements_table_missing_column_is_file_error() {
        let data = "planet_id,host_id\nx,1\n";
        assert!(read_elements_table(data.as_bytes()).is_err());
    }

    #[test]
    fn pose_table_round_trip() {
        let eph = Ephemeris {
            epoch_tai_seconds: 3.9e9,
            planets: vec![
                PlanetPose {
                    planet_id: "HD 1, b".into(),
                    host_id: 7,
                    position: [1.234_567_890_123e16, -2.0e15, 3.3e14],
                    true_anomaly: 1.0471975511965976,
                    inclination: 0.1,
                    radius_earth: Some(2.5),
                },
                PlanetPose {
                    planet_id: "x c".into(),
                    host_id: 8,
                    position: [0.0, 1.0, 2.0],
                    true_anomaly: -0.3,
                    inclination: 1.5,
                    radius_earth: None,
                },
            ],
        };
        let mut buf = Vec::new();
        write_pose_table(&mut buf, &eph).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("planet_id,host_id,x_m,y_m,z_m,true_anomaly_rad"));
        assert_eq!(text.lines().count(), 3);

        let (back, report) = read_pose_table(buf.as_slice()).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(back, eph.planets);
    }

    #[test]
    fn chart_table_columns() {
        let points = vec![SkyPoint {
            planet_id: "p b".into(),
            star_id: 42,
            azimuth_rad: 0.5,
            radius: 30.0,
            size: 4.0,
            rgba: [1.0, 0.5, 0.0, 1.0],
            apparent_ra_deg: 28.6,
            apparent_dec_deg: 60.0,
        }];
        let mut buf = Vec::new();
        write_chart_table(&mut buf, &points).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("planet_id,star_id,azimuth_rad,radius,size,r,g,b,a"));
        assert_eq!(lines.next(), Some("p b,42,0.5,30,4,1,0.5,0,1"));
    }
}
