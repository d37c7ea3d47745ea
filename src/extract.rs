//! Exposure extraction: turn raw survey exposures into a submission table.
//!
//! Exposures for one proposal are pulled from an exposure database, folded
//! into one pointing per (night, filter, hex, position, time), given an
//! estimated limiting magnitude, and written as CSV in the column layout
//! `tmsubmit submit` reads.

mod sqlite;

use std::{io, path::Path, sync::LazyLock};

use jiff::civil::{Date, DateTime};
use regex::Regex;
use serde::Serialize;

use crate::model::{DepthUnit, PointingStatus};

pub use sqlite::SqliteExposureSource;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid night '{value}' (expected YYYYMMDD): {source}")]
    InvalidNight { value: String, source: jiff::Error },

    #[error("night range {start}..{end} is empty")]
    EmptyRange { start: String, end: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("exposure {id}: invalid date '{value}': {source}")]
    ExposureDate {
        id: i64,
        value: String,
        source: jiff::Error,
    },

    #[error("failed to write pointings: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, ExtractError>;

/// Observing nights strictly between `start` and `end`.
///
/// A night is labelled by the date it began, one day before the UTC
/// date of its exposures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightRange {
    pub start: Date,
    pub end: Date,
}

impl NightRange {
    /// Parse `YYYYMMDD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |value: &str| {
            Date::strptime("%Y%m%d", value).map_err(|source| ExtractError::InvalidNight {
                value: value.to_string(),
                source,
            })
        };
        let range = Self {
            start: parse(start)?,
            end: parse(end)?,
        };
        if range.start >= range.end {
            return Err(ExtractError::EmptyRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(range)
    }

    pub fn contains(&self, night: Date) -> bool {
        self.start < night && night < self.end
    }
}

/// The night an exposure belongs to: the day before its UTC date.
pub fn night_of(date: DateTime) -> Date {
    date.date().yesterday().unwrap_or(date.date())
}

/// One science exposure as stored by the observatory.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureRow {
    pub id: i64,
    pub exptime: f64,
    pub filter: String,
    pub date: DateTime,
    pub qc_teff: f64,
    pub ra: f64,
    pub dec: f64,
    pub object: String,
}

/// A producer of science exposures for one proposal.
///
/// Implementations return only object exposures with positive `qc_teff`,
/// within the night range, ordered by exposure id.
pub trait ExposureSource {
    fn exposures(&self, propid: &str, nights: NightRange) -> Result<Vec<ExposureRow>>;
}

/// A row of the submission table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedPointing {
    pub ra: f64,
    pub dec: f64,
    pub time: String,
    pub band: String,
    pub status: PointingStatus,
    pub instrumentid: u32,
    pub depth: f64,
    pub depth_unit: DepthUnit,
}

/// Hex (tiling position) id embedded in the exposure's object name.
static HEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"x(.......)t").expect("hex pattern is valid"));

/// Nominal single-epoch depth per DECam filter at `teff * exptime = 90s`.
fn base_depth(filter: &str) -> Option<f64> {
    match filter {
        "g" => Some(23.4),
        "r" => Some(23.1),
        "i" => Some(22.5),
        "z" => Some(21.8),
        "Y" => Some(20.3),
        _ => None,
    }
}

/// Estimated limiting magnitude of a stack with the given effective exposure.
pub fn estimate_depth(filter: &str, teff_exptime: f64) -> Option<f64> {
    let depth = base_depth(filter)? + 1.25 * (teff_exptime / 90.0).log10();
    depth.is_finite().then(|| round_to(depth, 2))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug)]
struct Group {
    night: Date,
    key: (String, String, String, String, String),
    time: DateTime,
    ra: f64,
    dec: f64,
    filter: String,
    teff_exptime: f64,
}

/// Fold exposures into pointings, ordered by night.
///
/// Exposures sharing night, filter, hex, rounded position and second are one
/// pointing. Groups whose filter has no nominal depth are dropped.
pub fn aggregate(rows: &[ExposureRow], instrument_id: u32) -> Vec<ExtractedPointing> {
    let mut groups: Vec<Group> = Vec::new();

    for row in rows {
        let night = night_of(row.date);
        let hex = HEX_PATTERN
            .captures(&row.object)
            .and_then(|c| c.get(1))
            .map_or_else(String::new, |m| m.as_str().to_string());
        let time = row.date.strftime("%H:%M:%S").to_string();
        let key = (
            row.filter.clone(),
            hex,
            format!("{:.6}", row.ra),
            format!("{:.5}", row.dec),
            time,
        );

        tracing::trace!(id = row.id, %night, "folding exposure");
        match groups.iter_mut().find(|g| g.night == night && g.key == key) {
            Some(group) => group.teff_exptime += row.qc_teff * row.exptime,
            None => groups.push(Group {
                night,
                key,
                time: row.date,
                ra: round_to(row.ra, 6),
                dec: round_to(row.dec, 5),
                filter: row.filter.clone(),
                teff_exptime: row.qc_teff * row.exptime,
            }),
        }
    }

    groups.sort_by_key(|g| g.night);

    groups
        .into_iter()
        .filter_map(|g| {
            let Some(depth) = estimate_depth(&g.filter, g.teff_exptime) else {
                tracing::warn!(filter = %g.filter, night = %g.night, "no nominal depth, skipping");
                return None;
            };
            Some(ExtractedPointing {
                ra: g.ra,
                dec: g.dec,
                time: g.time.strftime("%Y-%m-%dT%H:%M:%S.0").to_string(),
                band: g.filter,
                status: PointingStatus::Completed,
                instrumentid: instrument_id,
                depth,
                depth_unit: DepthUnit::AbMag,
            })
        })
        .collect()
}

/// Write the submission table with a header row.
pub fn write_csv(pointings: &[ExtractedPointing], writer: impl io::Write) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if pointings.is_empty() {
        csv.write_record([
            "ra",
            "dec",
            "time",
            "band",
            "status",
            "instrumentid",
            "depth",
            "depth_unit",
        ])?;
    }
    for pointing in pointings {
        csv.serialize(pointing)?;
    }
    csv.flush()?;
    Ok(())
}

/// Query, aggregate and write to `out`. Returns the number of pointings.
pub fn extract_to_file(
    source: &dyn ExposureSource,
    propid: &str,
    nights: NightRange,
    instrument_id: u32,
    out: &Path,
) -> Result<usize> {
    let rows = source.exposures(propid, nights)?;
    tracing::info!(propid, exposures = rows.len(), "queried exposures");

    let pointings = aggregate(&rows, instrument_id);
    if pointings.is_empty() {
        tracing::warn!(propid, "no pointings in range");
    }

    let file = std::fs::File::create(out)?;
    write_csv(&pointings, file)?;
    tracing::info!(path = %out.display(), count = pointings.len(), "wrote pointings");
    Ok(pointings.len())
}
