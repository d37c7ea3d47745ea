//! Ingestion: read the pointing table into validated, normalized records.
//!
//! Columns: `ra, dec, time, band, depth, depth_unit`, plus optional `status`
//! and `instrumentid` as written by `tmsubmit extract`. Rows keep file order.
//! Any invalid row aborts ingestion; there is no skip-and-continue.

use std::{fs, io, path::Path, path::PathBuf};

use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use serde::Deserialize;

use crate::coords::{self, AngleUnit, Axis, CoordinateError};
use crate::model::{DepthUnit, PointingRecord, PointingStatus};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot open pointing file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("malformed CSV at row {row}: {source}")]
    Csv { row: usize, source: csv::Error },

    #[error("row {row}: {source}")]
    Coordinate {
        row: usize,
        source: CoordinateError,
    },

    #[error("row {row}: invalid time '{value}': {source}")]
    Time {
        row: usize,
        value: String,
        source: jiff::Error,
    },

    #[error("row {row}: {reason}")]
    Invalid { row: usize, reason: String },

    #[error("row {row}: status '{found}' disagrees with run status '{expected}'")]
    StatusMismatch {
        row: usize,
        found: String,
        expected: PointingStatus,
    },

    #[error("row {row}: instrumentid '{found}' disagrees with run instrument {expected}")]
    InstrumentMismatch {
        row: usize,
        found: String,
        expected: u32,
    },

    #[error("no pointings found in input")]
    Empty,
}

pub type Result<T> = core::result::Result<T, IngestError>;

/// Run-level values that rows are checked against.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub unit: AngleUnit,
    pub status: PointingStatus,
    pub instrument_id: u32,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    ra: String,
    dec: String,
    time: String,
    band: String,
    depth: f64,
    depth_unit: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    instrumentid: Option<String>,
}

/// Read pointings from a CSV file.
pub fn read_pointings(path: &Path, options: IngestOptions) -> Result<Vec<PointingRecord>> {
    let file = fs::File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_from(file, options)?;
    tracing::info!(path = %path.display(), count = records.len(), "read pointings");
    Ok(records)
}

/// Read pointings from any CSV source with a header row.
pub fn read_from(reader: impl io::Read, options: IngestOptions) -> Result<Vec<PointingRecord>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, raw) in csv.deserialize::<RawRow>().enumerate() {
        let row = index + 1;
        let raw = raw.map_err(|source| IngestError::Csv { row, source })?;
        let record = convert(row, raw, options)?;
        tracing::debug!(row, band = %record.band, "added pointing");
        records.push(record);
    }

    if records.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(records)
}

fn convert(row: usize, raw: RawRow, options: IngestOptions) -> Result<PointingRecord> {
    let coordinate = |source: CoordinateError| IngestError::Coordinate { row, source };

    let ra = coords::parse_angle(&raw.ra, Axis::RightAscension, options.unit).map_err(coordinate)?;
    let dec = coords::parse_angle(&raw.dec, Axis::Declination, options.unit).map_err(coordinate)?;
    let (ra_deg, dec_deg) = coords::normalize(ra, dec, options.unit).map_err(coordinate)?;

    let observation_time = parse_time(&raw.time).map_err(|source| IngestError::Time {
        row,
        value: raw.time.clone(),
        source,
    })?;

    let depth_unit: DepthUnit = raw
        .depth_unit
        .parse()
        .map_err(|reason| IngestError::Invalid { row, reason })?;
    check_depth(raw.depth, depth_unit).map_err(|reason| IngestError::Invalid { row, reason })?;

    if let Some(found) = raw.status.filter(|s| !s.is_empty())
        && found.parse::<PointingStatus>().ok() != Some(options.status)
    {
        return Err(IngestError::StatusMismatch {
            row,
            found,
            expected: options.status,
        });
    }

    if let Some(found) = raw.instrumentid.filter(|s| !s.is_empty())
        && found.parse::<u32>().ok() != Some(options.instrument_id)
    {
        return Err(IngestError::InstrumentMismatch {
            row,
            found,
            expected: options.instrument_id,
        });
    }

    Ok(PointingRecord {
        ra_deg,
        dec_deg,
        observation_time,
        band: raw.band,
        depth: raw.depth,
        depth_unit,
    })
}

/// Parse an ISO-8601 time. Times with an offset are converted to UTC;
/// times without one are taken as UTC already.
pub fn parse_time(value: &str) -> core::result::Result<DateTime, jiff::Error> {
    if let Ok(ts) = value.parse::<Timestamp>() {
        return Ok(ts.to_zoned(TimeZone::UTC).datetime());
    }
    value.parse::<DateTime>()
}

fn check_depth(depth: f64, unit: DepthUnit) -> core::result::Result<(), String> {
    if !depth.is_finite() {
        return Err(format!("depth {depth} is not finite"));
    }
    if unit == DepthUnit::AbMag && depth < 0.0 {
        return Err(format!("depth {depth} ab_mag is negative"));
    }
    Ok(())
}
