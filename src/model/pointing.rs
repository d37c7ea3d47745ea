//! Pointing records: one observed sky position per input row.

use std::fmt;
use std::str::FromStr;

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

/// One row of observation metadata, normalized at ingestion.
///
/// Never mutated once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointingRecord {
    /// Right ascension, ICRS decimal degrees in `[0, 360)`.
    pub ra_deg: f64,
    /// Declination, ICRS decimal degrees in `[-90, 90]`.
    pub dec_deg: f64,
    /// Observation time in UTC.
    pub observation_time: DateTime,
    /// Photometric filter identifier, e.g. `g` or `Y`.
    pub band: String,
    pub depth: f64,
    pub depth_unit: DepthUnit,
}

/// How a pointing's depth is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthUnit {
    /// AB magnitude (`ab_mag` on the wire).
    AbMag,
    /// Flux density in Jansky (`flux_jy` on the wire).
    FluxJy,
}

impl DepthUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AbMag => "ab_mag",
            Self::FluxJy => "flux_jy",
        }
    }
}

impl fmt::Display for DepthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ab_mag" | "ab_magnitude" => Ok(Self::AbMag),
            "flux_jy" => Ok(Self::FluxJy),
            other => Err(format!("unknown depth unit '{other}' (expected ab_mag or flux_jy)")),
        }
    }
}

/// Whether the reported pointings are scheduled or already observed.
///
/// Fixed per run, never per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointingStatus {
    Planned,
    Completed,
}

impl PointingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for PointingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown status '{other}' (expected planned or completed)")),
        }
    }
}
