//! Submission batches and the wire payload built from them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{DepthUnit, PointingRecord, PointingStatus, SubmissionSuccess};

/// The pointings of one band, bundled into a single submission unit.
///
/// Every record shares `band`; the grouper guarantees it and nothing
/// downstream re-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionBatch {
    pub band: String,
    pub instrument_id: u32,
    pub event_id: String,
    pub status: PointingStatus,
    pub records: Vec<PointingRecord>,

    /// Set once all records are appended.
    pub payload: Option<Payload>,

    /// Set by the submitter on success only.
    pub result: Option<SubmissionSuccess>,
}

/// The body the followup service expects for one band, minus credentials.
///
/// The API token is attached to the outgoing request only, so payloads can
/// be previewed and archived without leaking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub graceid: String,
    pub pointings: Vec<PayloadPointing>,
}

/// One pointing as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadPointing {
    pub ra: f64,
    pub dec: f64,
    pub band: String,
    pub instrumentid: u32,
    pub time: String,
    pub status: PointingStatus,
    pub depth: f64,
    pub depth_unit: DepthUnit,
}

impl Payload {
    /// Pretty-printed JSON, as shown in previews and written to artifacts.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Hex SHA-256 of the compact JSON encoding.
    ///
    /// Ties a result artifact entry back to the payload that produced it.
    pub fn digest(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(bytes)))
    }
}
