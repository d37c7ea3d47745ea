//! Per-band submission outcomes and the run that collects them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::SubmissionBatch;

/// What the service returned for an accepted band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSuccess {
    /// Identifiers the service assigned to the new pointings.
    pub pointing_ids: Vec<u64>,

    /// Per-pointing problems the service reported without rejecting the band.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Value>,

    /// The full response body, kept verbatim for audit.
    pub response: Value,
}

/// A band whose submission did not go through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionFailure {
    pub band: String,
    pub error: String,
}

/// The result of attempting one band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandOutcome {
    pub band: String,
    pub result: Result<SubmissionSuccess, SubmissionFailure>,
}

impl BandOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything one run produced, in band order.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: Uuid,
    pub event_id: String,
    pub batches: Vec<SubmissionBatch>,
    pub outcomes: Vec<BandOutcome>,
}

impl RunResult {
    pub fn succeeded(&self) -> impl Iterator<Item = &SubmissionBatch> {
        self.batches.iter().filter(|b| b.result.is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SubmissionFailure> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}
