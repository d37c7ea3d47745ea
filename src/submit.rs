//! Batch submission: send each band to the followup service, isolating failures.
//!
//! Each batch is submitted exactly once, in run order, with no retries.
//! A failing band is recorded and the next band is attempted; nothing here
//! propagates a per-band error to the caller.

mod treasure_map;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{BandOutcome, Payload, SubmissionBatch, SubmissionFailure, SubmissionSuccess};

pub use treasure_map::{DEFAULT_BASE_URL, TreasureMapClient};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service rejected every pointing: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("batch for band '{0}' has no built payload")]
    MissingPayload(String),
}

/// The body posted for one band: the payload plus credentials.
#[derive(Debug, Serialize)]
pub struct SubmissionRequest<'a> {
    pub api_token: &'a str,
    #[serde(flatten)]
    pub payload: &'a Payload,
}

/// A request to mint a DOI for an event's submitted pointings.
#[derive(Debug, Serialize)]
pub struct DoiRequest<'a> {
    pub api_token: &'a str,
    pub graceid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi_group_id: Option<&'a str>,
    #[serde(skip_serializing_if = "no_creators")]
    pub creators: &'a [Creator],
}

fn no_creators(creators: &&[Creator]) -> bool {
    creators.is_empty()
}

/// A DOI author entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub affiliation: String,
}

/// The remote followup service.
pub trait SubmissionApi {
    /// Post one band's pointings. Called at most once per batch per run.
    fn submit_pointings(
        &self,
        request: &SubmissionRequest<'_>,
    ) -> Result<SubmissionSuccess, ApiError>;

    /// Ask the service to mint a DOI.
    fn request_doi(&self, request: &DoiRequest<'_>) -> Result<Value, ApiError>;
}

/// Submit a single batch.
pub fn submit(
    api: &dyn SubmissionApi,
    api_token: &str,
    batch: &SubmissionBatch,
) -> Result<SubmissionSuccess, ApiError> {
    let payload = batch
        .payload
        .as_ref()
        .ok_or_else(|| ApiError::MissingPayload(batch.band.clone()))?;
    api.submit_pointings(&SubmissionRequest { api_token, payload })
}

/// Submit every batch in order and collect one outcome per band.
///
/// Successful batches get their `result` set; failed ones keep `None`.
pub fn submit_all(
    api: &dyn SubmissionApi,
    api_token: &str,
    batches: &mut [SubmissionBatch],
) -> Vec<BandOutcome> {
    let mut outcomes = Vec::with_capacity(batches.len());

    for batch in batches.iter_mut() {
        tracing::info!(band = %batch.band, pointings = batch.records.len(), "submitting");

        let result = match submit(api, api_token, batch) {
            Ok(success) => {
                tracing::info!(
                    band = %batch.band,
                    ids = ?success.pointing_ids,
                    warnings = success.warnings.len(),
                    "submitted"
                );
                batch.result = Some(success.clone());
                Ok(success)
            }
            Err(e) => {
                tracing::warn!(band = %batch.band, error = %e, "submission failed");
                Err(SubmissionFailure {
                    band: batch.band.clone(),
                    error: e.to_string(),
                })
            }
        };

        outcomes.push(BandOutcome {
            band: batch.band.clone(),
            result,
        });
    }

    outcomes
}
