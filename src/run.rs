//! One submission run, end to end.
//!
//! records → band groups → batches → preview gate → submission → artifacts.
//! Everything a run needs arrives in [`RunConfig`]; there is no ambient state.

use std::path::Path;

use uuid::Uuid;

use crate::batch::{self, BatchError};
use crate::credentials::Credential;
use crate::group::group_by_band;
use crate::model::{PointingRecord, PointingStatus, RunResult, SubmissionBatch};
use crate::preview::{self, GateDecision, PreviewError, PreviewMode, Reviewer};
use crate::record::{ArtifactPaths, RecordError, Recorder};
use crate::submit::{self, SubmissionApi};

/// Run-wide settings shared by every band.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub event_id: String,
    pub instrument_id: u32,
    pub status: PointingStatus,
    pub credential: Credential,
    pub preview_mode: PreviewMode,
}

/// How a run ended. Per-band failures live inside `Completed`.
#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        result: RunResult,
        artifacts: ArtifactPaths,
    },
    Declined {
        band: String,
    },
    DryRun {
        batches: Vec<SubmissionBatch>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("no pointings to submit")]
    NoPointings,

    #[error("{0} pointing(s) have an empty band")]
    BlankBand(usize),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Group records by band and build one batch per band, in first-seen order.
pub fn build_batches(
    config: &RunConfig,
    records: Vec<PointingRecord>,
) -> Result<Vec<SubmissionBatch>, RunError> {
    let groups = group_by_band(records);
    if groups.is_empty() {
        return Err(RunError::NoPointings);
    }

    if let Some(blank) = groups.get("") {
        return Err(RunError::BlankBand(blank.len()));
    }

    tracing::info!(
        bands = %groups.bands().collect::<Vec<_>>().join(","),
        "made pointings"
    );

    let mut batches = Vec::with_capacity(groups.len());
    for (band, records) in groups {
        tracing::debug!(%band, count = records.len(), "building batch");
        batches.push(batch::build(
            &band,
            &config.event_id,
            config.instrument_id,
            config.status,
            records,
        )?);
    }
    Ok(batches)
}

/// Execute a run.
///
/// Nothing is submitted and no artifact is opened unless the preview gate
/// lets the run proceed. Once it does, every band is attempted and both
/// artifacts are written regardless of how many bands failed.
pub fn execute(
    config: &RunConfig,
    records: Vec<PointingRecord>,
    reviewer: &mut dyn Reviewer,
    api: &dyn SubmissionApi,
    output_dir: &Path,
) -> Result<RunOutcome, RunError> {
    let mut batches = build_batches(config, records)?;

    match preview::run_gate(&batches, config.preview_mode, reviewer)? {
        GateDecision::Proceed => {}
        GateDecision::Declined { band } => return Ok(RunOutcome::Declined { band }),
        GateDecision::DryRunComplete => return Ok(RunOutcome::DryRun { batches }),
    }

    tracing::info!(
        event = %config.event_id,
        credential = %config.credential.source,
        "beginning submission"
    );
    let outcomes = submit::submit_all(api, &config.credential.token, &mut batches);
    tracing::info!("finished submission");

    let result = RunResult {
        run_id: Uuid::new_v4(),
        event_id: config.event_id.clone(),
        batches,
        outcomes,
    };

    let recorder = Recorder::new(output_dir)?;
    let artifacts = recorder.persist(&result)?;

    Ok(RunOutcome::Completed { result, artifacts })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use jiff::civil::date;
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::credentials::CredentialSource;
    use crate::model::DepthUnit;
    use crate::preview::Verdict;
    use crate::preview::tests::ScriptedReviewer;
    use crate::submit::tests::FakeApi;

    fn config(mode: PreviewMode) -> RunConfig {
        RunConfig {
            event_id: "TEST_EVENT".into(),
            instrument_id: 38,
            status: PointingStatus::Completed,
            credential: Credential {
                source: CredentialSource::Explicit,
                token: "token".into(),
            },
            preview_mode: mode,
        }
    }

    fn record(band: &str, ra: f64, dec: f64, depth: f64) -> PointingRecord {
        PointingRecord {
            ra_deg: ra,
            dec_deg: dec,
            observation_time: date(2020, 2, 24).at(14, 10, 27, 0),
            band: band.into(),
            depth,
            depth_unit: DepthUnit::AbMag,
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn bands_in(artifact: &Value, key: &str) -> Vec<String> {
        artifact[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["band"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn two_band_example_end_to_end() {
        let out = TempDir::new().unwrap();
        let api = FakeApi::new(&[]);
        let mut reviewer = ScriptedReviewer::new(vec![]);
        let records = vec![
            record("i", 143.11, -0.03, 22.1),
            record("g", 150.0, 10.0, 23.0),
        ];

        let outcome = execute(
            &config(PreviewMode::Skip),
            records,
            &mut reviewer,
            &api,
            out.path(),
        )
        .unwrap();

        let RunOutcome::Completed { result, artifacts } = outcome else {
            panic!("run did not complete");
        };
        assert_eq!(api.call_count(), 2);
        assert_eq!(result.batches.len(), 2);
        assert!(result.batches.iter().all(|b| b.records.len() == 1));
        assert_eq!(result.failures().count(), 0);

        let results = read_json(&artifacts.results);
        assert_eq!(bands_in(&results, "results"), ["i", "g"]);
        assert!(results["results"][0]["pointing_ids"][0].is_u64());

        let payloads = read_json(&artifacts.payloads);
        assert_eq!(bands_in(&payloads, "batches"), ["i", "g"]);
    }

    #[test]
    fn failing_middle_band_is_isolated() {
        let out = TempDir::new().unwrap();
        let api = FakeApi::new(&["B"]);
        let mut reviewer = ScriptedReviewer::new(vec![]);
        let records = vec![
            record("A", 1.0, 1.0, 20.0),
            record("B", 2.0, 2.0, 20.0),
            record("C", 3.0, 3.0, 20.0),
        ];

        let outcome = execute(
            &config(PreviewMode::Skip),
            records,
            &mut reviewer,
            &api,
            out.path(),
        )
        .unwrap();

        let RunOutcome::Completed { result, artifacts } = outcome else {
            panic!("run did not complete");
        };
        assert_eq!(api.call_count(), 3);
        let failed: Vec<&str> = result.failures().map(|f| f.band.as_str()).collect();
        assert_eq!(failed, ["B"]);

        assert_eq!(
            bands_in(&read_json(&artifacts.results), "results"),
            ["A", "C"]
        );
        assert_eq!(
            bands_in(&read_json(&artifacts.payloads), "batches"),
            ["A", "B", "C"]
        );
    }

    #[test]
    fn declining_preview_submits_and_writes_nothing() {
        let out = TempDir::new().unwrap();
        let out_dir = out.path().join("artifacts");
        let api = FakeApi::new(&[]);
        let mut reviewer = ScriptedReviewer::new(vec![Verdict::Approve, Verdict::Decline]);
        let records = vec![record("g", 1.0, 1.0, 20.0), record("r", 2.0, 2.0, 20.0)];

        let outcome = execute(
            &config(PreviewMode::Interactive),
            records,
            &mut reviewer,
            &api,
            &out_dir,
        )
        .unwrap();

        assert!(matches!(outcome, RunOutcome::Declined { band } if band == "r"));
        assert_eq!(api.call_count(), 0);
        assert!(!out_dir.exists());
    }

    #[test]
    fn dry_run_never_submits() {
        let out = TempDir::new().unwrap();
        let api = FakeApi::new(&[]);
        let mut reviewer = ScriptedReviewer::new(vec![Verdict::Approve]);

        let outcome = execute(
            &config(PreviewMode::DryRun),
            vec![record("z", 1.0, 1.0, 20.0)],
            &mut reviewer,
            &api,
            out.path(),
        )
        .unwrap();

        assert!(matches!(outcome, RunOutcome::DryRun { ref batches } if batches.len() == 1));
        assert_eq!(api.call_count(), 0);
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn blank_band_is_rejected_before_submission() {
        let out = TempDir::new().unwrap();
        let api = FakeApi::new(&[]);
        let mut reviewer = ScriptedReviewer::new(vec![]);

        let err = execute(
            &config(PreviewMode::Skip),
            vec![record("g", 1.0, 1.0, 20.0), record("", 2.0, 2.0, 20.0)],
            &mut reviewer,
            &api,
            out.path(),
        )
        .unwrap_err();

        assert!(matches!(err, RunError::BlankBand(1)));
        assert_eq!(api.call_count(), 0);
    }

    #[test]
    fn no_records_is_an_error() {
        let err = build_batches(&config(PreviewMode::Skip), Vec::new()).unwrap_err();
        assert!(matches!(err, RunError::NoPointings));
    }

    #[test]
    fn batches_share_run_status() {
        let batches = build_batches(
            &config(PreviewMode::Skip),
            vec![
                record("g", 1.0, 1.0, 20.0),
                record("r", 2.0, 2.0, 20.0),
                record("g", 3.0, 3.0, 20.0),
            ],
        )
        .unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].records.len(), 2);
        assert!(
            batches
                .iter()
                .all(|b| b.status == PointingStatus::Completed)
        );
    }
}
