//! Result recording: timestamped audit artifacts for each run.
//!
//! Two files per run, in the output directory:
//!
//! ```text
//! payloads_<yymmdd_HHMMSS>.json   # every attempted band's payload
//! requests_<yymmdd_HHMMSS>.json   # service responses, successful bands only
//! ```
//!
//! Files are never overwritten; a name collision gets a numeric suffix.
//! The payload artifact is written first and no transaction spans the two.

use std::{fs, io, io::Write, path::PathBuf};

use jiff::{Timestamp, Zoned};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::model::{Payload, RunResult};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("batch for band '{0}' has no built payload")]
    MissingPayload(String),

    #[error("I/O error writing artifacts: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, RecordError>;

/// Where one run's artifacts ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub payloads: PathBuf,
    pub results: PathBuf,
}

#[derive(Serialize)]
struct PayloadArtifact<'a> {
    run_id: Uuid,
    event_id: &'a str,
    written_at: Timestamp,
    batches: Vec<PayloadEntry<'a>>,
}

#[derive(Serialize)]
struct PayloadEntry<'a> {
    band: &'a str,
    digest: String,
    payload: &'a Payload,
}

#[derive(Serialize)]
struct ResultArtifact<'a> {
    run_id: Uuid,
    event_id: &'a str,
    written_at: Timestamp,
    results: Vec<ResultEntry<'a>>,
}

#[derive(Serialize)]
struct ResultEntry<'a> {
    band: &'a str,
    payload_digest: String,
    pointing_ids: &'a [u64],
    response: &'a Value,
}

/// Writes run artifacts into a single directory.
pub struct Recorder {
    dir: PathBuf,
}

impl Recorder {
    /// Creates a recorder for the given directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist both artifacts for a finished run.
    ///
    /// Bands that failed submission appear in the payload artifact only.
    pub fn persist(&self, run: &RunResult) -> Result<ArtifactPaths> {
        let mut batches = Vec::with_capacity(run.batches.len());
        for batch in &run.batches {
            let payload = batch
                .payload
                .as_ref()
                .ok_or_else(|| RecordError::MissingPayload(batch.band.clone()))?;
            batches.push(PayloadEntry {
                band: &batch.band,
                digest: payload.digest()?,
                payload,
            });
        }

        let written = Zoned::now();
        let payloads = self.write_artifact(
            "payloads",
            &written,
            &PayloadArtifact {
                run_id: run.run_id,
                event_id: &run.event_id,
                written_at: written.timestamp(),
                batches,
            },
        )?;
        tracing::info!(path = %payloads.display(), "wrote payload artifact");

        let mut results = Vec::new();
        for batch in run.succeeded() {
            let (Some(payload), Some(result)) = (&batch.payload, &batch.result) else {
                continue;
            };
            results.push(ResultEntry {
                band: &batch.band,
                payload_digest: payload.digest()?,
                pointing_ids: &result.pointing_ids,
                response: &result.response,
            });
            tracing::debug!(band = %batch.band, "recording result");
        }

        let written = Zoned::now();
        let results = self.write_artifact(
            "requests",
            &written,
            &ResultArtifact {
                run_id: run.run_id,
                event_id: &run.event_id,
                written_at: written.timestamp(),
                results,
            },
        )?;
        tracing::info!(path = %results.display(), "wrote result artifact");

        Ok(ArtifactPaths { payloads, results })
    }

    /// Write `value` to a fresh `<prefix>_<stamp>.json`, never replacing a file.
    fn write_artifact(&self, prefix: &str, at: &Zoned, value: &impl Serialize) -> Result<PathBuf> {
        let stamp = at.strftime("%y%m%d_%H%M%S").to_string();
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');

        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{prefix}_{stamp}.json")
            } else {
                format!("{prefix}_{stamp}_{attempt}.json")
            };
            let path = self.dir.join(name);

            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
