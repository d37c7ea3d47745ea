//! Submission batch building: one batch per band, serialized to the wire payload.

use jiff::civil::DateTime;

use crate::model::{Payload, PayloadPointing, PointingRecord, PointingStatus, SubmissionBatch};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("refusing to build an empty batch for band '{0}'")]
    Empty(String),
}

/// Build the batch for one band and compute its payload.
///
/// Records are taken verbatim; they were normalized at ingestion.
pub fn build(
    band: &str,
    event_id: &str,
    instrument_id: u32,
    status: PointingStatus,
    records: Vec<PointingRecord>,
) -> Result<SubmissionBatch, BatchError> {
    if records.is_empty() {
        return Err(BatchError::Empty(band.to_string()));
    }

    let mut batch = SubmissionBatch {
        band: band.to_string(),
        instrument_id,
        event_id: event_id.to_string(),
        status,
        records,
        payload: None,
        result: None,
    };
    batch.payload = Some(build_payload(&batch)?);
    Ok(batch)
}

/// Serialize a batch's records and metadata into the service's structure.
///
/// A pure function of the batch: unchanged records give an identical payload.
pub fn build_payload(batch: &SubmissionBatch) -> Result<Payload, BatchError> {
    if batch.records.is_empty() {
        return Err(BatchError::Empty(batch.band.clone()));
    }

    let pointings = batch
        .records
        .iter()
        .map(|record| PayloadPointing {
            ra: record.ra_deg,
            dec: record.dec_deg,
            band: batch.band.clone(),
            instrumentid: batch.instrument_id,
            time: wire_time(record.observation_time),
            status: batch.status,
            depth: record.depth,
            depth_unit: record.depth_unit,
        })
        .collect();

    Ok(Payload {
        graceid: batch.event_id.clone(),
        pointings,
    })
}

/// `YYYY-MM-DDTHH:MM:SS.f`, always with a fraction; whole seconds end in `.0`.
fn wire_time(time: DateTime) -> String {
    let whole = time.strftime("%Y-%m-%dT%H:%M:%S");
    let nanos = time.subsec_nanosecond();
    if nanos == 0 {
        return format!("{whole}.0");
    }
    let fraction = format!("{nanos:09}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
