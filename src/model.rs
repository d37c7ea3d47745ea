//! Core data model for tmsubmit.
//!
//! Pointings flow from ingestion into per-band submission batches, and each
//! batch ends the run with an outcome.

mod batch;
mod outcome;
mod pointing;

pub use batch::{Payload, PayloadPointing, SubmissionBatch};
pub use outcome::{BandOutcome, RunResult, SubmissionFailure, SubmissionSuccess};
pub use pointing::{DepthUnit, PointingRecord, PointingStatus};
