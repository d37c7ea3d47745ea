//! Preview gate: human confirmation before anything is submitted.
//!
//! The gate is all-or-nothing across bands. One declined band stops the
//! whole run, including bands already approved. It only reads batches.

use std::io::{self, BufRead, Write};

use crate::model::SubmissionBatch;

/// How the gate behaves for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Show every band and require approval before submitting.
    Interactive,
    /// Non-interactive: submit without asking.
    #[default]
    Skip,
    /// Show every band, then stop without submitting whatever the answers.
    DryRun,
}

/// A reviewer's answer for one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Decline,
}

/// What the run should do after the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Declined { band: String },
    DryRunComplete,
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("batch for band '{0}' has no built payload")]
    MissingPayload(String),

    #[error("failed to render payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error during preview: {0}")]
    Io(#[from] io::Error),
}

/// Something that can look at a band's payload and answer for it.
pub trait Reviewer {
    fn review(&mut self, band: &str, payload_json: &str) -> io::Result<Verdict>;
}

/// Asks on a terminal (or any line-oriented stream) with a `(y/n)` prompt.
///
/// Re-asks until it gets `y` or `n`. End of input counts as a decline.
pub struct TerminalReviewer<R, W> {
    input: R,
    output: W,
}

impl<R, W> TerminalReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalReviewer<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

const PROMPT: &str = "Does the JSON data look okay? (y/n) ";

impl<R: BufRead, W: Write> Reviewer for TerminalReviewer<R, W> {
    fn review(&mut self, band: &str, payload_json: &str) -> io::Result<Verdict> {
        writeln!(self.output, "\n\tShowing {band}-band pointings\n")?;
        writeln!(self.output, "{payload_json}")?;

        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Verdict::Decline);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" => return Ok(Verdict::Approve),
                "n" => return Ok(Verdict::Decline),
                _ => writeln!(self.output, "Please enter 'y' or 'n'")?,
            }
        }
    }
}

/// Run the gate over every batch, in order.
pub fn run_gate(
    batches: &[SubmissionBatch],
    mode: PreviewMode,
    reviewer: &mut dyn Reviewer,
) -> Result<GateDecision, PreviewError> {
    if mode == PreviewMode::Skip {
        tracing::info!("preview skipped");
        return Ok(GateDecision::Proceed);
    }

    tracing::info!(?mode, bands = batches.len(), "requesting approval");
    for batch in batches {
        let payload = batch
            .payload
            .as_ref()
            .ok_or_else(|| PreviewError::MissingPayload(batch.band.clone()))?;
        let json = payload.to_json()?;

        let verdict = reviewer.review(&batch.band, &json)?;
        tracing::debug!(band = %batch.band, ?verdict, "preview answered");

        if verdict == Verdict::Decline {
            tracing::info!(band = %batch.band, "pointings declined, stopping run");
            return Ok(GateDecision::Declined {
                band: batch.band.clone(),
            });
        }
    }

    if mode == PreviewMode::DryRun {
        return Ok(GateDecision::DryRunComplete);
    }
    Ok(GateDecision::Proceed)
}
