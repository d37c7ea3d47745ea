//! `tmsubmit submit`: the batched submission run.

use crate::config::Config;
use crate::credentials::{self, Credential};
use crate::ingest::{self, IngestOptions};
use crate::preview::{PreviewMode, TerminalReviewer};
use crate::run::{self, RunConfig, RunOutcome};
use crate::submit::TreasureMapClient;

use super::{SubmitArgs, format::format_summary, require, token_store};

pub(super) fn cmd_submit(config: &Config, args: &SubmitArgs) -> Result<(), String> {
    let infile = require(
        args.infile.as_deref(),
        "Use '--infile' to specify the file with pointing info",
    )?;
    let graceid = require(
        args.graceid.as_deref(),
        "Use '--graceid' to specify the GraceDB event name",
    )?;

    let preview_mode = if args.dry_run {
        PreviewMode::DryRun
    } else if args.preview {
        PreviewMode::Interactive
    } else {
        PreviewMode::Skip
    };
    let instrument_id = args.instrument_id.unwrap_or(config.instrument_id);
    let status = args.status.to_domain();

    tracing::info!(
        infile = %infile.display(),
        graceid,
        ?preview_mode,
        instrument_id,
        %status,
        "submit started"
    );

    let credential = resolve_credential(config, args.api_token.as_deref())?;
    tracing::info!(source = %credential.source, "resolved API token");

    let records = ingest::read_pointings(
        infile,
        IngestOptions {
            unit: args.coord_unit.to_domain(),
            status,
            instrument_id,
        },
    )
    .map_err(|e| {
        tracing::error!(error = %e, "cannot ingest pointings");
        format!("failed to read pointings: {e}")
    })?;

    let base_url = args.api_url.as_deref().unwrap_or(&config.api_base_url);
    let client = TreasureMapClient::new(base_url)
        .map_err(|e| format!("failed to create HTTP client: {e}"))?;

    let run_config = RunConfig {
        event_id: graceid.to_string(),
        instrument_id,
        status,
        credential,
        preview_mode,
    };
    let output_dir = args.output_dir.as_deref().unwrap_or(&config.output_dir);
    let mut reviewer = TerminalReviewer::stdio();

    let outcome = run::execute(&run_config, records, &mut reviewer, &client, output_dir)
        .map_err(|e| {
            tracing::error!(error = %e, "run aborted");
            format!("submission run failed: {e}")
        })?;

    report(&outcome);
    tracing::info!("submit finished");
    Ok(())
}

fn resolve_credential(
    config: &Config,
    explicit: Option<&str>,
) -> Result<Credential, String> {
    credentials::resolve_credential(
        explicit,
        &token_store(config)?,
        config.fallback_identity.as_deref(),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "program needs a valid API token");
        e.to_string()
    })
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Declined { band } => {
            eprintln!("{band}-band pointings declined. Please make your corrections and restart.");
        }
        RunOutcome::DryRun { batches } => {
            eprintln!(
                "Dry run: previewed {} band(s), nothing submitted.",
                batches.len()
            );
        }
        RunOutcome::Completed { result, artifacts } => {
            println!("{}", format_summary(result));
            let failed = result.failures().count();
            if failed > 0 {
                tracing::warn!(failed, "some bands may not have submitted properly");
            }
            eprintln!("Payloads → {}", artifacts.payloads.display());
            eprintln!("Results  → {}", artifacts.results.display());
        }
    }
}
