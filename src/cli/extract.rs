//! `tmsubmit extract`: build a pointing table from the exposure database.

use crate::config::Config;
use crate::extract::{self, NightRange, SqliteExposureSource};

use super::{ExtractArgs, require};

pub(super) fn cmd_extract(config: &Config, args: &ExtractArgs) -> Result<(), String> {
    let outfile = require(
        args.outfile.as_deref(),
        "Use '--outfile' to specify where you want the pointing info written.",
    )?;
    let start = require(
        args.start.as_deref(),
        "Use '--start' to specify the date to begin the query (fmt YYYYMMDD)",
    )?;
    let end = require(
        args.end.as_deref(),
        "Use '--end' to specify the date to end the query (fmt YYYYMMDD)",
    )?;
    let propid = require(
        args.propid.as_deref(),
        "Use '--propid' to specify the PROPID of the observations",
    )?;

    let nights = NightRange::parse(start, end).map_err(|e| e.to_string())?;
    let instrument_id = args.instrument_id.unwrap_or(config.instrument_id);

    tracing::info!(propid, start, end, db = %args.db.display(), "extract started");

    let source = SqliteExposureSource::open(&args.db)
        .map_err(|e| format!("failed to open {}: {e}", args.db.display()))?;

    let count = extract::extract_to_file(&source, propid, nights, instrument_id, outfile)
        .map_err(|e| format!("extraction failed: {e}"))?;

    eprintln!("Extracted {count} pointing(s) → {}", outfile.display());
    Ok(())
}
