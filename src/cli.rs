//! CLI interface for tmsubmit.
//!
//! Three commands:
//!
//! - `tmsubmit submit` reads a pointing table and submits it, one batch per band.
//! - `tmsubmit extract` builds a pointing table from an exposure database.
//! - `tmsubmit request-doi` asks the service to mint a DOI for an event.
//!
//! Flags override `~/.tmsubmit/config.toml`.

mod doi;
mod extract;
mod format;
mod submit;

use std::{ffi::OsStr, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::coords::AngleUnit;
use crate::credentials::TokenStore;
use crate::model::PointingStatus;

/// tmsubmit: report survey pointings to the Treasure Map followup service.
#[derive(Debug, Parser)]
#[command(name = "tmsubmit", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Append the audit log here instead of the configured log file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Do not write an audit log file.
    #[arg(long, global = true, conflicts_with = "log_file")]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: reporting a followup campaign
  1. tmsubmit extract --outfile S190814bv.csv --start 20190813 --end 20190905 \
       --propid 2019B-0372 --db decam.sqlite
  2. tmsubmit submit --infile S190814bv.csv --graceid S190814bv --dry-run
  3. tmsubmit submit --infile S190814bv.csv --graceid S190814bv --preview
  4. tmsubmit request-doi --graceid S190814bv --group DECam

Artifacts:
  payloads_<yymmdd_HHMMSS>.json  every band's payload, written once submission starts
  requests_<yymmdd_HHMMSS>.json  service responses for bands that were accepted";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit pointings from a CSV file, one batch per band.
    ///
    /// A band that fails to submit is reported and the remaining bands are
    /// still attempted. The exit status only reflects missing inputs,
    /// credentials or invalid rows.
    Submit(SubmitArgs),

    /// Extract pointings for a proposal from an exposure database into CSV.
    Extract(ExtractArgs),

    /// Ask the service to mint a DOI for an event's pointings.
    #[command(name = "request-doi")]
    RequestDoi(DoiArgs),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// CSV file with pointing info.
    #[arg(long)]
    pub infile: Option<PathBuf>,

    /// Event identifier (GraceDB id).
    #[arg(long)]
    pub graceid: Option<String>,

    /// Show each band's payload and ask before submitting.
    #[arg(long)]
    pub preview: bool,

    /// Show each band's payload, then stop without submitting.
    #[arg(long, conflicts_with = "preview")]
    pub dry_run: bool,

    /// Status reported for every pointing in this run.
    #[arg(long, value_enum, default_value_t = StatusArg::Completed)]
    pub status: StatusArg,

    /// Unit of plain-number `ra`/`dec` values.
    #[arg(long, value_enum, default_value_t = UnitArg::Deg)]
    pub coord_unit: UnitArg,

    /// Instrument id at the service (default from config, 38 = DECam).
    #[arg(long)]
    pub instrument_id: Option<u32>,

    /// API token; skips the token store.
    #[arg(long)]
    pub api_token: Option<String>,

    /// Service base URL.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Directory for run artifacts.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// CSV file to write pointing info to.
    #[arg(long)]
    pub outfile: Option<PathBuf>,

    /// Lower night bound, exclusive (YYYYMMDD).
    #[arg(long)]
    pub start: Option<String>,

    /// Upper night bound, exclusive (YYYYMMDD).
    #[arg(long)]
    pub end: Option<String>,

    /// Proposal id of the observations.
    #[arg(long)]
    pub propid: Option<String>,

    /// SQLite exposure database.
    #[arg(long)]
    pub db: PathBuf,

    /// Instrument id written to every row (default from config).
    #[arg(long)]
    pub instrument_id: Option<u32>,
}

#[derive(Debug, Args)]
pub struct DoiArgs {
    /// Event identifier (GraceDB id).
    #[arg(long)]
    pub graceid: String,

    /// DOI group to mint under (e.g. `DECam`).
    #[arg(long)]
    pub group: Option<String>,

    /// Author as `Name:Affiliation`. Can be specified multiple times.
    #[arg(long)]
    pub creator: Vec<String>,

    /// API token; skips the token store.
    #[arg(long)]
    pub api_token: Option<String>,

    /// Service base URL.
    #[arg(long)]
    pub api_url: Option<String>,
}

/// CLI-facing status, mapped to the domain `PointingStatus`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Planned,
    Completed,
}

impl StatusArg {
    fn to_domain(self) -> PointingStatus {
        match self {
            Self::Planned => PointingStatus::Planned,
            Self::Completed => PointingStatus::Completed,
        }
    }
}

/// CLI-facing coordinate unit, mapped to the domain `AngleUnit`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    /// Decimal degrees.
    Deg,
    /// RA in hours, Dec in degrees.
    Hourangle,
    /// Radians.
    Rad,
}

impl UnitArg {
    fn to_domain(self) -> AngleUnit {
        match self {
            Self::Deg => AngleUnit::Degrees,
            Self::Hourangle => AngleUnit::HourAngle,
            Self::Rad => AngleUnit::Radians,
        }
    }
}

impl Cli {
    /// The audit log path after applying flags over config.
    pub fn log_file(&self, config: &Config) -> Option<PathBuf> {
        if self.no_log_file {
            return None;
        }
        self.log_file.clone().or_else(|| config.log_file.clone())
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    match cli.command {
        Command::Submit(args) => submit::cmd_submit(config, &args),
        Command::Extract(args) => extract::cmd_extract(config, &args),
        Command::RequestDoi(args) => doi::cmd_request_doi(config, &args),
    }
}

/// Require that an optional flag was provided with a non-empty value.
fn require<'a, T>(value: Option<&'a T>, hint: &str) -> Result<&'a T, String>
where
    T: AsRef<OsStr> + ?Sized,
{
    value.filter(|v| !v.as_ref().is_empty()).ok_or_else(|| {
        tracing::error!("{hint}");
        hint.to_string()
    })
}

/// The token store, from config or `~/.tmsubmit/api_tokens`.
fn token_store(config: &Config) -> Result<TokenStore, String> {
    let root = config
        .token_store
        .clone()
        .or_else(TokenStore::default_root)
        .ok_or("could not determine home directory for the token store")?;
    Ok(TokenStore::new(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_defaults() {
        let cli = Cli::try_parse_from([
            "tmsubmit",
            "submit",
            "--infile",
            "p.csv",
            "--graceid",
            "S200224ca",
        ])
        .unwrap();

        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert!(!args.preview);
        assert!(!args.dry_run);
        assert_eq!(args.status.to_domain(), PointingStatus::Completed);
        assert_eq!(args.coord_unit.to_domain(), AngleUnit::Degrees);
    }

    #[test]
    fn require_rejects_missing_and_empty_values() {
        let hint = "Use '--graceid' to specify the GraceDB event name";
        assert_eq!(require::<str>(None, hint).unwrap_err(), hint);
        assert_eq!(require(Some(""), hint).unwrap_err(), hint);
        assert_eq!(require(Some("S190814bv"), hint).unwrap(), "S190814bv");

        let empty = PathBuf::new();
        assert!(require(Some(empty.as_path()), hint).is_err());
        let infile = PathBuf::from("pointings.csv");
        assert!(require(Some(infile.as_path()), hint).is_ok());
    }

    #[test]
    fn preview_and_dry_run_conflict() {
        let result = Cli::try_parse_from(["tmsubmit", "submit", "--preview", "--dry-run"]);
        assert!(result.is_err());
    }

    #[test]
    fn log_file_flag_overrides_config() {
        let config = Config::default();
        let cli = Cli::try_parse_from([
            "tmsubmit",
            "--log-file",
            "run.log",
            "request-doi",
            "--graceid",
            "E1",
        ])
        .unwrap();
        assert_eq!(cli.log_file(&config), Some(PathBuf::from("run.log")));

        let cli =
            Cli::try_parse_from(["tmsubmit", "--no-log-file", "request-doi", "--graceid", "E1"])
                .unwrap();
        assert_eq!(cli.log_file(&config), None);
    }
}
