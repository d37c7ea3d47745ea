//! tmsubmit configuration.
//!
//! Loaded from `~/.tmsubmit/config.toml`. Every key is optional; a missing
//! file means all defaults. Command-line flags override what is set here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::submit::DEFAULT_BASE_URL;

/// DECam's instrument id at the followup service.
pub const DECAM_INSTRUMENT_ID: u32 = 38;

/// tmsubmit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Base URL of the followup service's API.
    pub api_base_url: String,

    /// Instrument the pointings were taken with.
    pub instrument_id: u32,

    /// Identity whose token is used when the current user has none.
    pub fallback_identity: Option<String>,

    /// Root of the per-identity token store.
    /// Defaults to `~/.tmsubmit/api_tokens`.
    pub token_store: Option<PathBuf>,

    /// Where run artifacts are written.
    pub output_dir: PathBuf,

    /// Append-only audit log.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            instrument_id: DECAM_INSTRUMENT_ID,
            fallback_identity: None,
            token_store: None,
            output_dir: PathBuf::from("."),
            log_file: Some(PathBuf::from("submit_tm.log")),
        }
    }
}

impl Config {
    /// Load config from `~/.tmsubmit/config.toml`, or defaults if it is absent.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.tmsubmit/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tmsubmit").join("config.toml"))
    }
}
