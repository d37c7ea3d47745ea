//! Logging setup.
//!
//! Warnings and errors go to stderr for the user. When a log file is
//! configured, everything at the filter level is also appended to it as an
//! audit trail across runs. The level comes from `RUST_LOG`, defaulting
//! to `info`.

use std::{fs, io, path::Path, sync::Mutex};

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Install the global subscriber. Call once, before anything logs.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(env_filter()),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
