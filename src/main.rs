mod batch;
mod cli;
mod config;
mod coords;
mod credentials;
mod extract;
mod group;
mod ingest;
mod logging;
mod model;
mod preview;
mod record;
mod run;
mod submit;

use std::process;

use clap::Parser;

use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = logging::init(cli.log_file(&config).as_deref()) {
        eprintln!("Failed to open log file: {e}");
        process::exit(1);
    }

    if let Err(e) = cli::run(cli, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
