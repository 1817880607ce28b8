mod align_cmd;
mod cli;
mod globals;
mod logger;
mod segment_cmd;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::align_cmd::run_align;
use crate::cli::Commands;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_logger;
use crate::segment_cmd::run_segment;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Align(x) => {
            run_align(x)?;
        }
        Commands::Segment(x) => {
            info!("Running on {} threads", settings.shared.thread_count);
            run_segment(x, settings.shared.thread_count)?;
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    if let Err(err) = setup_logger(settings.shared.debug) {
        eprintln!("Failed to setup logger: {err}");
        process::exit(2);
    }

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}
