use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
};

/// Target prefix shared by the library and the binary.
const APP_TARGET: &str = "denscat";

fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Terminal output: our own events at the requested verbosity, dependencies (FFT planner,
/// linear algebra) never chattier than warnings. `--quiet` silences everything.
fn console_filter(verbosity: u8, quiet: bool) -> Targets {
    if quiet {
        return Targets::new().with_default(LevelFilter::OFF);
    }
    let level = verbosity_level(verbosity);
    Targets::new()
        .with_default(level.min(LevelFilter::WARN))
        .with_target(APP_TARGET, level)
}

/// The log file always records workflow milestones, even when the terminal is quiet.
fn file_filter(verbosity: u8) -> Targets {
    Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target(APP_TARGET, verbosity_level(verbosity).max(LevelFilter::INFO))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(console_filter(verbosity, quiet));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true)
                    .with_filter(file_filter(verbosity)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
