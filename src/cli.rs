//! Command-line arguments for the taperoll binary

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use taperoll::ControllerConfig;

/// Play a bundled sample or a WAV file, and record new takes from the terminal
#[derive(Parser, Debug)]
#[command(name = "taperoll")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// WAV file to open instead of the bundled sample
    pub file: Option<PathBuf>,

    /// Where new recordings are written
    #[arg(long, value_name = "DIR")]
    pub recordings_dir: Option<PathBuf>,

    /// More log output: -v info, -vv debug, -vvv trace (refresh ticks, view JSON)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn config(&self) -> ControllerConfig {
        let config = ControllerConfig::new();
        match &self.recordings_dir {
            Some(dir) => config.with_recordings_dir(dir),
            None => config,
        }
    }
}

/// Log to stderr with millisecond timestamps
///
/// Only taperoll's own modules follow the verbosity flags; everything else
/// stays at warn.
pub fn init_logging(args: &Args) {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("taperoll", args.log_level())
        .format_timestamp_millis()
        .init();
}
