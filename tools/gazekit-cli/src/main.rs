//! gazekit CLI — Command-line interface for gaze-stream analysis.
//!
//! Usage:
//!   gazekit analyze <PATH>     Segment a recorded gaze stream into metrics
//!   gazekit validate <PATH>    Validate a recorded gaze stream

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gazekit",
    about = "Gaze calibration and analytics toolkit",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a recorded gaze stream and report eye metrics
    Analyze {
        /// Path to the gaze stream (JSONL)
        path: PathBuf,

        /// Fixation radius in pixels
        #[arg(long, default_value = "40.0")]
        fixation_radius: f64,

        /// Minimum fixation duration in milliseconds
        #[arg(long, default_value = "100.0")]
        fixation_min_ms: f64,

        /// Minimum saccade distance in pixels
        #[arg(long, default_value = "150.0")]
        saccade_distance: f64,

        /// Maximum saccade duration in milliseconds
        #[arg(long, default_value = "80.0")]
        saccade_max_ms: f64,

        /// Area of interest as "id:x,y,w,h" in pixels (repeatable)
        #[arg(long = "aoi")]
        aois: Vec<String>,
    },

    /// Validate a recorded gaze stream
    Validate {
        /// Path to the gaze stream (JSONL)
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    gazekit_common::logging::init_logging(&gazekit_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Analyze {
            path,
            fixation_radius,
            fixation_min_ms,
            saccade_distance,
            saccade_max_ms,
            aois,
        } => commands::analyze::run(
            path,
            fixation_radius,
            fixation_min_ms,
            saccade_distance,
            saccade_max_ms,
            aois,
        ),
        Commands::Validate { path } => commands::validate::run(path),
    }
}
