use clap::{ArgAction, Parser, Subcommand};

use crate::aggregate::LapRule;
use crate::formats::FormatChoice;

#[derive(Parser, Debug)]
#[command(name = "ambit2x", about = "Convert Openambit .log files into TCX or GPX", version)]
pub struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert logs into TCX (Aerobics) or GPX (everything else)
    Convert {
        /// Path(s) to the .log file(s)
        #[arg(required = true)]
        logs: Vec<String>,
        /// Output file path (single log only); defaults to the log path with a .tcx/.gpx extension
        #[arg(short = 'o', long = "out")]
        out: Option<String>,
        /// Write outputs into this directory instead of next to each log
        #[arg(long = "out-dir", conflicts_with = "out")]
        out_dir: Option<String>,
        /// Output format; auto picks from the activity type
        #[arg(long = "format", value_enum, default_value_t = FormatChoice::Auto)]
        format: FormatChoice,
        /// Which lap markers split laps
        #[arg(long = "lap-rule", value_enum, default_value_t = LapRule::Extended)]
        lap_rule: LapRule,
        /// Dry-run: convert but do not write any file
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Show progress bar
        #[arg(long = "progress")]
        progress: bool,
    },

    /// Show header, sample counts and time span of a log
    Inspect {
        /// Path to the .log file
        log: String,
        /// Print the summary as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Show recognized sample types and the output format rule
    Schema {},

    /// Validate a produced .tcx or .gpx file
    Validate { file: String },
}
