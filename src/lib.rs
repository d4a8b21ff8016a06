//! ambit2x - Convert Suunto Ambit (Openambit) .log files into TCX or GPX
//!
//! An Openambit log is a flat, time-ordered list of samples: periodic
//! telemetry, GPS fixes and lap markers. This library folds that stream into
//! laps of tracks of trackpoints and writes the result as a standard
//! interchange document.
//!
//! # Features
//!
//! - **Log reading**: `periodic`, `gps-small` and `lap-info` samples; unknown or
//!   malformed samples are skipped with a diagnostic
//! - **Aggregation**: 5 s decimation before the first GPS fix, carry-forward of
//!   distance/altitude/heart rate/cadence, lap cuts on interval markers
//! - **TCX**: laps with summaries for `Aerobics` activities (sport `workout`)
//! - **GPX**: positioned trackpoints for every other activity type
//! - **Batch**: many logs converted in parallel, outputs written atomically
//!
//! # Example
//!
//! ```rust,no_run
//! use ambit2x::{convert_logs, ConvertOptions};
//!
//! let options = ConvertOptions {
//!     log_paths: vec!["move.log".to_string()],
//!     out_dir: Some("converted".to_string()),
//!     ..ConvertOptions::default()
//! };
//!
//! let summary = convert_logs(&options)?;
//! assert!(summary.failed.is_empty());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod aggregate;
pub mod ambit_log;
pub mod cli;
pub mod convert;
pub mod document;
pub mod error;
pub mod formats;
pub mod inspect;
pub mod model;
pub mod schema;
pub mod validate;

// Re-export main types for convenience
pub use aggregate::{AggregatorConfig, LapRule, SampleAggregator, aggregate};
pub use ambit_log::{AmbitLog, Sample, parse_log};
pub use convert::{ConvertOptions, convert_log, convert_logs};
pub use error::LogError;
pub use formats::{FormatChoice, OutputFormat};
pub use model::Activity;
