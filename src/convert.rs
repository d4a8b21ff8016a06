use anyhow::{Context, Result, anyhow};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

use crate::aggregate::{AggregateStats, AggregatorConfig, aggregate};
use crate::ambit_log::parse_log;
use crate::formats::{FormatChoice, OutputFormat, gpx};

/// Options for converting Openambit logs to TCX/GPX
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Input .log files
    pub log_paths: Vec<String>,
    /// Explicit output file; only valid with a single input
    pub output_path: Option<String>,
    /// Directory receiving `<log stem>.<tcx|gpx>`; defaults to next to each log
    pub out_dir: Option<String>,
    /// Output format, or pick from the activity type
    pub format: FormatChoice,
    /// Lap splitting and point spacing
    pub aggregator: AggregatorConfig,
    /// Dry run: convert but don't write output
    pub dry_run: bool,
    /// Show progress bar
    pub show_progress: bool,
}

/// Outcome of one successful conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub log_path: String,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub dropped_samples: usize,
    /// Trackpoints left out of a GPX document for lack of a position.
    pub unpositioned_points: usize,
    pub stats: AggregateStats,
    pub written: bool,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<ConversionReport>,
    /// Logs that could not be converted; each was already reported once.
    pub failed: Vec<String>,
}

/// Convert a single log.
///
/// The document is rendered in full before anything touches the filesystem,
/// then written through a uniquely named temporary file in the output
/// directory, so a failed conversion never leaves a partial output behind.
///
/// # Example
///
/// ```rust,no_run
/// use ambit2x::{convert_log, ConvertOptions};
///
/// let report = convert_log("move.log", &ConvertOptions::default())?;
/// println!("wrote {}", report.output_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn convert_log(log_path: &str, options: &ConvertOptions) -> Result<ConversionReport> {
    let text = fs::read_to_string(log_path).with_context(|| format!("failed to read log: {}", log_path))?;
    let log = parse_log(&text).with_context(|| format!("failed to parse log: {}", log_path))?;

    let activity_type = log.header.activity_type_name.as_str();
    let format = options.format.resolve(activity_type);
    let (activity, stats) = aggregate(&log, format.sport_label(activity_type), &options.aggregator);
    tracing::debug!(
        periodic = stats.periodic,
        gps_fixes = stats.gps_fixes,
        lap_markers = stats.lap_markers,
        ignored_markers = stats.ignored_markers,
        out_of_range = stats.out_of_range,
        "samples aggregated"
    );
    let unpositioned_points = match format {
        OutputFormat::Gpx => gpx::unpositioned_count(&activity),
        OutputFormat::Tcx => 0,
    };

    let output_path = output_path_for(log_path, format, options)?;
    if !options.dry_run {
        let document = format.render(&activity);
        write_atomic(&output_path, &document)?;
        tracing::info!(output = %output_path.display(), %format, laps = stats.laps, trackpoints = stats.trackpoints, "saved");
    }

    Ok(ConversionReport {
        log_path: log_path.to_string(),
        output_path,
        format,
        dropped_samples: log.dropped + stats.out_of_range,
        unpositioned_points,
        stats,
        written: !options.dry_run,
    })
}

/// Convert every log in `options`, in parallel; each conversion is independent.
pub fn convert_logs(options: &ConvertOptions) -> Result<BatchSummary> {
    if options.log_paths.is_empty() {
        anyhow::bail!("no input log given");
    }
    if options.output_path.is_some() && options.log_paths.len() > 1 {
        anyhow::bail!("--out requires a single input log; use --out-dir for several");
    }
    if options.output_path.is_none() {
        let mut targets: HashMap<PathBuf, &str> = HashMap::new();
        for path in &options.log_paths {
            let base = output_base(path, options)?;
            if let Some(previous) = targets.insert(base.clone(), path) {
                anyhow::bail!(
                    "{} and {} would both be written to {}.*; convert them into separate directories",
                    previous,
                    path,
                    base.display()
                );
            }
        }
    }
    if let Some(dir) = &options.out_dir
        && !options.dry_run
    {
        fs::create_dir_all(dir).with_context(|| format!("failed to create output directory: {}", dir))?;
    }

    let pb = if options.show_progress {
        let pb = ProgressBar::new(options.log_paths.len() as u64);
        pb.set_style(ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} logs")?);
        pb
    } else {
        ProgressBar::hidden()
    };

    let started = Instant::now();
    let results: Vec<(String, Result<ConversionReport>)> = options
        .log_paths
        .par_iter()
        .map(|path| {
            let _span = tracing::info_span!("convert", log = %path).entered();
            (path.clone(), convert_log(path, options))
        })
        .progress_with(pb.clone())
        .collect();
    pb.finish_and_clear();

    let mut summary = BatchSummary::default();
    for (path, result) in results {
        match result {
            Ok(report) => summary.reports.push(report),
            Err(e) => {
                tracing::error!("{}: conversion failed: {:#}", path, e);
                summary.failed.push(path);
            }
        }
    }

    let trackpoints: usize = summary.reports.iter().map(|r| r.stats.trackpoints).sum();
    let verb = if options.dry_run { "Plan" } else { "Converted" };
    println!(
        "{}: {} of {} logs, {} trackpoints, {:.2?}",
        verb,
        summary.reports.len(),
        options.log_paths.len(),
        trackpoints,
        started.elapsed()
    );
    for report in &summary.reports {
        let left_out = if report.unpositioned_points > 0 {
            format!(", {} without position left out of GPX", report.unpositioned_points)
        } else {
            String::new()
        };
        println!(
            "  {} → {} ({}, {} laps, {} trackpoints, {} samples dropped{})",
            report.log_path,
            report.output_path.display(),
            report.format,
            report.stats.laps,
            report.stats.trackpoints,
            report.dropped_samples,
            left_out
        );
    }

    Ok(summary)
}

/// Where the converted document for `log_path` goes.
pub fn output_path_for(log_path: &str, format: OutputFormat, options: &ConvertOptions) -> Result<PathBuf> {
    let input = Path::new(log_path);
    let output = match &options.output_path {
        Some(out) => PathBuf::from(out),
        None => {
            let mut name = output_base(log_path, options)?.into_os_string();
            name.push(".");
            name.push(format.extension());
            PathBuf::from(name)
        }
    };

    if output == input {
        anyhow::bail!("output path would overwrite the input log: {}", log_path);
    }
    Ok(output)
}

/// Output path minus its format extension, for logs without an explicit `--out`.
fn output_base(log_path: &str, options: &ConvertOptions) -> Result<PathBuf> {
    let input = Path::new(log_path);
    match &options.out_dir {
        Some(dir) => {
            let stem = input
                .file_stem()
                .ok_or_else(|| anyhow!("log path has no file name: {}", log_path))?;
            Ok(Path::new(dir).join(stem))
        }
        None => Ok(input.with_extension("")),
    }
}

/// The temporary file is removed on drop unless it was persisted.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write output for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move output into place: {}", path.display()))?;
    Ok(())
}
