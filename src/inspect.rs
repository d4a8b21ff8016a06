//! Inspect command - Summarize the header and samples of an Openambit log

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;

use crate::ambit_log::{AmbitLog, Sample, parse_log};
use crate::formats::OutputFormat;

#[derive(Debug, Default, Serialize)]
pub struct KindStat {
    pub count: usize,
    /// Elapsed seconds of the first sample of this kind
    pub first_s: f64,
    /// Elapsed seconds of the last sample of this kind
    pub last_s: f64,
}

#[derive(Debug, Serialize)]
pub struct LogSummary {
    pub path: String,
    pub start: NaiveDateTime,
    pub activity_type: String,
    pub activity_name: String,
    pub output_format: String,
    pub samples: usize,
    pub dropped_samples: usize,
    pub duration_s: f64,
    pub kinds: BTreeMap<&'static str, KindStat>,
    /// Lap marker subtypes and how often each occurs.
    pub lap_markers: BTreeMap<String, usize>,
}

pub fn summarize(path: &str, log: &AmbitLog) -> LogSummary {
    let mut kinds: BTreeMap<&'static str, KindStat> = BTreeMap::new();
    let mut lap_markers: BTreeMap<String, usize> = BTreeMap::new();
    let mut first = f64::INFINITY;
    let mut last = 0.0_f64;

    for sample in &log.samples {
        let t = sample.elapsed_ms() as f64 / 1000.0;
        let entry = kinds.entry(sample.kind()).or_insert_with(|| KindStat { count: 0, first_s: t, last_s: t });
        entry.count += 1;
        entry.first_s = entry.first_s.min(t);
        entry.last_s = entry.last_s.max(t);
        first = first.min(t);
        last = last.max(t);

        if let Sample::LapMarker(marker) = sample {
            *lap_markers.entry(marker.lap.kind.clone()).or_default() += 1;
        }
    }

    let header = &log.header;
    LogSummary {
        path: path.to_string(),
        start: header.date_time,
        activity_type: header.activity_type_name.clone(),
        activity_name: header.display_name().to_string(),
        output_format: OutputFormat::for_activity_type(&header.activity_type_name).to_string(),
        samples: log.samples.len(),
        dropped_samples: log.dropped,
        duration_s: if first.is_finite() { last - first } else { 0.0 },
        kinds,
        lap_markers,
    }
}

pub fn inspect_log(path: &str, json: bool) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read log: {}", path))?;
    let log = parse_log(&text).with_context(|| format!("failed to parse log: {}", path))?;
    let summary = summarize(path, &log);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Log: {}", summary.path);
    println!(
        "Start: {}, Activity: {} ({}), Output: {}",
        summary.start, summary.activity_type, summary.activity_name, summary.output_format
    );
    println!(
        "Samples: {} kept, {} dropped, Duration (s): {:.3}\n",
        summary.samples, summary.dropped_samples, summary.duration_s
    );

    println!("{:<12} {:>7} {:>10} {:>10}", "Kind", "Count", "Start(s)", "End(s)");
    println!("{}", "-".repeat(42));
    for (kind, st) in &summary.kinds {
        println!("{:<12} {:>7} {:>10.3} {:>10.3}", kind, st.count, st.first_s, st.last_s);
    }

    if !summary.lap_markers.is_empty() {
        println!("\n{:<20} {:>7}", "Lap marker", "Count");
        println!("{}", "-".repeat(28));
        for (kind, count) in &summary.lap_markers {
            println!("{:<20} {:>7}", kind, count);
        }
    }

    Ok(())
}
