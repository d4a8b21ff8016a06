//! Validate command - Re-read a produced TCX or GPX file and check its structure
//!
//! Checks performed:
//! - the root element is a TCX `TrainingCenterDatabase` or a GPX `gpx`
//! - every lap has at least one track, every track at least one trackpoint
//! - trackpoint timestamps are non-decreasing within each track

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDateTime;
use roxmltree::{Document, Node};
use std::fs;

use crate::ambit_log::{child, child_text};
use crate::formats::OutputFormat;
use crate::formats::tcx::TIME_FMT;
use crate::model::Position;

/// A trackpoint as found in an output document.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputTrackpoint {
    pub time: NaiveDateTime,
    pub distance: Option<f64>,
    pub position: Option<Position>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputDocument {
    pub format: OutputFormat,
    /// Tracks grouped per lap; GPX has a single implicit lap.
    pub laps: Vec<Vec<Vec<OutputTrackpoint>>>,
}

impl OutputDocument {
    pub fn trackpoints(&self) -> impl Iterator<Item = &OutputTrackpoint> {
        self.laps.iter().flatten().flatten()
    }

    /// Structural problems, one message per finding.
    pub fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (lap_index, tracks) in self.laps.iter().enumerate() {
            if tracks.is_empty() && self.format == OutputFormat::Tcx {
                errors.push(format!("[ERROR] Lap {} has no track", lap_index + 1));
            }
            for (track_index, points) in tracks.iter().enumerate() {
                if points.is_empty() {
                    errors.push(format!(
                        "[ERROR] Lap {} track {} has no trackpoint",
                        lap_index + 1,
                        track_index + 1
                    ));
                }
                for pair in points.windows(2) {
                    if pair[1].time < pair[0].time {
                        errors.push(format!(
                            "[ERROR] Lap {} track {} timestamps are not monotonic: {} < {}",
                            lap_index + 1,
                            track_index + 1,
                            pair[1].time,
                            pair[0].time
                        ));
                    }
                }
            }
        }
        errors
    }
}

/// Parse the text of a TCX or GPX document written by this tool.
pub fn read_output(text: &str) -> Result<OutputDocument> {
    let doc = Document::parse(text).context("output is not well-formed XML")?;
    let root = doc.root_element();

    if root.has_tag_name("TrainingCenterDatabase") {
        let mut laps = Vec::new();
        for lap in root.descendants().filter(|n| n.has_tag_name("Lap")) {
            let tracks = elements(lap, "Track")
                .map(|track| elements(track, "Trackpoint").map(read_tcx_point).collect::<Result<Vec<_>>>())
                .collect::<Result<Vec<_>>>()?;
            laps.push(tracks);
        }
        Ok(OutputDocument {
            format: OutputFormat::Tcx,
            laps,
        })
    } else if root.has_tag_name("gpx") {
        let tracks = root
            .descendants()
            .filter(|n| n.has_tag_name("trkseg"))
            .map(|segment| elements(segment, "trkpt").map(read_gpx_point).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Ok(OutputDocument {
            format: OutputFormat::Gpx,
            laps: vec![tracks],
        })
    } else {
        bail!("unrecognized root element <{}>", root.tag_name().name())
    }
}

/// Validate an output file, printing a PASSED/FAILED report. Returns whether it passed.
pub fn validate_output(path: &str) -> Result<bool> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;

    let document = match read_output(&text) {
        Ok(document) => document,
        Err(e) => {
            println!("Validation of {}: FAILED", path);
            println!("[ERROR] {:#}", e);
            return Ok(false);
        }
    };

    let errors = document.problems();
    if errors.is_empty() {
        println!("Validation of {}: PASSED", path);
        println!(
            "Format: {}, Laps: {}, Tracks: {}, Trackpoints: {}",
            document.format,
            document.laps.len(),
            document.laps.iter().map(Vec::len).sum::<usize>(),
            document.trackpoints().count()
        );
        Ok(true)
    } else {
        println!("Validation of {}: FAILED", path);
        for error in errors {
            println!("{}", error);
        }
        Ok(false)
    }
}

fn elements<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn read_tcx_point(node: Node) -> Result<OutputTrackpoint> {
    let time = parse_time(child_text(node, "Time"))?;
    let distance = child_text(node, "DistanceMeters").map(str::parse::<f64>).transpose()?;
    let position = match child(node, "Position") {
        Some(position) => Some(Position {
            latitude: number(child_text(position, "LatitudeDegrees"), "LatitudeDegrees")?,
            longitude: number(child_text(position, "LongitudeDegrees"), "LongitudeDegrees")?,
        }),
        None => None,
    };
    Ok(OutputTrackpoint {
        time,
        distance,
        position,
    })
}

fn read_gpx_point(node: Node) -> Result<OutputTrackpoint> {
    let time = parse_time(child_text(node, "time"))?;
    let distance = child(node, "extensions")
        .and_then(|ext| child_text(ext, "distance"))
        .map(str::parse::<f64>)
        .transpose()?;
    Ok(OutputTrackpoint {
        time,
        distance,
        position: Some(Position {
            latitude: number(node.attribute("lat"), "lat")?,
            longitude: number(node.attribute("lon"), "lon")?,
        }),
    })
}

fn parse_time(raw: Option<&str>) -> Result<NaiveDateTime> {
    let raw = raw.ok_or_else(|| anyhow!("trackpoint without time"))?;
    NaiveDateTime::parse_from_str(raw, TIME_FMT).with_context(|| format!("invalid time {:?}", raw))
}

fn number(raw: Option<&str>, field: &str) -> Result<f64> {
    let raw = raw.ok_or_else(|| anyhow!("missing {}", field))?;
    raw.parse().with_context(|| format!("invalid {} {:?}", field, raw))
}
