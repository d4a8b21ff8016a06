//! Openambit `.log` reader
//!
//! An Openambit log is an XML document holding a `Log` element made of a
//! `Header` (start time, activity type) followed by `Samples/Sample*`.
//! Each sample carries a `Type` discriminator and an elapsed `Time` in
//! milliseconds since the start of the activity.

use std::str::FromStr;

use chrono::NaiveDateTime;
use roxmltree::{Document, Node};

use crate::error::LogError;

/// Wall-clock format used by header and lap fields, e.g. `2024-04-10T06:22:49`.
pub const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// UTC fields look like `2024-04-10T04:22:47.905Z`; this is the `.905Z` part.
const UTC_SUFFIX_LEN: usize = ".000Z".len();

/// Integer coordinates are degrees scaled by this factor.
pub const COORD_SCALE: f64 = 10_000_000.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub date_time: NaiveDateTime,
    pub activity_type_name: String,
    pub activity_name: Option<String>,
}

impl Header {
    pub fn display_name(&self) -> &str {
        self.activity_name.as_deref().unwrap_or(&self.activity_type_name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Sample {
    Periodic(PeriodicSample),
    GpsFix(GpsFix),
    LapMarker(LapMarker),
}

impl Sample {
    pub const PERIODIC: &'static str = "periodic";
    pub const GPS_FIX: &'static str = "gps-small";
    pub const LAP_MARKER: &'static str = "lap-info";

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Sample::Periodic(s) => s.time_ms,
            Sample::GpsFix(s) => s.time_ms,
            Sample::LapMarker(s) => s.time_ms,
        }
    }

    /// The `Type` discriminator this sample was read from.
    pub fn kind(&self) -> &'static str {
        match self {
            Sample::Periodic(_) => Self::PERIODIC,
            Sample::GpsFix(_) => Self::GPS_FIX,
            Sample::LapMarker(_) => Self::LAP_MARKER,
        }
    }
}

/// Telemetry sample; everything but the elapsed time is optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeriodicSample {
    pub time_ms: u64,
    pub utc: Option<NaiveDateTime>,
    pub cadence: Option<u32>,
    pub energy_consumption: Option<u32>,
    pub temperature: Option<i32>,
    pub altitude: Option<i32>,
    pub distance: Option<u32>,
    pub speed: Option<u32>,
    pub heart_rate: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GpsFix {
    pub time_ms: u64,
    pub utc: NaiveDateTime,
    /// Degrees × 10,000,000
    pub latitude: i32,
    /// Degrees × 10,000,000
    pub longitude: i32,
}

impl GpsFix {
    pub fn latitude_degrees(&self) -> f64 {
        f64::from(self.latitude) / COORD_SCALE
    }

    pub fn longitude_degrees(&self) -> f64 {
        f64::from(self.longitude) / COORD_SCALE
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LapMarker {
    pub time_ms: u64,
    pub utc: Option<NaiveDateTime>,
    pub lap: LapInfo,
}

/// Summary of the lap that just ended, as recorded by the watch.
#[derive(Clone, Debug, PartialEq)]
pub struct LapInfo {
    /// Marker subtype, e.g. `Manual`, `Interval`, `Low Interval`, `Start`, `Pause`.
    pub kind: String,
    pub date_time: NaiveDateTime,
    /// Seconds
    pub duration: u32,
    /// Meters
    pub distance: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbitLog {
    pub header: Header,
    pub samples: Vec<Sample>,
    /// Sample entries skipped because they were unrecognized or malformed.
    pub dropped: usize,
}

/// Parse the text of an Openambit log.
///
/// Fails only when the document itself is unusable: bad XML, no `Log` or
/// `Header` element, or a header without a parsable start time or activity
/// type. Individual samples that cannot be read are skipped with a diagnostic.
pub fn parse_log(text: &str) -> Result<AmbitLog, LogError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    let log = if root.has_tag_name("Log") {
        root
    } else {
        child(root, "Log").ok_or(LogError::MissingElement("Log"))?
    };

    let header = parse_header(child(log, "Header").ok_or(LogError::MissingElement("Header"))?)?;
    tracing::debug!(start = %header.date_time, activity_type = %header.activity_type_name, "parsed header");

    let mut samples = Vec::new();
    let mut dropped = 0;
    let mut last_elapsed = 0;

    let sample_nodes = log
        .children()
        .filter(|n| n.has_tag_name("Samples"))
        .flat_map(|samples| samples.children().filter(|n| n.has_tag_name("Sample")));

    for node in sample_nodes {
        match parse_sample(node) {
            Ok(Some(sample)) => {
                if sample.elapsed_ms() < last_elapsed {
                    tracing::warn!(
                        line = doc.text_pos_at(node.range().start).row,
                        elapsed_ms = sample.elapsed_ms(),
                        previous_ms = last_elapsed,
                        "sample elapsed time goes backwards"
                    );
                }
                last_elapsed = sample.elapsed_ms();
                samples.push(sample);
            }
            Ok(None) => dropped += 1,
            Err(e) => {
                tracing::warn!(line = doc.text_pos_at(node.range().start).row, "malformed sample: {e}; skipping");
                dropped += 1;
            }
        }
    }

    Ok(AmbitLog { header, samples, dropped })
}

fn parse_header(node: Node) -> Result<Header, LogError> {
    let date_time_raw = child_text(node, "DateTime").ok_or(LogError::MissingField("Header/DateTime"))?;
    let activity_type_name = child_text(node, "ActivityTypeName")
        .ok_or(LogError::MissingField("Header/ActivityTypeName"))?
        .to_string();
    let date_time = parse_datetime(date_time_raw).ok_or_else(|| LogError::InvalidValue {
        field: "Header/DateTime",
        value: date_time_raw.to_string(),
    })?;

    Ok(Header {
        date_time,
        activity_type_name,
        activity_name: child_text(node, "ActivityName").map(str::to_string),
    })
}

/// Returns `Ok(None)` for sample types this converter does not use.
fn parse_sample(node: Node) -> Result<Option<Sample>, LogError> {
    let kind = child_text(node, "Type").ok_or(LogError::MissingField("Type"))?;

    let sample = match kind {
        Sample::PERIODIC => Sample::Periodic(parse_periodic(node)?),
        Sample::GPS_FIX => Sample::GpsFix(parse_gps_fix(node)?),
        Sample::LAP_MARKER => Sample::LapMarker(parse_lap_marker(node)?),
        other => {
            tracing::debug!(kind = other, "unhandled sample type");
            return Ok(None);
        }
    };
    Ok(Some(sample))
}

fn parse_periodic(node: Node) -> Result<PeriodicSample, LogError> {
    Ok(PeriodicSample {
        time_ms: required(node, "Time")?,
        utc: optional_utc(node),
        cadence: optional(node, "Cadence"),
        energy_consumption: optional(node, "EnergyConsumption"),
        temperature: optional(node, "Temperature"),
        altitude: optional(node, "Altitude"),
        distance: optional(node, "Distance"),
        speed: optional(node, "Speed"),
        heart_rate: optional(node, "HR"),
    })
}

fn parse_gps_fix(node: Node) -> Result<GpsFix, LogError> {
    let time_ms = required(node, "Time")?;
    let utc_raw = child_text(node, "UTC").ok_or(LogError::MissingField("UTC"))?;
    let utc = parse_utc(utc_raw).ok_or_else(|| LogError::InvalidValue {
        field: "UTC",
        value: utc_raw.to_string(),
    })?;

    Ok(GpsFix {
        time_ms,
        utc,
        latitude: required(node, "Latitude")?,
        longitude: required(node, "Longitude")?,
    })
}

fn parse_lap_marker(node: Node) -> Result<LapMarker, LogError> {
    let time_ms = required(node, "Time")?;
    let utc = optional_utc(node);
    let lap = child(node, "Lap").ok_or(LogError::MissingElement("Lap"))?;

    let kind = child_text(lap, "Type").ok_or(LogError::MissingField("Lap/Type"))?.to_string();
    let date_time_raw = child_text(lap, "DateTime").ok_or(LogError::MissingField("Lap/DateTime"))?;
    let date_time = parse_datetime(date_time_raw).ok_or_else(|| LogError::InvalidValue {
        field: "Lap/DateTime",
        value: date_time_raw.to_string(),
    })?;

    Ok(LapMarker {
        time_ms,
        utc,
        lap: LapInfo {
            kind,
            date_time,
            duration: required(lap, "Duration")?,
            distance: required(lap, "Distance")?,
        },
    })
}

/// Parse a wall-clock timestamp without timezone suffix.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).ok()
}

/// Parse a UTC timestamp by dropping its fixed-width `.fffZ` suffix.
pub fn parse_utc(s: &str) -> Option<NaiveDateTime> {
    let cut = s.len().checked_sub(UTC_SUFFIX_LEN)?;
    parse_datetime(s.get(..cut)?)
}

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

pub(crate) fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required<T: FromStr>(node: Node, field: &'static str) -> Result<T, LogError> {
    let raw = child_text(node, field).ok_or(LogError::MissingField(field))?;
    raw.parse().map_err(|_| LogError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

fn optional<T: FromStr>(node: Node, field: &'static str) -> Option<T> {
    let raw = child_text(node, field)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(field, value = raw, "unparsable optional field; treating as absent");
            None
        }
    }
}

fn optional_utc(node: Node) -> Option<NaiveDateTime> {
    let raw = child_text(node, "UTC")?;
    let parsed = parse_utc(raw);
    if parsed.is_none() {
        tracing::debug!(value = raw, "unparsable UTC; treating as absent");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn wrap(header: &str, samples: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?><openambitlog><Log><Header>{header}</Header><Samples>{samples}</Samples></Log></openambitlog>"
        )
    }

    const HEADER: &str = "<DateTime>2024-04-10T06:22:49</DateTime><ActivityTypeName>Running</ActivityTypeName>";

    #[test]
    fn test_parse_utc_truncates_fraction() {
        assert_eq!(parse_utc("2024-04-10T04:22:47.905Z"), Some(ts(4, 22, 47)));
        assert_eq!(parse_utc("Z"), None);
        assert_eq!(parse_utc("2024-04-10T04:22:47"), None);
    }

    #[test]
    fn test_header_fields() {
        let log = parse_log(&wrap(
            "<DateTime>2024-04-10T06:22:49</DateTime><ActivityTypeName>Aerobics</ActivityTypeName><ActivityName>Gym</ActivityName>",
            "",
        ))
        .unwrap();
        assert_eq!(log.header.date_time, ts(6, 22, 49));
        assert_eq!(log.header.activity_type_name, "Aerobics");
        assert_eq!(log.header.display_name(), "Gym");
        assert!(log.samples.is_empty());
    }

    #[test]
    fn test_missing_activity_type_is_fatal() {
        let err = parse_log(&wrap("<DateTime>2024-04-10T06:22:49</DateTime>", "")).unwrap_err();
        assert!(matches!(err, LogError::MissingField("Header/ActivityTypeName")));
    }

    #[test]
    fn test_bad_start_time_is_fatal() {
        let err = parse_log(&wrap(
            "<DateTime>yesterday</DateTime><ActivityTypeName>Running</ActivityTypeName>",
            "",
        ))
        .unwrap_err();
        assert!(matches!(err, LogError::InvalidValue { field: "Header/DateTime", .. }));
    }

    #[test]
    fn test_missing_log_element() {
        let err = parse_log("<openambitlog><Other/></openambitlog>").unwrap_err();
        assert!(matches!(err, LogError::MissingElement("Log")));
    }

    #[test]
    fn test_sample_variants() {
        let log = parse_log(&wrap(
            HEADER,
            "<Sample><Type>periodic</Type><Time>1000</Time><Distance>12</Distance><Altitude>-3</Altitude><HR>131</HR><Speed>oops</Speed></Sample>\
             <Sample><Type>gps-small</Type><Time>2000</Time><UTC>2024-04-10T04:22:51.000Z</UTC><Latitude>107000000</Latitude><Longitude>-742000000</Longitude></Sample>\
             <Sample><Type>lap-info</Type><Time>3000</Time><Lap><Type>Interval</Type><DateTime>2024-04-10T06:22:52</DateTime><Duration>3</Duration><Distance>20</Distance></Lap></Sample>",
        ))
        .unwrap();

        assert_eq!(log.samples.len(), 3);
        assert_eq!(log.dropped, 0);
        match &log.samples[0] {
            Sample::Periodic(p) => {
                assert_eq!(p.time_ms, 1000);
                assert_eq!(p.distance, Some(12));
                assert_eq!(p.altitude, Some(-3));
                assert_eq!(p.heart_rate, Some(131));
                assert_eq!(p.speed, None);
                assert_eq!(p.cadence, None);
            }
            other => panic!("unexpected sample {other:?}"),
        }
        match &log.samples[1] {
            Sample::GpsFix(g) => {
                assert_eq!(g.utc, ts(4, 22, 51));
                assert_eq!(g.latitude_degrees(), 10.7);
                assert_eq!(g.longitude_degrees(), -74.2);
            }
            other => panic!("unexpected sample {other:?}"),
        }
        match &log.samples[2] {
            Sample::LapMarker(m) => {
                assert_eq!(m.lap.kind, "Interval");
                assert_eq!(m.lap.date_time, ts(6, 22, 52));
                assert_eq!(m.lap.duration, 3);
                assert_eq!(m.lap.distance, 20);
                assert_eq!(m.utc, None);
            }
            other => panic!("unexpected sample {other:?}"),
        }
    }

    #[test]
    fn test_bad_samples_are_skipped() {
        let log = parse_log(&wrap(
            HEADER,
            "<Sample><Type>ibi</Type><Time>0</Time></Sample>\
             <Sample><Time>0</Time></Sample>\
             <Sample><Type>periodic</Type></Sample>\
             <Sample><Type>gps-small</Type><Time>10</Time><UTC>2024-04-10T04:22:51.000Z</UTC><Latitude>1</Latitude></Sample>\
             <Sample><Type>lap-info</Type><Time>10</Time></Sample>\
             <Sample><Type>periodic</Type><Time>20</Time></Sample>",
        ))
        .unwrap();
        assert_eq!(log.samples.len(), 1);
        assert_eq!(log.dropped, 5);
        assert_eq!(log.samples[0].elapsed_ms(), 20);
    }
}
