//! GPX 1.1 writer
//!
//! Laps are flattened away: every model track becomes one `trkseg`. Heart
//! rate, cadence and cumulative distance go into the ClueTrust `gpxdata`
//! extension. GPX points need coordinates, so trackpoints recorded before the
//! first GPS fix are left out.

use crate::document::Element;
use crate::formats::tcx::format_time;
use crate::model::{Activity, Track, Trackpoint};

pub const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
pub const GPXDATA_NS: &str = "http://www.cluetrust.com/XML/GPXDATA/1/0";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd http://www.cluetrust.com/XML/GPXDATA/1/0 http://www.cluetrust.com/Schemas/gpxdata10.xsd";

pub const CREATOR: &str = "ambit2x";

pub fn build(activity: &Activity) -> Element {
    let segments: Vec<Element> = activity
        .laps
        .iter()
        .flat_map(|lap| lap.tracks.iter())
        .filter_map(segment_element)
        .collect();

    let skipped = unpositioned_count(activity);
    if skipped > 0 {
        tracing::debug!(skipped, "trackpoints without position left out of GPX");
    }
    if segments.is_empty() {
        tracing::warn!("no positioned trackpoints; GPX track will be empty");
    }

    Element::new("gpx")
        .attr("version", "1.1")
        .attr("creator", CREATOR)
        .attr("xmlns", GPX_NS)
        .attr("xmlns:xsi", XSI_NS)
        .attr("xmlns:gpxdata", GPXDATA_NS)
        .attr("xsi:schemaLocation", SCHEMA_LOCATION)
        .child(
            Element::new("metadata")
                .child(Element::leaf("name", &activity.name))
                .child(Element::leaf("time", format_time(activity.id))),
        )
        .child(
            Element::new("trk")
                .child(Element::leaf("name", &activity.name))
                .child(Element::leaf("type", &activity.sport))
                .children(segments),
        )
}

/// Trackpoints of `activity` that GPX cannot carry because they have no position.
pub fn unpositioned_count(activity: &Activity) -> usize {
    activity
        .laps
        .iter()
        .flat_map(|lap| lap.trackpoints())
        .filter(|p| p.position.is_none())
        .count()
}

/// `None` when no point of the track has a position.
fn segment_element(track: &Track) -> Option<Element> {
    let points: Vec<Element> = track.trackpoints.iter().filter_map(trackpoint_element).collect();
    if points.is_empty() {
        return None;
    }
    Some(Element::new("trkseg").children(points))
}

fn trackpoint_element(point: &Trackpoint) -> Option<Element> {
    let position = point.position?;
    let extensions = Element::new("extensions")
        .child_opt(point.heart_rate.map(|bpm| Element::leaf("gpxdata:hr", bpm)))
        .child_opt(point.cadence.map(|cadence| Element::leaf("gpxdata:cadence", cadence)))
        .child(Element::leaf("gpxdata:distance", point.distance));

    Some(
        Element::new("trkpt")
            .attr("lat", position.latitude)
            .attr("lon", position.longitude)
            .child_opt(point.altitude.map(|m| Element::leaf("ele", m)))
            .child(Element::leaf("time", format_time(point.time)))
            .child(extensions),
    )
}
