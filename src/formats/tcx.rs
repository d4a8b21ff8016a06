//! Training Center Database (TCX v2) writer

use chrono::NaiveDateTime;

use crate::document::Element;
use crate::model::{Activity, Lap, Position, Trackpoint};

pub const TCX_NS: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const TPX_NS: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";
const SCHEMA_LOCATION: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2 http://www.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd";

/// e.g. `2011-07-10T09:52:40Z`
pub const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn build(activity: &Activity) -> Element {
    Element::new("TrainingCenterDatabase")
        .attr("xmlns", TCX_NS)
        .attr("xmlns:xsi", XSI_NS)
        .attr("xsi:schemaLocation", SCHEMA_LOCATION)
        .child(Element::new("Activities").child(activity_element(activity)))
}

fn activity_element(activity: &Activity) -> Element {
    Element::new("Activity")
        .attr("Sport", &activity.sport)
        .child(Element::leaf("Id", format_time(activity.id)))
        .child(Element::leaf("Name", &activity.name))
        .children(activity.laps.iter().map(|lap| lap_element(lap, activity.id)))
}

fn lap_element(lap: &Lap, fallback_start: NaiveDateTime) -> Element {
    Element::new("Lap")
        .attr("StartTime", format_time(lap.start_time.unwrap_or(fallback_start)))
        .child(Element::leaf("TotalTimeSeconds", lap.total_time.unwrap_or(0)))
        .child(Element::leaf("DistanceMeters", lap.distance))
        .child(Element::leaf("MaximumSpeed", lap.max_speed))
        .child(Element::leaf("Calories", lap.calories))
        .child_opt(lap.avg_heart_rate.map(|bpm| heart_rate_element("AverageHeartRateBpm", bpm)))
        .child_opt(lap.max_heart_rate.map(|bpm| heart_rate_element("MaximumHeartRateBpm", bpm)))
        .child(Element::leaf("Intensity", lap.intensity.as_str()))
        .child(Element::leaf("TriggerMethod", lap.trigger_method.as_str()))
        .children(
            lap.tracks
                .iter()
                .map(|track| Element::new("Track").children(track.trackpoints.iter().map(trackpoint_element))),
        )
}

fn trackpoint_element(point: &Trackpoint) -> Element {
    Element::new("Trackpoint")
        .child(Element::leaf("Time", format_time(point.time)))
        .child_opt(point.position.map(position_element))
        .child_opt(point.altitude.map(|m| Element::leaf("AltitudeMeters", m)))
        .child(Element::leaf("DistanceMeters", point.distance))
        .child_opt(point.heart_rate.map(|bpm| heart_rate_element("HeartRateBpm", bpm)))
        .child_opt(point.cadence.map(|cadence| {
            Element::new("Extensions").child(
                Element::new("TPX")
                    .attr("xmlns", TPX_NS)
                    .child(Element::leaf("RunCadence", cadence)),
            )
        }))
}

fn position_element(position: Position) -> Element {
    Element::new("Position")
        .child(Element::leaf("LatitudeDegrees", position.latitude))
        .child(Element::leaf("LongitudeDegrees", position.longitude))
}

fn heart_rate_element(name: &str, bpm: u32) -> Element {
    Element::new(name)
        .attr("xsi:type", "HeartRateInBeatsPerMinute_t")
        .child(Element::leaf("Value", bpm))
}

pub fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FMT).to_string()
}
