use std::fs;

use ambit2x::formats::OutputFormat;
use ambit2x::model::Activity;
use ambit2x::validate::read_output;
use ambit2x::{AggregatorConfig, aggregate, parse_log};
use pretty_assertions::assert_eq;

fn load(path: &str) -> (Activity, OutputFormat) {
    let text = fs::read_to_string(path).unwrap();
    let log = parse_log(&text).unwrap();
    let format = OutputFormat::for_activity_type(&log.header.activity_type_name);
    let (activity, _) = aggregate(&log, format.sport_label(&log.header.activity_type_name), &AggregatorConfig::default());
    (activity, format)
}

#[test]
fn tcx_keeps_lap_structure_and_points() {
    let (activity, format) = load("tests/data/aerobics.log");
    assert_eq!(format, OutputFormat::Tcx);

    let document = read_output(&format.render(&activity)).unwrap();
    assert!(document.problems().is_empty(), "{:?}", document.problems());
    assert_eq!(document.laps.len(), activity.laps.len());

    for (written, lap) in document.laps.iter().zip(&activity.laps) {
        assert_eq!(written.len(), lap.tracks.len());
    }

    let expected: Vec<_> = activity
        .laps
        .iter()
        .flat_map(|lap| lap.trackpoints())
        .map(|p| (p.time, Some(p.distance), p.position))
        .collect();
    let actual: Vec<_> = document.trackpoints().map(|p| (p.time, p.distance, p.position)).collect();
    assert_eq!(actual, expected);
}

#[test]
fn gpx_keeps_positioned_points_in_order() {
    let (activity, format) = load("tests/data/running.log");
    assert_eq!(format, OutputFormat::Gpx);

    let document = read_output(&format.render(&activity)).unwrap();
    assert!(document.problems().is_empty(), "{:?}", document.problems());

    let expected: Vec<_> = activity
        .laps
        .iter()
        .flat_map(|lap| lap.trackpoints())
        .filter(|p| p.position.is_some())
        .map(|p| (p.time, Some(p.distance), p.position))
        .collect();
    let actual: Vec<_> = document.trackpoints().map(|p| (p.time, p.distance, p.position)).collect();
    assert_eq!(actual.len(), 6);
    assert_eq!(actual, expected);
}

#[test]
fn fixtures_aggregate_as_recorded() {
    let (aerobics, _) = load("tests/data/aerobics.log");
    let seconds: Vec<Vec<i64>> = aerobics
        .laps
        .iter()
        .map(|lap| lap.trackpoints().map(|p| (p.time - aerobics.id).num_seconds()).collect())
        .collect();
    assert_eq!(seconds, vec![vec![0, 5], vec![7, 12]]);
    assert_eq!(aerobics.laps[0].max_heart_rate, Some(125));

    let (running, _) = load("tests/data/running.log");
    let counts: Vec<usize> = running.laps.iter().map(|lap| lap.trackpoints().count()).collect();
    assert_eq!(counts, vec![5, 2]);
    assert!(running.laps[0].trackpoints().next().unwrap().position.is_none());
}
