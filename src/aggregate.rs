//! Sample stream → activity tree
//!
//! [`SampleAggregator`] walks the time-ordered samples of a log once and folds
//! them into laps of tracks of trackpoints:
//!
//! - periodic samples refresh the carried-forward distance, altitude, heart
//!   rate and cadence; before the first GPS fix they also emit a trackpoint,
//!   at most one per `min_point_spacing_secs`
//! - GPS fixes emit a trackpoint every time and switch off periodic emission
//!   for the rest of the activity
//! - lap markers close the current lap, depending on [`LapRule`]

use chrono::{Duration, NaiveDateTime};

use crate::ambit_log::{AmbitLog, GpsFix, LapMarker, PeriodicSample, Sample};
use crate::model::{Activity, Intensity, Lap, Position, Track, Trackpoint};

/// Which lap marker subtypes split the activity into laps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LapRule {
    /// Only `Interval` markers cut a lap.
    IntervalOnly,
    /// `Interval` and `Pause` cut a lap, `Start` restarts the current one.
    #[default]
    Extended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MarkerAction {
    Cut,
    Restart,
    Ignore,
}

impl LapRule {
    fn action(self, kind: &str) -> MarkerAction {
        if kind.contains("Interval") {
            return MarkerAction::Cut;
        }
        match self {
            LapRule::IntervalOnly => MarkerAction::Ignore,
            LapRule::Extended if kind.contains("Pause") => MarkerAction::Cut,
            LapRule::Extended if kind.contains("Start") => MarkerAction::Restart,
            LapRule::Extended => MarkerAction::Ignore,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub lap_rule: LapRule,
    /// Minimum spacing between trackpoints emitted from periodic samples.
    pub min_point_spacing_secs: i64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            lap_rule: LapRule::default(),
            min_point_spacing_secs: 5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub periodic: usize,
    pub gps_fixes: usize,
    pub lap_markers: usize,
    pub ignored_markers: usize,
    /// Trackpoints thrown away by a `Start` marker restart.
    pub discarded_points: usize,
    /// Periodic samples whose elapsed time cannot be placed on the calendar.
    pub out_of_range: usize,
    pub laps: usize,
    pub trackpoints: usize,
}

/// Values that persist from sample to sample until overwritten.
#[derive(Clone, Debug, Default)]
struct CarryForward {
    distance: f64,
    altitude: Option<f64>,
    heart_rate: Option<u32>,
    cadence: Option<u32>,
    position: Option<Position>,
}

pub struct SampleAggregator {
    config: AggregatorConfig,
    start: NaiveDateTime,
    activity: Activity,
    lap: Lap,
    track: Track,
    gps_available: bool,
    /// Elapsed whole seconds of the last periodic trackpoint in this lap.
    last_decimation_secs: Option<i64>,
    carry: CarryForward,
    stats: AggregateStats,
}

impl SampleAggregator {
    /// `start` is the log start time that periodic elapsed times are relative to.
    pub fn new(activity: Activity, start: NaiveDateTime, config: AggregatorConfig) -> Self {
        Self {
            config,
            start,
            activity,
            lap: Lap::new(),
            track: Track::new(),
            gps_available: false,
            last_decimation_secs: None,
            carry: CarryForward::default(),
            stats: AggregateStats::default(),
        }
    }

    pub fn push(&mut self, sample: &Sample) {
        match sample {
            Sample::Periodic(p) => self.on_periodic(p),
            Sample::GpsFix(g) => self.on_gps_fix(g),
            Sample::LapMarker(m) => self.on_lap_marker(m),
        }
    }

    /// Flush the trailing lap and hand back the finished tree.
    pub fn finish(mut self) -> (Activity, AggregateStats) {
        self.close_lap();
        self.stats.laps = self.activity.laps.len();
        self.stats.trackpoints = self.activity.trackpoint_count();
        (self.activity, self.stats)
    }

    fn on_periodic(&mut self, sample: &PeriodicSample) {
        self.stats.periodic += 1;

        if let Some(distance) = sample.distance {
            self.carry.distance = f64::from(distance);
        }
        if let Some(altitude) = sample.altitude {
            self.carry.altitude = Some(f64::from(altitude));
        }
        if sample.heart_rate.is_some() {
            self.carry.heart_rate = sample.heart_rate;
        }
        if sample.cadence.is_some() {
            self.carry.cadence = sample.cadence;
        }

        if self.gps_available {
            return;
        }

        let secs = (sample.time_ms / 1000) as i64;
        let due = match self.last_decimation_secs {
            None => true,
            Some(last) => secs - last >= self.config.min_point_spacing_secs,
        };
        if !due {
            return;
        }
        let Some(time) = Duration::try_seconds(secs).and_then(|offset| self.start.checked_add_signed(offset)) else {
            tracing::warn!(elapsed_ms = sample.time_ms, "periodic sample time out of range; skipping");
            self.stats.out_of_range += 1;
            return;
        };
        self.last_decimation_secs = Some(secs);
        self.emit(time);
    }

    fn on_gps_fix(&mut self, fix: &GpsFix) {
        self.stats.gps_fixes += 1;
        if !self.gps_available {
            tracing::debug!(elapsed_ms = fix.time_ms, "first GPS fix; periodic samples no longer emit points");
        }
        self.gps_available = true;
        self.carry.position = Some(Position {
            latitude: fix.latitude_degrees(),
            longitude: fix.longitude_degrees(),
        });
        self.emit(fix.utc);
    }

    fn on_lap_marker(&mut self, marker: &LapMarker) {
        self.stats.lap_markers += 1;
        let info = &marker.lap;

        match self.config.lap_rule.action(&info.kind) {
            MarkerAction::Ignore => {
                self.stats.ignored_markers += 1;
                tracing::debug!(kind = %info.kind, elapsed_ms = marker.time_ms, "lap marker ignored");
            }
            MarkerAction::Cut => {
                self.lap.total_time = Some(info.duration);
                self.lap.distance = f64::from(info.distance);
                if info.kind.contains("Low") {
                    self.lap.intensity = Intensity::Resting;
                }
                self.close_lap();
                self.begin_lap(info.date_time);
            }
            MarkerAction::Restart => {
                let discarded = self.lap.trackpoints().count() + self.track.trackpoints.len();
                if discarded > 0 {
                    tracing::debug!(discarded, kind = %info.kind, "lap restarted; dropping points recorded before it");
                }
                self.stats.discarded_points += discarded;
                self.begin_lap(info.date_time);
            }
        }
    }

    fn emit(&mut self, time: NaiveDateTime) {
        self.track.add_trackpoint(Trackpoint {
            time,
            distance: self.carry.distance,
            altitude: self.carry.altitude,
            position: self.carry.position,
            heart_rate: self.carry.heart_rate,
            cadence: self.carry.cadence,
        });
    }

    fn close_lap(&mut self) {
        let mut lap = std::mem::take(&mut self.lap);
        let track = std::mem::take(&mut self.track);
        if !track.is_empty() {
            lap.add_track(track);
        }
        lap.finalize();
        if lap.tracks.is_empty() {
            tracing::debug!("lap without trackpoints; not recorded");
        } else {
            self.activity.add_lap(lap);
        }
    }

    fn begin_lap(&mut self, start_time: NaiveDateTime) {
        self.last_decimation_secs = None;
        self.lap = Lap::starting_at(start_time);
        self.track = Track::new();
    }
}

/// Fold every sample of `log` into an [`Activity`] labelled with `sport`.
pub fn aggregate(log: &AmbitLog, sport: &str, config: &AggregatorConfig) -> (Activity, AggregateStats) {
    let header = &log.header;
    let activity = Activity::new(header.date_time, header.display_name(), sport);
    let mut aggregator = SampleAggregator::new(activity, header.date_time, config.clone());
    for sample in &log.samples {
        aggregator.push(sample);
    }
    aggregator.finish()
}
