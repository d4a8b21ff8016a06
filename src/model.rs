//! In-memory activity tree: Activity → Lap → Track → Trackpoint
//!
//! Ownership flows downwards only. Laps and tracks are built by the
//! aggregator and handed to their parent once complete; after that the only
//! mutation is [`Lap::finalize`], which fills in derived fields.

use chrono::NaiveDateTime;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trackpoint {
    pub time: NaiveDateTime,
    /// Cumulative distance in meters
    pub distance: f64,
    pub altitude: Option<f64>,
    pub position: Option<Position>,
    pub heart_rate: Option<u32>,
    pub cadence: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub trackpoints: Vec<Trackpoint>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trackpoint(&mut self, trackpoint: Trackpoint) {
        self.trackpoints.push(trackpoint);
    }

    pub fn is_empty(&self) -> bool {
        self.trackpoints.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Intensity {
    #[default]
    Active,
    Resting,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Active => "Active",
            Intensity::Resting => "Resting",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMethod {
    #[default]
    Manual,
}

impl TriggerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMethod::Manual => "Manual",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lap {
    pub start_time: Option<NaiveDateTime>,
    /// Seconds
    pub total_time: Option<u32>,
    /// Meters
    pub distance: f64,
    pub max_speed: f64,
    pub calories: u32,
    pub avg_heart_rate: Option<u32>,
    pub max_heart_rate: Option<u32>,
    pub intensity: Intensity,
    pub trigger_method: TriggerMethod,
    pub tracks: Vec<Track>,
}

impl Lap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start_time: NaiveDateTime) -> Self {
        Self {
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn trackpoints(&self) -> impl Iterator<Item = &Trackpoint> {
        self.tracks.iter().flat_map(|t| t.trackpoints.iter())
    }

    /// Fill in every derived field that was not set explicitly.
    ///
    /// The average heart rate is `max / count` over the collected samples,
    /// which is what existing exports of this converter contain.
    pub fn finalize(&mut self) {
        let first = self.tracks.first().and_then(|t| t.trackpoints.first()).map(|p| p.time);
        let last = self.tracks.last().and_then(|t| t.trackpoints.last()).map(|p| p.time);

        if self.start_time.is_none() {
            self.start_time = first;
        }

        if self.total_time.is_none()
            && let (Some(start), Some(end)) = (self.start_time, last)
        {
            let secs = (end - start).num_seconds().clamp(0, i64::from(u32::MAX));
            self.total_time = Some(secs as u32);
        }

        let heart_rates: Vec<u32> = self.trackpoints().filter_map(|p| p.heart_rate).collect();
        if self.max_heart_rate.is_none() {
            self.max_heart_rate = heart_rates.iter().copied().max();
        }
        if self.avg_heart_rate.is_none()
            && !heart_rates.is_empty()
            && let Some(max) = self.max_heart_rate
        {
            self.avg_heart_rate = Some(max / heart_rates.len() as u32);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    pub id: NaiveDateTime,
    pub name: String,
    pub sport: String,
    pub laps: Vec<Lap>,
}

impl Activity {
    pub fn new(id: NaiveDateTime, name: impl Into<String>, sport: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sport: sport.into(),
            laps: Vec::new(),
        }
    }

    pub fn add_lap(&mut self, lap: Lap) {
        self.laps.push(lap);
    }

    pub fn trackpoint_count(&self) -> usize {
        self.laps.iter().map(|l| l.trackpoints().count()).sum()
    }
}
