//! Output formats and how one is picked for a log

pub mod gpx;
pub mod tcx;

use crate::document::to_xml_string;
use crate::model::Activity;

/// The activity type exported with laps, as TCX.
pub const LAP_ACTIVITY_TYPE: &str = "Aerobics";

/// Sport written to TCX for [`LAP_ACTIVITY_TYPE`] activities.
pub const WORKOUT_SPORT: &str = "workout";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Garmin Training Center: laps, tracks, lap summaries
    Tcx,
    /// GPX 1.1: positioned trackpoints only
    Gpx,
}

impl OutputFormat {
    pub fn for_activity_type(activity_type: &str) -> Self {
        if activity_type == LAP_ACTIVITY_TYPE {
            OutputFormat::Tcx
        } else {
            OutputFormat::Gpx
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Tcx => "tcx",
            OutputFormat::Gpx => "gpx",
        }
    }

    /// Sport label written into the output for a given log activity type.
    pub fn sport_label(self, activity_type: &str) -> &str {
        match self {
            OutputFormat::Tcx if activity_type == LAP_ACTIVITY_TYPE => WORKOUT_SPORT,
            _ => activity_type,
        }
    }

    /// Render the whole document; the result is complete and well-formed.
    pub fn render(self, activity: &Activity) -> String {
        let root = match self {
            OutputFormat::Tcx => tcx::build(activity),
            OutputFormat::Gpx => gpx::build(activity),
        };
        to_xml_string(&root)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Format requested on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatChoice {
    /// Pick from the log's activity type
    #[default]
    Auto,
    Tcx,
    Gpx,
}

impl FormatChoice {
    pub fn resolve(self, activity_type: &str) -> OutputFormat {
        match self {
            FormatChoice::Auto => OutputFormat::for_activity_type(activity_type),
            FormatChoice::Tcx => OutputFormat::Tcx,
            FormatChoice::Gpx => OutputFormat::Gpx,
        }
    }
}
