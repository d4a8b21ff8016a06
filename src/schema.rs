//! Schema command - Print the sample types understood and where they end up

use anyhow::Result;

use crate::ambit_log::Sample;
use crate::formats::{LAP_ACTIVITY_TYPE, OutputFormat, WORKOUT_SPORT};

/// Print recognized sample types with their effect, then the format selection rule
pub fn print_schema() -> Result<()> {
    println!("Recognized Openambit samples:");
    println!("---------------------------------------------------------------------------");

    let mappings = [
        (Sample::PERIODIC, "distance/altitude/HR/cadence; trackpoint every 5 s until first GPS fix"),
        (Sample::GPS_FIX, "position; trackpoint on every fix"),
        (Sample::LAP_MARKER, "Interval/Pause: close lap, Start: restart lap, other: ignored"),
    ];

    for (sample_type, effect) in mappings {
        println!("{:<12} → {}", sample_type, effect);
    }

    println!("\nOutput format by activity type:");
    println!("---------------------------------------------------------------------------");
    println!(
        "{:<12} → {} (Sport=\"{}\")",
        LAP_ACTIVITY_TYPE,
        OutputFormat::Tcx,
        WORKOUT_SPORT
    );
    println!("{:<12} → {}", "(any other)", OutputFormat::Gpx);

    Ok(())
}
