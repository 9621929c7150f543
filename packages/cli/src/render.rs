//! Console rendering of analysis results.

use console::style;
use plate_trace_analysis_models::{ConvoyConfig, ConvoyReport, Meeting};
use plate_trace_analysis::convoy::describe_lag;
use plate_trace_report::ReportOutcome;

/// Prints the outcome of the report pipeline.
pub fn print_report_outcome(outcome: &ReportOutcome) {
    match outcome {
        ReportOutcome::Complete(report) => {
            println!();
            println!("{}", style("## Final analysis report").bold());
            println!("{}", "#".repeat(70));
            println!("{}", report.final_report);
        }
        ReportOutcome::Insufficient { stage, message } => {
            println!();
            println!(
                "{} {message}",
                style(format!("Analysis stopped at {stage}:")).yellow()
            );
        }
    }
}

/// Prints the convoy analysis report.
pub fn print_convoy(vehicle: &str, report: &ConvoyReport, config: &ConvoyConfig) {
    if report.trips.is_empty() {
        println!(
            "No trips of {vehicle} were followed for at least {} locations.",
            config.min_segment_points
        );
        return;
    }

    println!();
    println!(
        "{}",
        style(format!(
            "## Top {} trips of {vehicle} by longest convoy segment",
            report.trips.len()
        ))
        .bold()
    );

    for (i, trip_report) in report.trips.iter().enumerate() {
        let trip = &trip_report.trip;
        println!();
        println!("{}", "=".repeat(70));
        println!(
            "Trip {}: {} -> {} ({} locations, {:.1} minutes)",
            i + 1,
            trip.start_time.format("%Y-%m-%d %H:%M"),
            trip.end_time.format("%H:%M"),
            trip.point_count,
            trip.duration_minutes
        );
        println!(
            "  from {} ({}) to {} ({})",
            trip.start_location_name, trip.start_area_id, trip.end_location_name, trip.end_area_id
        );

        for (j, partner) in trip_report.partners.iter().enumerate() {
            println!();
            println!("  [companion #{}] {}", j + 1, style(&partner.vehicle_id).bold());
            println!(
                "  - following: {:.1}% ({}/{} locations), {}",
                partner.following_ratio * 100.0,
                partner.point_count(),
                trip.point_count,
                partner.extent
            );
            println!(
                "  - position: {} -> {}, avg time lag: {}",
                partner.start_position,
                partner.end_position,
                describe_lag(partner.avg_lag_seconds)
            );
            if let (Some(first), Some(last)) = (partner.events.first(), partner.events.last()) {
                println!(
                    "  - span: {} -> {} ({} to {})",
                    first.partner_time.format("%H:%M:%S"),
                    last.partner_time.format("%H:%M:%S"),
                    first.sensor_id,
                    last.sensor_id
                );
            }
        }
    }
}

/// Prints dual-vehicle meeting results.
pub fn print_meetings(vehicle_a: &str, vehicle_b: &str, meetings: &[Meeting]) {
    if meetings.is_empty() {
        println!("No meetings or shared stays found between {vehicle_a} and {vehicle_b}.");
        return;
    }

    println!();
    println!(
        "{}",
        style(format!(
            "## {} meeting(s) between {vehicle_a} and {vehicle_b}",
            meetings.len()
        ))
        .bold()
    );

    for (i, meeting) in meetings.iter().enumerate() {
        println!();
        println!(
            "{}. [{}] {:.1} minutes",
            i + 1,
            meeting.start_time.format("%Y-%m-%d %H:%M"),
            meeting.duration_minutes
        );
        println!(
            "   - location: {} ({:.1} m apart)",
            meeting.location_desc, meeting.distance_meters
        );
        println!(
            "   - stay kinds: {} / {}",
            meeting.kind_a, meeting.kind_b
        );
        if meeting.cross_area {
            println!("   - note: cross-area boundary meeting");
        }
    }
}
