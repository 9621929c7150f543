//! Renders the structured analysis into the summary text handed to the
//! narrative provider.
//!
//! Every location is written as `name (area-id)` so the anonymizer can
//! swap names for codes without touching the surrounding prose.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use plate_trace_analysis_models::{
    AnalysisSummary, AnomalyReport, InfrequentTrip, StayPatternKind,
};

/// Resolves an area id to its display name.
fn area_name<'a>(area_names: &'a BTreeMap<String, String>, area_id: &str) -> &'a str {
    area_names.get(area_id).map_or("unknown location", |n| n)
}

/// Formats the full analysis summary as prompt-ready text.
#[must_use]
pub fn format_summary(
    vehicle_id: &str,
    analysis: &AnalysisSummary,
    anomalies: &AnomalyReport,
    area_names: &BTreeMap<String, String>,
) -> String {
    let mut text = String::new();

    let _ = writeln!(
        text,
        "Activity analysis summary for vehicle {vehicle_id}.\n"
    );

    write_stay_section(&mut text, analysis, area_names);
    write_pattern_section(&mut text, analysis, area_names);
    write_infrequent_section(&mut text, anomalies, area_names);
    write_duration_section(&mut text, analysis, anomalies, area_names);

    text
}

fn write_stay_section(
    text: &mut String,
    analysis: &AnalysisSummary,
    area_names: &BTreeMap<String, String>,
) {
    let _ = writeln!(text, "[Key stay locations]");
    if analysis.stay_stats.is_empty() {
        let _ = writeln!(text, "- no prolonged stays observed");
    }
    for stats in &analysis.stay_stats {
        let _ = write!(
            text,
            "- {} ({}): {} visits, {:.1} hours total",
            stats.name,
            stats.area_id,
            stats.visit_count,
            stats.total_duration_minutes / 60.0
        );
        match stats.pattern_kind {
            StayPatternKind::MultipleStays => {
                let _ = writeln!(
                    text,
                    ", typically {} to {}, durations {:.1}-{:.1} h",
                    stats.avg_arrival,
                    stats.avg_departure,
                    stats.min_duration_minutes / 60.0,
                    stats.max_duration_minutes / 60.0
                );
            }
            StayPatternKind::SingleLongStay => {
                let _ = writeln!(text, ", single long stay");
            }
        }
    }

    if let Some(primary) = &analysis.base_info.primary {
        let _ = writeln!(
            text,
            "- primary base: {} ({}), {} long stays",
            primary.name, primary.area_id, primary.long_stay_count
        );
    }
    for secondary in &analysis.base_info.secondary {
        let _ = writeln!(
            text,
            "- secondary base: {} ({}), {} long stays",
            secondary.name, secondary.area_id, secondary.long_stay_count
        );
    }
    let _ = writeln!(text);
}

fn write_pattern_section(
    text: &mut String,
    analysis: &AnalysisSummary,
    area_names: &BTreeMap<String, String>,
) {
    let _ = writeln!(text, "[Confirmed regular patterns]");
    if analysis.regular_patterns.is_empty() {
        let _ = writeln!(text, "- none");
    }
    for (i, pattern) in analysis.regular_patterns.iter().enumerate() {
        let label = pattern_label(i);
        let _ = writeln!(
            text,
            "- pattern {label}: from {} ({}) to {} ({}), {} {}: {} occurrences over {} days, \
             usually {}~{}, average {:.1} minutes",
            area_name(area_names, &pattern.signature.start_area_id),
            pattern.signature.start_area_id,
            area_name(area_names, &pattern.signature.end_area_id),
            pattern.signature.end_area_id,
            pattern.signature.day_type,
            pattern.signature.time_slot,
            pattern.occurrence_count,
            pattern.occurrence_days,
            pattern.avg_start_time,
            pattern.avg_end_time,
            pattern.avg_duration_minutes
        );
    }
    let _ = writeln!(text);
}

fn write_infrequent_section(
    text: &mut String,
    anomalies: &AnomalyReport,
    area_names: &BTreeMap<String, String>,
) {
    let _ = writeln!(text, "[Infrequent routes (below the regular threshold)]");
    if anomalies.infrequent_patterns.is_empty() {
        let _ = writeln!(text, "- none");
        let _ = writeln!(text);
        return;
    }

    // Group one-off trips by signature for readable aggregation.
    let mut groups: BTreeMap<String, Vec<&InfrequentTrip>> = BTreeMap::new();
    for trip in &anomalies.infrequent_patterns {
        groups
            .entry(trip.signature.to_string())
            .or_default()
            .push(trip);
    }

    for group in groups.values() {
        let first = group[0];
        #[allow(clippy::cast_precision_loss)]
        let avg_duration = group
            .iter()
            .map(|t| t.duration_minutes)
            .sum::<f64>()
            / group.len() as f64;
        let _ = writeln!(
            text,
            "- from {} ({}) to {} ({}): {} occurrence(s), average {avg_duration:.1} minutes",
            area_name(area_names, &first.start_area_id),
            first.start_area_id,
            area_name(area_names, &first.end_area_id),
            first.end_area_id,
            group.len()
        );
        for trip in group {
            let _ = writeln!(
                text,
                "  - {} to {}",
                trip.start_time.format("%Y-%m-%d %H:%M"),
                trip.end_time.format("%Y-%m-%d %H:%M")
            );
        }
    }
    let _ = writeln!(text);
}

fn write_duration_section(
    text: &mut String,
    analysis: &AnalysisSummary,
    anomalies: &AnomalyReport,
    area_names: &BTreeMap<String, String>,
) {
    let _ = writeln!(text, "[Duration anomalies within regular patterns]");
    if anomalies.duration_outliers.is_empty() {
        let _ = writeln!(text, "- none");
        return;
    }

    for outlier in &anomalies.duration_outliers {
        let label = analysis
            .regular_patterns
            .iter()
            .position(|p| p.signature == outlier.pattern_signature)
            .map_or_else(|| "?".to_string(), pattern_label);
        let exceeded = outlier.actual_duration_minutes - outlier.median_duration_minutes;
        let _ = writeln!(
            text,
            "- {} to {}, on pattern {label} (from {} to {}): took {:.1} minutes, \
             {exceeded:.1} minutes over the median of {:.1}",
            outlier.start_time.format("%Y-%m-%d %H:%M"),
            outlier.end_time.format("%Y-%m-%d %H:%M"),
            area_name(area_names, &outlier.pattern_signature.start_area_id),
            area_name(area_names, &outlier.pattern_signature.end_area_id),
            outlier.actual_duration_minutes,
            outlier.median_duration_minutes
        );
    }
}

/// Letters the patterns A, B, C... past Z it degrades to numbers.
fn pattern_label(index: usize) -> String {
    if index < 26 {
        #[allow(clippy::cast_possible_truncation)]
        let letter = (b'A' + index as u8) as char;
        letter.to_string()
    } else {
        format!("#{}", index + 1)
    }
}
