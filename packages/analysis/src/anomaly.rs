//! Anomaly detection over segmented trips and confirmed patterns.
//!
//! Two independent checks: trips whose signature never became regular
//! (path rarity), and trips inside a regular pattern whose duration
//! breaks the IQR upper bound (duration outliers).

use std::collections::HashSet;

use plate_trace_analysis_models::{
    AnomalyReport, DurationOutlier, InfrequentTrip, Pattern, Trip, TripSignature,
};

use crate::stats;

/// Minimum samples a pattern needs before the IQR rule is meaningful.
const MIN_IQR_SAMPLES: usize = 4;

/// Flags infrequent-path trips and duration outliers.
///
/// Infrequent trips are reported individually, in trip order, never
/// aggregated. Duration outliers are computed per regular pattern with at
/// least [`MIN_IQR_SAMPLES`] member trips, against
/// `Q3 + 1.5 * (Q3 - Q1)` with linear-interpolated quantiles.
#[must_use]
pub fn detect_anomalies(trips: &[Trip], regular_patterns: &[Pattern]) -> AnomalyReport {
    if trips.is_empty() {
        return AnomalyReport::default();
    }

    let regular: HashSet<&TripSignature> =
        regular_patterns.iter().map(|p| &p.signature).collect();

    let infrequent_patterns: Vec<InfrequentTrip> = trips
        .iter()
        .filter(|t| !regular.contains(&t.signature()))
        .map(|t| InfrequentTrip {
            start_time: t.start_time,
            end_time: t.end_time,
            start_area_id: t.start_area_id.clone(),
            end_area_id: t.end_area_id.clone(),
            duration_minutes: t.duration_minutes,
            signature: t.signature(),
        })
        .collect();

    let mut duration_outliers = Vec::new();
    for pattern in regular_patterns {
        let members: Vec<&Trip> = trips
            .iter()
            .filter(|t| t.signature() == pattern.signature)
            .collect();
        if members.len() < MIN_IQR_SAMPLES {
            continue;
        }

        let mut durations: Vec<f64> = members.iter().map(|t| t.duration_minutes).collect();
        durations.sort_by(f64::total_cmp);

        let q1 = stats::quantile(&durations, 0.25);
        let q3 = stats::quantile(&durations, 0.75);
        let upper_bound = q3 + 1.5 * (q3 - q1);
        let median = stats::median(&durations);

        for trip in members {
            if trip.duration_minutes > upper_bound {
                duration_outliers.push(DurationOutlier {
                    start_time: trip.start_time,
                    end_time: trip.end_time,
                    pattern_signature: pattern.signature.clone(),
                    actual_duration_minutes: trip.duration_minutes,
                    median_duration_minutes: median,
                });
            }
        }
    }

    let report = AnomalyReport {
        infrequent_patterns,
        duration_outliers,
    };
    if !report.is_empty() {
        log::debug!(
            "Anomalies: {} infrequent trips, {} duration outliers",
            report.infrequent_patterns.len(),
            report.duration_outliers.len()
        );
    }
    report
}
