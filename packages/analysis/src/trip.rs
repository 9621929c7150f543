//! Trip segmentation by sighting time gaps.

use plate_trace_analysis_models::{Trip, TripConfig};

use crate::{TaggedSighting, minutes_between};

/// Splits a tagged track into trips.
///
/// A breakpoint falls wherever the gap between consecutive sightings
/// exceeds `gap_threshold_minutes`; the runs between breakpoints become
/// trips. Runs of a single sighting are dropped (a trip needs a start and
/// an end), so the sum of trip point counts plus dropped singles always
/// equals the track length.
#[must_use]
pub fn segment_trips(tagged: &[TaggedSighting], config: &TripConfig) -> Vec<Trip> {
    let mut trips = Vec::new();

    let mut group_start = 0usize;
    for i in 0..=tagged.len() {
        let breakpoint = i == tagged.len()
            || (i > 0
                && minutes_between(
                    tagged[i - 1].sighting.timestamp,
                    tagged[i].sighting.timestamp,
                ) > config.gap_threshold_minutes);
        if !breakpoint {
            continue;
        }

        let group = &tagged[group_start..i];
        if group.len() > 1 {
            trips.push(trip_from_group(group));
        }
        group_start = i;
    }

    if trips.is_empty() {
        log::debug!("No trips segmentable from {} sightings", tagged.len());
    }
    trips
}

fn trip_from_group(group: &[TaggedSighting]) -> Trip {
    let first = &group[0];
    let last = &group[group.len() - 1];

    Trip {
        start_time: first.sighting.timestamp,
        end_time: last.sighting.timestamp,
        duration_minutes: minutes_between(first.sighting.timestamp, last.sighting.timestamp),
        start_area_id: first.area_id.clone().unwrap_or_else(|| "unknown".to_string()),
        end_area_id: last.area_id.clone().unwrap_or_else(|| "unknown".to_string()),
        start_location_name: first.sighting.sensor_name.clone(),
        end_location_name: last.sighting.sensor_name.clone(),
        path: group.iter().map(|t| t.sighting.sensor_name.clone()).collect(),
        point_count: group.len(),
    }
}
