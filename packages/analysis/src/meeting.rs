//! Dual-vehicle meeting detection.
//!
//! Reclusters the union of both vehicles' sensors so area ids are
//! comparable, computes hybrid stays for each vehicle independently, and
//! flags every pair of stays that overlaps in time with centers close
//! enough to count as co-presence.

use plate_trace_analysis_models::{Meeting, MeetingConfig, StayPoint};
use plate_trace_ingest::SightingTable;
use plate_trace_spatial::{cluster_sensors, haversine_meters};

use crate::{minutes_between, stay::detect_hybrid_stays, tag_track};

/// Finds meetings between two vehicles.
///
/// Symmetric up to stay-kind labels: swapping the vehicles swaps `kind_a`
/// and `kind_b` but yields the same windows and distances. Sorted by
/// meeting start time.
#[must_use]
pub fn analyze_meetings(
    table: &SightingTable,
    vehicle_a: &str,
    vehicle_b: &str,
    config: &MeetingConfig,
) -> Vec<Meeting> {
    let track_a = table.track_for(vehicle_a);
    let track_b = table.track_for(vehicle_b);

    if track_a.len() < 2 || track_b.len() < 2 {
        log::info!(
            "Meeting analysis needs at least 2 sightings per vehicle \
             ({vehicle_a}: {}, {vehicle_b}: {})",
            track_a.len(),
            track_b.len()
        );
        return Vec::new();
    }

    // Joint clustering keeps area ids comparable between the two tracks.
    let sensors = table.sensors_for_tracks(&[&track_a, &track_b]);
    let clustering = cluster_sensors(&sensors, config.cluster_radius_meters);

    let stays_a = detect_hybrid_stays(&tag_track(&track_a, &clustering), &config.stay);
    let stays_b = detect_hybrid_stays(&tag_track(&track_b, &clustering), &config.stay);
    log::debug!(
        "{vehicle_a}: {} stays, {vehicle_b}: {} stays",
        stays_a.len(),
        stays_b.len()
    );

    let mut meetings = Vec::new();
    for stay_a in &stays_a {
        for stay_b in &stays_b {
            if let Some(meeting) = match_pair(stay_a, stay_b, config) {
                meetings.push(meeting);
            }
        }
    }

    meetings.sort_by_key(|m| m.start_time);
    meetings
}

/// Tests one stay pair for temporal overlap and physical closeness.
fn match_pair(stay_a: &StayPoint, stay_b: &StayPoint, config: &MeetingConfig) -> Option<Meeting> {
    let overlap_start = stay_a.start_time.max(stay_b.start_time);
    let overlap_end = stay_a.end_time.min(stay_b.end_time);
    if overlap_start >= overlap_end {
        return None;
    }

    let distance_meters = haversine_meters(
        stay_a.center_lon,
        stay_a.center_lat,
        stay_b.center_lon,
        stay_b.center_lat,
    );
    if distance_meters > config.meeting_distance_meters {
        return None;
    }

    let hint_a = stay_a.kind.area_hint();
    let hint_b = stay_b.kind.area_hint();
    let cross_area = matches!((hint_a, hint_b), (Some(a), Some(b)) if a != b);
    let location_desc = if cross_area {
        format!(
            "boundary between {} and {}",
            hint_a.unwrap_or("unknown"),
            hint_b.unwrap_or("unknown")
        )
    } else {
        stay_a.location_desc.clone()
    };

    Some(Meeting {
        start_time: overlap_start,
        end_time: overlap_end,
        duration_minutes: minutes_between(overlap_start, overlap_end),
        distance_meters,
        location_desc,
        kind_a: stay_a.kind.tag(),
        kind_b: stay_b.kind.tag(),
        cross_area,
    })
}

#[cfg(test)]
mod tests {
    use plate_trace_analysis_models::StayKindTag;
    use plate_trace_ingest::SightingTable;

    use crate::testutil::{at, sighting};

    use super::*;

    /// Both vehicles linger at the same sensor across an overlapping
    /// window, each with a slow 40-minute gap (gap stays).
    fn co_located_table() -> SightingTable {
        SightingTable::new(vec![
            sighting("CAR-A", "CAM-1", 121.5000, 25.0000, at(8, 0)),
            sighting("CAR-A", "CAM-1", 121.5000, 25.0000, at(8, 40)),
            sighting("CAR-B", "CAM-2", 121.5001, 25.0000, at(8, 10)),
            sighting("CAR-B", "CAM-2", 121.5001, 25.0000, at(8, 50)),
        ])
    }

    #[test]
    fn overlapping_nearby_stays_become_a_meeting() {
        let table = co_located_table();
        let meetings = analyze_meetings(&table, "CAR-A", "CAR-B", &MeetingConfig::default());

        assert_eq!(meetings.len(), 1);
        let m = &meetings[0];
        assert_eq!(m.start_time, at(8, 10));
        assert_eq!(m.end_time, at(8, 40));
        assert!((m.duration_minutes - 30.0).abs() < 1e-9);
        assert!(m.distance_meters < 80.0);
        assert_eq!(m.kind_a, StayKindTag::Gap);
        assert_eq!(m.kind_b, StayKindTag::Gap);
        // CAM-1 and CAM-2 are ~10 m apart: clustered into one area.
        assert!(!m.cross_area);
    }

    #[test]
    fn swapping_vehicles_gives_the_same_window_and_distance() {
        let table = co_located_table();
        let ab = analyze_meetings(&table, "CAR-A", "CAR-B", &MeetingConfig::default());
        let ba = analyze_meetings(&table, "CAR-B", "CAR-A", &MeetingConfig::default());

        assert_eq!(ab.len(), ba.len());
        assert_eq!(ab[0].start_time, ba[0].start_time);
        assert_eq!(ab[0].end_time, ba[0].end_time);
        assert!((ab[0].distance_meters - ba[0].distance_meters).abs() < 1e-9);
    }

    #[test]
    fn distant_stays_do_not_meet() {
        // Same windows, but CAR-B is ~1.1 km away.
        let table = SightingTable::new(vec![
            sighting("CAR-A", "CAM-1", 121.50, 25.00, at(8, 0)),
            sighting("CAR-A", "CAM-1", 121.50, 25.00, at(8, 40)),
            sighting("CAR-B", "CAM-9", 121.51, 25.00, at(8, 10)),
            sighting("CAR-B", "CAM-9", 121.51, 25.00, at(8, 50)),
        ]);
        let meetings = analyze_meetings(&table, "CAR-A", "CAR-B", &MeetingConfig::default());
        assert!(meetings.is_empty());
    }

    #[test]
    fn disjoint_windows_do_not_meet() {
        let table = SightingTable::new(vec![
            sighting("CAR-A", "CAM-1", 121.50, 25.00, at(8, 0)),
            sighting("CAR-A", "CAM-1", 121.50, 25.00, at(8, 40)),
            sighting("CAR-B", "CAM-1", 121.50, 25.00, at(9, 0)),
            sighting("CAR-B", "CAM-1", 121.50, 25.00, at(9, 40)),
        ]);
        let meetings = analyze_meetings(&table, "CAR-A", "CAR-B", &MeetingConfig::default());
        assert!(meetings.is_empty());
    }

    #[test]
    fn single_sighting_vehicle_yields_nothing() {
        let table = SightingTable::new(vec![
            sighting("CAR-A", "CAM-1", 121.50, 25.00, at(8, 0)),
            sighting("CAR-B", "CAM-1", 121.50, 25.00, at(8, 10)),
            sighting("CAR-B", "CAM-1", 121.50, 25.00, at(8, 50)),
        ]);
        let meetings = analyze_meetings(&table, "CAR-A", "CAR-B", &MeetingConfig::default());
        assert!(meetings.is_empty());
    }
}
