//! Stay-point detection.
//!
//! Two variants share the [`StayConfig`] thresholds:
//!
//! * [`detect_area_stays`]: the simple detector used by the report
//!   pipeline: contiguous same-area runs whose span reaches the time
//!   threshold become explicit stays.
//! * [`detect_hybrid_stays`]: the meeting-analysis detector; in addition
//!   to explicit stays it tests every large sighting gap for a low
//!   implied travel speed, emitting a gap stay when the vehicle cannot
//!   have gone far.
//!
//! Explicit and gap stays are independent outputs; they are never merged
//! even when their windows overlap.

use plate_trace_analysis_models::{StayConfig, StayKind, StayPoint};
use plate_trace_spatial::haversine_meters;

use crate::{TaggedSighting, minutes_between, stats};

/// Detects explicit stays from contiguous same-area sighting runs.
///
/// Sightings whose sensor has no area assignment break runs and never
/// contribute a stay. Returns stays in track order; an empty result means
/// the vehicle never dwelled anywhere long enough.
#[must_use]
pub fn detect_area_stays(tagged: &[TaggedSighting], config: &StayConfig) -> Vec<StayPoint> {
    let mut stays = Vec::new();

    let mut run_start = 0usize;
    for i in 0..=tagged.len() {
        let run_ended = i == tagged.len()
            || tagged[i].area_id.is_none()
            || tagged[i].area_id != tagged[run_start].area_id;
        if !run_ended {
            continue;
        }

        if run_start < i && tagged[run_start].area_id.is_some() {
            if let Some(stay) = explicit_stay(&tagged[run_start..i], config, false) {
                stays.push(stay);
            }
        }

        // A run of unassigned sightings is skipped one row at a time.
        run_start = if i < tagged.len() && tagged[i].area_id.is_none() {
            i + 1
        } else {
            i
        };
    }

    if stays.is_empty() {
        log::debug!("No explicit stays found over {} sightings", tagged.len());
    }
    stays
}

/// Detects stays with the hybrid two-phase rule.
///
/// Scans adjacent sighting pairs keeping a current segment of
/// closely-spaced sightings. A gap of at least `time_threshold_minutes`
/// closes the segment (emitting an explicit stay when its span reaches
/// the threshold) and is then tested on its own: when the straight-line
/// speed implied by the gap stays below `gap_speed_threshold_kph`, the
/// vehicle is considered stationary over the gap and a gap stay is
/// emitted. Fewer than two sightings produce no stays.
#[must_use]
pub fn detect_hybrid_stays(tagged: &[TaggedSighting], config: &StayConfig) -> Vec<StayPoint> {
    let mut stays = Vec::new();

    if tagged.len() < 2 {
        log::debug!(
            "Hybrid stay detection needs at least 2 sightings, got {}",
            tagged.len()
        );
        return stays;
    }

    let mut segment_start = 0usize;

    for i in 0..tagged.len() - 1 {
        let curr = &tagged[i];
        let next = &tagged[i + 1];
        let gap_minutes = minutes_between(curr.sighting.timestamp, next.sighting.timestamp);

        if gap_minutes < config.time_threshold_minutes {
            continue;
        }

        if let Some(stay) = explicit_stay(&tagged[segment_start..=i], config, true) {
            stays.push(stay);
        }

        if let Some(stay) = gap_stay(curr, next, gap_minutes, config) {
            stays.push(stay);
        }

        segment_start = i + 1;
    }

    if let Some(stay) = explicit_stay(&tagged[segment_start..], config, true) {
        stays.push(stay);
    }

    stays
}

/// Builds an explicit stay from a segment when it spans long enough.
///
/// The simple detector labels stays with the seeding sensor's display
/// name; the hybrid detector uses the area id, matching the meeting
/// report wording.
fn explicit_stay(
    segment: &[TaggedSighting],
    config: &StayConfig,
    hybrid_label: bool,
) -> Option<StayPoint> {
    if segment.len() < 2 {
        return None;
    }

    let start = segment[0].sighting.timestamp;
    let end = segment[segment.len() - 1].sighting.timestamp;
    let duration = minutes_between(start, end);
    if duration < config.time_threshold_minutes {
        return None;
    }

    let lats: Vec<f64> = segment.iter().map(|t| t.sighting.latitude).collect();
    let lons: Vec<f64> = segment.iter().map(|t| t.sighting.longitude).collect();

    let area_id = segment[0].area_id.clone();
    let location_desc = if hybrid_label {
        format!(
            "{} (continuous activity)",
            area_id.as_deref().unwrap_or("unknown")
        )
    } else {
        segment[0].sighting.sensor_name.clone()
    };

    Some(StayPoint {
        kind: StayKind::Explicit { area_id },
        start_time: start,
        end_time: end,
        duration_minutes: duration,
        center_lat: stats::mean(&lats),
        center_lon: stats::mean(&lons),
        location_desc,
    })
}

/// Tests a sighting gap for the implied-speed stay rule.
fn gap_stay(
    curr: &TaggedSighting,
    next: &TaggedSighting,
    gap_minutes: f64,
    config: &StayConfig,
) -> Option<StayPoint> {
    let distance_km = haversine_meters(
        curr.sighting.longitude,
        curr.sighting.latitude,
        next.sighting.longitude,
        next.sighting.latitude,
    ) / 1000.0;
    let implied_speed_kph = distance_km / (gap_minutes / 60.0);

    if implied_speed_kph >= config.gap_speed_threshold_kph {
        return None;
    }

    let from = curr.area_id.as_deref().unwrap_or("unknown");
    let to = next.area_id.as_deref().unwrap_or("unknown");
    let location_desc = if from == to {
        format!("{from} (stationary)")
    } else {
        format!("interval stay between {from} and {to}")
    };

    Some(StayPoint {
        kind: StayKind::Gap {
            from_area: curr.area_id.clone(),
            to_area: next.area_id.clone(),
            implied_speed_kph,
        },
        start_time: curr.sighting.timestamp,
        end_time: next.sighting.timestamp,
        duration_minutes: gap_minutes,
        center_lat: (curr.sighting.latitude + next.sighting.latitude) / 2.0,
        center_lon: (curr.sighting.longitude + next.sighting.longitude) / 2.0,
        location_desc,
    })
}

#[cfg(test)]
mod tests {
    use plate_trace_analysis_models::StayKindTag;

    use crate::testutil::{at, sighting};

    use super::*;

    fn tagged(sensor: &str, area: Option<&str>, lon: f64, lat: f64, h: u32, m: u32) -> TaggedSighting {
        TaggedSighting {
            sighting: sighting("V-1", sensor, lon, lat, at(h, m)),
            area_id: area.map(String::from),
        }
    }

    #[test]
    fn area_run_reaching_threshold_becomes_stay() {
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-2", Some("Area-000"), 121.50, 25.00, 8, 10),
            tagged("CAM-3", Some("Area-000"), 121.50, 25.00, 8, 25),
            tagged("CAM-4", Some("Area-001"), 121.60, 25.10, 9, 0),
        ];
        let stays = detect_area_stays(&track, &StayConfig::default());

        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].kind.area_hint(), Some("Area-000"));
        assert!((stays[0].duration_minutes - 25.0).abs() < 1e-9);
        assert_eq!(stays[0].location_desc, "CAM-1 name");
    }

    #[test]
    fn short_runs_do_not_qualify() {
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-2", Some("Area-000"), 121.50, 25.00, 8, 5),
        ];
        assert!(detect_area_stays(&track, &StayConfig::default()).is_empty());
    }

    #[test]
    fn lowering_the_threshold_never_loses_stays() {
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-2", Some("Area-000"), 121.50, 25.00, 8, 12),
            tagged("CAM-3", Some("Area-001"), 121.60, 25.10, 9, 0),
            tagged("CAM-4", Some("Area-001"), 121.60, 25.10, 9, 30),
        ];

        let strict = StayConfig {
            time_threshold_minutes: 20.0,
            ..StayConfig::default()
        };
        let loose = StayConfig {
            time_threshold_minutes: 10.0,
            ..StayConfig::default()
        };

        let strict_count = detect_area_stays(&track, &strict).len();
        let loose_count = detect_area_stays(&track, &loose).len();
        assert!(loose_count >= strict_count);
        assert_eq!(strict_count, 1);
        assert_eq!(loose_count, 2);
    }

    #[test]
    fn low_speed_gap_becomes_gap_stay() {
        // Two sightings at the same area, 60 minutes apart, ~essentially
        // zero distance: implied speed is far below 10 km/h.
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 9, 0),
        ];
        let stays = detect_hybrid_stays(&track, &StayConfig::default());

        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].kind.tag(), StayKindTag::Gap);
        assert!((stays[0].duration_minutes - 60.0).abs() < 1e-9);
        assert_eq!(stays[0].location_desc, "Area-000 (stationary)");
    }

    #[test]
    fn fast_gap_is_not_a_stay() {
        // ~22 km in 30 minutes is ~44 km/h: travel, not a stay.
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-2", Some("Area-005"), 121.50, 25.20, 8, 30),
        ];
        assert!(detect_hybrid_stays(&track, &StayConfig::default()).is_empty());
    }

    #[test]
    fn cross_area_gap_is_labeled_interval_stay() {
        // 60 m apart over 40 minutes: implied speed ~0.09 km/h.
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.5000, 25.0000, 8, 0),
            tagged("CAM-2", Some("Area-001"), 121.5000, 25.0005, 8, 40),
        ];
        let stays = detect_hybrid_stays(&track, &StayConfig::default());

        assert_eq!(stays.len(), 1);
        assert_eq!(
            stays[0].location_desc,
            "interval stay between Area-000 and Area-001"
        );
        match &stays[0].kind {
            StayKind::Gap {
                implied_speed_kph, ..
            } => assert!(*implied_speed_kph < 1.0),
            StayKind::Explicit { .. } => panic!("expected gap stay"),
        }
    }

    #[test]
    fn segment_before_gap_is_flushed_as_explicit_stay() {
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-2", Some("Area-000"), 121.50, 25.00, 8, 10),
            tagged("CAM-3", Some("Area-000"), 121.50, 25.00, 8, 25),
            // Far away and much later: closes the segment, gap too fast
            // to be a stay on its own.
            tagged("CAM-9", Some("Area-007"), 121.50, 25.40, 9, 10),
        ];
        let stays = detect_hybrid_stays(&track, &StayConfig::default());

        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].kind.tag(), StayKindTag::Explicit);
        assert_eq!(stays[0].location_desc, "Area-000 (continuous activity)");
    }

    #[test]
    fn trailing_segment_is_flushed() {
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            // Fast 30-minute reposition, then a long run.
            tagged("CAM-5", Some("Area-003"), 121.50, 25.20, 8, 30),
            tagged("CAM-6", Some("Area-003"), 121.50, 25.20, 8, 45),
            tagged("CAM-7", Some("Area-003"), 121.50, 25.20, 9, 0),
        ];
        let stays = detect_hybrid_stays(&track, &StayConfig::default());

        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].kind.area_hint(), Some("Area-003"));
        assert!((stays[0].duration_minutes - 30.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_sightings_yield_nothing() {
        let track = vec![tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0)];
        assert!(detect_hybrid_stays(&track, &StayConfig::default()).is_empty());
        assert!(detect_hybrid_stays(&[], &StayConfig::default()).is_empty());
    }

    #[test]
    fn gap_and_explicit_stays_are_both_kept() {
        // A 25-minute dense run, then a slow 35-minute gap back at the
        // same spot: the run yields an explicit stay and the gap yields
        // a gap stay; neither suppresses the other.
        let track = vec![
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 8, 0),
            tagged("CAM-2", Some("Area-000"), 121.50, 25.00, 8, 10),
            tagged("CAM-3", Some("Area-000"), 121.50, 25.00, 8, 25),
            tagged("CAM-1", Some("Area-000"), 121.50, 25.00, 9, 0),
        ];
        let stays = detect_hybrid_stays(&track, &StayConfig::default());

        let tags: Vec<StayKindTag> = stays.iter().map(|s| s.kind.tag()).collect();
        assert_eq!(tags, vec![StayKindTag::Explicit, StayKindTag::Gap]);
    }
}
