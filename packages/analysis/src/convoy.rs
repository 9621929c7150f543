//! Trip-oriented convoy analysis: which vehicles travel with the target.
//!
//! For every trip of the target vehicle, each candidate partner's
//! sightings are matched against the target's at the same sensor within a
//! time tolerance. Matched pairs are stitched into continuous segments on
//! the target's clock; segments long enough to rule out coincidence are
//! classified by coverage and position and reported per trip.

use std::collections::HashMap;

use plate_trace_analysis_models::{
    CoOccurrence, ConvoyConfig, ConvoyPartner, ConvoyReport, ConvoyTrip, FollowingExtent,
    TripConfig, TripPosition,
};
use plate_trace_ingest::SightingTable;
use plate_trace_sighting_models::Sighting;
use plate_trace_spatial::SensorClustering;

use crate::{minutes_between, stats, tag_track, trip::segment_trips};

/// A matched pair remembered together with the target-side index, needed
/// for position classification.
struct IndexedEvent {
    target_index: usize,
    event: CoOccurrence,
}

/// Runs convoy analysis for one target vehicle against every other
/// vehicle in the table.
///
/// Returns the top trips ranked by their longest qualifying segment; a
/// report with no trips means nothing co-travelled long enough.
#[must_use]
pub fn analyze_convoys(
    table: &SightingTable,
    target_vehicle: &str,
    clustering: &SensorClustering,
    config: &ConvoyConfig,
) -> ConvoyReport {
    let target_track = table.track_for(target_vehicle);
    if target_track.is_empty() {
        log::warn!("No sightings for target vehicle {target_vehicle}");
        return ConvoyReport::default();
    }

    let tagged = tag_track(&target_track, clustering);
    let trips = segment_trips(&tagged, &TripConfig::default());
    if trips.is_empty() {
        log::info!("No segmentable trips for target vehicle {target_vehicle}");
        return ConvoyReport::default();
    }

    let partners: Vec<String> = table
        .vehicles()
        .into_iter()
        .filter(|v| v != target_vehicle)
        .collect();

    let mut analyzed: Vec<ConvoyTrip> = Vec::new();

    for trip in trips {
        let trip_points: Vec<&Sighting> = target_track
            .sightings()
            .iter()
            .filter(|s| s.timestamp >= trip.start_time && s.timestamp <= trip.end_time)
            .collect();

        let mut found: Vec<ConvoyPartner> = Vec::new();
        let mut max_segment_points = 0usize;

        for partner in &partners {
            let partner_track = table.track_for(partner);
            let by_sensor = index_by_sensor(partner_track.sightings());

            let events = match_events(&trip_points, &by_sensor, config);
            for segment in split_segments(events, config.max_gap_minutes) {
                if segment.len() < config.min_segment_points {
                    continue;
                }
                max_segment_points = max_segment_points.max(segment.len());
                found.push(classify_partner(partner, segment, trip_points.len()));
            }
        }

        if !found.is_empty() {
            found.sort_by(|a, b| {
                b.following_ratio
                    .total_cmp(&a.following_ratio)
                    .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
            });
            analyzed.push(ConvoyTrip {
                trip,
                partners: found,
                max_segment_points,
            });
        }
    }

    if analyzed.is_empty() {
        log::info!(
            "No convoy segments of at least {} points found for {target_vehicle}",
            config.min_segment_points
        );
        return ConvoyReport::default();
    }

    analyzed.sort_by(|a, b| b.max_segment_points.cmp(&a.max_segment_points));
    analyzed.truncate(config.top_trips);

    ConvoyReport { trips: analyzed }
}

/// Groups a partner's sightings by sensor for tolerance-window lookups.
fn index_by_sensor(sightings: &[Sighting]) -> HashMap<&str, Vec<&Sighting>> {
    let mut index: HashMap<&str, Vec<&Sighting>> = HashMap::new();
    for s in sightings {
        index.entry(s.sensor_id.as_str()).or_default().push(s);
    }
    index
}

/// Matches each target trip point against the partner's sightings at the
/// same sensor within the tolerance window; the closest in time wins.
fn match_events(
    trip_points: &[&Sighting],
    partner_by_sensor: &HashMap<&str, Vec<&Sighting>>,
    config: &ConvoyConfig,
) -> Vec<IndexedEvent> {
    let mut events = Vec::new();

    for (target_index, target) in trip_points.iter().enumerate() {
        let Some(candidates) = partner_by_sensor.get(target.sensor_id.as_str()) else {
            continue;
        };

        let best = candidates
            .iter()
            .map(|p| (minutes_between(target.timestamp, p.timestamp).abs(), *p))
            .filter(|(delta, _)| *delta <= config.time_tolerance_minutes)
            .min_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((_, partner_sighting)) = best {
            events.push(IndexedEvent {
                target_index,
                event: CoOccurrence {
                    sensor_id: target.sensor_id.clone(),
                    target_time: target.timestamp,
                    partner_time: partner_sighting.timestamp,
                },
            });
        }
    }

    events
}

/// Splits a co-occurrence run wherever the target-side gap exceeds the
/// limit.
fn split_segments(events: Vec<IndexedEvent>, max_gap_minutes: f64) -> Vec<Vec<IndexedEvent>> {
    let mut segments = Vec::new();
    let mut current: Vec<IndexedEvent> = Vec::new();

    for event in events {
        let breaks = current.last().is_some_and(|prev| {
            minutes_between(prev.event.target_time, event.event.target_time) > max_gap_minutes
        });
        if breaks {
            segments.push(std::mem::take(&mut current));
        }
        current.push(event);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Classifies one qualifying segment: coverage ratio, trip-position tags
/// for both endpoints, and the mean partner-vs-target time lag.
fn classify_partner(
    vehicle_id: &str,
    segment: Vec<IndexedEvent>,
    trip_len: usize,
) -> ConvoyPartner {
    #[allow(clippy::cast_precision_loss)]
    let ratio = segment.len() as f64 / trip_len.max(1) as f64;

    let denominator = trip_len.saturating_sub(1).max(1);
    #[allow(clippy::cast_precision_loss)]
    let index_ratio = |index: usize| index as f64 / denominator as f64;

    let first = segment.first().map_or(0, |e| e.target_index);
    let last = segment.last().map_or(0, |e| e.target_index);

    let lags: Vec<f64> = segment.iter().map(|e| e.event.lag_seconds()).collect();

    ConvoyPartner {
        vehicle_id: vehicle_id.to_string(),
        following_ratio: ratio,
        extent: FollowingExtent::from_ratio(ratio),
        start_position: TripPosition::from_index_ratio(index_ratio(first)),
        end_position: TripPosition::from_index_ratio(index_ratio(last)),
        avg_lag_seconds: stats::mean(&lags),
        events: segment.into_iter().map(|e| e.event).collect(),
    }
}

/// Renders a lag as report text: positive means the partner passes later.
#[must_use]
pub fn describe_lag(avg_lag_seconds: f64) -> String {
    if avg_lag_seconds > 0.0 {
        format!("partner later by {avg_lag_seconds:.1} s")
    } else {
        format!("partner earlier by {:.1} s", avg_lag_seconds.abs())
    }
}

#[cfg(test)]
mod tests {
    use plate_trace_ingest::SightingTable;
    use plate_trace_spatial::cluster_sensors;

    use crate::testutil::{at, sighting};

    use super::*;

    /// Builds a table where the target drives a 25-sensor route and the
    /// partner trails it by `lag_seconds` at every sensor.
    fn table_with_follower(lag_seconds: i64, partner_points: usize) -> SightingTable {
        let mut rows = Vec::new();
        for i in 0..25u32 {
            let ts = at(8, 0) + chrono::Duration::minutes(i64::from(i) * 2);
            let lon = 121.5 + f64::from(i) * 0.01;
            rows.push(sighting("TARGET-1", &format!("CAM-{i:02}"), lon, 25.0, ts));
            if (i as usize) < partner_points {
                rows.push(Sighting {
                    timestamp: ts + chrono::Duration::seconds(lag_seconds),
                    ..sighting("SHADOW-9", &format!("CAM-{i:02}"), lon, 25.0, ts)
                });
            }
        }
        SightingTable::new(rows)
    }

    fn clustering_for(table: &SightingTable) -> SensorClustering {
        cluster_sensors(&table.sensors(), 200.0)
    }

    #[test]
    fn full_following_over_25_points() {
        let table = table_with_follower(30, 25);
        let clustering = clustering_for(&table);
        let report = analyze_convoys(&table, "TARGET-1", &clustering, &ConvoyConfig::default());

        assert_eq!(report.trips.len(), 1);
        let trip = &report.trips[0];
        assert_eq!(trip.partners.len(), 1);

        let partner = &trip.partners[0];
        assert_eq!(partner.vehicle_id, "SHADOW-9");
        assert_eq!(partner.point_count(), 25);
        assert_eq!(partner.extent, FollowingExtent::Full);
        assert_eq!(partner.start_position, TripPosition::Start);
        assert_eq!(partner.end_position, TripPosition::End);
        assert!((partner.avg_lag_seconds - 30.0).abs() < 1e-9);
    }

    #[test]
    fn below_minimum_points_is_not_reported() {
        let table = table_with_follower(30, 10);
        let clustering = clustering_for(&table);
        let report = analyze_convoys(&table, "TARGET-1", &clustering, &ConvoyConfig::default());
        assert!(report.trips.is_empty());
    }

    #[test]
    fn lighter_minimum_reports_partial_following() {
        let table = table_with_follower(-15, 10);
        let clustering = clustering_for(&table);
        let config = ConvoyConfig {
            min_segment_points: 10,
            ..ConvoyConfig::default()
        };
        let report = analyze_convoys(&table, "TARGET-1", &clustering, &config);

        assert_eq!(report.trips.len(), 1);
        let partner = &report.trips[0].partners[0];
        assert_eq!(partner.extent, FollowingExtent::Medium);
        assert_eq!(partner.start_position, TripPosition::Start);
        assert_eq!(partner.end_position, TripPosition::Early);
        // Partner passed each sensor 15 s before the target.
        assert!(partner.avg_lag_seconds < 0.0);
        assert_eq!(describe_lag(partner.avg_lag_seconds), "partner earlier by 15.0 s");
    }

    #[test]
    fn partner_outside_tolerance_is_ignored() {
        // 90-second lag exceeds the default 1-minute tolerance.
        let table = table_with_follower(90, 25);
        let clustering = clustering_for(&table);
        let report = analyze_convoys(&table, "TARGET-1", &clustering, &ConvoyConfig::default());
        assert!(report.trips.is_empty());
    }

    #[test]
    fn gap_in_matches_splits_segments() {
        // Partner follows sensors 0-11 and 18-24; the 14-minute hole on
        // the target clock splits the run, leaving segments of 12 and 7.
        let mut rows = Vec::new();
        for i in 0..25u32 {
            let ts = at(8, 0) + chrono::Duration::minutes(i64::from(i) * 2);
            let lon = 121.5 + f64::from(i) * 0.01;
            rows.push(sighting("TARGET-1", &format!("CAM-{i:02}"), lon, 25.0, ts));
            if i < 12 || i >= 18 {
                rows.push(Sighting {
                    timestamp: ts + chrono::Duration::seconds(20),
                    ..sighting("SHADOW-9", &format!("CAM-{i:02}"), lon, 25.0, ts)
                });
            }
        }
        let table = SightingTable::new(rows);
        let clustering = clustering_for(&table);
        let config = ConvoyConfig {
            min_segment_points: 2,
            ..ConvoyConfig::default()
        };
        let report = analyze_convoys(&table, "TARGET-1", &clustering, &config);

        assert_eq!(report.trips.len(), 1);
        let lengths: Vec<usize> = report.trips[0]
            .partners
            .iter()
            .map(ConvoyPartner::point_count)
            .collect();
        assert_eq!(lengths, vec![12, 7]);
    }

    #[test]
    fn unknown_target_vehicle_yields_empty_report() {
        let table = table_with_follower(30, 25);
        let clustering = clustering_for(&table);
        let report = analyze_convoys(&table, "NOBODY-0", &clustering, &ConvoyConfig::default());
        assert!(report.trips.is_empty());
    }
}
