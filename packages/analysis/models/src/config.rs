//! Tunable thresholds for each detector, with the defaults the pipeline
//! ships with.

use serde::{Deserialize, Serialize};

/// Camera clustering radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Seed radius for greedy area assignment, meters.
    pub radius_meters: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_meters: 200.0,
        }
    }
}

/// Stay detection thresholds (both variants).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayConfig {
    /// Minimum span for a stay, and the gap size that closes a segment,
    /// minutes.
    pub time_threshold_minutes: f64,
    /// Maximum implied speed for a gap to count as a stay, km/h.
    pub gap_speed_threshold_kph: f64,
}

impl Default for StayConfig {
    fn default() -> Self {
        Self {
            time_threshold_minutes: 20.0,
            gap_speed_threshold_kph: 10.0,
        }
    }
}

/// Trip segmentation threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripConfig {
    /// Inter-sighting gap that ends a trip, minutes.
    pub gap_threshold_minutes: f64,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            gap_threshold_minutes: 20.0,
        }
    }
}

/// Pattern mining and home-base thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    /// Occurrences required for a signature to become a regular pattern.
    pub confirmed_threshold: usize,
    /// Long-stay count required for a secondary home base.
    pub secondary_base_threshold: usize,
    /// Minimum duration for a stay to count as a long stay, hours.
    pub long_stay_duration_hours: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            confirmed_threshold: 4,
            secondary_base_threshold: 3,
            long_stay_duration_hours: 4.0,
        }
    }
}

/// Convoy matching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvoyConfig {
    /// Window around each target sighting when matching partners, minutes.
    pub time_tolerance_minutes: f64,
    /// Target-side gap that splits a co-occurrence run, minutes.
    pub max_gap_minutes: f64,
    /// Minimum matched points for a segment to qualify.
    pub min_segment_points: usize,
    /// Number of top-ranked trips to report.
    pub top_trips: usize,
}

impl Default for ConvoyConfig {
    fn default() -> Self {
        Self {
            time_tolerance_minutes: 1.0,
            max_gap_minutes: 10.0,
            min_segment_points: 20,
            top_trips: 3,
        }
    }
}

/// Dual-vehicle meeting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingConfig {
    /// Joint clustering radius over both vehicles' sensors, meters.
    pub cluster_radius_meters: f64,
    /// Maximum distance between stay centers, meters.
    pub meeting_distance_meters: f64,
    /// Stay detection thresholds used for both vehicles.
    pub stay: StayConfig,
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self {
            cluster_radius_meters: 200.0,
            meeting_distance_meters: 80.0,
            stay: StayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_documentation() {
        let stay = StayConfig::default();
        assert!((stay.time_threshold_minutes - 20.0).abs() < f64::EPSILON);
        assert!((stay.gap_speed_threshold_kph - 10.0).abs() < f64::EPSILON);

        assert_eq!(PatternConfig::default().confirmed_threshold, 4);
        assert_eq!(ConvoyConfig::default().min_segment_points, 20);
        let meeting = MeetingConfig::default();
        assert!((meeting.meeting_distance_meters - 80.0).abs() < f64::EPSILON);
    }
}
