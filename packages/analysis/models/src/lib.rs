#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed result records for the plate-trace analysis pipeline.
//!
//! Detector outputs are tagged records rather than open-ended maps: one
//! variant per stay kind, one record per anomaly kind, and explicit
//! optional fields everywhere a value can legitimately be absent.

use chrono::NaiveDateTime;
use plate_trace_sighting_models::{DayType, TimeSlot};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub mod config;

pub use config::{ClusterConfig, ConvoyConfig, MeetingConfig, PatternConfig, StayConfig, TripConfig};

/// A fractional hour of day in `[0, 24)`, renderable as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourOfDay(pub f64);

impl std::fmt::Display for HourOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total_minutes = self.0 * 60.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let hours = (total_minutes / 60.0) as u32 % 24;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minutes = (total_minutes % 60.0) as u32;
        write!(f, "{hours:02}:{minutes:02}")
    }
}

/// How a stay point was established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StayKind {
    /// A contiguous run of closely-spaced sightings inside one area.
    Explicit {
        /// Area the run started in; `None` when the seeding sensor was
        /// not part of the clustered catalog.
        area_id: Option<String>,
    },
    /// A long sighting gap whose implied travel speed was low enough to
    /// count as standing still.
    Gap {
        /// Area of the sighting opening the gap, when clustered.
        from_area: Option<String>,
        /// Area of the sighting closing the gap, when clustered.
        to_area: Option<String>,
        /// Straight-line speed implied by the gap, in km/h.
        implied_speed_kph: f64,
    },
}

impl StayKind {
    /// Short tag for report text.
    #[must_use]
    pub const fn tag(&self) -> StayKindTag {
        match self {
            Self::Explicit { .. } => StayKindTag::Explicit,
            Self::Gap { .. } => StayKindTag::Gap,
        }
    }

    /// The area id used when grouping stays by location: the run's area
    /// for explicit stays, the gap's opening area for gap stays.
    #[must_use]
    pub fn area_hint(&self) -> Option<&str> {
        match self {
            Self::Explicit { area_id } => area_id.as_deref(),
            Self::Gap { from_area, .. } => from_area.as_deref(),
        }
    }
}

/// Kind label without the variant payload, for compact report lines.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StayKindTag {
    /// Continuous observed presence.
    Explicit,
    /// Inferred from a low-implied-speed sighting gap.
    Gap,
}

/// A detected stay event for one vehicle.
///
/// Computed fresh per analysis run; never persisted. Gap and explicit
/// stays are independent outputs and may overlap in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayPoint {
    /// How the stay was established.
    pub kind: StayKind,
    /// First sighting of the stay (or gap opening).
    pub start_time: NaiveDateTime,
    /// Last sighting of the stay (or gap closing).
    pub end_time: NaiveDateTime,
    /// Stay length in minutes.
    pub duration_minutes: f64,
    /// Mean member latitude (explicit) or gap midpoint latitude.
    pub center_lat: f64,
    /// Mean member longitude (explicit) or gap midpoint longitude.
    pub center_lon: f64,
    /// Human-readable location description for report text.
    pub location_desc: String,
}

/// One movement between two sighting-gap breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// First sighting time.
    pub start_time: NaiveDateTime,
    /// Last sighting time.
    pub end_time: NaiveDateTime,
    /// Trip length in minutes.
    pub duration_minutes: f64,
    /// Area of the first sighting.
    pub start_area_id: String,
    /// Area of the last sighting.
    pub end_area_id: String,
    /// Display name of the first sensor.
    pub start_location_name: String,
    /// Display name of the last sensor.
    pub end_location_name: String,
    /// Ordered sensor display names traversed.
    pub path: Vec<String>,
    /// Number of sightings in the trip (always >= 2).
    pub point_count: usize,
}

impl Trip {
    /// The recurring-pattern signature this trip contributes to.
    #[must_use]
    pub fn signature(&self) -> TripSignature {
        TripSignature {
            start_area_id: self.start_area_id.clone(),
            end_area_id: self.end_area_id.clone(),
            day_type: DayType::of(self.start_time),
            time_slot: TimeSlot::of(self.start_time),
        }
    }
}

/// Grouping key for recurring movement patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSignature {
    /// Origin area.
    pub start_area_id: String,
    /// Destination area.
    pub end_area_id: String,
    /// Weekday/weekend classification of the start time.
    pub day_type: DayType,
    /// Time-of-day bucket of the start hour.
    pub time_slot: TimeSlot,
}

impl std::fmt::Display for TripSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}->{}_{}_{}",
            self.start_area_id, self.end_area_id, self.day_type, self.time_slot
        )
    }
}

/// A confirmed recurring movement pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// The shared signature of the member trips.
    pub signature: TripSignature,
    /// Number of member trips.
    pub occurrence_count: usize,
    /// Number of distinct calendar days the pattern occurred on.
    pub occurrence_days: usize,
    /// Mean trip duration in minutes.
    pub avg_duration_minutes: f64,
    /// Circular-mean start time.
    pub avg_start_time: HourOfDay,
    /// Circular-mean end time.
    pub avg_end_time: HourOfDay,
}

/// How often a vehicle stayed at one area, with timing statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayAreaStats {
    /// The area.
    pub area_id: String,
    /// Display name resolved through the full area-name map.
    pub name: String,
    /// Number of stays at the area.
    pub visit_count: usize,
    /// Sum of stay durations in minutes.
    pub total_duration_minutes: f64,
    /// Mean stay duration in minutes.
    pub avg_duration_minutes: f64,
    /// Shortest stay in minutes.
    pub min_duration_minutes: f64,
    /// Longest stay in minutes.
    pub max_duration_minutes: f64,
    /// Circular-mean arrival hour.
    pub avg_arrival: HourOfDay,
    /// Circular-mean departure hour.
    pub avg_departure: HourOfDay,
    /// Single long stay vs. repeated visits.
    pub pattern_kind: StayPatternKind,
    /// Number of stays exceeding the long-stay threshold; populated by
    /// home-base detection.
    pub long_stay_count: usize,
}

/// Classification of an area's stay history.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StayPatternKind {
    /// Exactly one stay at this area.
    SingleLongStay,
    /// More than one stay; duration range is meaningful.
    MultipleStays,
}

/// Primary and secondary home-base candidates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseInfo {
    /// Area with the most long stays, if any stay exceeded the threshold.
    pub primary: Option<StayAreaStats>,
    /// Further areas whose long-stay count met the secondary threshold.
    pub secondary: Vec<StayAreaStats>,
}

/// The structured single-vehicle summary handed to report generation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Home-base detection result.
    pub base_info: BaseInfo,
    /// Per-area stay statistics, ordered by total duration descending.
    pub stay_stats: Vec<StayAreaStats>,
    /// Confirmed recurring patterns, ordered by occurrence descending.
    pub regular_patterns: Vec<Pattern>,
}

/// A trip whose signature never reached the regular threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrequentTrip {
    /// Trip start.
    pub start_time: NaiveDateTime,
    /// Trip end.
    pub end_time: NaiveDateTime,
    /// Origin area.
    pub start_area_id: String,
    /// Destination area.
    pub end_area_id: String,
    /// Trip duration in minutes.
    pub duration_minutes: f64,
    /// The rare signature.
    pub signature: TripSignature,
}

/// A trip inside a regular pattern whose duration broke the IQR bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationOutlier {
    /// Trip start.
    pub start_time: NaiveDateTime,
    /// Trip end.
    pub end_time: NaiveDateTime,
    /// Signature of the pattern the trip belongs to.
    pub pattern_signature: TripSignature,
    /// Observed duration in minutes.
    pub actual_duration_minutes: f64,
    /// The pattern's median duration, for context.
    pub median_duration_minutes: f64,
}

/// All anomalies found for one vehicle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    /// Trips with signatures below the regular threshold, one entry per
    /// trip.
    pub infrequent_patterns: Vec<InfrequentTrip>,
    /// IQR duration outliers within regular patterns.
    pub duration_outliers: Vec<DurationOutlier>,
}

impl AnomalyReport {
    /// Whether no anomaly of either kind was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infrequent_patterns.is_empty() && self.duration_outliers.is_empty()
    }
}

/// One matched sighting pair between target and partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoOccurrence {
    /// Sensor both vehicles passed.
    pub sensor_id: String,
    /// Target vehicle's sighting time.
    pub target_time: NaiveDateTime,
    /// Partner vehicle's closest sighting time within tolerance.
    pub partner_time: NaiveDateTime,
}

impl CoOccurrence {
    /// Partner time minus target time, in seconds (negative when the
    /// partner passed first).
    #[must_use]
    pub fn lag_seconds(&self) -> f64 {
        let delta = self.partner_time - self.target_time;
        #[allow(clippy::cast_precision_loss)]
        let millis = delta.num_milliseconds() as f64;
        millis / 1000.0
    }
}

/// What fraction of the target trip a convoy segment covered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowingExtent {
    /// Covered at least 90 % of the trip.
    Full,
    /// Covered at least 60 %.
    Long,
    /// Covered at least 30 %.
    Medium,
    /// Anything shorter that still met the minimum point count.
    Short,
}

impl FollowingExtent {
    /// Classifies a segment-to-trip point-count ratio.
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.9 {
            Self::Full
        } else if ratio >= 0.6 {
            Self::Long
        } else if ratio >= 0.3 {
            Self::Medium
        } else {
            Self::Short
        }
    }
}

/// Where within the target trip a matched point falls, by index ratio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TripPosition {
    /// First fifth of the trip.
    Start,
    /// Second fifth.
    Early,
    /// Middle fifth.
    Mid,
    /// Fourth fifth.
    Late,
    /// Final fifth.
    End,
}

impl TripPosition {
    /// Classifies an index ratio in `[0, 1]` against the 20/40/60/80 %
    /// thresholds.
    #[must_use]
    pub fn from_index_ratio(ratio: f64) -> Self {
        if ratio < 0.2 {
            Self::Start
        } else if ratio < 0.4 {
            Self::Early
        } else if ratio < 0.6 {
            Self::Mid
        } else if ratio < 0.8 {
            Self::Late
        } else {
            Self::End
        }
    }
}

/// One partner vehicle's qualifying convoy segment on a target trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvoyPartner {
    /// Partner vehicle id.
    pub vehicle_id: String,
    /// Matched pairs, ordered by target time.
    pub events: Vec<CoOccurrence>,
    /// Segment length / trip point count.
    pub following_ratio: f64,
    /// Ratio classification.
    pub extent: FollowingExtent,
    /// Position of the first matched point within the trip.
    pub start_position: TripPosition,
    /// Position of the last matched point within the trip.
    pub end_position: TripPosition,
    /// Mean lag across matched points (partner minus target), seconds.
    pub avg_lag_seconds: f64,
}

impl ConvoyPartner {
    /// Number of matched points in the segment.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.events.len()
    }
}

/// A target trip together with every qualifying convoy partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvoyTrip {
    /// The target vehicle's trip.
    pub trip: Trip,
    /// Qualifying partners, sorted by following ratio descending.
    pub partners: Vec<ConvoyPartner>,
    /// Longest qualifying segment length, used for trip ranking.
    pub max_segment_points: usize,
}

/// Convoy analysis result for one target vehicle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvoyReport {
    /// Top trips ranked by longest convoy segment, descending.
    pub trips: Vec<ConvoyTrip>,
}

/// A co-presence event between two vehicles' stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    /// Overlap window start (`max` of the two stay starts).
    pub start_time: NaiveDateTime,
    /// Overlap window end (`min` of the two stay ends).
    pub end_time: NaiveDateTime,
    /// Overlap length in minutes.
    pub duration_minutes: f64,
    /// Distance between the two stay centers in meters.
    pub distance_meters: f64,
    /// Location description taken from the first vehicle's stay.
    pub location_desc: String,
    /// Kind of the first vehicle's stay.
    pub kind_a: StayKindTag,
    /// Kind of the second vehicle's stay.
    pub kind_b: StayKindTag,
    /// Whether the two stays' area hints differ (boundary meeting).
    pub cross_area: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_of_day_formats_like_clock_time() {
        assert_eq!(HourOfDay(8.25).to_string(), "08:15");
        assert_eq!(HourOfDay(0.0).to_string(), "00:00");
        assert_eq!(HourOfDay(23.99).to_string(), "23:59");
    }

    #[test]
    fn following_extent_thresholds() {
        assert_eq!(FollowingExtent::from_ratio(1.0), FollowingExtent::Full);
        assert_eq!(FollowingExtent::from_ratio(0.9), FollowingExtent::Full);
        assert_eq!(FollowingExtent::from_ratio(0.7), FollowingExtent::Long);
        assert_eq!(FollowingExtent::from_ratio(0.4), FollowingExtent::Medium);
        assert_eq!(FollowingExtent::from_ratio(0.1), FollowingExtent::Short);
    }

    #[test]
    fn trip_position_thresholds() {
        assert_eq!(TripPosition::from_index_ratio(0.0), TripPosition::Start);
        assert_eq!(TripPosition::from_index_ratio(0.2), TripPosition::Early);
        assert_eq!(TripPosition::from_index_ratio(0.5), TripPosition::Mid);
        assert_eq!(TripPosition::from_index_ratio(0.65), TripPosition::Late);
        assert_eq!(TripPosition::from_index_ratio(0.95), TripPosition::End);
    }

    #[test]
    fn signature_display_is_stable() {
        let sig = TripSignature {
            start_area_id: "Area-001".to_string(),
            end_area_id: "Area-005".to_string(),
            day_type: plate_trace_sighting_models::DayType::Weekday,
            time_slot: plate_trace_sighting_models::TimeSlot::Afternoon,
        };
        assert_eq!(sig.to_string(), "Area-001->Area-005_WEEKDAY_AFTERNOON");
    }

    #[test]
    fn lag_is_signed() {
        use chrono::NaiveDate;
        let t = NaiveDate::from_ymd_opt(2025, 8, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let event = CoOccurrence {
            sensor_id: "CAM-1".to_string(),
            target_time: t,
            partner_time: t - chrono::Duration::seconds(30),
        };
        assert!((event.lag_seconds() + 30.0).abs() < f64::EPSILON);
    }
}
