#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core record types shared across the plate-trace analysis pipeline.
//!
//! Defines the immutable [`Sighting`] record produced by ingestion, the
//! [`Sensor`] catalog entry used by geographic clustering, and the
//! [`VehicleTrack`] wrapper that makes ascending-timestamp ordering an
//! explicit contract instead of a runtime assumption.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single license-plate-camera sighting of one vehicle.
///
/// Immutable once constructed. Rows with non-finite coordinates never make
/// it this far; ingestion drops them before a `Sighting` is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    /// License plate identifier of the sighted vehicle.
    pub vehicle_id: String,
    /// Identifier of the camera sensor that produced the sighting.
    pub sensor_id: String,
    /// Human-readable display name of the sensor.
    pub sensor_name: String,
    /// Sensor longitude in decimal degrees.
    pub longitude: f64,
    /// Sensor latitude in decimal degrees.
    pub latitude: f64,
    /// Local capture timestamp (date + time combined at ingest).
    pub timestamp: NaiveDateTime,
    /// Unit that owns the sensor, when the source provides it.
    pub owning_unit: Option<String>,
}

impl Sighting {
    /// Returns the sensor position as `(longitude, latitude)`.
    #[must_use]
    pub const fn position(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

/// A deduplicated camera sensor with its fixed position.
///
/// Produced by collapsing the sighting table to one entry per sensor id;
/// input order is preserved because area ids depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    /// Sensor identifier.
    pub sensor_id: String,
    /// Display name.
    pub name: String,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Owning unit, when known.
    pub owning_unit: Option<String>,
}

/// One vehicle's sightings, guaranteed sorted by ascending timestamp.
///
/// Every detector in the pipeline requires time-ordered input; this type
/// makes that precondition part of the signature. Construction sorts, so a
/// `VehicleTrack` can never hold out-of-order rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTrack(Vec<Sighting>);

impl VehicleTrack {
    /// Builds a track from sightings in any order; sorts by timestamp.
    ///
    /// The sort is stable, so same-instant sightings keep their input
    /// order.
    #[must_use]
    pub fn from_unsorted(mut sightings: Vec<Sighting>) -> Self {
        sightings.sort_by_key(|s| s.timestamp);
        Self(sightings)
    }

    /// The sorted sightings.
    #[must_use]
    pub fn sightings(&self) -> &[Sighting] {
        &self.0
    }

    /// Number of sightings in the track.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the track holds no sightings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Weekday/weekend classification for pattern signatures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DayType {
    /// Monday through Friday.
    Weekday,
    /// Saturday and Sunday.
    Weekend,
}

impl DayType {
    /// Classifies a timestamp by its ISO weekday (Mon-Fri => weekday).
    #[must_use]
    pub fn of(timestamp: NaiveDateTime) -> Self {
        if timestamp.weekday().num_days_from_monday() < 5 {
            Self::Weekday
        } else {
            Self::Weekend
        }
    }
}

/// Coarse time-of-day bucket derived from a trip's start hour.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeSlot {
    /// 05:00 - 07:59.
    Dawn,
    /// 08:00 - 11:59.
    Morning,
    /// 12:00 - 17:59.
    Afternoon,
    /// 18:00 - 22:59.
    Evening,
    /// 23:00 - 04:59.
    LateNight,
}

impl TimeSlot {
    /// Buckets an hour of day (0-23).
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            5..=7 => Self::Dawn,
            8..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=22 => Self::Evening,
            _ => Self::LateNight,
        }
    }

    /// Buckets a timestamp by its hour component.
    #[must_use]
    pub fn of(timestamp: NaiveDateTime) -> Self {
        Self::from_hour(timestamp.hour())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn sighting(ts: NaiveDateTime) -> Sighting {
        Sighting {
            vehicle_id: "ABC-1234".to_string(),
            sensor_id: "CAM-01".to_string(),
            sensor_name: "Main St & 1st Ave".to_string(),
            longitude: 121.5,
            latitude: 25.0,
            timestamp: ts,
            owning_unit: None,
        }
    }

    #[test]
    fn track_sorts_by_timestamp() {
        let later = sighting(at(2025, 8, 4, 9, 0));
        let earlier = sighting(at(2025, 8, 4, 8, 0));
        let track = VehicleTrack::from_unsorted(vec![later, earlier.clone()]);
        assert_eq!(track.sightings()[0], earlier);
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn weekday_boundaries() {
        // 2025-08-04 is a Monday, 2025-08-09 a Saturday.
        assert_eq!(DayType::of(at(2025, 8, 4, 12, 0)), DayType::Weekday);
        assert_eq!(DayType::of(at(2025, 8, 8, 12, 0)), DayType::Weekday);
        assert_eq!(DayType::of(at(2025, 8, 9, 12, 0)), DayType::Weekend);
        assert_eq!(DayType::of(at(2025, 8, 10, 12, 0)), DayType::Weekend);
    }

    #[test]
    fn time_slot_boundaries() {
        assert_eq!(TimeSlot::from_hour(4), TimeSlot::LateNight);
        assert_eq!(TimeSlot::from_hour(5), TimeSlot::Dawn);
        assert_eq!(TimeSlot::from_hour(8), TimeSlot::Morning);
        assert_eq!(TimeSlot::from_hour(12), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::from_hour(18), TimeSlot::Evening);
        assert_eq!(TimeSlot::from_hour(23), TimeSlot::LateNight);
        assert_eq!(TimeSlot::from_hour(0), TimeSlot::LateNight);
    }
}
