#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The trajectory-to-pattern inference core.
//!
//! Pure, stateless detectors over time-sorted sighting tracks:
//! stay-point detection (explicit runs and implied-speed gap stays), trip
//! segmentation, recurring-pattern mining with circular time averaging,
//! IQR anomaly detection, multi-vehicle convoy matching, and dual-vehicle
//! meeting detection. Insufficient input yields an empty result plus a
//! diagnostic log line, never an error.

pub mod anomaly;
pub mod convoy;
pub mod meeting;
pub mod pattern;
pub mod stats;
pub mod stay;
pub mod trip;

use plate_trace_sighting_models::{Sighting, VehicleTrack};
use plate_trace_spatial::SensorClustering;

/// A sighting annotated with the location area its sensor belongs to.
///
/// `area_id` is `None` when the sensor was not part of the clustered
/// catalog the track was tagged against.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSighting {
    /// The underlying sighting.
    pub sighting: Sighting,
    /// Area assignment of the sighting's sensor.
    pub area_id: Option<String>,
}

/// Annotates a track's sightings with their area assignments.
///
/// Order (and therefore the time-sorted contract) is preserved.
#[must_use]
pub fn tag_track(track: &VehicleTrack, clustering: &SensorClustering) -> Vec<TaggedSighting> {
    track
        .sightings()
        .iter()
        .map(|s| TaggedSighting {
            area_id: clustering.area_of(&s.sensor_id).map(String::from),
            sighting: s.clone(),
        })
        .collect()
}

/// Minutes between two timestamps as a float.
pub(crate) fn minutes_between(
    start: chrono::NaiveDateTime,
    end: chrono::NaiveDateTime,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let millis = (end - start).num_milliseconds() as f64;
    millis / 60_000.0
}


#[cfg(test)]
mod tests {
    use plate_trace_sighting_models::{Sensor, VehicleTrack};
    use plate_trace_spatial::cluster_sensors;

    use super::testutil::{at, sighting};
    use super::*;

    #[test]
    fn tagging_resolves_known_sensors_only() {
        let sensors = vec![Sensor {
            sensor_id: "CAM-1".to_string(),
            name: "First St".to_string(),
            longitude: 121.5,
            latitude: 25.0,
            owning_unit: None,
        }];
        let clustering = cluster_sensors(&sensors, 200.0);

        let track = VehicleTrack::from_unsorted(vec![
            sighting("V", "CAM-1", 121.5, 25.0, at(8, 0)),
            sighting("V", "CAM-9", 121.6, 25.1, at(8, 5)),
        ]);
        let tagged = tag_track(&track, &clustering);

        assert_eq!(tagged[0].area_id.as_deref(), Some("Area-000"));
        assert_eq!(tagged[1].area_id, None);
    }
}
