#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic clustering of camera sensors into location areas.
//!
//! Builds an R-tree over sensor positions and runs a greedy seed-radius
//! partition: sensors are visited in input order, each unlabeled sensor
//! opens a new area, and every still-unlabeled sensor within the radius of
//! that *seed* joins it. The R-tree only accelerates the radius query
//! (envelope prefilter, exact haversine test); it does not change which
//! sensor ends up in which area.

use std::collections::BTreeMap;

use plate_trace_sighting_models::Sensor;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

/// Earth radius used for all great-circle distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate meters per degree of latitude, used only to size envelope
/// queries. Slight over-estimation is harmless; the exact haversine test
/// runs on every candidate.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two `(lon, lat)` points in meters.
///
/// Standard haversine:
/// `a = sin²(Δφ/2) + cosφ1·cosφ2·sin²(Δλ/2)`,
/// `d = R · 2·atan2(√a, √(1−a))`.
#[must_use]
pub fn haversine_meters(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// A sensor position stored in the R-tree with its input-order index.
struct SensorEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
    lon: f64,
    lat: f64,
}

impl RTreeObject for SensorEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// One location area produced by clustering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationArea {
    /// Stable area id of the form `Area-NNN`, numbered in generation order.
    pub area_id: String,
    /// Display name of the area's first member (its seed sensor).
    pub representative_name: String,
    /// Member sensor ids in input order; every sensor belongs to exactly
    /// one area.
    pub sensor_ids: Vec<String>,
}

/// The result of clustering a sensor catalog: areas plus a sensor-to-area
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorClustering {
    areas: Vec<LocationArea>,
    by_sensor: BTreeMap<String, String>,
}

impl SensorClustering {
    /// All areas in generation order.
    #[must_use]
    pub fn areas(&self) -> &[LocationArea] {
        &self.areas
    }

    /// Number of distinct areas.
    #[must_use]
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// Area id for a sensor, if the sensor was part of the clustered
    /// catalog.
    #[must_use]
    pub fn area_of(&self, sensor_id: &str) -> Option<&str> {
        self.by_sensor.get(sensor_id).map(String::as_str)
    }

    /// Map from area id to its representative display name.
    ///
    /// Covers *every* area, including ones a given vehicle only passes
    /// through, so downstream reporting never falls back to an unknown
    /// label for a clustered sensor.
    #[must_use]
    pub fn area_name_map(&self) -> BTreeMap<String, String> {
        self.areas
            .iter()
            .map(|a| (a.area_id.clone(), a.representative_name.clone()))
            .collect()
    }
}

/// Greedily partitions sensors into location areas by seed distance.
///
/// Sensors are visited in input order. Each unlabeled sensor becomes the
/// seed of a new `Area-NNN`; all still-unlabeled sensors within
/// `radius_meters` of the seed join that area. Distance is measured from
/// the seed, not the evolving cluster, so two members of one area can be
/// farther than `radius_meters` apart, a known property of the greedy
/// partition, kept deliberately. Deterministic for a fixed input order,
/// and idempotent at radius 0.
#[must_use]
pub fn cluster_sensors(sensors: &[Sensor], radius_meters: f64) -> SensorClustering {
    let tree = RTree::bulk_load(
        sensors
            .iter()
            .enumerate()
            .map(|(index, s)| SensorEntry {
                index,
                envelope: AABB::from_point([s.longitude, s.latitude]),
                lon: s.longitude,
                lat: s.latitude,
            })
            .collect(),
    );

    let mut assigned: Vec<Option<usize>> = vec![None; sensors.len()];
    let mut areas: Vec<LocationArea> = Vec::new();

    for (seed_index, seed) in sensors.iter().enumerate() {
        if assigned[seed_index].is_some() {
            continue;
        }

        let area_index = areas.len();
        let area_id = format!("Area-{area_index:03}");
        assigned[seed_index] = Some(area_index);

        let mut members = vec![seed_index];

        let mut candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(&radius_envelope(seed, radius_meters))
            .filter(|entry| assigned[entry.index].is_none())
            .filter(|entry| {
                haversine_meters(seed.longitude, seed.latitude, entry.lon, entry.lat)
                    <= radius_meters
            })
            .map(|entry| entry.index)
            .collect();
        candidates.sort_unstable();

        for index in candidates {
            assigned[index] = Some(area_index);
            members.push(index);
        }

        areas.push(LocationArea {
            area_id,
            representative_name: seed.name.clone(),
            sensor_ids: members
                .iter()
                .map(|&i| sensors[i].sensor_id.clone())
                .collect(),
        });
    }

    let by_sensor = sensors
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let area_index = assigned[i].unwrap_or_default();
            (s.sensor_id.clone(), areas[area_index].area_id.clone())
        })
        .collect();

    log::debug!(
        "Clustered {} sensors into {} location areas (radius {radius_meters} m)",
        sensors.len(),
        areas.len()
    );

    SensorClustering { areas, by_sensor }
}

/// Bounding box around a seed sensor sized to contain everything within
/// the query radius. Longitude degrees shrink with latitude, so the pad
/// widens toward the poles.
fn radius_envelope(seed: &Sensor, radius_meters: f64) -> AABB<[f64; 2]> {
    let pad_lat = radius_meters / METERS_PER_DEGREE;
    let cos_lat = seed.latitude.to_radians().cos().abs().max(1e-6);
    let pad_lon = radius_meters / (METERS_PER_DEGREE * cos_lat);

    AABB::from_corners(
        [seed.longitude - pad_lon, seed.latitude - pad_lat],
        [seed.longitude + pad_lon, seed.latitude + pad_lat],
    )
}
