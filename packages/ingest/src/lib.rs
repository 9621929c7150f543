#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV sighting ingestion for the plate-trace pipeline.
//!
//! Loads a camera-sighting export into an in-memory [`SightingTable`]:
//! combines the date and time columns into a timestamp, drops rows with
//! unparseable timestamps or non-finite coordinates (with a warning), and
//! sorts everything by time once so downstream per-vehicle tracks are
//! cheap filtered copies.

pub mod parsing;
pub mod progress;

use std::collections::BTreeSet;
use std::path::Path;

use plate_trace_sighting_models::{Sensor, Sighting, VehicleTrack};
use serde::Deserialize;
use thiserror::Error;

use crate::progress::ProgressCallback;

/// Errors that can occur while loading sighting data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV structure error (missing column, malformed record).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Every row in the file was dropped during validation.
    #[error("no valid sighting rows in {path}")]
    NoValidRows {
        /// Path of the offending file.
        path: String,
    },
}

/// One raw CSV row before validation.
///
/// Field aliases accept the column names of the original camera export
/// alongside the English ones.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "plate", alias = "車牌")]
    vehicle_id: String,
    #[serde(alias = "sensor_id", alias = "camera", alias = "攝影機")]
    sensor_id: String,
    #[serde(alias = "sensor_name", alias = "camera_name", alias = "攝影機名稱")]
    sensor_name: String,
    #[serde(alias = "date", alias = "日期")]
    date: String,
    #[serde(alias = "time", alias = "時間")]
    time: String,
    #[serde(alias = "longitude", alias = "經度")]
    longitude: String,
    #[serde(alias = "latitude", alias = "緯度")]
    latitude: String,
    #[serde(default, alias = "owning_unit", alias = "unit", alias = "單位")]
    owning_unit: Option<String>,
}

/// The full, time-sorted sighting dataset.
///
/// Loaded once and treated as read-only; every analysis run filters its
/// own per-vehicle copy, so no locking is ever needed.
#[derive(Debug, Clone)]
pub struct SightingTable {
    rows: Vec<Sighting>,
}

impl SightingTable {
    /// Wraps already-validated sightings, sorting them by timestamp.
    #[must_use]
    pub fn new(mut rows: Vec<Sighting>) -> Self {
        rows.sort_by_key(|s| s.timestamp);
        Self { rows }
    }

    /// All sightings, ascending by timestamp.
    #[must_use]
    pub fn rows(&self) -> &[Sighting] {
        &self.rows
    }

    /// Total row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct vehicle ids, sorted.
    #[must_use]
    pub fn vehicles(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|s| s.vehicle_id.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// A private, sorted copy of one vehicle's sightings.
    #[must_use]
    pub fn track_for(&self, vehicle_id: &str) -> VehicleTrack {
        VehicleTrack::from_unsorted(
            self.rows
                .iter()
                .filter(|s| s.vehicle_id == vehicle_id)
                .cloned()
                .collect(),
        )
    }

    /// The deduplicated sensor catalog, first occurrence wins.
    ///
    /// Order follows the time-sorted table, which is what makes area-id
    /// generation deterministic for a given dataset.
    #[must_use]
    pub fn sensors(&self) -> Vec<Sensor> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut sensors = Vec::new();
        for s in &self.rows {
            if seen.insert(s.sensor_id.as_str()) {
                sensors.push(Sensor {
                    sensor_id: s.sensor_id.clone(),
                    name: s.sensor_name.clone(),
                    longitude: s.longitude,
                    latitude: s.latitude,
                    owning_unit: s.owning_unit.clone(),
                });
            }
        }
        sensors
    }

    /// Sensor catalog restricted to the sensors appearing in the given
    /// tracks, preserving table order. Used by meeting analysis, which
    /// reclusters over the union of two vehicles' sensors.
    #[must_use]
    pub fn sensors_for_tracks(&self, tracks: &[&VehicleTrack]) -> Vec<Sensor> {
        let wanted: BTreeSet<&str> = tracks
            .iter()
            .flat_map(|t| t.sightings())
            .map(|s| s.sensor_id.as_str())
            .collect();
        self.sensors()
            .into_iter()
            .filter(|s| wanted.contains(s.sensor_id.as_str()))
            .collect()
    }
}

/// Loads a sighting CSV from disk without progress reporting.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, the CSV is
/// structurally invalid, or no row survives validation.
pub fn load_csv(path: &Path) -> Result<SightingTable, IngestError> {
    load_csv_with_progress(path, &progress::NullProgress)
}

/// Loads a sighting CSV from disk, reporting per-row progress.
///
/// Rows with unparseable timestamps or non-numeric/non-finite coordinates
/// are dropped with a warning tally; they never reach the analysis core.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read, the CSV is
/// structurally invalid, or no row survives validation.
pub fn load_csv_with_progress(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<SightingTable, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for record in reader.deserialize::<RawRow>() {
        let raw = record?;
        progress.inc(1);

        let Some(timestamp) = parsing::parse_timestamp(&raw.date, &raw.time) else {
            log::warn!(
                "Dropping row for {}: unparseable timestamp '{} {}'",
                raw.vehicle_id,
                raw.date,
                raw.time
            );
            dropped += 1;
            continue;
        };

        let Some((longitude, latitude)) =
            parsing::parse_lon_lat(&raw.longitude, &raw.latitude)
        else {
            log::warn!(
                "Dropping row for {} at {}: invalid coordinates ('{}', '{}')",
                raw.vehicle_id,
                timestamp,
                raw.longitude,
                raw.latitude
            );
            dropped += 1;
            continue;
        };

        rows.push(Sighting {
            vehicle_id: raw.vehicle_id,
            sensor_id: raw.sensor_id,
            sensor_name: raw.sensor_name,
            longitude,
            latitude,
            timestamp,
            owning_unit: raw.owning_unit.filter(|u| !u.is_empty()),
        });
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} invalid rows while loading {}", path.display());
    }

    if rows.is_empty() {
        progress.finish_and_clear();
        return Err(IngestError::NoValidRows {
            path: path.display().to_string(),
        });
    }

    progress.finish(format!("Loaded {} sightings", rows.len()));
    log::info!(
        "Loaded {} sightings from {} ({dropped} dropped)",
        rows.len(),
        path.display()
    );

    Ok(SightingTable::new(rows))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "plate_trace_ingest_{name}_{}.csv",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const HEADER: &str = "plate,sensor_id,sensor_name,date,time,longitude,latitude,owning_unit\n";

    #[test]
    fn loads_and_sorts_rows() {
        let csv = format!(
            "{HEADER}\
             AAA-1111,CAM-2,Second St,2025-08-04,09:00:00,121.51,25.01,\n\
             AAA-1111,CAM-1,First St,2025-08-04,08:00:00,121.50,25.00,North\n"
        );
        let path = write_temp_csv("sorts", &csv);
        let table = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].sensor_id, "CAM-1");
        assert_eq!(table.rows()[0].owning_unit.as_deref(), Some("North"));
        assert_eq!(table.vehicles(), vec!["AAA-1111".to_string()]);
    }

    #[test]
    fn drops_rows_with_bad_coordinates() {
        let csv = format!(
            "{HEADER}\
             AAA-1111,CAM-1,First St,2025-08-04,08:00:00,not-a-number,25.00,\n\
             AAA-1111,CAM-2,Second St,2025-08-04,09:00:00,121.51,25.01,\n"
        );
        let path = write_temp_csv("bad_coords", &csv);
        let table = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].sensor_id, "CAM-2");
    }

    #[test]
    fn errors_when_nothing_survives() {
        let csv = format!("{HEADER}AAA-1111,CAM-1,First St,bad-date,08:00:00,121.5,25.0,\n");
        let path = write_temp_csv("empty", &csv);
        let result = load_csv(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(IngestError::NoValidRows { .. })));
    }

    #[test]
    fn sensor_catalog_dedupes_first_occurrence() {
        let csv = format!(
            "{HEADER}\
             AAA-1111,CAM-1,First St,2025-08-04,08:00:00,121.50,25.00,\n\
             BBB-2222,CAM-1,First St,2025-08-04,08:30:00,121.50,25.00,\n\
             AAA-1111,CAM-2,Second St,2025-08-04,09:00:00,121.51,25.01,\n"
        );
        let path = write_temp_csv("dedupe", &csv);
        let table = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let sensors = table.sensors();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0].sensor_id, "CAM-1");
        assert_eq!(sensors[1].sensor_id, "CAM-2");
    }

    #[test]
    fn track_for_filters_one_vehicle() {
        let csv = format!(
            "{HEADER}\
             AAA-1111,CAM-1,First St,2025-08-04,08:00:00,121.50,25.00,\n\
             BBB-2222,CAM-1,First St,2025-08-04,08:30:00,121.50,25.00,\n"
        );
        let path = write_temp_csv("track", &csv);
        let table = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.track_for("BBB-2222").len(), 1);
        assert!(table.track_for("CCC-3333").is_empty());
    }
}
