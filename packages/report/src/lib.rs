#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The end-to-end single-vehicle report pipeline.
//!
//! Sequences the analysis core (clustering, stay detection, trip
//! segmentation, pattern mining, anomaly detection), then formats the
//! structured summary, anonymizes it, hands it to the narrative
//! provider, and deanonymizes the result. Each stage that comes up empty
//! halts the pipeline with a typed [`ReportOutcome::Insufficient`]: a
//! normal terminal outcome, never a panic or error. A failing narrative
//! provider degrades the report to the structured summary with a
//! placeholder narrative.

pub mod summary;

use std::collections::BTreeMap;

use plate_trace_ai::providers::LlmProvider;
use plate_trace_analysis::{anomaly, pattern, stay, tag_track, trip};
use plate_trace_analysis_models::{
    AnalysisSummary, AnomalyReport, ClusterConfig, PatternConfig, StayConfig, TripConfig,
};
use plate_trace_anonymize::{anonymize_summary, deanonymize_report};
use plate_trace_ingest::SightingTable;
use plate_trace_spatial::cluster_sensors;
use serde::{Deserialize, Serialize};

/// Thresholds for every stage of the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Camera clustering radius.
    pub cluster: ClusterConfig,
    /// Stay detection thresholds.
    pub stay: StayConfig,
    /// Trip segmentation threshold.
    pub trip: TripConfig,
    /// Pattern mining thresholds.
    pub pattern: PatternConfig,
}

/// Which pipeline stage ran out of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStage {
    /// No sightings for the requested vehicle.
    VehicleFilter,
    /// No stay points found.
    StayDetection,
    /// No trips segmentable.
    TripSegmentation,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VehicleFilter => write!(f, "vehicle filter"),
            Self::StayDetection => write!(f, "stay detection"),
            Self::TripSegmentation => write!(f, "trip segmentation"),
        }
    }
}

/// A completed vehicle report with all intermediate artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleReport {
    /// The analyzed vehicle.
    pub vehicle_id: String,
    /// Structured pattern-mining output.
    pub summary: AnalysisSummary,
    /// Anomaly detection output.
    pub anomalies: AnomalyReport,
    /// Area id -> display name map used for naming.
    pub area_names: BTreeMap<String, String>,
    /// The formatted (pre-anonymization) summary text.
    pub summary_text: String,
    /// Narrative from the provider, when generation succeeded.
    pub narrative: Option<String>,
    /// The final deanonymized report text presented to the user.
    pub final_report: String,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ReportOutcome {
    /// Full report produced.
    Complete(VehicleReport),
    /// A stage found too little data to continue.
    Insufficient {
        /// The stage that halted the pipeline.
        stage: PipelineStage,
        /// Human-readable diagnostic.
        message: String,
    },
}

/// Runs the full report pipeline for one vehicle.
///
/// `provider` is the narrative-generation collaborator; pass `None` to
/// skip generation and present the structured summary only (the same
/// degradation path taken when the provider errors).
pub async fn run_report_pipeline(
    table: &SightingTable,
    vehicle_id: &str,
    config: &ReportConfig,
    provider: Option<&dyn LlmProvider>,
) -> ReportOutcome {
    // Stage A: camera geo-clustering over the full sensor catalog.
    let clustering = cluster_sensors(&table.sensors(), config.cluster.radius_meters);
    log::info!(
        "Clustering complete: {} location areas",
        clustering.area_count()
    );
    let area_names = clustering.area_name_map();

    // Stage B: the target vehicle's track.
    let track = table.track_for(vehicle_id);
    if track.is_empty() {
        return ReportOutcome::Insufficient {
            stage: PipelineStage::VehicleFilter,
            message: format!("no records found for vehicle {vehicle_id}"),
        };
    }
    let tagged = tag_track(&track, &clustering);

    // Stage C: stay points.
    let stays = stay::detect_area_stays(&tagged, &config.stay);
    if stays.is_empty() {
        return ReportOutcome::Insufficient {
            stage: PipelineStage::StayDetection,
            message: format!(
                "no stay points of at least {} minutes found for {vehicle_id}; \
                 widen the query window or integrate more camera sources",
                config.stay.time_threshold_minutes
            ),
        };
    }
    log::info!("Found {} stay events for {vehicle_id}", stays.len());

    // Stage D: trips.
    let trips = trip::segment_trips(&tagged, &config.trip);
    if trips.is_empty() {
        return ReportOutcome::Insufficient {
            stage: PipelineStage::TripSegmentation,
            message: format!("no trips segmentable for {vehicle_id}"),
        };
    }
    log::info!("Segmented {} trips for {vehicle_id}", trips.len());

    // Stage E: recurring patterns and anomalies.
    let analysis = pattern::mine_patterns(&trips, &stays, &area_names, &config.pattern);
    let anomalies = anomaly::detect_anomalies(&trips, &analysis.regular_patterns);

    if log::log_enabled!(log::Level::Debug) {
        match serde_json::to_string_pretty(&analysis) {
            Ok(json) => log::debug!("Structured summary:\n{json}"),
            Err(err) => log::debug!("Structured summary not serializable: {err}"),
        }
    }

    // Stage F: formatted summary -> anonymize -> narrative -> restore.
    let summary_text =
        summary::format_summary(vehicle_id, &analysis, &anomalies, &area_names);

    let ranked_areas: Vec<String> = analysis
        .stay_stats
        .iter()
        .map(|s| s.area_id.clone())
        .collect();
    let (anonymized_text, reversal) =
        anonymize_summary(&summary_text, &area_names, &ranked_areas, vehicle_id);
    log::debug!("Anonymized prompt:\n{anonymized_text}");

    let narrative = match provider {
        Some(p) => match p.generate(&anonymized_text).await {
            Ok(draft) => Some(deanonymize_report(&draft, &reversal)),
            Err(err) => {
                log::error!("Narrative generation failed: {err}");
                None
            }
        },
        None => {
            log::info!("No narrative provider configured; presenting structured summary");
            None
        }
    };

    let final_report = narrative.clone().unwrap_or_else(|| {
        format!("[narrative unavailable: structured summary follows]\n\n{summary_text}")
    });

    ReportOutcome::Complete(VehicleReport {
        vehicle_id: vehicle_id.to_string(),
        summary: analysis,
        anomalies,
        area_names,
        summary_text,
        narrative,
        final_report,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use plate_trace_ai::AiError;
    use plate_trace_sighting_models::Sighting;

    use super::*;

    fn sighting(vehicle: &str, sensor: &str, lon: f64, lat: f64, day: u32, h: u32, m: u32) -> Sighting {
        Sighting {
            vehicle_id: vehicle.to_string(),
            sensor_id: sensor.to_string(),
            sensor_name: format!("{sensor} Rd"),
            longitude: lon,
            latitude: lat,
            timestamp: NaiveDate::from_ymd_opt(2025, 8, day)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            owning_unit: None,
        }
    }

    /// A vehicle commuting between two areas on four weekdays, dwelling
    /// long enough at each end to produce stays.
    fn commuter_table() -> SightingTable {
        let mut rows = Vec::new();
        for day in 4..8 {
            // Morning presence at home cameras (25-minute run).
            rows.push(sighting("CAR-1", "HOME-1", 121.50, 25.00, day, 7, 30));
            rows.push(sighting("CAR-1", "HOME-2", 121.5001, 25.0001, day, 7, 55));
            // Commute: 8:30 -> 9:00, sightings every 10 minutes.
            rows.push(sighting("CAR-1", "MID-1", 121.52, 25.02, day, 8, 30));
            rows.push(sighting("CAR-1", "MID-2", 121.54, 25.04, day, 8, 40));
            rows.push(sighting("CAR-1", "WORK-1", 121.56, 25.06, day, 8, 50));
            // Evening presence at work cameras.
            rows.push(sighting("CAR-1", "WORK-1", 121.56, 25.06, day, 17, 30));
            rows.push(sighting("CAR-1", "WORK-2", 121.5601, 25.0601, day, 17, 55));
        }
        SightingTable::new(rows)
    }

    struct CannedProvider;

    #[async_trait::async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(&self, summary_text: &str) -> Result<String, AiError> {
            assert!(!summary_text.contains("CAR-1"), "prompt must be anonymized");
            Ok("Vehicle-A routinely moves between Area-000 and Area-002.".to_string())
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl LlmProvider for FailingProvider {
        async fn generate(&self, _summary_text: &str) -> Result<String, AiError> {
            Err(AiError::Provider {
                message: "service unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn full_pipeline_produces_a_deanonymized_report() {
        let table = commuter_table();
        let outcome = run_report_pipeline(
            &table,
            "CAR-1",
            &ReportConfig::default(),
            Some(&CannedProvider),
        )
        .await;

        let ReportOutcome::Complete(report) = outcome else {
            panic!("expected a complete report");
        };
        assert!(!report.summary.regular_patterns.is_empty());
        let narrative = report.narrative.as_deref().unwrap();
        // Codes restored to real names and plate.
        assert!(narrative.contains("CAR-1"));
        assert!(narrative.contains("Rd"));
        assert!(!narrative.contains("Vehicle-A"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_structured_summary() {
        let table = commuter_table();
        let outcome = run_report_pipeline(
            &table,
            "CAR-1",
            &ReportConfig::default(),
            Some(&FailingProvider),
        )
        .await;

        let ReportOutcome::Complete(report) = outcome else {
            panic!("expected a complete report");
        };
        assert!(report.narrative.is_none());
        assert!(report.final_report.contains("narrative unavailable"));
        assert!(report.final_report.contains(&report.summary_text));
    }

    #[tokio::test]
    async fn unknown_vehicle_is_insufficient_at_the_filter() {
        let table = commuter_table();
        let outcome =
            run_report_pipeline(&table, "GHOST-0", &ReportConfig::default(), None).await;

        assert!(matches!(
            outcome,
            ReportOutcome::Insufficient {
                stage: PipelineStage::VehicleFilter,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn vehicle_without_dwells_halts_at_stay_detection() {
        // Passing sightings only: never more than a couple of minutes in
        // one area.
        let rows = vec![
            sighting("CAR-2", "MID-1", 121.52, 25.02, 4, 8, 0),
            sighting("CAR-2", "MID-2", 121.54, 25.04, 4, 8, 10),
            sighting("CAR-2", "MID-3", 121.56, 25.06, 4, 8, 20),
        ];
        let outcome = run_report_pipeline(
            &SightingTable::new(rows),
            "CAR-2",
            &ReportConfig::default(),
            None,
        )
        .await;

        assert!(matches!(
            outcome,
            ReportOutcome::Insufficient {
                stage: PipelineStage::StayDetection,
                ..
            }
        ));
    }
}
