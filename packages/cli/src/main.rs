#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for plate-trace vehicle behavior analysis.
//!
//! With a subcommand it runs one analysis non-interactively; without one
//! it drops into the dialoguer menu.

mod interactive;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plate_trace_ai::providers::{LlmProvider, create_provider_from_env};
use plate_trace_analysis::{convoy, meeting};
use plate_trace_analysis_models::{ConvoyConfig, MeetingConfig};
use plate_trace_cli_utils::IndicatifProgress;
use plate_trace_ingest::{SightingTable, load_csv_with_progress};
use plate_trace_report::{ReportConfig, run_report_pipeline};
use plate_trace_spatial::cluster_sensors;

#[derive(Parser)]
#[command(name = "plate_trace", about = "Vehicle sighting behavior analysis")]
struct Cli {
    /// Path to the sighting CSV export
    #[arg(long, default_value = "data/sightings.csv")]
    data: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deep-analysis report for one vehicle
    Report {
        /// Target plate
        vehicle: String,
        /// Skip narrative generation and print the structured summary
        #[arg(long)]
        no_narrative: bool,
    },
    /// Find vehicles travelling with a target vehicle
    Convoy {
        /// Target plate
        vehicle: String,
        /// Minimum matched points for a convoy segment
        #[arg(long, default_value = "20")]
        min_points: usize,
    },
    /// Find meetings between two vehicles
    Meeting {
        /// First plate
        vehicle_a: String,
        /// Second plate
        vehicle_b: String,
    },
    /// List the vehicles present in the dataset
    Vehicles,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = plate_trace_cli_utils::init_logger();
    let cli = Cli::parse();

    let progress = IndicatifProgress::records_bar(&multi, "Loading sightings...");
    let table = load_csv_with_progress(&cli.data, progress.as_ref())?;

    match cli.command {
        Some(Commands::Report {
            vehicle,
            no_narrative,
        }) => {
            let provider = if no_narrative { None } else { narrative_provider() };
            let outcome = run_report_pipeline(
                &table,
                &vehicle,
                &ReportConfig::default(),
                provider.as_deref(),
            )
            .await;
            render::print_report_outcome(&outcome);
        }
        Some(Commands::Convoy { vehicle, min_points }) => {
            let config = ConvoyConfig {
                min_segment_points: min_points,
                ..ConvoyConfig::default()
            };
            run_convoy(&table, &vehicle, &config);
        }
        Some(Commands::Meeting {
            vehicle_a,
            vehicle_b,
        }) => {
            let meetings =
                meeting::analyze_meetings(&table, &vehicle_a, &vehicle_b, &MeetingConfig::default());
            render::print_meetings(&vehicle_a, &vehicle_b, &meetings);
        }
        Some(Commands::Vehicles) => {
            for vehicle in table.vehicles() {
                println!("{vehicle}");
            }
        }
        None => interactive::run(&table).await?,
    }

    Ok(())
}

/// Builds the narrative provider from the environment, degrading to
/// summary-only reporting when credentials are missing.
fn narrative_provider() -> Option<Box<dyn LlmProvider>> {
    match create_provider_from_env() {
        Ok(provider) => Some(provider),
        Err(err) => {
            log::warn!("Narrative generation disabled: {err}");
            None
        }
    }
}

/// Clusters the sensor catalog and runs convoy analysis.
fn run_convoy(table: &SightingTable, vehicle: &str, config: &ConvoyConfig) {
    let clustering = cluster_sensors(&table.sensors(), 200.0);
    let report = convoy::analyze_convoys(table, vehicle, &clustering, config);
    render::print_convoy(vehicle, &report, config);
}
