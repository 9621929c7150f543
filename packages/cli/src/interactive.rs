//! Interactive menu for plate-trace analysis.
//!
//! Menu-driven selection of vehicle(s) and analysis mode using
//! `dialoguer`. Invalid input is reported and returns to the menu; it
//! never reaches the analysis core.

use dialoguer::Select;
use plate_trace_analysis::{convoy, meeting};
use plate_trace_analysis_models::{ConvoyConfig, MeetingConfig};
use plate_trace_ingest::SightingTable;
use plate_trace_report::{ReportConfig, run_report_pipeline};
use plate_trace_spatial::cluster_sensors;

use crate::{narrative_provider, render};

/// Top-level actions in the analysis menu.
enum AnalysisAction {
    SingleReport,
    Convoy,
    Meeting,
    ListVehicles,
    Quit,
}

impl AnalysisAction {
    const ALL: &[Self] = &[
        Self::SingleReport,
        Self::Convoy,
        Self::Meeting,
        Self::ListVehicles,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::SingleReport => "Generate single-vehicle analysis report",
            Self::Convoy => "Find convoy partners for a vehicle",
            Self::Meeting => "Find meetings between two vehicles",
            Self::ListVehicles => "List vehicles in the dataset",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive menu loop.
///
/// # Errors
///
/// Returns an error if a prompt fails (e.g. the terminal goes away);
/// analysis-level problems are printed and return to the menu.
pub async fn run(table: &SightingTable) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = AnalysisAction::ALL.iter().map(AnalysisAction::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("plate-trace analysis")
            .items(&labels)
            .default(0)
            .interact()?;

        match AnalysisAction::ALL[idx] {
            AnalysisAction::SingleReport => handle_report(table).await?,
            AnalysisAction::Convoy => handle_convoy(table)?,
            AnalysisAction::Meeting => handle_meeting(table)?,
            AnalysisAction::ListVehicles => {
                for vehicle in table.vehicles() {
                    println!("  {vehicle}");
                }
            }
            AnalysisAction::Quit => return Ok(()),
        }
    }
}

/// Prompts for one vehicle from the dataset.
fn pick_vehicle(
    table: &SightingTable,
    prompt: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let vehicles = table.vehicles();
    if vehicles.is_empty() {
        println!("No vehicles in the dataset.");
        return Ok(None);
    }

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&vehicles)
        .default(0)
        .interact()?;

    Ok(vehicles.into_iter().nth(idx))
}

async fn handle_report(table: &SightingTable) -> Result<(), Box<dyn std::error::Error>> {
    let Some(vehicle) = pick_vehicle(table, "Select the vehicle to analyze")? else {
        return Ok(());
    };

    let provider = narrative_provider();
    let outcome =
        run_report_pipeline(table, &vehicle, &ReportConfig::default(), provider.as_deref()).await;
    render::print_report_outcome(&outcome);
    Ok(())
}

fn handle_convoy(table: &SightingTable) -> Result<(), Box<dyn std::error::Error>> {
    let Some(vehicle) = pick_vehicle(table, "Select the target vehicle")? else {
        return Ok(());
    };

    let config = ConvoyConfig::default();
    let clustering = cluster_sensors(&table.sensors(), 200.0);
    let report = convoy::analyze_convoys(table, &vehicle, &clustering, &config);
    render::print_convoy(&vehicle, &report, &config);
    Ok(())
}

fn handle_meeting(table: &SightingTable) -> Result<(), Box<dyn std::error::Error>> {
    let Some(vehicle_a) = pick_vehicle(table, "Select the first vehicle")? else {
        return Ok(());
    };
    let Some(vehicle_b) = pick_vehicle(table, "Select the second vehicle")? else {
        return Ok(());
    };
    if vehicle_a == vehicle_b {
        println!("Pick two different vehicles.");
        return Ok(());
    }

    let meetings =
        meeting::analyze_meetings(table, &vehicle_a, &vehicle_b, &MeetingConfig::default());
    render::print_meetings(&vehicle_a, &vehicle_b, &meetings);
    Ok(())
}
