//! Recurring-pattern mining: stay statistics, home-base detection, and
//! signature-grouped regular movement patterns.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Timelike;
use plate_trace_analysis_models::{
    AnalysisSummary, BaseInfo, HourOfDay, Pattern, PatternConfig, StayAreaStats, StayPatternKind,
    StayPoint, Trip, TripSignature,
};

use crate::stats;

/// Mines a vehicle's trips and stays for recurring structure.
///
/// `area_names` must cover every clustered area (not just the ones the
/// vehicle stayed at) so pass-through areas still resolve to display
/// names. Either input being empty short-circuits to an empty summary,
/// a normal outcome for sparse tracks rather than an error.
#[must_use]
pub fn mine_patterns(
    trips: &[Trip],
    stays: &[StayPoint],
    area_names: &BTreeMap<String, String>,
    config: &PatternConfig,
) -> AnalysisSummary {
    if trips.is_empty() || stays.is_empty() {
        log::debug!(
            "Pattern mining skipped: {} trips, {} stays",
            trips.len(),
            stays.len()
        );
        return AnalysisSummary::default();
    }

    let mut stay_stats = stay_statistics(stays, area_names);
    let base_info = detect_home_bases(stays, &mut stay_stats, config);
    let regular_patterns = regular_patterns(trips, config);

    AnalysisSummary {
        base_info,
        stay_stats,
        regular_patterns,
    }
}

/// Fractional hour of day for circular averaging (hours + minutes; the
/// seconds column of camera exports is noise at this granularity).
fn hour_float(ts: chrono::NaiveDateTime) -> f64 {
    f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0
}

/// Per-area stay statistics, ordered by total stay duration descending.
fn stay_statistics(
    stays: &[StayPoint],
    area_names: &BTreeMap<String, String>,
) -> Vec<StayAreaStats> {
    let mut by_area: BTreeMap<&str, Vec<&StayPoint>> = BTreeMap::new();
    for stay in stays {
        if let Some(area) = stay.kind.area_hint() {
            by_area.entry(area).or_default().push(stay);
        }
    }

    let mut stats_list: Vec<StayAreaStats> = by_area
        .into_iter()
        .map(|(area_id, group)| {
            let durations: Vec<f64> = group.iter().map(|s| s.duration_minutes).collect();
            let arrivals: Vec<f64> = group.iter().map(|s| hour_float(s.start_time)).collect();
            let departures: Vec<f64> = group.iter().map(|s| hour_float(s.end_time)).collect();

            let visit_count = group.len();
            StayAreaStats {
                area_id: area_id.to_string(),
                name: area_names
                    .get(area_id)
                    .cloned()
                    .unwrap_or_else(|| "unknown location".to_string()),
                visit_count,
                total_duration_minutes: durations.iter().sum(),
                avg_duration_minutes: stats::mean(&durations),
                min_duration_minutes: durations.iter().copied().fold(f64::INFINITY, f64::min),
                max_duration_minutes: durations.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                avg_arrival: HourOfDay(stats::circular_mean_hour(&arrivals)),
                avg_departure: HourOfDay(stats::circular_mean_hour(&departures)),
                pattern_kind: if visit_count > 1 {
                    StayPatternKind::MultipleStays
                } else {
                    StayPatternKind::SingleLongStay
                },
                long_stay_count: 0,
            }
        })
        .collect();

    stats_list.sort_by(|a, b| {
        b.total_duration_minutes
            .total_cmp(&a.total_duration_minutes)
    });
    stats_list
}

/// Counts stays beyond the long-stay threshold per area; the area with
/// the most becomes the primary base, and later areas qualify as
/// secondary when their count reaches the secondary threshold.
fn detect_home_bases(
    stays: &[StayPoint],
    stay_stats: &mut [StayAreaStats],
    config: &PatternConfig,
) -> BaseInfo {
    let threshold_minutes = config.long_stay_duration_hours * 60.0;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for stay in stays {
        if stay.duration_minutes > threshold_minutes
            && let Some(area) = stay.kind.area_hint()
        {
            *counts.entry(area).or_insert(0) += 1;
        }
    }

    let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut base_info = BaseInfo::default();
    for (area_id, count) in ordered {
        let Some(entry) = stay_stats.iter_mut().find(|s| s.area_id == area_id) else {
            continue;
        };
        entry.long_stay_count = count;

        if base_info.primary.is_none() {
            base_info.primary = Some(entry.clone());
        } else if count >= config.secondary_base_threshold {
            base_info.secondary.push(entry.clone());
        }
    }

    base_info
}

/// Groups trips by signature and promotes frequent groups to patterns.
fn regular_patterns(trips: &[Trip], config: &PatternConfig) -> Vec<Pattern> {
    let mut groups: HashMap<TripSignature, Vec<&Trip>> = HashMap::new();
    for trip in trips {
        groups.entry(trip.signature()).or_default().push(trip);
    }

    let mut patterns: Vec<Pattern> = groups
        .into_iter()
        .filter(|(_, group)| group.len() >= config.confirmed_threshold)
        .map(|(signature, group)| {
            let durations: Vec<f64> = group.iter().map(|t| t.duration_minutes).collect();
            let start_hours: Vec<f64> = group.iter().map(|t| hour_float(t.start_time)).collect();
            let end_hours: Vec<f64> = group.iter().map(|t| hour_float(t.end_time)).collect();
            let days: BTreeSet<chrono::NaiveDate> =
                group.iter().map(|t| t.start_time.date()).collect();

            Pattern {
                signature,
                occurrence_count: group.len(),
                occurrence_days: days.len(),
                avg_duration_minutes: stats::mean(&durations),
                avg_start_time: HourOfDay(stats::circular_mean_hour(&start_hours)),
                avg_end_time: HourOfDay(stats::circular_mean_hour(&end_hours)),
            }
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.occurrence_count
            .cmp(&a.occurrence_count)
            .then_with(|| a.signature.to_string().cmp(&b.signature.to_string()))
    });
    patterns
}
