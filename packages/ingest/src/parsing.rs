//! Shared parsing helpers for sighting ingestion.
//!
//! Timestamp and coordinate parsing used while validating raw CSV rows.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Date formats accepted in the `date` column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Time formats accepted in the `time` column.
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Combines separate date and time strings into a timestamp.
#[must_use]
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date.trim(), fmt).ok())?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time.trim(), fmt).ok())?;
    Some(date.and_time(time))
}

/// Parses longitude/latitude strings, rejecting non-finite values and
/// coordinates outside the valid range.
#[must_use]
pub fn parse_lon_lat(lon: &str, lat: &str) -> Option<(f64, f64)> {
    let longitude = lon.trim().parse::<f64>().ok()?;
    let latitude = lat.trim().parse::<f64>().ok()?;
    if !longitude.is_finite() || !latitude.is_finite() {
        return None;
    }
    if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
        return None;
    }
    Some((longitude, latitude))
}
