//! Small statistics helpers shared by the detectors.

use std::f64::consts::PI;

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Circular mean of hours on a 24-hour clock.
///
/// Each hour maps to an angle on the circle; the means of the sine and
/// cosine components are converted back through `atan2`, so times
/// straddling midnight average correctly (23:54 and 00:06 give ~00:00,
/// not 12:00). Result is normalized into `[0, 24)`.
#[must_use]
pub fn circular_mean_hour(hours: &[f64]) -> f64 {
    if hours.is_empty() {
        return 0.0;
    }

    let radians: Vec<f64> = hours.iter().map(|h| 2.0 * PI * h / 24.0).collect();
    let sin_avg = mean(&radians.iter().map(|r| r.sin()).collect::<Vec<_>>());
    let cos_avg = mean(&radians.iter().map(|r| r.cos()).collect::<Vec<_>>());

    let avg_hour = sin_avg.atan2(cos_avg) * 24.0 / (2.0 * PI);
    if avg_hour < 0.0 { avg_hour + 24.0 } else { avg_hour }
}

/// Quantile with linear interpolation between order statistics.
///
/// `sorted` must be ascending and non-empty; `q` in `[0, 1]`.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }

    #[allow(clippy::cast_precision_loss)]
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - pos.floor();

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Median via [`quantile`] at 0.5.
#[must_use]
pub fn median(sorted: &[f64]) -> f64 {
    quantile(sorted, 0.5)
}
