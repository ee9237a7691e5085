use chrono::{Duration, NaiveDateTime};

/// Computes the mean of a slice of timestamps as delta-accumulation from the
/// first element, avoiding any averaging of absolute timestamps.
/// Returns the first element's value for a single-element slice.
///
/// # Panics
///
/// Panics on empty input; callers guard against it.
pub fn mean_time(times: &[NaiveDateTime]) -> NaiveDateTime {
    let t0 = times[0];
    let mut delta_sum = Duration::zero();
    for t in times {
        delta_sum += *t - t0;
    }
    t0 + delta_sum / times.len() as i32
}

/// Computes the median of a slice of values. Returns `None` for empty input.
/// For an even count the two middle values are averaged.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Converts a duration to fractional hours.
pub fn hours(d: Duration) -> f64 {
    d.num_seconds() as f64 / 3600.0
}
