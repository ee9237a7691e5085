//! Scan segmentation: partitions a time-ordered capture-timestamp log into
//! discrete scan intervals based on gaps between consecutive timestamps.

use chrono::{Duration, NaiveDateTime};

use crate::loader::TimedRow;

/// Gap threshold for the accessibility-scoring log.
pub fn score_gap() -> Duration {
    Duration::minutes(10)
}

/// Gap threshold for the utilization log.
pub fn utilization_gap() -> Duration {
    Duration::minutes(15)
}

/// Returns scan interval boundaries for an ascending capture-timestamp
/// sequence.
///
/// The first timestamp always starts an interval; a new interval starts
/// wherever two consecutive timestamps differ by more than `gap`. One
/// synthetic boundary is appended one minute past the last timestamp, so
/// scan `i` is the half-open range `[starts[i], starts[i + 1])`.
///
/// An input of `n` boundaries describes `n - 1` scans; empty input yields
/// an empty boundary list.
pub fn scan_starts(times: &[NaiveDateTime], gap: Duration) -> Vec<NaiveDateTime> {
    let Some(first) = times.first() else {
        return Vec::new();
    };
    let mut starts = vec![*first];
    for pair in times.windows(2) {
        if pair[1] - pair[0] > gap {
            starts.push(pair[1]);
        }
    }
    starts.push(times[times.len() - 1] + Duration::minutes(1));
    starts
}

/// Consecutive `[start, stop)` pairs from a boundary list.
pub fn intervals(starts: &[NaiveDateTime]) -> impl Iterator<Item = (NaiveDateTime, NaiveDateTime)> {
    starts.windows(2).map(|w| (w[0], w[1]))
}

/// The contiguous slice of a time-ordered row collection whose capture
/// timestamps fall in `[start, stop)`.
pub fn interval_slice<T: TimedRow>(rows: &[T], start: NaiveDateTime, stop: NaiveDateTime) -> &[T] {
    let lo = rows.partition_point(|r| r.capture_time() < start);
    let hi = rows.partition_point(|r| r.capture_time() < stop);
    &rows[lo..hi]
}
