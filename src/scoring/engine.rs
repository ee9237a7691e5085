//! Per-interval scoring: maps the raw option records of one scan interval to
//! one score per region, plus the interval's representative timestamp and
//! wait-time statistics.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::loader::GgdRow;
use crate::regions::RegionTable;
use crate::scoring::RegionScore;
use crate::scoring::thresholds::{pick_score, score_thresholds};
use crate::util::{hours, mean_time, median};

/// Sentinel wait time (hours) for an interval without any matching option.
pub const NO_DATA_WAIT_H: f64 = 999.0;

/// One region's score within a scan.
#[derive(Debug, Clone, Serialize)]
pub struct PcScore {
    pub pc4: u32,
    pub score: RegionScore,
}

/// The scored result of one scan interval.
#[derive(Debug, Clone, Serialize)]
pub struct ScanScores {
    /// Representative timestamp: midpoint of the per-region query times,
    /// or the interval's median-row capture time when nothing was scored.
    pub timestamp: NaiveDateTime,
    /// One entry per known region, in table order.
    pub scores: Vec<PcScore>,
    pub min_wait_h: f64,
    pub med_wait_h: f64,
}

/// Scores one scan interval. Pure function of its inputs: identical rows
/// always produce identical output.
///
/// Rows referencing a postal code outside the region table are logged at
/// info level and skipped.
///
/// # Panics
///
/// Panics on an empty row slice; scan intervals hold at least one row by
/// construction.
pub fn score_scan(rows: &[GgdRow], table: &RegionTable) -> ScanScores {
    let mut unknown_codes: HashSet<u32> = HashSet::new();
    for row in rows {
        if table.canonical(row.req_pc4).is_none() && unknown_codes.insert(row.req_pc4) {
            info!(pc4 = row.req_pc4, "requested postal code not in region table");
        }
    }

    let mut scores = Vec::with_capacity(table.len());
    let mut query_times: Vec<NaiveDateTime> = Vec::new();
    let mut wait_hours: Vec<f64> = Vec::new();

    for region in table.regions() {
        let mut observed = false;
        // (capture time, appointment time) per accepted option.
        let mut options: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
        for row in rows {
            if table.canonical(row.req_pc4) != Some(region.key) {
                continue;
            }
            observed = true;
            for (addr, appt) in row.options() {
                // Short addresses carry a fixed "1234 " postal prefix.
                let Some(city) = addr.get(5..) else { continue };
                if region.matches_city(city) {
                    options.push((row.scan_time, appt));
                }
            }
        }

        let score = if options.is_empty() {
            if observed {
                // Rows seen, nothing acceptable offered.
                RegionScore::Value(7.0)
            } else {
                RegionScore::Unknown
            }
        } else {
            let capture_times: Vec<_> = options.iter().map(|(c, _)| *c).collect();
            let qtm = mean_time(&capture_times);
            let earliest = options
                .iter()
                .map(|(_, a)| *a)
                .min()
                .expect("options is non-empty");
            for (capture, appt) in &options {
                wait_hours.push(hours(*appt - *capture));
            }
            query_times.push(qtm);
            RegionScore::Value(pick_score(&score_thresholds(qtm), earliest))
        };
        scores.push(PcScore {
            pc4: region.key,
            score,
        });
    }

    let timestamp = match (query_times.iter().min(), query_times.iter().max()) {
        (Some(min), Some(max)) => *min + (*max - *min) / 2,
        _ => rows[rows.len() / 2].scan_time,
    };

    let (min_wait_h, med_wait_h) = if wait_hours.is_empty() {
        (NO_DATA_WAIT_H, NO_DATA_WAIT_H)
    } else {
        let min = wait_hours.iter().cloned().fold(f64::INFINITY, f64::min);
        let med = median(&wait_hours).unwrap_or(NO_DATA_WAIT_H);
        (min, med)
    };

    ScanScores {
        timestamp,
        scores,
        min_wait_h,
        med_wait_h,
    }
}
