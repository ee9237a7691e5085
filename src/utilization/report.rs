//! Per-interval utilization reports: location deltas, per-date booking
//! totals, anomaly lists and the top-booked ranking.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::loader::SonRow;
use crate::utilization::anomaly::{has_limited_hours, is_closed_suspicious};

/// Slot/booking sums at one granularity.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Totals {
    pub slots: u64,
    pub booked: u64,
}

impl Totals {
    fn add(&mut self, slots: u32, booked: u32) {
        self.slots += slots as u64;
        self.booked += booked as u64;
    }

    /// Booking percentage; `None` when no slots were observed.
    pub fn percent(&self) -> Option<f64> {
        if self.slots == 0 {
            None
        } else {
            Some(100.0 * self.booked as f64 / self.slots as f64)
        }
    }
}

/// One entry of the top-booked ranking.
#[derive(Debug, Clone, Serialize)]
pub struct TopBooking {
    pub short_addr: String,
    pub booked: u32,
    pub slots: u32,
}

/// Aggregated statistics for one appointment date within one scan.
#[derive(Debug, Clone, Serialize)]
pub struct DateStats {
    pub date: NaiveDate,
    pub all_day: Totals,
    pub block_2h: Totals,
    pub block_45m: Totals,
    pub block_15m: Totals,
    /// All-day totals with closed-suspicious locations removed.
    pub adjusted: Totals,
    /// Fully-booked locations whose slot window already closed.
    pub suspicious: Vec<String>,
    /// Locations with a limited-hours availability bitmap.
    pub limited_hours: Vec<String>,
    /// Most-booked locations, anomalous ones excluded, stable input-order
    /// tie-break.
    pub top_booked: Vec<TopBooking>,
}

/// The full utilization report for one scan interval.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub start: NaiveDateTime,
    pub location_count: usize,
    pub appeared: Vec<String>,
    pub disappeared: Vec<String>,
    pub dates: Vec<DateStats>,
}

/// Analyzes one scan interval.
///
/// `prev_locations` is the location set of the previous reported (not
/// suppressed) interval; `suppress_new` empties the appeared list, used for
/// the very first reported interval to avoid listing the entire inventory
/// as new. Returns the report plus this interval's location set for the
/// next call.
pub fn analyze_scan(
    rows: &[SonRow],
    prev_locations: &BTreeSet<String>,
    start: NaiveDateTime,
    ntop: usize,
    suppress_new: bool,
) -> (ScanReport, BTreeSet<String>) {
    let locations: BTreeSet<String> = rows
        .iter()
        .filter(|r| r.apt_date.is_some())
        .map(|r| r.short_addr.clone())
        .collect();

    let appeared: Vec<String> = if suppress_new {
        Vec::new()
    } else {
        locations.difference(prev_locations).cloned().collect()
    };
    let disappeared: Vec<String> = prev_locations.difference(&locations).cloned().collect();

    // Group by appointment date, preserving row order within each date.
    let mut by_date: BTreeMap<NaiveDate, Vec<&SonRow>> = BTreeMap::new();
    for row in rows {
        if let Some(date) = row.apt_date {
            by_date.entry(date).or_default().push(row);
        }
    }

    let dates = by_date
        .into_iter()
        .map(|(date, rows)| date_stats(date, &rows, ntop))
        .collect();

    let report = ScanReport {
        start,
        location_count: locations.len(),
        appeared,
        disappeared,
        dates,
    };
    (report, locations)
}

fn date_stats(date: NaiveDate, rows: &[&SonRow], ntop: usize) -> DateStats {
    let mut all_day = Totals::default();
    let mut block_2h = Totals::default();
    let mut block_45m = Totals::default();
    let mut block_15m = Totals::default();
    let mut adjusted = Totals::default();
    let mut suspicious = Vec::new();
    let mut limited_hours = Vec::new();
    let mut excluded: HashSet<&str> = HashSet::new();

    for row in rows {
        all_day.add(row.num_slots, row.num_booked);
        block_2h.add(row.num_slots_2h, row.num_booked_2h);
        block_45m.add(row.num_slots_45m, row.num_booked_45m);
        block_15m.add(row.num_slots_15m, row.num_booked_15m);

        if is_closed_suspicious(row) {
            suspicious.push(row.short_addr.clone());
            excluded.insert(row.short_addr.as_str());
        } else {
            adjusted.add(row.num_slots, row.num_booked);
        }
        if has_limited_hours(row) {
            limited_hours.push(row.short_addr.clone());
            excluded.insert(row.short_addr.as_str());
        }
    }

    // Stable sort keeps the input order among equal booking counts.
    let mut ranked: Vec<&&SonRow> = rows
        .iter()
        .filter(|r| !excluded.contains(r.short_addr.as_str()))
        .collect();
    ranked.sort_by(|a, b| b.num_booked.cmp(&a.num_booked));
    let top_booked = ranked
        .into_iter()
        .take(ntop)
        .map(|r| TopBooking {
            short_addr: r.short_addr.clone(),
            booked: r.num_booked,
            slots: r.num_slots,
        })
        .collect();

    DateStats {
        date,
        all_day,
        block_2h,
        block_45m,
        block_15m,
        adjusted,
        suspicious,
        limited_hours,
        top_booked,
    }
}

/// Formats a booking percentage, `—` when no slots were observed.
pub fn percent_str(totals: &Totals) -> String {
    match totals.percent() {
        Some(p) => format!("{p:.1}%"),
        None => "—".to_string(),
    }
}

/// Renders one report as the line-oriented console narrative.
pub fn render_report(report: &ScanReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n===== scan {} =====",
        report.start.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(out, "* Locations: {}.", report.location_count);
    if report.appeared.is_empty() && report.disappeared.is_empty() {
        let _ = writeln!(out, "* No location changes.");
    } else {
        if !report.appeared.is_empty() {
            let _ = writeln!(out, "* New: {}.", report.appeared.join(", "));
        }
        if !report.disappeared.is_empty() {
            let _ = writeln!(out, "* Disappeared: {}.", report.disappeared.join(", "));
        }
    }

    for stats in &report.dates {
        let _ = writeln!(out, "* Appointments on {}:", stats.date.format("%Y-%m-%d"));
        let line = |label: &str, t: &Totals| {
            format!(
                "  - {:<16} {}/{} ({})",
                label,
                t.booked,
                t.slots,
                percent_str(t)
            )
        };
        let _ = writeln!(out, "{}", line("booked:", &stats.all_day));
        let _ = writeln!(out, "{}", line("booked (2h):", &stats.block_2h));
        let _ = writeln!(out, "{}", line("booked (45m):", &stats.block_45m));
        let _ = writeln!(out, "{}", line("booked (15m):", &stats.block_15m));
        if !stats.suspicious.is_empty() {
            let _ = writeln!(out, "{}", line("booked (adj):", &stats.adjusted));
        }
        let mut flagged: Vec<String> = stats
            .suspicious
            .iter()
            .map(|a| format!("{a} (closed)"))
            .collect();
        flagged.extend(
            stats
                .limited_hours
                .iter()
                .map(|a| format!("{a} (limited hours)")),
        );
        if !flagged.is_empty() {
            let _ = writeln!(out, "  - suspicious: {}", flagged.join(", "));
        }
        let compact = stats.top_booked.len() > 4;
        let entries: Vec<String> = stats
            .top_booked
            .iter()
            .map(|t| {
                let addr = if compact {
                    t.short_addr.chars().take(8).collect::<String>()
                } else {
                    t.short_addr.clone()
                };
                format!("{addr} ({}/{})", t.booked, t.slots)
            })
            .collect();
        let _ = writeln!(
            out,
            "  - top-{}: {}",
            stats.top_booked.len(),
            entries.join(", ")
        );
    }
    out
}
