use std::collections::BTreeSet;
use std::path::PathBuf;

use scan_rater::loader::{self, GgdRow, SonRow};
use scan_rater::output::{render_console, score_table, to_clipboard_tsv};
use scan_rater::regions::region_table;
use scan_rater::scoring::RegionScore;
use scan_rater::scoring::engine::score_scan;
use scan_rater::segment::{interval_slice, intervals, scan_starts, score_gap, utilization_gap};
use scan_rater::utilization::report::analyze_scan;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn test_scoring_pipeline() {
    let files = loader::find_scan_files(&fixture_dir(), "ggd").expect("fixture files");
    let rows: Vec<GgdRow> = loader::load_files(&files).expect("load ggd rows");
    let times = loader::capture_times(&rows);
    let starts = scan_starts(&times, score_gap());
    let ranges: Vec<_> = intervals(&starts).collect();
    assert_eq!(ranges.len(), 2);

    let scan1 = score_scan(interval_slice(&rows, ranges[0].0, ranges[0].1), region_table());
    let score_of = |scan: &scan_rater::scoring::engine::ScanScores, pc4: u32| {
        scan.scores.iter().find(|s| s.pc4 == pc4).unwrap().score
    };

    // Appointment 2h out at 10:00 query time.
    assert_eq!(score_of(&scan1, 3511), RegionScore::Value(1.0));
    // Two days out, past the day-after-tomorrow-midnight threshold.
    assert_eq!(score_of(&scan1, 5611), RegionScore::Value(6.0));
    // Alias code 2561 scores under the canonical 2515 column.
    assert_eq!(score_of(&scan1, 2515), RegionScore::Value(3.0));
    // No rows observed for this region in scan 1.
    assert_eq!(score_of(&scan1, 9726), RegionScore::Unknown);

    assert_eq!(scan1.min_wait_h, 2.0);
    assert_eq!(scan1.med_wait_h, 10.0);

    let scan2 = score_scan(interval_slice(&rows, ranges[1].0, ranges[1].1), region_table());
    // Rows observed but no option offered.
    assert_eq!(score_of(&scan2, 3511), RegionScore::Value(7.0));
    assert_eq!(score_of(&scan2, 9726), RegionScore::Value(1.0));

    let table = score_table(&[scan1, scan2], region_table());
    let console = render_console(&table);
    assert!(console.starts_with("Date"));
    assert_eq!(console.lines().count(), 3);
    let tsv = to_clipboard_tsv(&table);
    assert!(tsv.lines().next().unwrap().contains("min_wait_h"));
}

#[test]
fn test_blacklist_suppresses_interval() {
    let files = loader::find_scan_files(&fixture_dir(), "ggd").unwrap();
    let rows: Vec<GgdRow> = loader::load_files(&files).unwrap();
    let times = loader::capture_times(&rows);
    let starts = scan_starts(&times, score_gap());
    let ranges: Vec<_> = intervals(&starts).collect();
    let blacklist = loader::load_blacklist(&fixture_dir().join("ggd_bad_scans.txt")).unwrap();

    let reported: Vec<_> = ranges
        .iter()
        .filter(|(start, _)| !blacklist.contains(start))
        .collect();
    // The 14:00 scan is blacklisted; only the morning scan remains.
    assert_eq!(reported.len(), 1);
    assert_eq!(
        reported[0].0,
        loader::parse_ts("2022-02-12 10:00:00").unwrap()
    );
}

#[test]
fn test_utilization_pipeline_location_delta() {
    let files = loader::find_scan_files(&fixture_dir(), "son").expect("fixture files");
    let rows: Vec<SonRow> = loader::load_files(&files).expect("load son rows");
    let times = loader::capture_times(&rows);
    let starts = scan_starts(&times, utilization_gap());
    let ranges: Vec<_> = intervals(&starts).collect();
    assert_eq!(ranges.len(), 2);

    let mut prev = BTreeSet::new();

    let slice1 = interval_slice(&rows, ranges[0].0, ranges[0].1);
    let (report1, locations) = analyze_scan(slice1, &prev, ranges[0].0, 3, true);
    prev = locations;
    // First reported interval: the whole inventory is not "new".
    assert!(report1.appeared.is_empty());
    assert_eq!(report1.location_count, 2);
    assert_eq!(report1.dates.len(), 1);
    assert_eq!(report1.dates[0].all_day.slots, 50);
    assert_eq!(report1.dates[0].all_day.booked, 15);

    let slice2 = interval_slice(&rows, ranges[1].0, ranges[1].1);
    let (report2, _) = analyze_scan(slice2, &prev, ranges[1].0, 3, false);
    assert_eq!(report2.appeared, vec!["Gamma 3"]);
    assert_eq!(report2.disappeared, vec!["Alpha 1"]);
    let top: Vec<&str> = report2.dates[0]
        .top_booked
        .iter()
        .map(|t| t.short_addr.as_str())
        .collect();
    assert_eq!(top, vec!["Beta 2", "Gamma 3"]);
}
