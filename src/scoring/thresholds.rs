//! The score threshold table.
//!
//! Thresholds are anchored at the query time (`qtm`) and at its calendar
//! midnight (`qtm_00`) and walked in priority order; the first threshold
//! lying strictly after the earliest offered appointment decides the score.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// A `hh:mm` offset as a duration.
fn hhmm(h: i64, m: i64) -> Duration {
    Duration::minutes(h * 60 + m)
}

/// Builds the priority-ordered `(score, threshold)` list for one query time.
///
/// The fixed tail of the table:
///
/// | Score | Threshold        |
/// |-------|------------------|
/// | 3     | qtm_00 + 23:59   |
/// | 4     | qtm + 24:00      |
/// | 5     | qtm_00 + 48:00   |
/// | 6     | qtm + 48:00      |
/// | 6.3   | qtm_00 + 72:00   |
/// | 6.7   | qtm + 72:00      |
///
/// One or two faster-score entries are prepended depending on the hour of
/// day of the query: `[00,09)` → 1 at qtm_00+13:00; `[09,13)` → 1 at
/// qtm+4:00; `[13,17)` → 1 at qtm_00+24:00 and 2 at qtm+20:00; `[17,24)` →
/// 1 at qtm_00+24:00 and 2 at qtm_00+37:00.
pub fn score_thresholds(qtm: NaiveDateTime) -> Vec<(f64, NaiveDateTime)> {
    let qtm_00 = qtm.date().and_time(NaiveTime::MIN);
    let mut thresholds = vec![
        (3.0, qtm_00 + hhmm(23, 59)),
        (4.0, qtm + hhmm(24, 0)),
        (5.0, qtm_00 + hhmm(48, 0)),
        (6.0, qtm + hhmm(48, 0)),
        (6.3, qtm_00 + hhmm(72, 0)),
        (6.7, qtm + hhmm(72, 0)),
    ];
    match qtm.hour() {
        0..=8 => thresholds.insert(0, (1.0, qtm_00 + hhmm(13, 0))),
        9..=12 => thresholds.insert(0, (1.0, qtm + hhmm(4, 0))),
        13..=16 => {
            thresholds.insert(0, (1.0, qtm_00 + hhmm(24, 0)));
            thresholds.insert(1, (2.0, qtm + hhmm(20, 0)));
        }
        _ => {
            thresholds.insert(0, (1.0, qtm_00 + hhmm(24, 0)));
            thresholds.insert(1, (2.0, qtm_00 + hhmm(37, 0)));
        }
    }
    thresholds
}

/// First score whose threshold lies strictly after the earliest appointment;
/// 7 (worst) when no threshold does.
pub fn pick_score(thresholds: &[(f64, NaiveDateTime)], earliest_appt: NaiveDateTime) -> f64 {
    thresholds
        .iter()
        .find(|(_, tm)| earliest_appt < *tm)
        .map(|(score, _)| *score)
        .unwrap_or(7.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn score_for(qtm: &str, appt: &str) -> f64 {
        pick_score(&score_thresholds(ts(qtm)), ts(appt))
    }

    #[test]
    fn test_morning_bucket_prepends_single_entry() {
        let thresholds = score_thresholds(ts("2022-02-12 10:00:00"));
        assert_eq!(thresholds[0], (1.0, ts("2022-02-12 14:00:00")));
        assert_eq!(thresholds[1].0, 3.0);
        assert_eq!(thresholds.len(), 7);
    }

    #[test]
    fn test_afternoon_buckets_prepend_two_entries() {
        let thresholds = score_thresholds(ts("2022-02-12 14:00:00"));
        assert_eq!(thresholds[0], (1.0, ts("2022-02-13 00:00:00")));
        assert_eq!(thresholds[1], (2.0, ts("2022-02-13 10:00:00")));

        let thresholds = score_thresholds(ts("2022-02-12 18:00:00"));
        assert_eq!(thresholds[0], (1.0, ts("2022-02-13 00:00:00")));
        assert_eq!(thresholds[1], (2.0, ts("2022-02-13 13:00:00")));
    }

    #[test]
    fn test_early_morning_bucket() {
        let thresholds = score_thresholds(ts("2022-02-12 07:30:00"));
        assert_eq!(thresholds[0], (1.0, ts("2022-02-12 13:00:00")));
    }

    #[test]
    fn test_score_at_hour_10() {
        // Bucket [09:00, 13:00): score 1 up to qtm + 4h.
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-12 13:00:00"), 1.0);
        // Same day after the 4h window, still before midnight: score 3.
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-12 20:00:00"), 3.0);
        // qtm + 25h has passed both the 23:59 and qtm+24h thresholds; the
        // next-day-midnight + 48h threshold catches it.
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-13 11:00:00"), 5.0);
    }

    #[test]
    fn test_score_ladder_far_out() {
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-14 09:00:00"), 6.0);
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-14 12:00:00"), 6.3);
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-15 09:00:00"), 6.7);
        // Beyond every threshold: worst score.
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-20 10:00:00"), 7.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // An appointment exactly on a threshold does not take its score.
        assert_eq!(score_for("2022-02-12 10:00:00", "2022-02-12 14:00:00"), 3.0);
    }
}
