//! Detection of anomalous location availability patterns.

use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;

use crate::loader::SonRow;

lazy_static! {
    // 4+ unavailable slots, then 4+ available, optional trailing unavailable.
    static ref LIMITED_HOURS: Regex = Regex::new(r"^0{4,}1{4,}0*$").unwrap();
}

/// A fully-booked location whose last observable slot lies more than 15
/// minutes before the capture time. The slot window closed before the scan,
/// so "fully booked" signals a closed location rather than genuine demand.
pub fn is_closed_suspicious(row: &SonRow) -> bool {
    let Some(last_tm) = row.last_tm else {
        return false;
    };
    row.num_slots > 0
        && row.num_booked >= row.num_slots
        && row.scan_time - last_tm > Duration::minutes(15)
}

/// True when the slot-availability bitmap shows a limited-hours pattern:
/// a closed morning block followed by an open block, optionally closing
/// again at the end of the day.
pub fn has_limited_hours(row: &SonRow) -> bool {
    LIMITED_HOURS.is_match(&row.all_slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_ts;
    use chrono::NaiveDate;

    fn son_row(scan: &str, slots: u32, booked: u32, last_tm: Option<&str>, bitmap: &str) -> SonRow {
        SonRow {
            scan_time: parse_ts(scan).unwrap(),
            apt_date: NaiveDate::from_ymd_opt(2022, 2, 6),
            short_addr: "Teststraat 1".to_string(),
            num_slots: slots,
            num_booked: booked,
            num_slots_2h: 0,
            num_booked_2h: 0,
            num_slots_45m: 0,
            num_booked_45m: 0,
            num_slots_15m: 0,
            num_booked_15m: 0,
            last_tm: last_tm.map(|s| parse_ts(s).unwrap()),
            all_slots: bitmap.to_string(),
            api_version: 1,
            xfields: String::new(),
        }
    }

    #[test]
    fn test_closed_location_is_suspicious() {
        let row = son_row(
            "2022-02-05 15:00:00",
            20,
            20,
            Some("2022-02-05 14:00:00"),
            "",
        );
        assert!(is_closed_suspicious(&row));
    }

    #[test]
    fn test_open_window_is_not_suspicious() {
        // Last slot still ahead of the capture time: genuine full booking.
        let row = son_row(
            "2022-02-05 15:00:00",
            20,
            20,
            Some("2022-02-05 17:00:00"),
            "",
        );
        assert!(!is_closed_suspicious(&row));
    }

    #[test]
    fn test_not_fully_booked_is_not_suspicious() {
        let row = son_row(
            "2022-02-05 15:00:00",
            20,
            19,
            Some("2022-02-05 14:00:00"),
            "",
        );
        assert!(!is_closed_suspicious(&row));
    }

    #[test]
    fn test_missing_last_slot_time_is_not_suspicious() {
        let row = son_row("2022-02-05 15:00:00", 20, 20, None, "");
        assert!(!is_closed_suspicious(&row));
    }

    #[test]
    fn test_boundary_exactly_15_minutes_is_not_suspicious() {
        let row = son_row(
            "2022-02-05 15:00:00",
            20,
            20,
            Some("2022-02-05 14:45:00"),
            "",
        );
        assert!(!is_closed_suspicious(&row));
    }

    #[test]
    fn test_limited_hours_bitmap() {
        assert!(has_limited_hours(&son_row("2022-02-05 15:00:00", 1, 0, None, "000011110")));
        assert!(has_limited_hours(&son_row("2022-02-05 15:00:00", 1, 0, None, "00001111")));
        assert!(!has_limited_hours(&son_row("2022-02-05 15:00:00", 1, 0, None, "11110000")));
        assert!(!has_limited_hours(&son_row("2022-02-05 15:00:00", 1, 0, None, "0001111")));
        assert!(!has_limited_hours(&son_row("2022-02-05 15:00:00", 1, 0, None, "")));
        // An interior closed block breaks the pattern.
        assert!(!has_limited_hours(&son_row("2022-02-05 15:00:00", 1, 0, None, "000011001111")));
    }
}
