//! Loading of scan snapshot CSV files into typed, time-ordered row
//! collections.
//!
//! Snapshot files follow a fixed naming convention
//! (`<prefix>_scan-YYYY-Www.csv`, or `<prefix>_scan-latest.csv`), may carry
//! `#`-prefixed comment lines, and exist in several historical schema
//! versions: columns absent from older files are defaulted at load time.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A row type carrying a capture timestamp. Lets the multi-file loader order
/// and segment both snapshot variants with the same code.
pub trait TimedRow {
    fn capture_time(&self) -> NaiveDateTime;
}

impl TimedRow for NaiveDateTime {
    fn capture_time(&self) -> NaiveDateTime {
        *self
    }
}

/// One observed appointment-option record from the accessibility-scoring log.
/// Up to three offered options per requested postal code.
#[derive(Debug, Clone, Deserialize)]
pub struct GgdRow {
    #[serde(with = "ts")]
    pub scan_time: NaiveDateTime,
    #[serde(with = "pc4")]
    pub req_pc4: u32,
    #[serde(default, with = "date_opt")]
    pub req_date: Option<NaiveDate>,
    #[serde(default)]
    pub opt0_short_addr: Option<String>,
    #[serde(default, with = "ts_opt")]
    pub opt0_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub opt0_loc_id: Option<String>,
    #[serde(default)]
    pub opt1_short_addr: Option<String>,
    #[serde(default, with = "ts_opt")]
    pub opt1_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub opt1_loc_id: Option<String>,
    #[serde(default)]
    pub opt2_short_addr: Option<String>,
    #[serde(default, with = "ts_opt")]
    pub opt2_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub opt2_loc_id: Option<String>,
}

impl GgdRow {
    /// The offered options with both an address and an appointment time.
    pub fn options(&self) -> impl Iterator<Item = (&str, NaiveDateTime)> {
        [
            (&self.opt0_short_addr, &self.opt0_time),
            (&self.opt1_short_addr, &self.opt1_time),
            (&self.opt2_short_addr, &self.opt2_time),
        ]
        .into_iter()
        .filter_map(|(addr, tm)| match (addr, tm) {
            (Some(a), Some(t)) if !a.is_empty() => Some((a.as_str(), *t)),
            _ => None,
        })
    }
}

impl TimedRow for GgdRow {
    fn capture_time(&self) -> NaiveDateTime {
        self.scan_time
    }
}

/// One per-location slot/booking record from the utilization log.
///
/// Older schema versions lack the finer-granularity counts, the slot bitmap
/// and the API version; those default to zero / empty / version 1.
#[derive(Debug, Clone, Deserialize)]
pub struct SonRow {
    #[serde(with = "ts")]
    pub scan_time: NaiveDateTime,
    #[serde(default, with = "date_opt")]
    pub apt_date: Option<NaiveDate>,
    pub short_addr: String,
    #[serde(default, with = "count")]
    pub num_slots: u32,
    #[serde(default, with = "count")]
    pub num_booked: u32,
    #[serde(default, with = "count")]
    pub num_slots_2h: u32,
    #[serde(default, with = "count")]
    pub num_booked_2h: u32,
    #[serde(default, with = "count")]
    pub num_slots_45m: u32,
    #[serde(default, with = "count")]
    pub num_booked_45m: u32,
    #[serde(default, with = "count")]
    pub num_slots_15m: u32,
    #[serde(default, with = "count")]
    pub num_booked_15m: u32,
    #[serde(default, with = "ts_opt")]
    pub last_tm: Option<NaiveDateTime>,
    #[serde(default)]
    pub all_slots: String,
    #[serde(default = "default_api_version", with = "count")]
    pub api_version: u32,
    #[serde(default)]
    pub xfields: String,
}

fn default_api_version() -> u32 {
    1
}

impl TimedRow for SonRow {
    fn capture_time(&self) -> NaiveDateTime {
        self.scan_time
    }
}

/// Parses the timestamp formats seen across snapshot schema versions.
pub fn parse_ts(s: &str) -> Result<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    bail!("unrecognized timestamp {s:?}")
}

/// Parses a date field; full timestamps are truncated to their date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    parse_ts(s).map(|t| t.date())
}

mod ts {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<chrono::NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        super::parse_ts(&s).map_err(serde::de::Error::custom)
    }
}

mod ts_opt {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<chrono::NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(d)?.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => super::parse_ts(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

mod date_opt {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<chrono::NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(d)?.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => super::parse_date(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

mod pc4 {
    use serde::{Deserialize, Deserializer};

    /// Postal codes appear as integers or as float-typed text (`"3511.0"`).
    pub fn deserialize<'de, D>(d: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        if let Ok(v) = s.trim().parse::<u32>() {
            return Ok(v);
        }
        s.trim()
            .parse::<f64>()
            .map(|v| v as u32)
            .map_err(|_| serde::de::Error::custom(format!("bad postal code {s:?}")))
    }
}

mod count {
    use serde::{Deserialize, Deserializer};

    /// Slot counts from older files may be missing, empty, NaN-valued or
    /// float-typed; all of those normalize to plain integers, absent data
    /// to zero.
    pub fn deserialize<'de, D>(d: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = match Option::<String>::deserialize(d)? {
            None => return Ok(0),
            Some(s) => s,
        };
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nan") {
            return Ok(0);
        }
        if let Ok(v) = s.parse::<u32>() {
            return Ok(v);
        }
        s.parse::<f64>()
            .map(|v| v as u32)
            .map_err(|_| serde::de::Error::custom(format!("bad count {s:?}")))
    }
}

lazy_static! {
    // Suffix after `<prefix>_scan-`: an ISO week token or "latest".
    static ref WEEK_SUFFIX: Regex = Regex::new(r"^\d{4}-W\d{2}\.csv$").unwrap();
}

/// Finds snapshot files for a prefix (`ggd`, `son`) in a data directory.
///
/// Weekly files are returned in ascending filename order (which is
/// chronological for the `YYYY-Www` token); the `-latest.csv` file is used
/// only when no weekly file exists.
///
/// # Errors
///
/// Fails when the directory holds no matching file at all.
pub fn find_scan_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let stem = format!("{prefix}_scan-");
    let mut weekly = Vec::new();
    let mut latest = None;

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read data directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(suffix) = name.strip_prefix(&stem) else {
            continue;
        };
        if WEEK_SUFFIX.is_match(suffix) {
            weekly.push(entry.path());
        } else if suffix == "latest.csv" {
            latest = Some(entry.path());
        }
    }

    weekly.sort();
    if weekly.is_empty() {
        if let Some(latest) = latest {
            return Ok(vec![latest]);
        }
        bail!("no files matching {}/{stem}????-W??.csv", dir.display());
    }
    Ok(weekly)
}

/// Deserializes all rows of one snapshot stream, skipping `#` comment lines.
pub fn read_rows<T, R>(reader: R) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Loads one or more snapshot files into a single row collection, ordered by
/// each file's first capture timestamp.
///
/// Files must not have overlapping capture-time ranges; that case is not
/// validated and the resulting order is unspecified.
pub fn load_files<T>(paths: &[PathBuf]) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned + TimedRow,
{
    let mut chunks: Vec<Vec<T>> = Vec::new();
    for path in paths {
        let file =
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let rows: Vec<T> =
            read_rows(file).with_context(|| format!("cannot parse {}", path.display()))?;
        if rows.is_empty() {
            warn!(path = %path.display(), "snapshot file has no rows, skipping");
            continue;
        }
        debug!(path = %path.display(), rows = rows.len(), "snapshot file loaded");
        chunks.push(rows);
    }
    chunks.sort_by_key(|rows| rows[0].capture_time());
    Ok(chunks.into_iter().flatten().collect())
}

/// The distinct capture timestamps of a row collection, in input order.
pub fn capture_times<T: TimedRow>(rows: &[T]) -> Vec<NaiveDateTime> {
    rows.iter().map(|r| r.capture_time()).collect()
}

/// Loads the known-bad capture timestamps (one `Timestamp` column, `#`
/// comments allowed). A missing file is an empty blacklist, not an error.
pub fn load_blacklist(path: &Path) -> Result<HashSet<NaiveDateTime>> {
    #[derive(Deserialize)]
    struct BadScan {
        #[serde(rename = "Timestamp", with = "ts")]
        timestamp: NaiveDateTime,
    }

    if !path.exists() {
        return Ok(HashSet::new());
    }
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let rows: Vec<BadScan> =
        read_rows(file).with_context(|| format!("cannot parse {}", path.display()))?;
    Ok(rows.into_iter().map(|r| r.timestamp).collect())
}
