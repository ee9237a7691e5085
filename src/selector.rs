//! Scan selection tokens from the command line.
//!
//! One positional argument picks which scans to report: a slice-style index
//! range `start:stop[:step]` (negative indices count from the end), a
//! comma-separated index list, or an ISO week token `YYYY-Www` naming a
//! weekly snapshot file. Absence selects the most recent scans.

use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// No token given: the most recent N scans (N is a per-variant default).
    Latest,
    /// `start:stop[:step]`, any part optional, negatives from the end.
    Range {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// Explicit scan indices, `3,5,9`.
    List(Vec<i64>),
    /// `YYYY-Www`: all scans of the matching weekly file.
    Week(String),
}

lazy_static! {
    static ref WEEK_TOKEN: Regex = Regex::new(r"^\d{4}-W\d{2}$").unwrap();
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if WEEK_TOKEN.is_match(s) {
            return Ok(Selector::Week(s.to_string()));
        }
        if s.contains(':') {
            let parts: Vec<&str> = s.split(':').collect();
            if parts.len() > 3 {
                return Err(format!("too many ':' in range {s:?}"));
            }
            let field = |i: usize| -> Result<Option<i64>, String> {
                match parts.get(i) {
                    None | Some(&"") => Ok(None),
                    Some(p) => p
                        .parse::<i64>()
                        .map(Some)
                        .map_err(|_| format!("bad index {p:?} in range {s:?}")),
                }
            };
            let step = field(2)?;
            if step == Some(0) {
                return Err(format!("zero step in range {s:?}"));
            }
            if matches!(step, Some(n) if n < 0) {
                return Err(format!("negative step in range {s:?}"));
            }
            return Ok(Selector::Range {
                start: field(0)?,
                stop: field(1)?,
                step,
            });
        }
        let indices: Result<Vec<i64>, String> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<i64>()
                    .map_err(|_| format!("bad scan index {p:?}"))
            })
            .collect();
        Ok(Selector::List(indices?))
    }
}

impl Selector {
    /// Resolves this selector to concrete ascending scan indices, given the
    /// total scan count and the default most-recent window.
    ///
    /// Out-of-range list entries are dropped. `Week` resolves to all scans:
    /// week tokens select files, not indices.
    pub fn resolve(&self, n_scans: usize, latest_n: usize) -> Vec<usize> {
        let n = n_scans as i64;
        let clamp_index = |i: i64| -> i64 {
            let i = if i < 0 { i + n } else { i };
            i.clamp(0, n)
        };
        match self {
            Selector::Latest => {
                let start = n_scans.saturating_sub(latest_n);
                (start..n_scans).collect()
            }
            Selector::Week(_) => (0..n_scans).collect(),
            Selector::Range { start, stop, step } => {
                let start = clamp_index(start.unwrap_or(0));
                let stop = clamp_index(stop.unwrap_or(n));
                let step = step.unwrap_or(1) as usize;
                (start..stop)
                    .step_by(step.max(1))
                    .map(|i| i as usize)
                    .collect()
            }
            Selector::List(indices) => indices
                .iter()
                .map(|i| if *i < 0 { i + n } else { *i })
                .filter(|i| (0..n).contains(i))
                .map(|i| i as usize)
                .collect(),
        }
    }

    pub fn week(&self) -> Option<&str> {
        match self {
            Selector::Week(w) => Some(w),
            _ => None,
        }
    }
}
