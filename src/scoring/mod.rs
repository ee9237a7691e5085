//! Accessibility scoring of scan intervals.
//!
//! This module turns the appointment options observed for one region within
//! one scan interval into a single ordinal score on a 1–7 scale (lower is
//! better: a faster earliest appointment relative to the query time), via a
//! priority-ordered time-threshold table.

pub mod engine;
pub mod thresholds;

use serde::{Serialize, Serializer};
use std::fmt;

/// One region's score for one scan interval.
///
/// `Unknown` means no row was observed for the region at all; `Value(7.0)`
/// means rows were observed but no acceptable option was offered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionScore {
    Unknown,
    Value(f64),
}

impl RegionScore {
    pub fn value(self) -> Option<f64> {
        match self {
            RegionScore::Unknown => None,
            RegionScore::Value(v) => Some(v),
        }
    }

    fn is_integral(self) -> bool {
        matches!(self, RegionScore::Value(v) if v.fract() == 0.0)
    }
}

impl fmt::Display for RegionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionScore::Unknown => write!(f, "?"),
            RegionScore::Value(v) if self.is_integral() => write!(f, "{}", *v as i64),
            RegionScore::Value(v) => write!(f, "{v:.1}"),
        }
    }
}

impl Serialize for RegionScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RegionScore::Unknown => serializer.serialize_str("?"),
            RegionScore::Value(v) if self.is_integral() => serializer.serialize_i64(*v as i64),
            RegionScore::Value(v) => serializer.serialize_f64(*v),
        }
    }
}
