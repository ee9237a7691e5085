//! Slot-utilization reporting over scan intervals.
//!
//! This module aggregates per-location slot/booking counts per appointment
//! date, tracks location appearance and disappearance between scans, flags
//! anomalous availability patterns, and ranks the most-booked locations.

pub mod anomaly;
pub mod report;
