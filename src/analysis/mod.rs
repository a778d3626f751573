//! Event stream statistics.
//!
//! Aggregates per-frame event counts into running totals for logging
//! and metrics export. Nothing here feeds back into emulation.

mod statistics;

pub use statistics::StreamStatistics;
