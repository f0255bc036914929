//! Session metrics.
//!
//! This module contains:
//! - The pure metrics computation over a finished session log
//! - The report format with JSON save/load and validation

pub mod engine;
pub mod report;

pub use engine::{compute, DEFAULT_SAMPLING_INTERVAL_SECS};
pub use report::{
    CategoryValues, FocusBouts, ReportBuilder, ReportError, ReportMeta, SessionReport,
    Transitions, PRODUCER_NAME,
};
