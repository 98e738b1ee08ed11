//! Core data types for harbour-check.
//!
//! - Severities and severity filters
//! - Defect records
//! - Per-run options

pub mod defect;
pub mod options;
pub mod severity;

pub use defect::{DefectItem, DefectSummary};
pub use options::CheckOptions;
pub use severity::{severity_to_int, Severity, SeverityFilter, SeverityValue};
