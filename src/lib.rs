//! harbour-check - static analysis for C/C++ projects
//!
//! This crate runs external analyzers (cppcheck, clang-tidy, ...) behind a
//! single adapter interface: it builds each analyzer's command line, streams
//! its output, turns diagnostic lines into defect records and filters them by
//! severity.

pub mod check;
pub mod core;
pub mod metadata;
pub mod toolchain;
pub mod util;

pub use check::{CheckContext, CheckError, CheckTool, Checker, ParsedLine, PatternTool};
pub use core::{CheckOptions, DefectItem, Severity};
pub use metadata::{BuildMetadata, CompileCommandsProvider, MetadataProvider};
