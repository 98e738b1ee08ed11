//! Defect records produced by analyzer adapters.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::severity::Severity;

/// One diagnostic reported by an analyzer.
///
/// Only `severity` is interpreted by the checker; every other field passes
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectItem {
    pub severity: Severity,
    /// Analyzer category (error, warning, style, performance, ...)
    pub category: String,
    pub message: String,
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    /// Analyzer-specific check identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callstack: Vec<String>,
}

impl DefectItem {
    /// Create a defect with an unknown location.
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        DefectItem {
            severity,
            category: category.into(),
            message: message.into(),
            file: PathBuf::from("unknown"),
            line: 0,
            column: 0,
            id: None,
            cwe: None,
            callstack: Vec::new(),
        }
    }

    pub fn with_location(mut self, file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_cwe(mut self, cwe: u32) -> Self {
        self.cwe = Some(cwe);
        self
    }

    /// Path of the reported file relative to `base`, if it lies beneath it.
    pub fn relpath(&self, base: &Path) -> PathBuf {
        if self.file.is_absolute() {
            pathdiff::diff_paths(&self.file, base).unwrap_or_else(|| self.file.clone())
        } else {
            self.file.clone()
        }
    }
}

impl fmt::Display for DefectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: [{}:{}] {}",
            self.file.display(),
            self.line,
            self.column,
            self.severity,
            self.category,
            self.message
        )?;
        if let Some(ref id) = self.id {
            write!(f, " [{}]", id)?;
        }
        Ok(())
    }
}

/// Defect counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DefectSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl DefectSummary {
    pub fn from_defects<'a>(defects: impl IntoIterator<Item = &'a DefectItem>) -> Self {
        let mut summary = DefectSummary::default();
        for defect in defects {
            summary.add(defect.severity);
        }
        summary
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

impl fmt::Display for DefectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} defect(s): {} high, {} medium, {} low",
            self.total(),
            self.high,
            self.medium,
            self.low
        )
    }
}
