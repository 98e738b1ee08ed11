//! Defect severity and severity filters.
//!
//! Each severity carries a stable integer code (`high = 1`, `medium = 2`,
//! `low = 4`). Configuration may name severities either way, so filters are
//! normalized to [`Severity`] values once, when a checker is constructed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::check::CheckError;

/// Severity of a reported defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Integer code of this severity.
    pub fn code(self) -> u8 {
        match self {
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 4,
        }
    }

    /// Severity for an integer code, if the code is known.
    pub fn from_code(code: u8) -> Option<Severity> {
        Severity::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Lowercase label used in configuration and output.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| CheckError::InvalidSeverity {
                value: s.to_string(),
            })
    }
}

/// Map a symbolic severity name to its integer code.
pub fn severity_to_int(name: &str) -> Result<u8, CheckError> {
    name.parse::<Severity>().map(Severity::code)
}

/// One entry of a user-supplied severity filter.
///
/// Accepts `"high"` as well as `1` so that configuration written by hand and
/// configuration re-serialized from codes load the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeverityValue {
    Code(u8),
    Name(String),
}

impl SeverityValue {
    /// Resolve this entry to a severity.
    pub fn resolve(&self) -> Result<Severity, CheckError> {
        match self {
            SeverityValue::Code(code) => {
                Severity::from_code(*code).ok_or_else(|| CheckError::InvalidSeverity {
                    value: code.to_string(),
                })
            }
            SeverityValue::Name(name) => name.parse(),
        }
    }
}

impl From<Severity> for SeverityValue {
    fn from(severity: Severity) -> Self {
        SeverityValue::Code(severity.code())
    }
}

impl From<&str> for SeverityValue {
    fn from(name: &str) -> Self {
        // Numeric strings from the command line are codes.
        match name.parse::<u8>() {
            Ok(code) => SeverityValue::Code(code),
            Err(_) => SeverityValue::Name(name.to_string()),
        }
    }
}

/// A normalized set of accepted severities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityFilter {
    accepted: Vec<Severity>,
}

impl SeverityFilter {
    /// Normalize raw filter entries.
    ///
    /// An empty list accepts every severity.
    pub fn normalize(values: &[SeverityValue]) -> Result<Self, CheckError> {
        if values.is_empty() {
            return Ok(Self::all());
        }

        let mut accepted = Vec::with_capacity(values.len());
        for value in values {
            let severity = value.resolve()?;
            if !accepted.contains(&severity) {
                accepted.push(severity);
            }
        }
        Ok(SeverityFilter { accepted })
    }

    /// A filter that accepts everything.
    pub fn all() -> Self {
        SeverityFilter {
            accepted: Severity::ALL.to_vec(),
        }
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        self.accepted.contains(&severity)
    }

    /// The accepted severities as configuration entries (integer codes).
    pub fn to_values(&self) -> Vec<SeverityValue> {
        self.accepted.iter().copied().map(SeverityValue::from).collect()
    }

    pub fn severities(&self) -> &[Severity] {
        &self.accepted
    }
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self::all()
    }
}
