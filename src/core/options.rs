//! Options for one analysis run.

use serde::{Deserialize, Serialize};

use super::severity::SeverityValue;

/// Default source filter: every file in the project.
pub const DEFAULT_SRC_FILTER: &str = "+<*>";

/// Options governing one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Accepted severities, by name or code (empty = all)
    pub severity: Vec<SeverityValue>,

    /// Extra analyzer flags, optionally scoped as `tool:<flags>`
    pub flags: Vec<String>,

    /// Echo commands and unparsed analyzer output
    pub verbose: bool,

    /// Source filter patterns (`+<glob>` / `-<glob>`)
    pub filter: Vec<String>,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn severity<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SeverityValue>,
    {
        self.severity = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn filter<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Filter patterns, falling back to the default when none are configured.
    pub fn src_filter(&self) -> Vec<String> {
        if self.filter.is_empty() {
            vec![DEFAULT_SRC_FILTER.to_string()]
        } else {
            self.filter.clone()
        }
    }
}
