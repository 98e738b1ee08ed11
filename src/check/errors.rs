//! Check error types and diagnostics.

use std::io;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while constructing a checker or running an analyzer.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid severity `{value}`")]
    InvalidSeverity { value: String },

    #[error("failed to execute `{command}`")]
    Execution {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure command for `{tool}`")]
    Command {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load build metadata for env `{env}`")]
    Metadata {
        env: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("clean-up failed for `{tool}`")]
    CleanUp {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CheckError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            CheckError::InvalidSeverity { .. } => {
                diag.with_suggestion(suggestions::VALID_SEVERITIES)
            }
            CheckError::Execution { source, .. } => {
                let diag = diag.with_context(source.to_string());
                if source.kind() == io::ErrorKind::NotFound {
                    diag.with_suggestion(suggestions::ANALYZER_NOT_FOUND)
                } else {
                    diag
                }
            }
            CheckError::Metadata { source, .. } => diag
                .with_context(format!("{:#}", source))
                .with_suggestion(suggestions::STALE_METADATA),
            CheckError::Command { source, .. } | CheckError::CleanUp { source, .. } => {
                diag.with_context(format!("{:#}", source))
            }
        }
    }
}
