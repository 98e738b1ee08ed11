//! User-friendly diagnostic messages.
//!
//! Every error shown to the user carries its root cause, the context that led
//! to it, and a suggested fix where one exists.

use std::fmt;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a severity name is not recognized.
    pub const VALID_SEVERITIES: &str = "help: Valid severities are `high`, `medium` and `low` (or codes 1, 2 and 4)";

    /// Suggestion when an analyzer executable cannot be started.
    pub const ANALYZER_NOT_FOUND: &str =
        "help: Check that the analyzer is installed and on your PATH";

    /// Suggestion when an unknown tool is requested.
    pub const TOOL_NOT_CONFIGURED: &str =
        "help: Define the tool under `[tools.<name>]` in .harbour/check.toml";

    /// Suggestion when a check run fails.
    pub const CHECK_FAILED: &str = "help: Run `harbour-check check --verbose` for more details";

    /// Suggestion when build metadata cannot be read.
    pub const STALE_METADATA: &str =
        "help: Rebuild with `harbour build --emit-compile-commands` to refresh compile_commands.json";
}

/// An error message with context and suggested fixes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let level_str = if color {
            "\x1b[1;31merror\x1b[0m"
        } else {
            "error"
        };

        output.push_str(&format!("{}: {}\n", level_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                output.push_str(&format!("{}\n", suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
