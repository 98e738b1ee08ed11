//! Configuration file support for harbour-check.
//!
//! Two configuration file locations are read:
//! - Global: `~/.harbour/check.toml` - User-wide defaults
//! - Project: `.harbour/check.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::check::ToolDefinition;
use crate::core::{CheckOptions, SeverityValue};

/// harbour-check configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run settings
    pub check: CheckConfig,

    /// Analyzer definitions, by tool name
    pub tools: BTreeMap<String, ToolDefinition>,
}

/// Settings for a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Build environment whose metadata is used
    pub env: Option<String>,

    /// Tools to run (empty = every defined tool)
    pub tools: Vec<String>,

    /// Accepted severities, by name or code
    pub severity: Vec<SeverityValue>,

    /// Analyzer flags, optionally `tool:`-scoped
    pub flags: Vec<String>,

    /// Source filter patterns
    pub filter: Vec<String>,

    pub verbose: bool,

    /// Severities that make the run fail when reported
    pub fail_on_defect: Vec<SeverityValue>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Lists are replaced, not appended; tool definitions are replaced by name.
    pub fn merge(&mut self, other: Config) {
        let check = other.check;
        if check.env.is_some() {
            self.check.env = check.env;
        }
        if !check.tools.is_empty() {
            self.check.tools = check.tools;
        }
        if !check.severity.is_empty() {
            self.check.severity = check.severity;
        }
        if !check.flags.is_empty() {
            self.check.flags = check.flags;
        }
        if !check.filter.is_empty() {
            self.check.filter = check.filter;
        }
        if check.verbose {
            self.check.verbose = true;
        }
        if !check.fail_on_defect.is_empty() {
            self.check.fail_on_defect = check.fail_on_defect;
        }

        self.tools.extend(other.tools);
    }

    /// Run options derived from the `[check]` section.
    pub fn options(&self) -> CheckOptions {
        CheckOptions {
            severity: self.check.severity.clone(),
            flags: self.check.flags.clone(),
            verbose: self.check.verbose,
            filter: self.check.filter.clone(),
        }
    }

    /// Names of the tools to run, in configuration order.
    pub fn selected_tools(&self) -> Vec<String> {
        if self.check.tools.is_empty() {
            self.tools.keys().cloned().collect()
        } else {
            self.check.tools.clone()
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.harbour/check.toml)
/// 2. Global config (~/.harbour/check.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global harbour config directory (~/.harbour).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".harbour"))
}

/// Get the global check config path (~/.harbour/check.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("check.toml"))
}

/// Get the project check config path (.harbour/check.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".harbour").join("check.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.check.env.is_none());
        assert!(config.check.severity.is_empty());
        assert!(!config.check.verbose);
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("check.toml");

        std::fs::write(
            &config_path,
            r#"
[check]
env = "release"
severity = ["high", 2]
flags = ["-q", "lint:--strict"]
filter = ["+<src/>"]

[tools.lint]
command = ["lint", "{flags}", "{sources}"]
pattern = '^(?P<file>[^:]+):(?P<line>\d+): (?P<severity>\w+): (?P<message>.*)$'

[tools.lint.severity_map]
style = "low"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.check.env.as_deref(), Some("release"));
        assert_eq!(
            config.check.severity,
            vec![SeverityValue::Name("high".to_string()), SeverityValue::Code(2)]
        );
        assert_eq!(config.selected_tools(), vec!["lint"]);

        let lint = &config.tools["lint"];
        assert_eq!(lint.command.len(), 3);
        assert_eq!(lint.severity_map.get("style"), Some(&Severity::Low));

        let options = config.options();
        assert_eq!(options.flags, vec!["-q", "lint:--strict"]);
        assert_eq!(options.filter, vec!["+<src/>"]);
    }

    #[test]
    fn test_config_load_invalid() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("check.toml");
        std::fs::write(&config_path, "[check\nenv = ").unwrap();

        assert!(Config::load(&config_path).is_err());
        assert_eq!(Config::load_or_default(&config_path), Config::default());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.check.env = Some("debug".to_string());
        base.check.flags = vec!["-q".to_string()];
        base.tools.insert("a".to_string(), ToolDefinition::default());

        let mut override_cfg = Config::default();
        override_cfg.check.flags = vec!["-v".to_string()];
        override_cfg.tools.insert("b".to_string(), ToolDefinition::default());

        base.merge(override_cfg);

        assert_eq!(base.check.env.as_deref(), Some("debug"));
        assert_eq!(base.check.flags, vec!["-v"]);
        assert_eq!(base.selected_tools(), vec!["a", "b"]);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[check]
env = "debug"
severity = ["low"]
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[check]
severity = ["high"]
tools = ["lint"]
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);
        assert_eq!(config.check.env.as_deref(), Some("debug"));
        assert_eq!(
            config.check.severity,
            vec![SeverityValue::Name("high".to_string())]
        );
        assert_eq!(config.selected_tools(), vec!["lint"]);
    }

    #[test]
    fn test_project_config_path() {
        let path = project_config_path(Path::new("/work/app"));
        assert_eq!(path, PathBuf::from("/work/app/.harbour/check.toml"));
    }
}
