//! Configuration-driven analyzer adapter.
//!
//! A [`PatternTool`] wraps any analyzer whose diagnostics fit on one line. It
//! is defined in configuration:
//!
//! ```toml
//! [tools.cppcheck]
//! command = ["cppcheck", "--template={file}:{line}:{column}: {severity}: {message} [{id}]",
//!            "{flags}", "{includes}", "{defines}", "{sources}"]
//! pattern = '^(?P<file>[^:]+):(?P<line>\d+):(?P<column>\d+): (?P<severity>\w+): (?P<message>.*?)( \[(?P<id>\w+)\])?$'
//! ignore = ['^Checking ']
//! bad_input = ['^cppcheck: error:']
//!
//! [tools.cppcheck.severity_map]
//! style = "low"
//! ```
//!
//! `default_flags` entries are inserted at `{flags}` unless the user's flags
//! for the tool already mention the same option (the part before `=`).
//!
//! Command arguments that are exactly `{flags}`, `{includes}`, `{defines}` or
//! `{sources}` expand to zero or more arguments. `{project_dir}` and `{env}`
//! are substituted anywhere inside an argument.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{is_flag_set, CheckContext, CheckTool, ParsedLine};
use crate::core::{DefectItem, Severity};

/// A tool definition as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefinition {
    /// Argument template; the first entry is the executable
    pub command: Vec<String>,

    /// Regex matched against each output line; named groups fill the defect
    pub pattern: String,

    /// Flags added to `{flags}` unless the user already sets the same option
    pub default_flags: Vec<String>,

    /// Tool severity label -> severity (case-insensitive)
    pub severity_map: BTreeMap<String, Severity>,

    /// Severity for lines without a mapped label (default `low`)
    pub default_severity: Option<Severity>,

    /// Category used when the pattern has no `category` group
    pub category: Option<String>,

    /// Lines matching any of these are dropped before parsing
    pub ignore: Vec<String>,

    /// Lines matching any of these mark the run as bad input
    pub bad_input: Vec<String>,
}

/// Adapter for an analyzer described by a [`ToolDefinition`].
#[derive(Debug, Clone)]
pub struct PatternTool {
    name: String,
    command: Vec<String>,
    default_flags: Vec<String>,
    pattern: Regex,
    severity_map: BTreeMap<String, Severity>,
    default_severity: Severity,
    category: Option<String>,
    ignore: Vec<Regex>,
    bad_input: Vec<Regex>,
}

impl PatternTool {
    /// Compile a tool definition.
    pub fn new(name: impl Into<String>, def: &ToolDefinition) -> Result<Self> {
        let name = name.into();
        if def.command.is_empty() {
            bail!("tool `{}` has an empty command", name);
        }
        if def.pattern.is_empty() {
            bail!("tool `{}` has no defect pattern", name);
        }

        let pattern = Regex::new(&def.pattern)
            .with_context(|| format!("invalid pattern for tool `{}`", name))?;
        let ignore = compile_all(&def.ignore)
            .with_context(|| format!("invalid ignore pattern for tool `{}`", name))?;
        let bad_input = compile_all(&def.bad_input)
            .with_context(|| format!("invalid bad_input pattern for tool `{}`", name))?;

        let mut severity_map = default_severity_map();
        for (label, severity) in &def.severity_map {
            severity_map.insert(label.to_lowercase(), *severity);
        }

        Ok(PatternTool {
            name,
            command: def.command.clone(),
            default_flags: def.default_flags.clone(),
            pattern,
            severity_map,
            default_severity: def.default_severity.unwrap_or(Severity::Low),
            category: def.category.clone(),
            ignore,
            bad_input,
        })
    }

    /// Expand the command template against a context.
    pub fn expand_command(&self, ctx: &CheckContext) -> Result<Vec<String>> {
        let mut argv = Vec::with_capacity(self.command.len());

        for arg in &self.command {
            match arg.as_str() {
                "{flags}" => {
                    let flags = ctx.get_flags(&self.name);
                    for default in &self.default_flags {
                        let option = default.split('=').next().unwrap_or(default);
                        if !is_flag_set(option, &flags) {
                            argv.push(default.clone());
                        }
                    }
                    argv.extend(flags);
                }
                "{includes}" => argv.extend(ctx.cpp_includes.iter().map(|i| format!("-I{}", i))),
                "{defines}" => argv.extend(ctx.cpp_defines.iter().map(|d| format!("-D{}", d))),
                "{sources}" => argv.extend(
                    ctx.get_project_src_files()?
                        .iter()
                        .map(|p| p.display().to_string()),
                ),
                _ => argv.push(
                    arg.replace("{project_dir}", &ctx.project_dir().display().to_string())
                        .replace("{env}", ctx.env()),
                ),
            }
        }

        Ok(argv)
    }

    fn severity_for(&self, label: Option<&str>) -> Severity {
        label
            .and_then(|label| self.severity_map.get(&label.to_lowercase()).copied())
            .unwrap_or(self.default_severity)
    }
}

fn default_severity_map() -> BTreeMap<String, Severity> {
    [
        ("fatal", Severity::High),
        ("error", Severity::High),
        ("warning", Severity::Medium),
    ]
    .into_iter()
    .map(|(label, sev)| (label.to_string(), sev))
    .collect()
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

impl CheckTool for PatternTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure_command(&mut self, ctx: &CheckContext) -> Result<Vec<String>> {
        self.expand_command(ctx)
    }

    fn tool_output_filter(&self, line: String) -> Option<String> {
        if self.ignore.iter().any(|re| re.is_match(&line)) {
            return None;
        }
        Some(line)
    }

    fn parse_defect(&self, line: String) -> ParsedLine {
        if self.bad_input.iter().any(|re| re.is_match(&line)) {
            return ParsedLine::BadInput(line);
        }

        let Some(caps) = self.pattern.captures(&line) else {
            return ParsedLine::Unparsed(line.clone());
        };

        let group = |name: &str| caps.name(name).map(|m| m.as_str().trim());
        let number = |name: &str| group(name).and_then(|v| v.parse().ok()).unwrap_or(0);

        let label = group("severity");
        let severity = self.severity_for(label);
        let category = group("category")
            .map(str::to_string)
            .or_else(|| self.category.clone())
            .or_else(|| label.map(str::to_lowercase))
            .unwrap_or_else(|| "defect".to_string());
        let message = group("message").unwrap_or(line.as_str());

        let mut defect = DefectItem::new(severity, category, message).with_location(
            group("file").unwrap_or("unknown"),
            number("line"),
            number("column"),
        );
        if let Some(id) = group("id").filter(|id| !id.is_empty()) {
            defect = defect.with_id(id);
        }
        if let Some(cwe) = group("cwe").and_then(|c| c.parse().ok()) {
            defect = defect.with_cwe(cwe);
        }

        ParsedLine::Defect(defect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CheckOptions;
    use crate::metadata::{BuildMetadata, StaticMetadata};
    use std::path::PathBuf;

    const GCC_STYLE: &str = r"^(?P<file>[^:]+):(?P<line>\d+):(?P<column>\d+): (?P<severity>\w+): (?P<message>.*?)(?: \[(?P<id>[\w-]+)\])?$";

    fn definition() -> ToolDefinition {
        ToolDefinition {
            command: vec!["lint".to_string(), "{flags}".to_string()],
            pattern: GCC_STYLE.to_string(),
            ignore: vec!["^Checking ".to_string()],
            bad_input: vec!["^lint: fatal:".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_gcc_style_line() {
        let tool = PatternTool::new("lint", &definition()).unwrap();
        let parsed = tool.parse_defect("src/main.c:10:4: warning: unused variable 'x' [unusedVariable]".to_string());

        let ParsedLine::Defect(defect) = parsed else {
            panic!("expected a defect, got {:?}", parsed);
        };
        assert_eq!(defect.severity, Severity::Medium);
        assert_eq!(defect.category, "warning");
        assert_eq!(defect.message, "unused variable 'x'");
        assert_eq!(defect.file, PathBuf::from("src/main.c"));
        assert_eq!((defect.line, defect.column), (10, 4));
        assert_eq!(defect.id.as_deref(), Some("unusedVariable"));
    }

    #[test]
    fn test_severity_map_overrides() {
        let mut def = definition();
        def.severity_map.insert("Style".to_string(), Severity::Medium);
        def.severity_map.insert("warning".to_string(), Severity::High);
        let tool = PatternTool::new("lint", &def).unwrap();

        let ParsedLine::Defect(style) = tool.parse_defect("a.c:1:1: style: nit".to_string()) else {
            panic!("expected a defect");
        };
        assert_eq!(style.severity, Severity::Medium);

        let ParsedLine::Defect(warning) = tool.parse_defect("a.c:1:1: warning: w".to_string()) else {
            panic!("expected a defect");
        };
        assert_eq!(warning.severity, Severity::High);

        let ParsedLine::Defect(other) = tool.parse_defect("a.c:1:1: portability: p".to_string()) else {
            panic!("expected a defect");
        };
        assert_eq!(other.severity, Severity::Low);
    }

    #[test]
    fn test_unmatched_and_bad_lines() {
        let tool = PatternTool::new("lint", &definition()).unwrap();
        assert_eq!(
            tool.parse_defect("1/3 files checked".to_string()),
            ParsedLine::Unparsed("1/3 files checked".to_string())
        );
        assert!(matches!(
            tool.parse_defect("lint: fatal: cannot open project".to_string()),
            ParsedLine::BadInput(_)
        ));
    }

    #[test]
    fn test_output_filter() {
        let tool = PatternTool::new("lint", &definition()).unwrap();
        assert_eq!(tool.tool_output_filter("Checking src/a.c ...".to_string()), None);
        assert_eq!(
            tool.tool_output_filter("a.c:1:1: error: e".to_string()),
            Some("a.c:1:1: error: e".to_string())
        );
    }

    #[test]
    fn test_pattern_without_severity_group() {
        let def = ToolDefinition {
            command: vec!["lint".to_string()],
            pattern: r"^(?P<file>\S+) (?P<message>.+)$".to_string(),
            default_severity: Some(Severity::High),
            category: Some("security".to_string()),
            ..Default::default()
        };
        let tool = PatternTool::new("lint", &def).unwrap();
        let ParsedLine::Defect(defect) = tool.parse_defect("a.c buffer overrun".to_string()) else {
            panic!("expected a defect");
        };
        assert_eq!(defect.severity, Severity::High);
        assert_eq!(defect.category, "security");
        assert_eq!((defect.line, defect.column), (0, 0));
    }

    #[test]
    fn test_unmapped_label_uses_default_severity() {
        let mut def = definition();
        def.default_severity = Some(Severity::Medium);
        let tool = PatternTool::new("lint", &def).unwrap();

        let ParsedLine::Defect(unmapped) = tool.parse_defect("a.c:1:1: portability: p".to_string())
        else {
            panic!("expected a defect");
        };
        assert_eq!(unmapped.severity, Severity::Medium);

        let ParsedLine::Defect(mapped) = tool.parse_defect("a.c:1:1: error: e".to_string()) else {
            panic!("expected a defect");
        };
        assert_eq!(mapped.severity, Severity::High);
    }

    #[test]
    fn test_invalid_definitions() {
        let mut def = definition();
        def.pattern = "(unclosed".to_string();
        assert!(PatternTool::new("lint", &def).is_err());

        let mut def = definition();
        def.command.clear();
        assert!(PatternTool::new("lint", &def).is_err());

        let mut def = definition();
        def.pattern.clear();
        assert!(PatternTool::new("lint", &def).is_err());
    }

    #[test]
    fn test_expand_command() {
        let def = ToolDefinition {
            command: vec![
                "lint".to_string(),
                "--root={project_dir}".to_string(),
                "--env={env}".to_string(),
                "{flags}".to_string(),
                "{includes}".to_string(),
                "{defines}".to_string(),
            ],
            pattern: GCC_STYLE.to_string(),
            ..Default::default()
        };
        let tool = PatternTool::new("lint", &def).unwrap();

        let metadata = BuildMetadata {
            includes: vec!["/p/include".to_string()],
            defines: vec!["NDEBUG".to_string(), "V=2".to_string()],
            cc_path: None,
        };
        let ctx = CheckContext::builder("/p")
            .env("release")
            .options(CheckOptions::new().flags(["-q", "lint:--strict", "other:--no"]))
            .build(&StaticMetadata(Some(metadata)))
            .unwrap();

        let argv = tool.expand_command(&ctx).unwrap();
        assert_eq!(
            argv,
            vec![
                "lint",
                "--root=/p",
                "--env=release",
                "-q",
                "--strict",
                "-I/p/include",
                "-DNDEBUG",
                "-DV=2",
            ]
        );
    }

    #[test]
    fn test_default_flags_yield_to_user_flags() {
        let def = ToolDefinition {
            command: vec!["lint".to_string(), "{flags}".to_string()],
            default_flags: vec!["--std=c11".to_string(), "--inline-suppr".to_string()],
            pattern: GCC_STYLE.to_string(),
            ..Default::default()
        };
        let tool = PatternTool::new("lint", &def).unwrap();

        let ctx = CheckContext::builder("/p")
            .options(CheckOptions::new().flags(["lint:--std=c99"]))
            .build(&StaticMetadata(None))
            .unwrap();
        assert_eq!(
            tool.expand_command(&ctx).unwrap(),
            vec!["lint", "--inline-suppr", "--std=c99"]
        );

        let ctx = CheckContext::builder("/p")
            .build(&StaticMetadata(None))
            .unwrap();
        assert_eq!(
            tool.expand_command(&ctx).unwrap(),
            vec!["lint", "--std=c11", "--inline-suppr"]
        );
    }

    #[test]
    fn test_definition_from_toml() {
        let def: ToolDefinition = toml::from_str(
            r#"
command = ["lint", "{sources}"]
pattern = '^(?P<message>.*)$'
default_severity = "medium"

[severity_map]
info = "low"
"#,
        )
        .unwrap();
        assert_eq!(def.command, vec!["lint", "{sources}"]);
        assert_eq!(def.default_severity, Some(Severity::Medium));
        assert_eq!(def.severity_map.get("info"), Some(&Severity::Low));
    }
}
