//! Filesystem utilities.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions};
use regex::Regex;
use walkdir::WalkDir;

/// `+<pattern>` / `-<pattern>` groups inside a source filter.
static FILTER_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+-])<([^>]*)>").expect("valid filter regex"));

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// One step of a source filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRule {
    Include(String),
    Exclude(String),
}

/// Split filter strings into ordered include/exclude rules.
///
/// `"+<src/> -<src/vendor/>"` yields two rules; a string without any
/// `+<..>`/`-<..>` group is a single include.
pub fn parse_src_filter(filters: &[String]) -> Vec<FilterRule> {
    let mut rules = Vec::new();

    for filter in filters {
        let mut found = false;
        for cap in FILTER_GROUP.captures_iter(filter) {
            found = true;
            let pattern = cap[2].trim().to_string();
            if &cap[1] == "+" {
                rules.push(FilterRule::Include(pattern));
            } else {
                rules.push(FilterRule::Exclude(pattern));
            }
        }
        if !found && !filter.trim().is_empty() {
            rules.push(FilterRule::Include(filter.trim().to_string()));
        }
    }

    rules
}

/// Find project source files matching a filter and an extension set.
///
/// Rules apply in order: includes add every file matched by the glob (a
/// matched directory contributes all files beneath it), excludes remove them.
pub fn match_src_files(
    project_dir: &Path,
    filters: &[String],
    extensions: &[&str],
) -> Result<Vec<PathBuf>> {
    let mut matched = BTreeSet::new();

    for rule in parse_src_filter(filters) {
        match rule {
            FilterRule::Include(pattern) => {
                for path in expand_pattern(project_dir, &pattern)? {
                    matched.insert(path);
                }
            }
            FilterRule::Exclude(pattern) => {
                for path in expand_pattern(project_dir, &pattern)? {
                    matched.remove(&path);
                }
            }
        }
    }

    Ok(matched
        .into_iter()
        .filter(|path| has_extension(path, extensions))
        .collect())
}

/// Wildcards never match hidden entries (`.git/`, `.harbour/`); a dot
/// written out in the pattern still does.
const FILTER_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

fn expand_pattern(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = base.join(pattern.trim_end_matches('/'));
    let pattern_str = full_pattern.to_string_lossy();

    let mut results = Vec::new();
    for entry in glob_with(&pattern_str, FILTER_MATCH_OPTIONS)
        .with_context(|| format!("invalid filter pattern: {}", pattern))?
    {
        match entry {
            Ok(path) if path.is_dir() => {
                let walker = WalkDir::new(&path)
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
                for file in walker.filter_map(|e| e.ok()) {
                    if file.file_type().is_file() {
                        results.push(file.into_path());
                    }
                }
            }
            Ok(path) if path.is_file() => results.push(path),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("glob error: {}", e);
            }
        }
    }
    Ok(results)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| extensions.iter().any(|e| ext == *e))
        .unwrap_or(false)
}
