//! Build metadata: include paths, defines and the compiler used by a project.
//!
//! Checkers obtain metadata once, at construction, through a
//! [`MetadataProvider`]. The default provider reads the
//! `compile_commands.json` emitted by the build.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Include paths, defines and compiler for one build environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMetadata {
    pub includes: Vec<String>,
    pub defines: Vec<String>,
    pub cc_path: Option<PathBuf>,
}

/// Source of build metadata, keyed by project directory and environment name.
pub trait MetadataProvider {
    /// Load metadata, or `None` when the project has none for `env`.
    fn load(&self, project_dir: &Path, env: &str) -> Result<Option<BuildMetadata>>;
}

/// Provider that returns fixed metadata (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata(pub Option<BuildMetadata>);

impl MetadataProvider for StaticMetadata {
    fn load(&self, _project_dir: &Path, _env: &str) -> Result<Option<BuildMetadata>> {
        Ok(self.0.clone())
    }
}

/// Provider backed by `compile_commands.json`.
///
/// Looks for `.harbour/<env>/compile_commands.json`, then
/// `.harbour/compile_commands.json`.
#[derive(Debug, Clone, Default)]
pub struct CompileCommandsProvider;

/// compile_commands.json entry.
#[derive(Debug, Deserialize)]
struct CompileCommand {
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    command: Option<String>,
}

impl CompileCommand {
    /// Argument vector, splitting `command` with shell quoting rules.
    fn argv(&self) -> Result<Vec<String>> {
        if !self.arguments.is_empty() {
            return Ok(self.arguments.clone());
        }
        match self.command.as_deref() {
            Some(command) => shell_words::split(command)
                .with_context(|| format!("malformed compile command: {}", command)),
            None => Ok(Vec::new()),
        }
    }
}

impl CompileCommandsProvider {
    /// Candidate database paths for `env`, most specific first.
    pub fn candidates(project_dir: &Path, env: &str) -> Vec<PathBuf> {
        let harbour_dir = project_dir.join(".harbour");
        let mut paths = Vec::with_capacity(2);
        if !env.is_empty() {
            paths.push(harbour_dir.join(env).join("compile_commands.json"));
        }
        paths.push(harbour_dir.join("compile_commands.json"));
        paths
    }

    /// Parse a compile database into metadata.
    pub fn parse(contents: &str) -> Result<BuildMetadata> {
        let commands: Vec<CompileCommand> =
            serde_json::from_str(contents).context("invalid compile_commands.json")?;

        let mut metadata = BuildMetadata::default();
        for (i, command) in commands.iter().enumerate() {
            let argv = command.argv()?;
            if i == 0 {
                metadata.cc_path = argv.first().map(PathBuf::from);
            }
            collect_flags(argv.iter().skip(1), &mut metadata);
        }
        Ok(metadata)
    }
}

impl MetadataProvider for CompileCommandsProvider {
    fn load(&self, project_dir: &Path, env: &str) -> Result<Option<BuildMetadata>> {
        let Some(path) = Self::candidates(project_dir, env)
            .into_iter()
            .find(|p| p.is_file())
        else {
            tracing::debug!("no compile_commands.json for env `{}`", env);
            return Ok(None);
        };

        let contents = crate::util::fs::read_to_string(&path)?;
        let metadata = Self::parse(&contents)
            .with_context(|| format!("failed to load build metadata: {}", path.display()))?;

        tracing::debug!(
            "loaded {} include(s) and {} define(s) from {}",
            metadata.includes.len(),
            metadata.defines.len(),
            path.display()
        );
        Ok(Some(metadata))
    }
}

fn collect_flags<'a>(mut args: impl Iterator<Item = &'a String>, metadata: &mut BuildMetadata) {
    fn push_unique(list: &mut Vec<String>, value: &str) {
        if !value.is_empty() && !list.iter().any(|v| v == value) {
            list.push(value.to_string());
        }
    }

    while let Some(arg) = args.next() {
        if arg == "-I" || arg == "-isystem" {
            if let Some(dir) = args.next() {
                push_unique(&mut metadata.includes, dir);
            }
        } else if let Some(dir) = arg.strip_prefix("-isystem") {
            push_unique(&mut metadata.includes, dir);
        } else if let Some(dir) = arg.strip_prefix("-I") {
            push_unique(&mut metadata.includes, dir);
        } else if arg == "-D" {
            if let Some(def) = args.next() {
                push_unique(&mut metadata.defines, def);
            }
        } else if let Some(def) = arg.strip_prefix("-D") {
            push_unique(&mut metadata.defines, def);
        }
    }
}
