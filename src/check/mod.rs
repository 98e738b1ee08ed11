//! Analyzer adapters and the check pipeline.
//!
//! An analyzer is plugged in by implementing [`CheckTool`]: it supplies the
//! command line and, optionally, per-line filtering, parsing and clean-up.
//! [`Checker`] runs it:
//!
//! 1. `configure_command` builds the argument vector
//! 2. the analyzer runs with stdout and stderr streamed line by line
//! 3. each line goes through `tool_output_filter`, then `parse_defect`
//! 4. defects outside the severity filter are dropped, the rest are kept and
//!    handed to the caller's callback
//! 5. `clean_up` runs once the process has exited
//!
//! The run reports whether the analyzer flagged any input as unusable.

pub mod errors;
pub mod flags;
pub mod pattern;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{CheckOptions, DefectItem, SeverityFilter};
use crate::metadata::MetadataProvider;
use crate::toolchain::get_toolchain_defines;
use crate::util::fs::match_src_files;
use crate::util::process::{OutputLine, ProcessBuilder};
use crate::util::shell::Shell;

pub use errors::CheckError;
pub use flags::{get_flags, is_flag_set};
pub use pattern::{PatternTool, ToolDefinition};

/// Source extensions analyzers are pointed at.
pub const SRC_EXTENSIONS: &[&str] = &["h", "hpp", "c", "cc", "cpp", "ino"];

/// Result of parsing one line of analyzer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// The line describes a defect.
    Defect(DefectItem),
    /// Progress messages, banners and other chatter.
    Unparsed(String),
    /// The analyzer could not use its input; the run is marked as bad input.
    BadInput(String),
}

/// An external static analyzer.
///
/// Only [`configure_command`](CheckTool::configure_command) is required. The
/// hooks default to pass-through behavior, which treats every line as chatter.
pub trait CheckTool {
    /// Tool name, also the scope prefix for `tool:`-scoped flags.
    fn name(&self) -> &str;

    /// Argument vector to execute; `argv[0]` is the analyzer executable.
    fn configure_command(&mut self, ctx: &CheckContext) -> anyhow::Result<Vec<String>>;

    /// Cheap pre-filter applied before parsing.
    ///
    /// Return `None` (or an empty line) to drop the line.
    fn tool_output_filter(&self, line: String) -> Option<String> {
        Some(line)
    }

    /// Turn a filtered line into a defect.
    fn parse_defect(&self, line: String) -> ParsedLine {
        ParsedLine::Unparsed(line)
    }

    /// Tear down anything `configure_command` created.
    ///
    /// Runs after every execution attempt, whatever the exit code.
    fn clean_up(&mut self, _ctx: &CheckContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Shared state for analyzer adapters: options, build metadata and output.
///
/// Cloning shares the loaded metadata; nothing is queried again.
#[derive(Debug, Clone)]
pub struct CheckContext {
    project_dir: PathBuf,
    env: String,
    options: CheckOptions,
    severity: SeverityFilter,
    pub cpp_includes: Vec<String>,
    pub cpp_defines: Vec<String>,
    shell: Arc<Shell>,
}

/// Builder for [`CheckContext`].
#[derive(Debug)]
pub struct ContextBuilder {
    project_dir: PathBuf,
    env: String,
    options: CheckOptions,
    shell: Option<Arc<Shell>>,
}

impl ContextBuilder {
    /// Build environment whose metadata to load.
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    pub fn options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Shell used for verbose echo output.
    pub fn shell(mut self, shell: Arc<Shell>) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Normalize options and load build metadata.
    ///
    /// Fails on an unknown severity or unreadable metadata. Missing metadata
    /// is not an error.
    pub fn build(self, provider: &dyn MetadataProvider) -> Result<CheckContext, CheckError> {
        let mut options = self.options;
        let severity = SeverityFilter::normalize(&options.severity)?;
        options.severity = severity.to_values();

        let mut ctx = CheckContext {
            project_dir: self.project_dir,
            env: self.env,
            options,
            severity,
            cpp_includes: Vec::new(),
            cpp_defines: Vec::new(),
            shell: self.shell.unwrap_or_default(),
        };
        ctx.load_cpp_data(provider)?;
        Ok(ctx)
    }
}

impl CheckContext {
    /// Start building a context for the project at `project_dir`.
    pub fn builder(project_dir: impl Into<PathBuf>) -> ContextBuilder {
        ContextBuilder {
            project_dir: project_dir.into(),
            env: String::new(),
            options: CheckOptions::default(),
            shell: None,
        }
    }

    fn load_cpp_data(&mut self, provider: &dyn MetadataProvider) -> Result<(), CheckError> {
        let data = provider
            .load(&self.project_dir, &self.env)
            .map_err(|source| CheckError::Metadata {
                env: self.env.clone(),
                source,
            })?;

        let Some(data) = data else {
            return Ok(());
        };

        self.cpp_includes = data.includes;
        self.cpp_defines = data.defines;
        self.cpp_defines
            .extend(get_toolchain_defines(data.cc_path.as_deref()));
        Ok(())
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    /// Options with the severity filter normalized to codes.
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    pub fn severity_filter(&self) -> &SeverityFilter {
        &self.severity
    }

    pub fn is_verbose(&self) -> bool {
        self.options.verbose
    }

    pub fn shell(&self) -> &Arc<Shell> {
        &self.shell
    }

    /// Configured flags that apply to `tool`.
    pub fn get_flags(&self, tool: &str) -> Vec<String> {
        get_flags(tool, &self.options.flags)
    }

    /// Project sources selected by the configured filter.
    pub fn get_project_src_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        match_src_files(&self.project_dir, &self.options.src_filter(), SRC_EXTENSIONS)
    }
}

/// Callback invoked for every accepted defect.
pub type DefectCallback<'a> = &'a mut dyn FnMut(&DefectItem);

/// State scoped to a single `check` run.
struct RunState<'a> {
    bad_input: bool,
    on_defect: Option<DefectCallback<'a>>,
}

/// Runs one analyzer and collects its defects.
pub struct Checker<T> {
    ctx: CheckContext,
    tool: T,
    defects: Vec<DefectItem>,
}

impl<T: CheckTool> Checker<T> {
    pub fn new(tool: T, ctx: CheckContext) -> Self {
        Checker {
            ctx,
            tool,
            defects: Vec::new(),
        }
    }

    pub fn context(&self) -> &CheckContext {
        &self.ctx
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Configured flags that apply to `tool`.
    pub fn get_flags(&self, tool: &str) -> Vec<String> {
        self.ctx.get_flags(tool)
    }

    /// Defects accepted so far, in the order they were reported.
    ///
    /// Defects accumulate across runs of the same checker.
    pub fn get_defects(&self) -> &[DefectItem] {
        &self.defects
    }

    pub fn into_defects(self) -> Vec<DefectItem> {
        self.defects
    }

    /// Run the analyzer.
    ///
    /// `on_defect` is called synchronously for each accepted defect before
    /// this returns. Returns `true` when the analyzer reported unusable input.
    /// A non-zero analyzer exit code is not an error.
    pub fn check(&mut self, on_defect: Option<DefectCallback<'_>>) -> Result<bool, CheckError> {
        let Checker {
            ctx,
            tool,
            defects,
        } = self;

        let mut run = RunState {
            bad_input: false,
            on_defect,
        };

        let argv = tool
            .configure_command(ctx)
            .map_err(|source| CheckError::Command {
                tool: tool.name().to_string(),
                source,
            })?;

        let command = argv.join(" ");
        if ctx.is_verbose() {
            ctx.shell.echo(&command);
        }
        tracing::debug!("running `{}`", command);

        let result = match ProcessBuilder::from_argv(&argv) {
            Some(process) => process
                .cwd(&ctx.project_dir)
                .exec_streaming(|line| on_tool_output(&*tool, ctx, defects, &mut run, line)),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "analyzer command is empty",
            )),
        };

        let cleaned = tool.clean_up(ctx);

        let status = result.map_err(|source| CheckError::Execution {
            command: command.clone(),
            source,
        })?;
        cleaned.map_err(|source| CheckError::CleanUp {
            tool: tool.name().to_string(),
            source,
        })?;

        tracing::debug!("`{}` exited with {:?}", tool.name(), status.code());
        Ok(run.bad_input)
    }
}

/// Handle one line from either output stream.
fn on_tool_output<T: CheckTool + ?Sized>(
    tool: &T,
    ctx: &CheckContext,
    defects: &mut Vec<DefectItem>,
    run: &mut RunState<'_>,
    line: OutputLine,
) {
    let Some(line) = tool.tool_output_filter(line.text).filter(|l| !l.is_empty()) else {
        return;
    };

    let defect = match tool.parse_defect(line) {
        ParsedLine::Defect(defect) => defect,
        ParsedLine::Unparsed(line) => {
            if ctx.is_verbose() {
                ctx.shell.echo(line);
            }
            return;
        }
        ParsedLine::BadInput(line) => {
            run.bad_input = true;
            if ctx.is_verbose() {
                ctx.shell.echo(line);
            }
            return;
        }
    };

    if !ctx.severity.accepts(defect.severity) {
        return;
    }

    defects.push(defect);
    if let Some(callback) = run.on_defect.as_mut() {
        if let Some(defect) = defects.last() {
            callback(defect);
        }
    }
}
