//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// harbour-check - Run static analyzers over a C/C++ project
#[derive(Parser)]
#[command(name = "harbour-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only defects and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured analyzers and report defects
    Check(CheckArgs),

    /// Show the flags a tool would receive
    Flags(FlagsArgs),

    /// Show the macros predefined by the C/C++ compiler
    Defines(DefinesArgs),

    /// List the configured analyzers
    Tools(ToolsArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'd', long)]
    pub project_dir: Option<PathBuf>,

    /// Build environment whose metadata is used
    #[arg(short, long, env = "HARBOUR_CHECK_ENV")]
    pub env: Option<String>,

    /// Tool to run (repeatable; defaults to every configured tool)
    #[arg(short, long = "tool", value_name = "TOOL")]
    pub tools: Vec<String>,

    /// Accepted severity: high, medium, low or a code (repeatable)
    #[arg(short, long)]
    pub severity: Vec<String>,

    /// Extra analyzer flag, optionally scoped as `tool:flag` (repeatable)
    #[arg(long = "flags", value_name = "FLAGS", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// Source filter pattern such as `+<src/>` or `-<src/vendor/>` (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    pub filter: Vec<String>,

    /// Fail when a defect of this severity is reported (repeatable)
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on_defect: Vec<String>,

    /// Print defects as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Tool name
    pub tool: String,

    /// Project directory (defaults to the current directory)
    #[arg(short = 'd', long)]
    pub project_dir: Option<PathBuf>,

    /// Flag entries to partition instead of the configured ones (repeatable)
    #[arg(long = "flags", value_name = "FLAGS", allow_hyphen_values = true)]
    pub flags: Vec<String>,
}

#[derive(Args)]
pub struct DefinesArgs {
    /// Compiler to query (defaults to the detected C compiler)
    #[arg(long, env = "CC")]
    pub cc: Option<PathBuf>,
}

#[derive(Args)]
pub struct ToolsArgs {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'd', long)]
    pub project_dir: Option<PathBuf>,
}
