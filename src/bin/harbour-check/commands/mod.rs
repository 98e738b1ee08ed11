//! Command implementations

pub mod check;
pub mod defines;
pub mod flags;
pub mod tools;

use std::path::PathBuf;

use anyhow::{Context, Result};

use harbour_check::util::config::{global_config_path, load_config, project_config_path};
use harbour_check::util::Config;

/// Flags shared by every subcommand.
pub struct GlobalFlags {
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
}

/// Resolve the project directory, defaulting to the current directory.
pub fn project_dir(arg: Option<PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("failed to determine current directory"),
    }
}

/// Load the merged global and project configuration.
pub fn load_project_config(project_dir: &std::path::Path) -> Config {
    let global = global_config_path().unwrap_or_default();
    load_config(&global, &project_config_path(project_dir))
}
