//! `harbour-check tools` command

use anyhow::Result;

use crate::cli::ToolsArgs;
use harbour_check::util::process::find_executable;

pub fn execute(args: ToolsArgs) -> Result<()> {
    let project_dir = super::project_dir(args.project_dir)?;
    let config = super::load_project_config(&project_dir);

    if config.tools.is_empty() {
        println!("No tools configured.");
        println!();
        println!("Define one under `[tools.<name>]` in .harbour/check.toml");
        return Ok(());
    }

    let selected = config.selected_tools();
    let width = config.tools.keys().map(|n| n.len()).max().unwrap_or(0);

    for (name, definition) in &config.tools {
        let program = definition.command.first().map(String::as_str).unwrap_or("");
        let status = if program.is_empty() {
            "no command"
        } else if find_executable(program).is_some() {
            "found"
        } else {
            "not found"
        };
        let marker = if selected.contains(name) { "*" } else { " " };

        println!(
            "{} {:<width$}  {} ({})",
            marker,
            name,
            program,
            status,
            width = width
        );
    }

    Ok(())
}
