//! `harbour-check check` command

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};

use crate::cli::CheckArgs;
use crate::commands::GlobalFlags;
use harbour_check::core::{DefectSummary, Severity, SeverityValue};
use harbour_check::util::diagnostic::suggestions;
use harbour_check::util::shell::{ColorChoice, Status};
use harbour_check::util::Shell;
use harbour_check::{CheckContext, Checker, CompileCommandsProvider, DefectItem, PatternTool};

const DEFAULT_ENV: &str = "debug";

pub fn execute(args: CheckArgs, global: &GlobalFlags) -> Result<()> {
    let project_dir = super::project_dir(args.project_dir)?;
    let config = super::load_project_config(&project_dir);

    // Command-line values replace configured ones
    let mut options = config.options();
    if !args.severity.is_empty() {
        options.severity = args.severity.iter().map(|s| SeverityValue::from(s.as_str())).collect();
    }
    if !args.flags.is_empty() {
        options.flags = args.flags;
    }
    if !args.filter.is_empty() {
        options.filter = args.filter;
    }
    options.verbose = !global.quiet && (options.verbose || global.verbose);

    let fail_on = if args.fail_on_defect.is_empty() {
        config.check.fail_on_defect.clone()
    } else {
        args.fail_on_defect.iter().map(|s| SeverityValue::from(s.as_str())).collect()
    };
    let fail_on = fail_on
        .iter()
        .map(SeverityValue::resolve)
        .collect::<Result<Vec<Severity>, _>>()?;

    let env = args
        .env
        .or_else(|| config.check.env.clone())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());

    let tools = if args.tools.is_empty() {
        config.selected_tools()
    } else {
        args.tools
    };
    if tools.is_empty() {
        bail!("no analyzers configured\n{}", suggestions::TOOL_NOT_CONFIGURED);
    }

    let color = if global.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Arc::new(Shell::from_flags(
        global.quiet,
        options.verbose,
        color,
        args.json,
    ));

    // Metadata and toolchain macros are loaded once and shared by every tool
    let ctx = CheckContext::builder(&project_dir)
        .env(&env)
        .options(options)
        .shell(Arc::clone(&shell))
        .build(&CompileCommandsProvider)?;

    let mut summary = DefectSummary::default();
    let mut bad_input = Vec::new();
    let mut failing = 0usize;

    for name in &tools {
        let definition = config.tools.get(name).ok_or_else(|| {
            anyhow!(
                "tool `{}` is not configured\n{}",
                name,
                suggestions::TOOL_NOT_CONFIGURED
            )
        })?;
        let tool = PatternTool::new(name, definition)?;

        shell.status(Status::Checking, format!("{} ({})", name, env));
        let spinner = shell.spinner(format!("running {}", name));

        let mut checker = Checker::new(tool, ctx.clone());
        let mut on_defect = |defect: &DefectItem| {
            spinner.suspend(|| report_defect(&shell, &project_dir, name, defect));
        };
        let reported_bad_input = checker.check(Some(&mut on_defect))?;
        spinner.finish();

        let tool_summary = DefectSummary::from_defects(checker.get_defects());
        failing += fail_on.iter().map(|&s| tool_summary.count(s)).sum::<usize>();
        for defect in checker.get_defects() {
            summary.add(defect.severity);
        }

        if reported_bad_input {
            shell.warn(format!("`{}` could not process some of its input", name));
            bad_input.push(name.clone());
        }
        shell.status(Status::Finished, format!("{}: {}", name, tool_summary));
    }

    let success = bad_input.is_empty() && failing == 0;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "check-finished",
            "success": success,
            "summary": summary,
            "total": summary.total(),
            "bad_input": bad_input,
        }));
    } else if tools.len() > 1 {
        shell.status(Status::Finished, &summary);
    }

    if !bad_input.is_empty() {
        bail!(
            "bad input reported by: {}\n{}",
            bad_input.join(", "),
            suggestions::CHECK_FAILED
        );
    }
    if failing > 0 {
        bail!("{} defect(s) at a failing severity", failing);
    }

    Ok(())
}

fn report_defect(shell: &Shell, project_dir: &Path, tool: &str, defect: &DefectItem) {
    let defect = DefectItem {
        file: defect.relpath(project_dir),
        ..defect.clone()
    };

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "defect",
            "tool": tool,
            "defect": defect,
        }));
    } else {
        shell.echo(&defect);
    }
}
