//! harbour-check CLI - run static analyzers over a C/C++ project

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use harbour_check::util::diagnostic;
use harbour_check::CheckError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        match e.downcast_ref::<CheckError>() {
            Some(check_err) => diagnostic::emit(&check_err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("harbour_check=debug")
    } else {
        EnvFilter::new("harbour_check=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false)
        .without_time()
        .init();

    let global = commands::GlobalFlags {
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &global),
        Commands::Flags(args) => commands::flags::execute(args),
        Commands::Defines(args) => commands::defines::execute(args),
        Commands::Tools(args) => commands::tools::execute(args),
    }
}
