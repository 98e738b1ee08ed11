//! `harbour-check flags` command

use anyhow::Result;

use crate::cli::FlagsArgs;
use harbour_check::check::flags::get_flags;

pub fn execute(args: FlagsArgs) -> Result<()> {
    let flags = if args.flags.is_empty() {
        let project_dir = super::project_dir(args.project_dir)?;
        super::load_project_config(&project_dir).check.flags
    } else {
        args.flags
    };

    for flag in get_flags(&args.tool, &flags) {
        println!("{}", flag);
    }

    Ok(())
}
