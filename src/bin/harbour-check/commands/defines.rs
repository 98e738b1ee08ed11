//! `harbour-check defines` command

use anyhow::{bail, Result};

use crate::cli::DefinesArgs;
use harbour_check::toolchain::get_toolchain_defines;
use harbour_check::util::process::{find_c_compiler, find_executable};

pub fn execute(args: DefinesArgs) -> Result<()> {
    let cc = match args.cc {
        Some(cc) => find_executable(&cc)
            .ok_or_else(|| anyhow::anyhow!("compiler `{}` not found", cc.display()))?,
        None => match find_c_compiler() {
            Some(cc) => cc,
            None => bail!(
                "no C compiler found\n\
                 help: Install gcc or clang, or pass `--cc <path>`"
            ),
        },
    };

    tracing::debug!("querying defines from {}", cc.display());

    for define in get_toolchain_defines(Some(cc.as_path())) {
        println!("{}", define);
    }

    Ok(())
}
