// src/cli/handlers/versions.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::state::AppContext;
use crate::system::toeexpand::ToeExpandProbe;

use super::commons;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
struct VersionsArgs {
    /// Also show each installation's path.
    #[arg(long)]
    paths: bool,
}

/// The main handler for the `versions` command.
pub fn handle(args: Vec<String>, ctx: &mut AppContext) -> Result<()> {
    let versions_args = VersionsArgs::try_parse_from(&args)?;

    let catalog = commons::scan_catalog(ctx.config());
    if catalog.is_empty() {
        println!(
            "No TouchDesigner installations found. Add directories to 'install_roots' in the config."
        );
        return Ok(());
    }

    let probe_available = ToeExpandProbe::locate(&catalog).is_some();
    for install in catalog.installed() {
        if versions_args.paths {
            println!(
                "{}  {}",
                install.version.to_string().cyan(),
                install.install_path.display().to_string().dimmed()
            );
        } else {
            println!("{}", install.version.to_string().cyan());
        }
    }
    if !probe_available {
        println!(
            "{}",
            "Note: no toeexpand tool found; project versions cannot be auto-resolved.".yellow()
        );
    }
    Ok(())
}
