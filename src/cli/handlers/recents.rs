// src/cli/handlers/recents.rs

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::core::history;
use crate::core::search::SearchFilter;
use crate::state::AppContext;
use crate::system::native_recents::SystemRecents;

use super::commons;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
struct RecentsArgs {
    /// Filter file names: `*` matches any run, `?` one character.
    pattern: Option<String>,
    /// Remove a path from the launcher history.
    #[arg(long, value_name = "PATH")]
    remove: Option<PathBuf>,
    /// Drop every history entry whose file no longer exists.
    #[arg(long)]
    clear_missing: bool,
    /// Show only the launcher's own history, without the native merge.
    #[arg(long)]
    launcher_only: bool,
}

/// The main handler for the `recents` command.
pub fn handle(args: Vec<String>, ctx: &mut AppContext) -> Result<()> {
    let recents_args = RecentsArgs::try_parse_from(&args)?;

    if let Some(path) = recents_args.remove {
        return remove(ctx, path);
    }
    if recents_args.clear_missing {
        let dropped = history::clear_missing(ctx.config_mut());
        ctx.persist()?;
        println!("Removed {dropped} missing entr{}.", if dropped == 1 { "y" } else { "ies" });
        return Ok(());
    }

    list(ctx, recents_args)
}

fn remove(ctx: &mut AppContext, path: PathBuf) -> Result<()> {
    if ctx.config().confirm_remove_from_list
        && !commons::confirm(&format!("Remove '{}' from the list?", path.display()))?
    {
        return Ok(());
    }
    if !history::remove_path(ctx.config_mut(), &path) {
        println!("'{}' is not in the launcher history.", path.display());
        return Ok(());
    }
    ctx.persist()?;
    println!("Removed '{}'.", path.display());
    Ok(())
}

fn list(ctx: &mut AppContext, args: RecentsArgs) -> Result<()> {
    let launcher_only_records;
    let records = if args.launcher_only || !ctx.config().show_full_history {
        launcher_only_records =
            history::reconcile(&ctx.config().launcher_recents, &[], &[]);
        launcher_only_records.as_slice()
    } else {
        ctx.refresh_records(&SystemRecents);
        ctx.records()
    };

    let filter = SearchFilter::compile(args.pattern.as_deref().unwrap_or(""));
    let matched = filter.apply(records);

    if matched.is_empty() {
        println!("No matching projects.");
        return Ok(());
    }
    for record in matched {
        println!(
            "{}  {}",
            commons::format_record_line(record),
            record.display_path.dimmed()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_store::ConfigStore;

    #[test]
    fn removing_an_unknown_path_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = AppContext::with_store(ConfigStore::at(dir.path().join("config.json")));
        ctx.config_mut().confirm_remove_from_list = false;

        let result = handle(
            vec!["--remove".to_string(), "/nowhere/gone.toe".to_string()],
            &mut ctx,
        );
        assert!(result.is_ok());
        assert!(ctx.config().launcher_recents.is_empty());
    }
}
