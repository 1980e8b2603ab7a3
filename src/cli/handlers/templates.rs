// src/cli/handlers/templates.rs

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::core::history::{self, MoveDirection};
use crate::state::AppContext;

use super::commons;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct TemplatesArgs {
    #[command(subcommand)]
    action: Option<TemplateAction>,
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    /// Add a project file to the template list.
    Add { file: PathBuf },
    /// Remove a template from the list.
    Remove { file: PathBuf },
    /// Move a template one slot up, wrapping at the top.
    Up { file: PathBuf },
    /// Move a template one slot down, wrapping at the bottom.
    Down { file: PathBuf },
}

/// The main handler for the `templates` command.
pub fn handle(args: Vec<String>, ctx: &mut AppContext) -> Result<()> {
    let templates_args = TemplatesArgs::try_parse_from(&args)?;

    match templates_args.action {
        None => list(ctx),
        Some(TemplateAction::Add { file }) => {
            let file = dunce::canonicalize(&file).unwrap_or(file);
            if !file.is_file() {
                return Err(anyhow!("'{}' does not exist", file.display()));
            }
            if !history::add_template(ctx.config_mut(), &file) {
                println!("'{}' is already a template.", file.display());
                return Ok(());
            }
            ctx.persist()?;
            println!("Added template '{}'.", file.display());
            Ok(())
        }
        Some(TemplateAction::Remove { file }) => {
            if ctx.config().confirm_remove_from_list
                && !commons::confirm(&format!("Remove template '{}'?", file.display()))?
            {
                return Ok(());
            }
            if !history::remove_template(ctx.config_mut(), &file) {
                println!("'{}' is not a template.", file.display());
                return Ok(());
            }
            ctx.persist()?;
            println!("Removed template '{}'.", file.display());
            Ok(())
        }
        Some(TemplateAction::Up { file }) => reorder(ctx, file, MoveDirection::Up),
        Some(TemplateAction::Down { file }) => reorder(ctx, file, MoveDirection::Down),
    }
}

fn reorder(ctx: &mut AppContext, file: PathBuf, direction: MoveDirection) -> Result<()> {
    if !history::move_template(ctx.config_mut(), &file, direction) {
        return Err(anyhow!("'{}' is not a template", file.display()));
    }
    ctx.persist()?;
    list(ctx)
}

fn list(ctx: &mut AppContext) -> Result<()> {
    if ctx.config().templates.is_empty() {
        println!("No templates. Add one with 'templates add <file.toe>'.");
        return Ok(());
    }
    for (i, path) in ctx.config().template_paths().enumerate() {
        println!("{:>3}. {}", (i + 1).to_string().cyan(), path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_store::ConfigStore;

    #[test]
    fn removing_an_unknown_template_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = AppContext::with_store(ConfigStore::at(dir.path().join("config.json")));
        ctx.config_mut().confirm_remove_from_list = false;

        let result = handle(
            vec!["remove".to_string(), "/nowhere/gone.toe".to_string()],
            &mut ctx,
        );
        assert!(result.is_ok());
        assert!(ctx.config().templates.is_empty());
    }
}
