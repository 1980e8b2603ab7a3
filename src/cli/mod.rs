// src/cli/mod.rs

use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// tdlaunch: pick, resolve and launch TouchDesigner projects from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// A command (`open`, `recents`, `templates`, `versions`) or a `.toe`
    /// file path to open directly.
    #[arg()]
    pub args: Vec<String>,
}
