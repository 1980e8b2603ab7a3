// src/cli/dispatcher.rs

use anyhow::{Result, anyhow};
use std::path::Path;

use crate::{cli::handlers, constants::TOE_EXTENSION, state::AppContext};

/// Defines a system command, its aliases, and its universal handler signature.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &mut AppContext) -> Result<()>,
}

/// The single source of truth for all commands.
/// To add a new command, simply add a new entry to this static array.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "open",
        aliases: &["o"],
        handler: handlers::open::handle,
    },
    CommandDefinition {
        name: "recents",
        aliases: &["ls"],
        handler: handlers::recents::handle,
    },
    CommandDefinition {
        name: "templates",
        aliases: &["tpl"],
        handler: handlers::templates::handle,
    },
    CommandDefinition {
        name: "versions",
        aliases: &["vers"],
        handler: handlers::versions::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// The main application dispatcher.
///
/// Grammar: a bare invocation browses recents interactively, a `.toe` path
/// opens that file directly, and anything else must be a known command.
pub fn dispatch(all_args: Vec<String>, ctx: &mut AppContext) -> Result<()> {
    log::debug!("Dispatching args: {all_args:?}");

    let Some(first) = all_args.first() else {
        return handlers::open::handle(Vec::new(), ctx);
    };

    if let Some(command) = find_command(first) {
        let rest = all_args.iter().skip(1).cloned().collect();
        return (command.handler)(rest, ctx);
    }

    // `tdlaunch show.toe` is a shortcut for `tdlaunch open show.toe`.
    let is_project_file = Path::new(first)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TOE_EXTENSION));
    if is_project_file {
        return handlers::open::handle(all_args, ctx);
    }

    Err(anyhow!(
        "Unknown command '{first}'. Expected a .toe file or one of: open, recents, templates, versions."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_reach_the_same_handler_as_names() {
        let recents = find_command("recents").unwrap();
        let ls = find_command("ls").unwrap();
        assert_eq!(recents.name, ls.name);
        assert!(find_command("nonsense").is_none());
    }
}
