// src/bin/tdlaunch.rs

use clap::Parser;
use colored::Colorize;
use tdlaunch::{
    cli::{Cli, dispatcher, handlers::commons::Interrupted},
    state::AppContext,
};

/// The main entry point of the `tdlaunch` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let mut ctx = match AppContext::load() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}: {e}", "Error".red().bold());
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatcher::dispatch(cli.args, &mut ctx) {
        // A user abort (Esc / Ctrl+C at a prompt) exits silently with the
        // standard interruption code, like a shell would.
        if e.downcast_ref::<Interrupted>().is_some() {
            std::process::exit(130);
        }
        eprintln!("\n{}: {e:#}", "Error".red().bold());
        std::process::exit(1);
    }
}
