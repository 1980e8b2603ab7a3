// src/cli/handlers/open.rs

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use crate::core::catalog::{MatchResult, VersionCatalog};
use crate::core::history;
use crate::core::path_key;
use crate::core::resolver::{ResolveError, Ticket, VersionResolver};
use crate::models::{BuildVersion, InstalledVersion, ProjectRecord, RecordSource};
use crate::state::AppContext;
use crate::system::launcher;
use crate::system::native_recents::SystemRecents;
use crate::system::toeexpand::ToeExpandProbe;

use super::commons;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
struct OpenArgs {
    /// The project file to open. Picked interactively when omitted.
    file: Option<PathBuf>,
    /// Launch immediately, skipping the countdown.
    #[arg(long)]
    now: bool,
    /// Launch with an explicit build (e.g. "2022.35320") instead of the
    /// resolved one.
    #[arg(long = "with", value_name = "VERSION")]
    with_version: Option<String>,
}

/// The main handler for the `open` command.
pub fn handle(args: Vec<String>, ctx: &mut AppContext) -> Result<()> {
    let open_args = OpenArgs::try_parse_from(&args)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(open_args, ctx))
}

async fn run(args: OpenArgs, ctx: &mut AppContext) -> Result<()> {
    let catalog = commons::scan_catalog(ctx.config());
    if catalog.is_empty() {
        return Err(anyhow!(
            "No TouchDesigner installations found. Add directories to 'install_roots' in the config."
        ));
    }

    let record = pick_record(args.file, ctx)?;

    // Resolve which build wrote the file. Failure is not fatal: the user can
    // still pick a build by hand.
    let resolver = ToeExpandProbe::locate(&catalog).map(VersionResolver::new);
    let ticket = resolver.as_ref().map_or_else(Ticket::default, VersionResolver::request);
    ctx.sequencer.select(record.clone(), ticket);

    let outcome = match &resolver {
        Some(resolver) => resolver
            .resolve(&record.path, ticket)
            .await
            .unwrap_or_else(|| Err(ResolveError::ProbeFailed("resolution superseded".into()))),
        None => Err(ResolveError::ProbeFailed(
            "no toeexpand tool in any catalogued installation".into(),
        )),
    };
    ctx.sequencer.resolution_settled(ticket, outcome.clone());

    if let Some(spec) = &args.with_version {
        let version: BuildVersion = spec
            .parse()
            .map_err(|_| anyhow!("'{spec}' is not a valid build version"))?;
        ctx.sequencer.override_version(version);
    }

    // Find an installed build for the effective version, falling back to an
    // interactive pick when it is missing or unresolved.
    let picked = match &outcome {
        Ok(required) => match_or_pick(ctx, &catalog, *required, args.now)?,
        Err(err) => {
            eprintln!("{} {err}", "Could not resolve required build:".yellow());
            pick_install_interactively(ctx, &catalog, "Launch with which build?")?
                .map(|install| (install, true))
        }
    };
    let Some((install, skip_countdown)) = picked else {
        return cancel(ctx);
    };

    if skip_countdown {
        ctx.sequencer.launch_now();
        return launch(ctx, &record, &install);
    }

    countdown(ctx, &catalog, &record, install).await
}

fn pick_record(file: Option<PathBuf>, ctx: &mut AppContext) -> Result<ProjectRecord> {
    match file {
        Some(file) => {
            let file = dunce::canonicalize(&file).unwrap_or(file);
            if !file.is_file() {
                return Err(anyhow!("'{}' does not exist", file.display()));
            }
            ctx.note_browsed(file.clone());
            let display = path_key::display_path(&file);
            Ok(ProjectRecord::new(file, display, RecordSource::Browsed, None, true))
        }
        None => {
            ctx.refresh_records(&SystemRecents);
            if ctx.records().is_empty() {
                return Err(anyhow!("No recent projects. Pass a .toe file to get started."));
            }
            let picked = commons::select_record(ctx.records())?;
            let record = ctx.records()[picked].clone();
            if !record.exists {
                return Err(anyhow!(
                    "'{}' is missing on disk. Use 'recents --clear-missing' to tidy the list.",
                    record.path.display()
                ));
            }
            Ok(record)
        }
    }
}

/// Reports the resolved build and matches it against the catalog. A missing
/// build drops to the interactive picker, which launches without countdown;
/// `Ok(None)` means the user cancelled there.
fn match_or_pick(
    ctx: &mut AppContext,
    catalog: &VersionCatalog,
    required: BuildVersion,
    now: bool,
) -> Result<Option<(InstalledVersion, bool)>> {
    println!("Project requires TouchDesigner {}", required.to_string().cyan());
    let effective = ctx.sequencer.effective_version().unwrap_or(required);
    match catalog.matches(effective) {
        MatchResult::Exact(install) => Ok(Some((install, now))),
        MatchResult::Missing => {
            eprintln!("{}", format!("Build {effective} is not installed.").yellow());
            let choice =
                pick_install_interactively(ctx, catalog, "Launch with which installed build?")?;
            Ok(choice.map(|install| (install, true)))
        }
    }
}

fn pick_install_interactively(
    ctx: &mut AppContext,
    catalog: &VersionCatalog,
    prompt: &str,
) -> Result<Option<InstalledVersion>> {
    let choice = commons::select_install(catalog, prompt)?;
    if let Some(install) = &choice {
        ctx.sequencer.override_version(install.version);
    }
    Ok(choice)
}

/// Runs the interruptible countdown. Ctrl+C disarms it and offers the build
/// picker; picking launches immediately, cancelling abandons the session.
async fn countdown(
    ctx: &mut AppContext,
    catalog: &VersionCatalog,
    record: &ProjectRecord,
    mut install: InstalledVersion,
) -> Result<()> {
    let handle = ctx
        .sequencer
        .begin_countdown(std::time::Instant::now())
        .ok_or_else(|| anyhow!("nothing selected to launch"))?;
    let deadline = tokio::time::Instant::from_std(handle.deadline);

    println!(
        "Launching '{}' with {} in {}s. Press Ctrl+C to pick a different build.",
        record.file_name().bold(),
        install.version.to_string().cyan(),
        (handle.deadline - std::time::Instant::now()).as_secs() + 1,
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                if ctx.sequencer.countdown_fired(handle) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                ctx.sequencer.interrupt();
                println!();
                match pick_install_interactively(ctx, catalog, "Launch with which build?")? {
                    Some(choice) => {
                        install = choice;
                        ctx.sequencer.launch_now();
                        break;
                    }
                    None => return cancel(ctx),
                }
            }
        }
    }

    launch(ctx, record, &install)
}

fn cancel(ctx: &mut AppContext) -> Result<()> {
    ctx.sequencer.cancel();
    println!("{}", "Launch cancelled.".yellow());
    Ok(())
}

/// Commits the launch to history, then spawns. A failed spawn rolls the
/// history back and clears the selection; a failed history write never
/// blocks the launch itself.
fn launch(ctx: &mut AppContext, record: &ProjectRecord, install: &InstalledVersion) -> Result<()> {
    let snapshot = ctx.config().launcher_recents.clone();
    history::commit_launch(ctx.config_mut(), &record.path, SystemTime::now());

    let extra_args = ctx.config().extra_launch_args.clone();
    if let Err(err) = launcher::launch_project(install, &record.path, &extra_args) {
        ctx.config_mut().launcher_recents = snapshot;
        ctx.sequencer.reset();
        return Err(err.into());
    }

    if let Err(err) = ctx.persist() {
        log::warn!("Launched, but could not save history: {err}");
    }
    println!(
        "{}",
        format!("Launched {} with {}.", record.file_name(), install.version).green()
    );
    Ok(())
}
