// src/cli/handlers/commons.rs

// This module contains shared functions used by multiple handlers.

use anyhow::{Result, anyhow};
use colored::Colorize;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};
use thiserror::Error;

use crate::core::catalog::{InstallScan, VersionCatalog};
use crate::models::{InstalledVersion, LauncherConfig, ProjectRecord};

/// Sentinel for a user-initiated abort (Esc or Ctrl+C at a prompt). The
/// binary exits silently with code 130 when it surfaces.
#[derive(Error, Debug)]
#[error("interrupted by user")]
pub struct Interrupted;

/// Scans the well-known install roots plus the user-configured extras.
pub fn scan_catalog(config: &LauncherConfig) -> VersionCatalog {
    VersionCatalog::from_registry(&InstallScan::new(&config.install_roots))
}

/// One line of the interactive project list.
pub fn format_record_line(record: &ProjectRecord) -> String {
    let mut line = format!(
        "{}  {}",
        record.file_name(),
        format!("[{}]", record.source.label()).dimmed()
    );
    if !record.exists {
        line.push_str(&format!("  {}", "(missing)".red()));
    }
    line
}

/// Interactive project picker. `Ok(index)` into `records`.
pub fn select_record(records: &[ProjectRecord]) -> Result<usize> {
    let items: Vec<String> = records.iter().map(format_record_line).collect();
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Open which project?")
        .items(&items)
        .default(0)
        .interact_opt()?
        .ok_or_else(|| anyhow!(Interrupted))
}

/// Interactive build picker over the catalog, newest first. `Ok(None)` means
/// the user chose to cancel the launch.
pub fn select_install(
    catalog: &VersionCatalog,
    prompt: &str,
) -> Result<Option<InstalledVersion>> {
    let mut items: Vec<String> = catalog
        .installed()
        .iter()
        .map(|install| install.version.to_string())
        .collect();
    items.push("Cancel launch".to_string());

    let picked = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()?
        .ok_or_else(|| anyhow!(Interrupted))?;

    Ok(catalog.installed().get(picked).cloned())
}

pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact_opt()?
        .ok_or_else(|| anyhow!(Interrupted))
}
