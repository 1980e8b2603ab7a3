// src/system/launcher.rs

use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::models::InstalledVersion;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Could not parse extra launch arguments: '{0}'")]
    BadExtraArgs(String),
    #[error("Could not start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Starts the given TouchDesigner build on a project file and detaches.
///
/// The child owns its own stdio; the launcher process exits right after and
/// never waits on it. On macOS the app bundle goes through `open -a` so
/// LaunchServices treats it like a double-clicked document.
pub fn launch_project(
    install: &InstalledVersion,
    file: &Path,
    extra_args: &str,
) -> Result<(), LaunchError> {
    let extras = split_extra_args(extra_args)?;

    let mut command = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg("-a").arg(&install.install_path).arg(file);
        if !extras.is_empty() {
            c.arg("--args").args(&extras);
        }
        c
    } else {
        let mut c = Command::new(&install.executable);
        c.args(&extras).arg(file);
        c
    };

    log::info!(
        "Launching '{}' with {}",
        file.display(),
        install.version
    );
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(|e| LaunchError::Spawn {
            program: command.get_program().to_string_lossy().into_owned(),
            source: e,
        })
}

fn split_extra_args(extra_args: &str) -> Result<Vec<String>, LaunchError> {
    let trimmed = extra_args.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    shlex::split(trimmed).ok_or_else(|| LaunchError::BadExtraArgs(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_args_split_shell_style() {
        let args = split_extra_args(" -n --org 'my org' ").unwrap();
        assert_eq!(args, vec!["-n", "--org", "my org"]);
    }

    #[test]
    fn empty_extra_args_are_fine() {
        assert!(split_extra_args("   ").unwrap().is_empty());
    }

    #[test]
    fn unbalanced_quoting_is_rejected() {
        assert!(matches!(
            split_extra_args("--org 'unterminated"),
            Err(LaunchError::BadExtraArgs(_))
        ));
    }
}
