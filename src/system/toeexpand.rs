// src/system/toeexpand.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::constants::PROBE_TIMEOUT;
use crate::core::catalog::VersionCatalog;
use crate::core::resolver::{ResolveError, VersionProbe};
use crate::models::BuildVersion;

/// Probes a project file with TouchDesigner's bundled `toeexpand -b` tool
/// to learn the build that wrote it.
#[derive(Debug, Clone)]
pub struct ToeExpandProbe {
    tool: PathBuf,
    timeout: Duration,
}

impl ToeExpandProbe {
    pub fn new(tool: PathBuf) -> Self {
        Self {
            tool,
            timeout: PROBE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(tool: PathBuf, timeout: Duration) -> Self {
        Self { tool, timeout }
    }

    /// Finds a usable `toeexpand` inside any catalogued installation,
    /// preferring the newest. Any build's copy can read any project file.
    pub fn locate(catalog: &VersionCatalog) -> Option<Self> {
        catalog.installed().iter().find_map(|install| {
            let tool = toeexpand_path(&install.install_path);
            if tool.is_file() {
                log::debug!("Using toeexpand at '{}'", tool.display());
                Some(Self::new(tool))
            } else {
                None
            }
        })
    }
}

fn toeexpand_path(install_path: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        install_path.join("Contents").join("MacOS").join("toeexpand")
    } else if cfg!(target_os = "windows") {
        install_path.join("bin").join("toeexpand.exe")
    } else {
        install_path.join("bin").join("toeexpand")
    }
}

impl VersionProbe for ToeExpandProbe {
    fn probe(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<BuildVersion, ResolveError>> + Send {
        let tool = self.tool.clone();
        let timeout = self.timeout;
        let path = path.to_path_buf();
        async move {
            log::debug!("Probing '{}' with '{}'", path.display(), tool.display());
            let run = Command::new(&tool)
                .arg("-b")
                .arg(&path)
                .stdin(Stdio::null())
                .output();
            let output = tokio::time::timeout(timeout, run)
                .await
                .map_err(|_| {
                    ResolveError::ProbeFailed(format!(
                        "toeexpand took longer than {}s",
                        timeout.as_secs()
                    ))
                })?
                .map_err(|e| {
                    ResolveError::ProbeFailed(format!(
                        "could not run '{}': {e}",
                        tool.display()
                    ))
                })?;

            // toeexpand often exits non-zero even when its output is fine;
            // judge by the output alone.
            let stdout = String::from_utf8_lossy(&output.stdout);
            parse_probe_output(&stdout).ok_or_else(|| {
                let stderr = String::from_utf8_lossy(&output.stderr);
                ResolveError::ProbeFailed(format!(
                    "unusable toeexpand output (stderr: {})",
                    stderr.trim()
                ))
            })
        }
    }
}

/// The build number sits on the second non-empty line of `toeexpand -b`
/// output, as the last space-separated token.
pub(crate) fn parse_probe_output(stdout: &str) -> Option<BuildVersion> {
    let cleaned = stdout.replace('\r', "");
    let lines: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let token = lines.get(1)?.rsplit(' ').next()?;
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_number_is_read_from_the_second_line() {
        let stdout = "/projects/show.toe:\nbuild 2023.11600\n";
        assert_eq!(
            parse_probe_output(stdout),
            Some("2023.11600".parse().unwrap())
        );
    }

    #[test]
    fn windows_line_endings_and_blank_lines_are_tolerated() {
        let stdout = "\r\n/projects/show.toe:\r\n\r\nbuild 2022.35320\r\n";
        assert_eq!(
            parse_probe_output(stdout),
            Some("2022.35320".parse().unwrap())
        );
    }

    #[test]
    fn truncated_or_garbage_output_yields_nothing() {
        assert_eq!(parse_probe_output(""), None);
        assert_eq!(parse_probe_output("/projects/show.toe:\n"), None);
        assert_eq!(parse_probe_output("a\nbuild whatever\n"), None);
    }

    #[tokio::test]
    async fn a_missing_tool_reports_a_probe_failure() {
        let probe = ToeExpandProbe::with_timeout(
            PathBuf::from("/no/such/toeexpand"),
            Duration::from_secs(1),
        );
        let result = probe.probe(Path::new("/tmp/show.toe")).await;
        assert!(matches!(result, Err(ResolveError::ProbeFailed(_))));
    }
}
