// src/core/catalog.rs

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::{BuildVersion, InstalledVersion};

/// Read-only enumeration of the builds installed on the host.
pub trait VersionRegistry {
    fn enumerate(&self) -> Vec<InstalledVersion>;
}

/// Outcome of matching a required version against the catalog.
///
/// There is deliberately no "compatible" variant: a build either matches
/// exactly or the project is treated as unopenable until the user overrides,
/// because a near-miss build may silently rewrite the authoring format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Exact(InstalledVersion),
    Missing,
}

/// Ordered view over the installed builds: newest first, one entry per
/// distinct version.
#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    installed: Vec<InstalledVersion>,
}

impl VersionCatalog {
    pub fn from_registry(registry: &dyn VersionRegistry) -> Self {
        let mut installed = registry.enumerate();
        installed.sort_by(|a, b| b.version.cmp(&a.version));
        installed.dedup_by(|a, b| a.version == b.version);
        log::debug!("Catalog holds {} installed build(s)", installed.len());
        Self { installed }
    }

    /// Newest-first, deduplicated.
    pub fn installed(&self) -> &[InstalledVersion] {
        &self.installed
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    pub fn find(&self, version: BuildVersion) -> Option<&InstalledVersion> {
        self.installed.iter().find(|iv| iv.version == version)
    }

    /// Exact match or `Missing`; never a silent substitution.
    pub fn matches(&self, required: BuildVersion) -> MatchResult {
        match self.find(required) {
            Some(found) => MatchResult::Exact(found.clone()),
            None => MatchResult::Missing,
        }
    }
}

// --- FILESYSTEM DISCOVERY ---

lazy_static! {
    /// Install directory / bundle names: `TouchDesigner.2023.11600`,
    /// `TouchDesigner 2023.11600.app`, ...
    static ref INSTALL_DIR_NAME: Regex =
        Regex::new(r"(?i)^touchdesigner[ .](\d{4}(?:\.\d+)+)(?:\.app)?$").expect("static regex");
}

/// Discovers installations by scanning well-known install roots plus any
/// user-configured extras. Purely read-only.
#[derive(Debug, Clone)]
pub struct InstallScan {
    roots: Vec<PathBuf>,
}

impl InstallScan {
    pub fn new(extra_roots: &[String]) -> Self {
        let mut roots = default_roots();
        for raw in extra_roots {
            match shellexpand::full(raw) {
                Ok(expanded) => roots.push(PathBuf::from(expanded.into_owned())),
                Err(e) => log::warn!("Ignoring install root '{raw}': {e}"),
            }
        }
        Self { roots }
    }
}

impl VersionRegistry for InstallScan {
    fn enumerate(&self) -> Vec<InstalledVersion> {
        let mut found = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                log::debug!("Install root '{}' not present, skipping", root.display());
                continue;
            }
            for entry in WalkDir::new(root)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let Some(version) = parse_install_dir_name(&name) else {
                    continue;
                };
                let install_path = entry.path().to_path_buf();
                let executable = executable_for(&install_path, &name);
                if executable.exists() {
                    log::debug!("Found TouchDesigner {version} at {}", install_path.display());
                    found.push(InstalledVersion {
                        version,
                        install_path,
                        executable,
                    });
                } else {
                    log::debug!(
                        "Skipping '{}': no launchable executable at {}",
                        install_path.display(),
                        executable.display()
                    );
                }
            }
        }
        found
    }
}

fn default_roots() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        vec![PathBuf::from(r"C:\Program Files\Derivative")]
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Applications")]
    } else {
        vec![PathBuf::from("/opt/derivative")]
    }
}

pub(crate) fn parse_install_dir_name(name: &str) -> Option<BuildVersion> {
    INSTALL_DIR_NAME
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn executable_for(install_path: &Path, dir_name: &str) -> PathBuf {
    if dir_name.to_ascii_lowercase().ends_with(".app") {
        install_path.join("Contents").join("MacOS").join("TouchDesigner")
    } else if cfg!(target_os = "windows") {
        install_path.join("bin").join("TouchDesigner.exe")
    } else {
        install_path.join("bin").join("touchdesigner")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) struct StaticRegistry(pub Vec<InstalledVersion>);

    impl VersionRegistry for StaticRegistry {
        fn enumerate(&self) -> Vec<InstalledVersion> {
            self.0.clone()
        }
    }

    pub(crate) fn installed(version: &str) -> InstalledVersion {
        InstalledVersion {
            version: version.parse().unwrap(),
            install_path: PathBuf::from(format!("/opt/derivative/TouchDesigner.{version}")),
            executable: PathBuf::from(format!(
                "/opt/derivative/TouchDesigner.{version}/bin/touchdesigner"
            )),
        }
    }

    #[test]
    fn catalog_is_newest_first_and_deduplicated() {
        let registry = StaticRegistry(vec![
            installed("2022.30000"),
            installed("2023.11600"),
            installed("2023.11600"),
            installed("2021.10000"),
        ]);
        let catalog = VersionCatalog::from_registry(&registry);
        let versions: Vec<String> = catalog
            .installed()
            .iter()
            .map(|iv| iv.version.to_string())
            .collect();
        assert_eq!(versions, ["2023.11600", "2022.30000", "2021.10000"]);
    }

    #[test]
    fn exact_match_wins() {
        let catalog = VersionCatalog::from_registry(&StaticRegistry(vec![
            installed("2023.11600"),
            installed("2022.30000"),
        ]));
        let result = catalog.matches("2023.11600".parse().unwrap());
        match result {
            MatchResult::Exact(iv) => assert_eq!(iv.version.to_string(), "2023.11600"),
            MatchResult::Missing => panic!("expected exact match"),
        }
    }

    #[test]
    fn near_miss_is_missing_not_substituted() {
        let catalog =
            VersionCatalog::from_registry(&StaticRegistry(vec![installed("2022.30000")]));
        assert_eq!(
            catalog.matches("2023.11600".parse().unwrap()),
            MatchResult::Missing
        );
    }

    #[test]
    fn install_dir_names_parse() {
        assert_eq!(
            parse_install_dir_name("TouchDesigner.2023.11600"),
            Some("2023.11600".parse().unwrap())
        );
        assert_eq!(
            parse_install_dir_name("TouchDesigner 2025.32280.app"),
            Some("2025.32280".parse().unwrap())
        );
        assert_eq!(parse_install_dir_name("TouchDesigner"), None);
        assert_eq!(parse_install_dir_name("Blender.4.1"), None);
    }
}
