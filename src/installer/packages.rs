// ABOUTME: Package selection and ordering for an install run
// ABOUTME: Chooses source or compiled distribution and orders the runtime package first

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::manifest::{JobSpec, ReleaseManifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Packages are compiled on this machine by their packaging scripts
    Source,
    /// Packages ship pre-built under `compiled_packages/`
    Compiled,
}

impl std::fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionMode::Source => write!(f, "source"),
            DistributionMode::Compiled => write!(f, "compiled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackagePlan {
    pub mode: DistributionMode,
    pub packages: Vec<String>,
}

impl PackagePlan {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Decide which packages to materialize and in which order.
///
/// `compiled_dir` is the release's `compiled_packages/` directory; its
/// presence alone switches the plan to compiled mode.
pub fn plan_packages(
    release: &ReleaseManifest,
    job: &JobSpec,
    runtime_package: &str,
    compiled_dir: &Path,
) -> PackagePlan {
    let mode = if release.is_compiled() || compiled_dir.is_dir() {
        DistributionMode::Compiled
    } else {
        DistributionMode::Source
    };

    let available = match mode {
        DistributionMode::Source => release.package_names(),
        DistributionMode::Compiled if release.is_compiled() => release.compiled_package_names(),
        DistributionMode::Compiled => discover_compiled_packages(compiled_dir),
    };

    let needed: HashSet<&str> = job
        .packages
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(runtime_package))
        .collect();

    let mut seen = HashSet::new();
    let selected: Vec<String> = available
        .into_iter()
        .filter(|name| needed.contains(name.as_str()))
        .filter(|name| seen.insert(name.clone()))
        .collect();

    for name in &job.packages {
        if !selected.contains(name) {
            debug!("Job package '{}' is not shipped in this release", name);
        }
    }

    for name in &selected {
        if let Some(spec) = release.find_package(name) {
            for dependency in &spec.dependencies {
                if !selected.contains(dependency) {
                    debug!(
                        "Package '{}' depends on '{}', which is not part of the install plan",
                        name, dependency
                    );
                }
            }
        }
    }

    PackagePlan {
        mode,
        packages: order_runtime_first(selected, runtime_package),
    }
}

/// Stable partition: the runtime package moves to the front, everything
/// else keeps its relative order.
pub fn order_runtime_first(mut packages: Vec<String>, runtime_package: &str) -> Vec<String> {
    packages.sort_by_key(|name| name != runtime_package);
    packages
}

/// Package names of the `*.tgz` files directly under `dir`, sorted by name
pub fn discover_compiled_packages(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(".tgz"))
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
}
