// ABOUTME: Result types describing a completed install run
// ABOUTME: Records per-package outcomes, rendered templates, and run timing

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use super::packages::DistributionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PackageOutcome {
    /// Packaging script ran and exited zero
    Compiled,
    /// Source package without a packaging script
    Precompiled,
    /// Pre-built package extracted from `compiled_packages/`
    Extracted,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub name: String,
    pub outcome: PackageOutcome,
    pub install_target: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedTemplate {
    pub source: String,
    pub destination: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub job_name: String,
    pub mode: DistributionMode,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub packages: Vec<PackageReport>,
    pub templates: Vec<RenderedTemplate>,
    pub executables: usize,
}

impl InstallReport {
    pub fn new(job_name: String, mode: DistributionMode) -> Self {
        Self {
            job_name,
            mode,
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            packages: Vec::new(),
            templates: Vec::new(),
            executables: 0,
        }
    }

    pub fn add_package(&mut self, name: String, outcome: PackageOutcome, install_target: PathBuf) {
        self.packages.push(PackageReport {
            name,
            outcome,
            install_target,
        });
    }

    pub fn add_template(&mut self, source: String, destination: PathBuf, bytes: usize) {
        self.templates.push(RenderedTemplate {
            source,
            destination,
            bytes,
        });
    }

    pub fn mark_completed(&mut self) {
        let end_time = Utc::now();
        self.end_time = Some(end_time);
        self.duration = Some(
            (end_time - self.start_time)
                .to_std()
                .unwrap_or(Duration::ZERO),
        );
    }

    pub fn package_names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn count_outcome(&self, outcome: PackageOutcome) -> usize {
        self.packages.iter().filter(|p| p.outcome == outcome).count()
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        let duration = self
            .duration
            .map(|d| format!(" in {:.2}s", d.as_secs_f64()))
            .unwrap_or_default();

        format!(
            "Installed job {} ({} release): {} packages ({} compiled, {} pre-compiled, {} extracted), {} templates rendered, {} executables{}",
            self.job_name,
            self.mode,
            self.packages.len(),
            self.count_outcome(PackageOutcome::Compiled),
            self.count_outcome(PackageOutcome::Precompiled),
            self.count_outcome(PackageOutcome::Extracted),
            self.templates.len(),
            self.executables,
            duration
        )
    }
}
