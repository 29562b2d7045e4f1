// ABOUTME: Filesystem layout owned by the supervision system
// ABOUTME: Computes /var/vcap run, log, store, job, and package paths under a configurable root

use std::path::{Path, PathBuf};

pub const PACKAGING_SCRIPT: &str = "packaging";

#[derive(Debug, Clone, PartialEq)]
pub struct InstallLayout {
    root: PathBuf,
    job: String,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>, job: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            job: job.into(),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vcap_dir(&self) -> PathBuf {
        self.root.join("var").join("vcap")
    }

    pub fn run_dir(&self) -> PathBuf {
        self.vcap_dir().join("sys").join("run").join(&self.job)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.vcap_dir().join("sys").join("log").join(&self.job)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.vcap_dir().join("store").join(&self.job)
    }

    /// Installed job root; rendered templates land beneath it
    pub fn job_dir(&self) -> PathBuf {
        self.vcap_dir().join("jobs").join(&self.job)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.job_dir().join("bin")
    }

    /// Shared packages root, exported to packaging scripts as `BOSH_PACKAGES_DIR`
    pub fn packages_dir(&self) -> PathBuf {
        self.vcap_dir().join("packages")
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.packages_dir().join(package)
    }

    /// Directories created on every install run
    pub fn runtime_dirs(&self) -> Vec<PathBuf> {
        vec![self.run_dir(), self.log_dir()]
    }
}

/// Paths inside the scratch workspace an extracted release archive occupies
#[derive(Debug, Clone)]
pub struct Workspace<'a> {
    root: &'a Path,
    job: &'a str,
}

impl<'a> Workspace<'a> {
    pub fn new(root: &'a Path, job: &'a str) -> Self {
        Self { root, job }
    }

    pub fn root(&self) -> &Path {
        self.root
    }

    pub fn release_manifest(&self) -> PathBuf {
        self.root.join("release.MF")
    }

    pub fn job_archive(&self) -> PathBuf {
        self.root.join("jobs").join(format!("{}.tgz", self.job))
    }

    /// Extraction directory of the job archive
    pub fn job_dir(&self) -> PathBuf {
        self.root.join(self.job)
    }

    pub fn job_manifest(&self) -> PathBuf {
        self.job_dir().join("job.MF")
    }

    pub fn template_source(&self, source: &str) -> PathBuf {
        self.job_dir().join("templates").join(source)
    }

    pub fn source_package_archive(&self, package: &str) -> PathBuf {
        self.root.join("packages").join(format!("{}.tgz", package))
    }

    pub fn compiled_packages_dir(&self) -> PathBuf {
        self.root.join("compiled_packages")
    }

    pub fn compiled_package_archive(&self, package: &str) -> PathBuf {
        self.compiled_packages_dir().join(format!("{}.tgz", package))
    }

    pub fn compile_dir(&self, package: &str) -> PathBuf {
        self.root.join(format!("compile_{}", package))
    }

    pub fn context_document(&self) -> PathBuf {
        self.root.join("context.json")
    }
}
