// ABOUTME: Job installer orchestrating extraction, package compilation, and template rendering
// ABOUTME: Installs a single job from a release archive into the /var/vcap layout

pub mod archive;
pub mod error;
pub mod layout;
pub mod packages;
pub mod report;
pub mod runner;

pub use archive::{extract_archive, ExtractionStats};
pub use error::{ArchiveError, InstallError, Result, RunnerError};
pub use layout::{InstallLayout, Workspace};
pub use packages::{plan_packages, DistributionMode, PackagePlan};
pub use report::{InstallReport, PackageOutcome, PackageReport, RenderedTemplate};
pub use runner::{Invocation, ProcessOutput, ProcessRunner, SystemProcessRunner};

use chrono::Utc;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::manifest::{JobSpec, ManifestError, ReleaseManifest};
use crate::template::{nest_property, RenderContext, TemplateEngine};
use layout::PACKAGING_SCRIPT;

pub const DEFAULT_RUNTIME_PACKAGE: &str = "golang-1-linux";
pub const DEFAULT_PACKAGING_SHELL: &str = "bash";

pub fn default_store_subdirs() -> Vec<String> {
    [
        "disks",
        "stemcells",
        "ephemeral_bind_mounts_dir",
        "persistent_bind_mounts_dir",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallOptions {
    /// Package compiled before every other package
    pub runtime_package: String,
    /// Interpreter used to run `packaging` scripts
    pub packaging_shell: String,
    /// Operator-supplied property values; dotted names are expanded
    pub job_properties: JsonMap<String, JsonValue>,
    /// Subdirectories of the job's persistent store created by `prepare`
    pub store_subdirs: Vec<String>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            packaging_shell: DEFAULT_PACKAGING_SHELL.to_string(),
            job_properties: JsonMap::new(),
            store_subdirs: default_store_subdirs(),
        }
    }
}

pub struct Installer {
    layout: InstallLayout,
    options: InstallOptions,
    runner: Arc<dyn ProcessRunner>,
    engine: TemplateEngine,
}

impl Installer {
    pub fn new(layout: InstallLayout, options: InstallOptions) -> Self {
        Self::with_runner(layout, options, Arc::new(SystemProcessRunner))
    }

    pub fn with_runner(
        layout: InstallLayout,
        options: InstallOptions,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            layout,
            options,
            runner,
            engine: TemplateEngine::new(),
        }
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Install the job from `archive`.
    ///
    /// Every step is fatal; files already written by earlier steps are left
    /// in place. The scratch workspace is removed on every exit path.
    pub async fn install(&self, archive: &Path) -> Result<InstallReport> {
        let start_time = Utc::now();
        let job_name = self.layout.job_name();

        info!("Installing job {} from {}", job_name, archive.display());

        for dir in self.layout.runtime_dirs() {
            ensure_dir(&dir).await?;
        }

        let scratch = TempDir::new().map_err(|e| InstallError::io(std::env::temp_dir(), e))?;
        let workspace = Workspace::new(scratch.path(), job_name);
        debug!("Using workspace {}", workspace.root().display());

        extract_archive(archive, workspace.root()).await?;
        extract_archive(&workspace.job_archive(), &workspace.job_dir()).await?;

        let job = JobSpec::from_file(workspace.job_manifest())?;
        let release = ReleaseManifest::from_file(workspace.release_manifest())?;

        match job.name.as_deref() {
            Some(name) if name != job_name => warn!(
                "Job manifest names '{}' but installing as '{}'",
                name, job_name
            ),
            None => debug!("Job manifest has no name, installing as '{}'", job_name),
            _ => {}
        }

        let plan = plan_packages(
            &release,
            &job,
            &self.options.runtime_package,
            &workspace.compiled_packages_dir(),
        );
        info!(
            "Materializing {} packages from {} release: {}",
            plan.packages.len(),
            plan.mode,
            plan.packages.join(", ")
        );

        let mut report = InstallReport::new(job_name.to_string(), plan.mode);
        report.start_time = start_time;

        for package in &plan.packages {
            let outcome = match plan.mode {
                DistributionMode::Source => self.compile_package(&workspace, package).await?,
                DistributionMode::Compiled => self.extract_compiled(&workspace, package).await?,
            };
            report.add_package(package.clone(), outcome, self.layout.package_dir(package));
        }

        let context = self.write_context(&job, &workspace)?;

        let job_dir = self.layout.job_dir();
        for (source, destination) in &job.templates {
            let destination_path = job_dir.join(destination);
            let bytes = self.engine.render_file(
                &context,
                &workspace.template_source(source),
                &destination_path,
            )?;
            info!("Rendered template {} -> {}", source, destination_path.display());
            report.add_template(source.clone(), destination_path, bytes);
        }

        report.executables = mark_executables(&self.layout.bin_dir())?;

        report.mark_completed();
        info!("{}", report.summary());

        Ok(report)
    }

    /// Create the job's run, log, and store directories without installing anything
    pub async fn prepare(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = self.layout.runtime_dirs();
        let store_dir = self.layout.store_dir();
        dirs.extend(
            self.options
                .store_subdirs
                .iter()
                .map(|subdir| store_dir.join(subdir)),
        );

        for dir in &dirs {
            ensure_dir(dir).await?;
            debug!("Ensured directory {}", dir.display());
        }

        info!(
            "Prepared {} directories for job {}",
            dirs.len(),
            self.layout.job_name()
        );
        Ok(dirs)
    }

    async fn compile_package(
        &self,
        workspace: &Workspace<'_>,
        package: &str,
    ) -> Result<PackageOutcome> {
        let install_target = self.layout.package_dir(package);
        ensure_dir(&install_target).await?;

        let compile_dir = workspace.compile_dir(package);
        extract_archive(&workspace.source_package_archive(package), &compile_dir).await?;

        if !compile_dir.join(PACKAGING_SCRIPT).is_file() {
            warn!(
                "Package {} has no packaging script, assuming it is pre-compiled",
                package
            );
            return Ok(PackageOutcome::Precompiled);
        }

        info!("Compiling package {}", package);

        let invocation = Invocation::new(&self.options.packaging_shell)
            .arg(PACKAGING_SCRIPT)
            .env("BOSH_COMPILE_TARGET", compile_dir.display().to_string())
            .env("BOSH_INSTALL_TARGET", install_target.display().to_string())
            .env(
                "BOSH_PACKAGES_DIR",
                self.layout.packages_dir().display().to_string(),
            )
            .current_dir(&compile_dir);

        let output = self.runner.run(&invocation).await?;

        if !output.success() {
            error!(
                "Packaging script for {} exited with status {}",
                package, output.exit_code
            );
            return Err(InstallError::PackageCompilation {
                package: package.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        debug!("Package {} compiled into {}", package, install_target.display());
        Ok(PackageOutcome::Compiled)
    }

    async fn extract_compiled(
        &self,
        workspace: &Workspace<'_>,
        package: &str,
    ) -> Result<PackageOutcome> {
        let install_target = self.layout.package_dir(package);
        ensure_dir(&install_target).await?;

        info!("Extracting compiled package {}", package);
        extract_archive(&workspace.compiled_package_archive(package), &install_target).await?;

        Ok(PackageOutcome::Extracted)
    }

    /// Build the job's render context and write it to the workspace's
    /// `context.json`, the document templates are rendered against.
    pub fn write_context(&self, job: &JobSpec, workspace: &Workspace<'_>) -> Result<RenderContext> {
        let context = self.build_context(job)?;
        let context_path = workspace.context_document();
        context.write(&context_path)?;
        debug!("Wrote render context to {}", context_path.display());
        Ok(context)
    }

    fn build_context(&self, job: &JobSpec) -> Result<RenderContext> {
        let default_properties = job.default_properties()?;

        let mut job_properties = JsonMap::new();
        for (name, value) in &self.options.job_properties {
            nest_property(&mut job_properties, name, value.clone()).map_err(ManifestError::from)?;
        }

        Ok(RenderContext::new(default_properties, job_properties))
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| InstallError::io(path, e))
}

/// Add the executable bits to every regular file directly under `bin_dir`
fn mark_executables(bin_dir: &Path) -> Result<usize> {
    if !bin_dir.is_dir() {
        debug!("No bin directory at {}, nothing to mark executable", bin_dir.display());
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(bin_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| InstallError::io(bin_dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let mut permissions = std::fs::metadata(path)
            .map_err(|e| InstallError::io(path, e))?
            .permissions();
        permissions.set_mode(permissions.mode() | 0o111);
        std::fs::set_permissions(path, permissions).map_err(|e| InstallError::io(path, e))?;

        debug!("Marked {} executable", path.display());
        count += 1;
    }

    Ok(count)
}
