// ABOUTME: Command implementations for the warden_cpi installer CLI
// ABOUTME: Handles the full install run and the directory preparation mode

use anyhow::Result;
use std::path::Path;
use tracing::info;

use super::config::Config;
use crate::installer::{InstallReport, Installer, PackageOutcome};

/// Install the configured job from a release archive
pub async fn install_job(archive: &Path, config: &Config) -> Result<InstallReport> {
    info!(
        "Installing job {} under {}",
        config.job_name,
        config.root.display()
    );

    let installer = Installer::new(config.layout(), config.install_options());
    let report = installer.install(archive).await?;

    println!("{}", report.summary());
    for package in &report.packages {
        let outcome = match package.outcome {
            PackageOutcome::Compiled => "compiled",
            PackageOutcome::Precompiled => "pre-compiled",
            PackageOutcome::Extracted => "extracted",
        };
        println!("  Package '{}': {}", package.name, outcome);
    }
    for template in &report.templates {
        println!(
            "  Template '{}' -> {} ({} bytes)",
            template.source,
            template.destination.display(),
            template.bytes
        );
    }

    Ok(report)
}

/// Create the job's directories without installing anything
pub async fn prepare_job(config: &Config) -> Result<()> {
    let installer = Installer::new(config.layout(), config.install_options());
    let dirs = installer.prepare().await?;

    for dir in &dirs {
        println!("  {}", dir.display());
    }
    println!(
        "Prepared {} directories for job {}",
        dirs.len(),
        config.job_name
    );

    Ok(())
}
