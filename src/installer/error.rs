// ABOUTME: Error types for the job installer
// ABOUTME: Defines the fatal error taxonomy of an install run and its process exit codes

use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::ManifestError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("Failed to extract {} into {}: {source}", .archive.display(), .destination.display())]
    Extraction {
        archive: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Archive extraction failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Failed to compile package {package}: packaging script exited with status {exit_code}{}", stderr_suffix(.stderr))]
    PackageCompilation {
        package: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Process error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Archive(_) => 2,
            InstallError::Manifest(_) => 3,
            InstallError::PackageCompilation { .. } | InstallError::Runner(_) => 4,
            InstallError::Template(e) => e.exit_code(),
            InstallError::Io { .. } => 7,
            InstallError::JoinError(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;
