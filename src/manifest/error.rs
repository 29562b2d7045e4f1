// ABOUTME: Error types for release and job manifest parsing
// ABOUTME: Covers unreadable files, malformed YAML, and conflicting property names

use std::path::PathBuf;
use thiserror::Error;

use crate::template::PropertyConflict;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {origin}: {source}")]
    YamlError {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid property declaration: {0}")]
    ConflictingProperty(#[from] PropertyConflict),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
