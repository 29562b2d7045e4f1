// ABOUTME: Manifest module for BOSH release and job descriptors
// ABOUTME: Parses release.MF and job.MF into typed specs used by the installer

pub mod error;
pub mod job;
pub mod release;

pub use error::{ManifestError, Result};
pub use job::{JobSpec, PropertyDeclaration};
pub use release::{JobEntry, PackageSpec, ReleaseManifest};
