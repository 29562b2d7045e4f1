// ABOUTME: Main library module for the warden_cpi job installer
// ABOUTME: Exports the manifest, template, and installer modules and provides the public API

pub mod cli;
pub mod installer;
pub mod manifest;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use installer::{InstallError, InstallLayout, InstallOptions, InstallReport, Installer};
pub use manifest::{JobSpec, ReleaseManifest};
pub use template::{RenderContext, TemplateEngine, TemplateError};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
