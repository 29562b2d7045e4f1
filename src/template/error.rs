// ABOUTME: Error types for template rendering operations
// ABOUTME: Separates unresolved property references from malformed templates and IO failures

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unresolved property reference: {name}")]
    UnresolvedReference { name: String },

    #[error("Malformed template{}: {message}", location_suffix(.template))]
    MalformedTemplate {
        template: Option<String>,
        message: String,
    },

    #[error("Template render error: {0}")]
    RenderError(String),

    #[error("IO error on {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Context document error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn location_suffix(template: &Option<String>) -> String {
    match template {
        Some(name) => format!(" '{}'", name),
        None => String::new(),
    }
}

impl TemplateError {
    /// Process exit code for this failure when it ends a run
    pub fn exit_code(&self) -> i32 {
        match self {
            TemplateError::UnresolvedReference { .. } => 5,
            TemplateError::MalformedTemplate { .. } => 6,
            TemplateError::IoError { .. } => 7,
            TemplateError::JsonError(_) => 3,
            TemplateError::RenderError(_) => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TemplateError::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Failure raised from inside a property helper. Carried through handlebars
/// as the cause of a `RenderError` and recovered by the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyLookupError {
    #[error("property '{0}' is not set and has no default")]
    Unresolved(String),

    #[error("{0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
