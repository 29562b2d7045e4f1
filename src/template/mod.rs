// ABOUTME: Template rendering module for job templates
// ABOUTME: Provides the property context, Handlebars engine, and property lookup helpers

pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;

pub use context::{nest_property, PropertyConflict, RenderContext};
pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};
