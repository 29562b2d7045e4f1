// ABOUTME: Template engine implementation using Handlebars
// ABOUTME: Renders job templates against a property context and writes the results to disk

use handlebars::Handlebars;
use std::path::Path;
use tracing::debug;

use super::context::RenderContext;
use super::error::{PropertyLookupError, Result, TemplateError};
use super::helpers;

#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with all built-in helpers
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Missing variables are errors, never blanks
        handlebars.set_strict_mode(true);
        handlebars.set_dev_mode(false);

        // Job templates are config files and shell scripts, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        helpers::register_helpers(&mut handlebars);

        Self { handlebars }
    }

    /// Render template text with the given property context
    pub fn render_str(&self, template: &str, context: &RenderContext) -> Result<String> {
        self.render_named(None, template, context)
    }

    /// Render `source` into `destination`, creating parent directories and
    /// replacing any existing file
    pub fn render_file(
        &self,
        context: &RenderContext,
        source: &Path,
        destination: &Path,
    ) -> Result<usize> {
        let template =
            std::fs::read_to_string(source).map_err(|e| TemplateError::io(source, e))?;

        let name = source.display().to_string();
        let rendered = self.render_named(Some(&name), &template, context)?;

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TemplateError::io(parent, e))?;
        }
        std::fs::write(destination, &rendered).map_err(|e| TemplateError::io(destination, e))?;

        debug!(
            "Rendered {} -> {} ({} bytes)",
            source.display(),
            destination.display(),
            rendered.len()
        );

        Ok(rendered.len())
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        handlebars::Template::compile(template)
            .map(|_| ())
            .map_err(|e| TemplateError::MalformedTemplate {
                template: None,
                message: e.to_string(),
            })
    }

    fn render_named(
        &self,
        name: Option<&str>,
        template: &str,
        context: &RenderContext,
    ) -> Result<String> {
        handlebars::Template::compile(template).map_err(|e| TemplateError::MalformedTemplate {
            template: name.map(str::to_string),
            message: e.to_string(),
        })?;

        self.handlebars
            .render_template(template, &context.to_json())
            .map_err(|e| classify_render_error(name, e))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a handlebars render failure onto the renderer's error taxonomy
fn classify_render_error(name: Option<&str>, error: handlebars::RenderError) -> TemplateError {
    let lookup = std::error::Error::source(&error)
        .and_then(|cause| cause.downcast_ref::<PropertyLookupError>())
        .cloned();

    match lookup {
        Some(PropertyLookupError::Unresolved(property)) => {
            TemplateError::UnresolvedReference { name: property }
        }
        Some(PropertyLookupError::Malformed(message)) => TemplateError::MalformedTemplate {
            template: name.map(str::to_string),
            message,
        },
        None if error.desc.contains("strict mode") => TemplateError::UnresolvedReference {
            name: quoted_path(&error.desc).unwrap_or_else(|| error.desc.clone()),
        },
        None if error.desc.contains("Helper not defined") => TemplateError::MalformedTemplate {
            template: name.map(str::to_string),
            message: error.desc.clone(),
        },
        None => TemplateError::RenderError(error.to_string()),
    }
}

fn quoted_path(desc: &str) -> Option<String> {
    let start = desc.find('"')? + 1;
    let end = start + desc[start..].find('"')?;
    Some(desc[start..end].to_string())
}
