// ABOUTME: Job manifest (job.MF) data structures and parsing
// ABOUTME: Exposes the package list, ordered template mapping, and property defaults of a job

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::path::Path;

use super::error::{ManifestError, Result};
use crate::template::nest_property;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    /// Template source (relative to `templates/`) to destination (relative to the job root)
    #[serde(default)]
    pub templates: IndexMap<String, String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDeclaration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    pub description: Option<String>,
    pub default: Option<JsonValue>,
}

impl JobSpec {
    /// Parse job manifest from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse job manifest from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse(content, "job.MF")
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ManifestError::YamlError {
            origin: origin.to_string(),
            source: e,
        })
    }

    /// Defaults of every declared property, with dotted names expanded into
    /// nested objects. Properties declared without a default are omitted.
    pub fn default_properties(&self) -> Result<JsonMap<String, JsonValue>> {
        let mut defaults = JsonMap::new();
        for (name, declaration) in &self.properties {
            if let Some(default) = &declaration.default {
                nest_property(&mut defaults, name, default.clone())?;
            }
        }
        Ok(defaults)
    }

    pub fn uses_package(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p == package)
    }
}
