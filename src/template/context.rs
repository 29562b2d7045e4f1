// ABOUTME: Property context consumed by the template renderer
// ABOUTME: Holds default and job properties, resolves dotted paths, and round-trips the context document

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::path::Path;
use thiserror::Error;

use super::error::{Result, TemplateError};

/// The context document shared by every render call of an install run.
///
/// Serialized form is `{"default_properties": {...}, "job_properties": {...}}`.
/// Lookups consult `job_properties` first and fall back to `default_properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    #[serde(default)]
    pub default_properties: JsonMap<String, JsonValue>,
    #[serde(default)]
    pub job_properties: JsonMap<String, JsonValue>,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("property '{name}' conflicts with an existing non-object value at '{at}'")]
pub struct PropertyConflict {
    pub name: String,
    pub at: String,
}

impl RenderContext {
    pub fn new(
        default_properties: JsonMap<String, JsonValue>,
        job_properties: JsonMap<String, JsonValue>,
    ) -> Self {
        Self {
            default_properties,
            job_properties,
        }
    }

    /// Resolve a dotted property path, job properties winning over defaults.
    /// Agrees with `merged_properties` at every path.
    pub fn lookup(&self, path: &str) -> Option<JsonValue> {
        resolve_property(&self.job_properties, &self.default_properties, path)
    }

    /// Deep merge of defaults and job properties; job values win at the leaves
    pub fn merged_properties(&self) -> JsonMap<String, JsonValue> {
        let mut merged = self.default_properties.clone();
        deep_merge(&mut merged, &self.job_properties);
        merged
    }

    /// Data handed to handlebars: both documents plus the merged `properties` view
    pub fn to_json(&self) -> JsonValue {
        let mut root = JsonMap::new();
        root.insert(
            "default_properties".to_string(),
            JsonValue::Object(self.default_properties.clone()),
        );
        root.insert(
            "job_properties".to_string(),
            JsonValue::Object(self.job_properties.clone()),
        );
        root.insert(
            "properties".to_string(),
            JsonValue::Object(self.merged_properties()),
        );
        JsonValue::Object(root)
    }

    /// Read a context document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TemplateError::io(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the context document to disk
    pub fn write(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string(self)?;
        std::fs::write(path, contents).map_err(|e| TemplateError::io(path, e))
    }
}

/// Insert `value` under a possibly dotted `name`, creating intermediate objects.
///
/// `cpi.warden.address` becomes `{"cpi": {"warden": {"address": value}}}`.
pub fn nest_property(
    target: &mut JsonMap<String, JsonValue>,
    name: &str,
    value: JsonValue,
) -> std::result::Result<(), PropertyConflict> {
    let segments: Vec<&str> = name.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut current = target;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(JsonMap::new()));
        current = match slot {
            JsonValue::Object(map) => map,
            _ => {
                return Err(PropertyConflict {
                    name: name.to_string(),
                    at: segments[..=depth].join("."),
                })
            }
        };
    }

    if let Some(JsonValue::Object(_)) = current.get(*last) {
        if !value.is_object() {
            return Err(PropertyConflict {
                name: name.to_string(),
                at: name.to_string(),
            });
        }
    }

    if let (Some(JsonValue::Object(existing)), JsonValue::Object(incoming)) =
        (current.get_mut(*last), &value)
    {
        deep_merge(existing, incoming);
        return Ok(());
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Walk a dotted path through objects and arrays. A literal key containing
/// dots is matched before the path is split.
pub fn lookup_path<'a>(map: &'a JsonMap<String, JsonValue>, path: &str) -> Option<&'a JsonValue> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            JsonValue::Object(object) => object.get(segment)?,
            JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve `path` against job properties layered over defaults.
///
/// When both layers hold an object at `path` the two are deep merged, so a
/// partial override keeps the default leaves it does not replace.
pub fn resolve_property(
    job_properties: &JsonMap<String, JsonValue>,
    default_properties: &JsonMap<String, JsonValue>,
    path: &str,
) -> Option<JsonValue> {
    match (
        lookup_path(job_properties, path),
        lookup_path(default_properties, path),
    ) {
        (Some(JsonValue::Object(overlay)), Some(JsonValue::Object(base))) => {
            let mut merged = base.clone();
            deep_merge(&mut merged, overlay);
            Some(JsonValue::Object(merged))
        }
        (Some(value), _) | (None, Some(value)) => Some(value.clone()),
        (None, None) => None,
    }
}

fn deep_merge(base: &mut JsonMap<String, JsonValue>, overlay: &JsonMap<String, JsonValue>) {
    for (key, value) in overlay {
        if let (Some(JsonValue::Object(existing)), JsonValue::Object(incoming)) =
            (base.get_mut(key), value)
        {
            deep_merge(existing, incoming);
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}
