// ABOUTME: Release manifest (release.MF) data structures and parsing
// ABOUTME: Lists source packages or compiled packages along with their declared dependencies

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use super::error::{ManifestError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseManifest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(default)]
    pub compiled_packages: Vec<PackageSpec>,
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    pub fingerprint: Option<String>,
    pub sha1: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    pub fingerprint: Option<String>,
    pub sha1: Option<String>,
}

/// Versions appear both quoted and as bare numbers in release manifests
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(serde_yaml::to_string(&other).unwrap_or_default().trim().to_string()),
    })
}

impl ReleaseManifest {
    /// Parse release manifest from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse release manifest from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse(content, "release.MF")
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ManifestError::YamlError {
            origin: origin.to_string(),
            source: e,
        })
    }

    /// Whether this release ships precompiled packages
    pub fn is_compiled(&self) -> bool {
        !self.compiled_packages.is_empty()
    }

    /// Names of source packages in manifest order
    pub fn package_names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }

    /// Names of compiled packages in manifest order
    pub fn compiled_package_names(&self) -> Vec<String> {
        self.compiled_packages.iter().map(|p| p.name.clone()).collect()
    }

    /// Look up a package by name among source and compiled packages
    pub fn find_package(&self, name: &str) -> Option<&PackageSpec> {
        self.packages
            .iter()
            .chain(self.compiled_packages.iter())
            .find(|p| p.name == name)
    }
}
