// ABOUTME: Configuration management for the warden_cpi installer
// ABOUTME: Handles loading and merging configuration from files and environment variables

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::path::PathBuf;
use thiserror::Error;

use crate::installer::{
    default_store_subdirs, InstallLayout, InstallOptions, DEFAULT_PACKAGING_SHELL,
    DEFAULT_RUNTIME_PACKAGE,
};

pub const DEFAULT_JOB_NAME: &str = "warden_cpi";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {var}: {message}")]
    Environment { var: String, message: String },
}

impl ConfigError {
    pub fn exit_code(&self) -> i32 {
        8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_job_name")]
    pub job_name: String,

    #[serde(default = "default_runtime_package")]
    pub runtime_package: String,

    #[serde(default = "default_packaging_shell")]
    pub packaging_shell: String,

    #[serde(default = "default_store_subdirs")]
    pub store_subdirs: Vec<String>,

    #[serde(default)]
    pub job_properties: JsonMap<String, JsonValue>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_job_name() -> String {
    DEFAULT_JOB_NAME.to_string()
}

fn default_runtime_package() -> String {
    DEFAULT_RUNTIME_PACKAGE.to_string()
}

fn default_packaging_shell() -> String {
    DEFAULT_PACKAGING_SHELL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            job_name: default_job_name(),
            runtime_package: default_runtime_package(),
            packaging_shell: default_packaging_shell(),
            store_subdirs: default_store_subdirs(),
            job_properties: JsonMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.merge_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Load configuration without consulting the environment
    pub fn load_file(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
            path: config_path,
            source: e,
        })
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = vec![
            PathBuf::from("warden-cpi-install.yaml"),
            PathBuf::from("warden-cpi-install.yml"),
            PathBuf::from(".warden-cpi-install.yaml"),
        ];

        // Check current directory
        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".warden-cpi-install").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Return default path (may not exist)
        PathBuf::from("warden-cpi-install.yaml")
    }

    /// Merge environment overrides; `lookup` resolves a variable name
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("WARDEN_CPI_INSTALL_ROOT") {
            if root.trim().is_empty() {
                return Err(ConfigError::Environment {
                    var: "WARDEN_CPI_INSTALL_ROOT".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            self.root = PathBuf::from(root);
        }
        if let Some(job) = lookup("WARDEN_CPI_JOB") {
            self.job_name = job;
        }
        if let Some(package) = lookup("WARDEN_CPI_RUNTIME_PACKAGE") {
            self.runtime_package = package;
        }

        // Logging configuration
        if let Some(level) = lookup("WARDEN_CPI_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WARDEN_CPI_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(self.root.clone(), self.job_name.clone())
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            runtime_package: self.runtime_package.clone(),
            packaging_shell: self.packaging_shell.clone(),
            job_properties: self.job_properties.clone(),
            store_subdirs: self.store_subdirs.clone(),
        }
    }
}
