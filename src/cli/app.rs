// ABOUTME: Main application orchestration for the warden_cpi installer CLI
// ABOUTME: Coordinates between CLI arguments, configuration, logging, and command execution

use anyhow::{anyhow, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::config::ConfigError;
use super::{Args, Config};
use crate::installer::InstallError;
use crate::template::TemplateError;

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration. Logs go to stderr so that
    /// the install summary on stdout stays clean.
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let result = match self.config.logging.format.as_str() {
            "compact" => tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init(),
        };
        result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting warden-cpi-install v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        if args.prepare_only {
            return commands::prepare_job(&self.config).await;
        }

        let archive = args
            .archive
            .ok_or_else(|| anyhow!("A release archive path is required"))?;
        commands::install_job(&archive, &self.config).await?;

        Ok(())
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}

/// Process exit code for an error returned by `App::run`
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<InstallError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<TemplateError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.exit_code()
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_app_creation() {
        let app = App::new(Config::default());
        assert_eq!(app.config().job_name, "warden_cpi");
    }

    #[test]
    fn test_app_from_args_with_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("warden-cpi-install.yaml");

        fs::write(
            &config_path,
            r#"
root: /tmp/sandbox
logging:
  level: debug
  format: compact
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "warden-cpi-install",
            "--config",
            config_path.to_str().unwrap(),
            "release.tgz",
        ])
        .unwrap();

        let app = App::from_args(&args).unwrap();
        assert_eq!(app.config().logging.format, "compact");
        assert_eq!(app.config().root, PathBuf::from("/tmp/sandbox"));
    }

    #[test]
    fn test_exit_code_mapping() {
        let unresolved: anyhow::Error = InstallError::from(TemplateError::UnresolvedReference {
            name: "cpi.warden.port".to_string(),
        })
        .into();
        assert_eq!(exit_code(&unresolved), 5);

        let malformed: anyhow::Error = TemplateError::MalformedTemplate {
            template: None,
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(exit_code(&malformed), 6);

        let config: anyhow::Error = ConfigError::Environment {
            var: "WARDEN_CPI_INSTALL_ROOT".to_string(),
            message: "must not be empty".to_string(),
        }
        .into();
        assert_eq!(exit_code(&config), 8);

        assert_eq!(exit_code(&anyhow!("something else")), 1);
    }
}
