// ABOUTME: CLI module for the warden_cpi job installer
// ABOUTME: Exports command line interface components and main application logic

pub mod app;
pub mod args;
pub mod commands;
pub mod config;

pub use app::{exit_code, App};
pub use args::Args;
pub use config::{Config, ConfigError};
