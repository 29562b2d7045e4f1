// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the installer CLI: archive path plus logging and config options

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "warden-cpi-install")]
#[command(about = "Install the warden_cpi job from a BOSH release archive")]
#[command(version)]
pub struct Args {
    #[arg(
        help = "Path to the release archive (.tgz)",
        required_unless_present = "prepare_only"
    )]
    pub archive: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    #[arg(
        long,
        help = "Only create the job's run, log, and store directories",
        conflicts_with = "archive"
    )]
    pub prepare_only: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
