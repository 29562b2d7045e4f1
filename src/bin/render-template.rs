// ABOUTME: Standalone template renderer for job templates
// ABOUTME: Renders one template against a context.json document into a destination file

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden_cpi_install::cli::exit_code;
use warden_cpi_install::{RenderContext, TemplateEngine};

#[derive(Parser, Debug)]
#[command(name = "render-template")]
#[command(about = "Render a job template against a property context document")]
#[command(version)]
struct RenderArgs {
    #[arg(help = "Context document with default_properties and job_properties")]
    context: PathBuf,

    #[arg(help = "Template source file")]
    source: PathBuf,

    #[arg(help = "Destination file (parent directories are created)")]
    destination: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn render(args: &RenderArgs) -> Result<()> {
    let context = RenderContext::load(&args.context)?;
    let engine = TemplateEngine::new();
    let bytes = engine.render_file(&context, &args.source, &args.destination)?;

    info!(
        "Rendered {} -> {} ({} bytes)",
        args.source.display(),
        args.destination.display(),
        bytes
    );
    Ok(())
}

fn main() {
    let args = RenderArgs::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = render(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}
