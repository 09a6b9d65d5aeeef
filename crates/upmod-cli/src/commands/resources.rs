//! Resources command implementation

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use miette::{IntoDiagnostic, Result};
use upmod_core::config::Config;
use upmod_core::resources::copy_project_manifest;

/// Arguments for the resources command
#[derive(Debug, Args)]
pub struct ResourcesArgs {
    /// Build output directory (default: from upmod.toml, else target/classes)
    #[arg(long)]
    pub output_dir: Option<Utf8PathBuf>,
}

/// Run the resources command
pub fn run(project_dir: &Utf8Path, args: ResourcesArgs) -> Result<()> {
    let config = Config::load(project_dir).into_diagnostic()?;

    let output_dir = match args.output_dir {
        Some(dir) => project_dir.join(dir),
        None => config.resources_output_dir(project_dir),
    };

    if !copy_project_manifest(project_dir, &output_dir).into_diagnostic()? {
        tracing::debug!("Project manifest not copied");
    }

    Ok(())
}
