//! Install command implementation

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use miette::{IntoDiagnostic, Result};
use upmod_core::archive::ZipInspector;
use upmod_core::config::Config;
use upmod_core::graph::GraphFile;
use upmod_core::install::{InstallOptions, Installer};

/// Arguments for the install command
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Module directory (default: from upmod.toml, else node_modules)
    #[arg(long)]
    pub modules_dir: Option<Utf8PathBuf>,

    /// Dependency graph file (default: from upmod.toml, else dependency-graph.json)
    #[arg(long)]
    pub graph: Option<Utf8PathBuf>,

    /// Dry run - show which modules would be installed
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the install command
pub fn run(project_dir: &Utf8Path, args: InstallArgs) -> Result<()> {
    let config = Config::load(project_dir).into_diagnostic()?;

    let module_root = match args.modules_dir {
        Some(dir) => project_dir.join(dir),
        None => config.module_root(project_dir),
    };
    let graph_file = match args.graph {
        Some(file) => project_dir.join(file),
        None => config.graph_file(project_dir),
    };

    tracing::info!("Resolving upstream modules from {}", graph_file);

    let graph = GraphFile::new(graph_file);
    let installer = Installer::new(&graph, &ZipInspector);
    let options = InstallOptions {
        module_root,
        dry_run: args.dry_run,
    };
    let report = installer.install(&options).into_diagnostic()?;

    if args.dry_run {
        if report.modules.is_empty() {
            println!("No upstream modules found for {}", report.project);
            return Ok(());
        }

        println!("Would install the following modules:");
        for module in &report.modules {
            println!("  - {} ({}) -> {}", module.name, module.artifact, module.target_dir);
        }
        return Ok(());
    }

    if report.files_written == 0 {
        tracing::info!("Upstream modules are up to date");
    } else {
        tracing::info!(
            "Wrote {} files for {} modules in {:.2?}",
            report.files_written,
            report.modules.len(),
            report.elapsed
        );
    }

    Ok(())
}
