//! upmod CLI - upstream JavaScript module installer

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// upmod - install JavaScript modules shipped inside project dependencies
#[derive(Debug, Parser)]
#[command(name = "upmod")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory
    #[arg(short = 'p', long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract upstream modules from the dependency graph into the module directory
    Install(commands::install::InstallArgs),

    /// Copy the project's package.json into the build output directory
    Resources(commands::resources::ResourcesArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let project_dir = if let Some(ref path) = cli.project {
        camino::Utf8PathBuf::from(path)
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|p| camino::Utf8PathBuf::try_from(p).ok())
            .unwrap_or_else(|| camino::Utf8PathBuf::from("."))
    };

    match cli.command {
        Commands::Install(args) => commands::install::run(&project_dir, args),
        Commands::Resources(args) => commands::resources::run(&project_dir, args),
    }
}
