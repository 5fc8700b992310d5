use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use workspace_runtime_manager::{
    size, Installer, InstallerConfigProvisioner, ParserRegistry, ProvisionerPipeline, Settings,
    StaticInstallerRegistry, VolumeOptions, WorkspaceEnvironmentSpec, WorkspaceVolumeProvisioner,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a workspace environment spec and print the resulting
    /// runtime configuration
    Provision {
        /// Path to a workspace environment spec (JSON)
        spec: PathBuf,

        /// Path to an installer catalog (JSON array of installers)
        #[arg(short, long)]
        installers: Option<PathBuf>,

        /// Override the configured volume-support flag
        #[arg(long)]
        no_volumes: bool,
    },
    /// Convert a human-readable size string to a byte count
    ToBytes {
        /// Size string, e.g. "512Mi" or "2G"
        size: String,
    },
    /// Convert a byte count to a human-readable size string
    ToHuman {
        bytes: i64,

        /// Use the SI decimal unit family instead of the binary one
        #[arg(long)]
        si: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path.to_str().unwrap_or_default())
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();

    match cli.command {
        Commands::Provision {
            spec,
            installers,
            no_volumes,
        } => provision(&settings, &spec, installers.as_deref(), no_volumes).await,
        Commands::ToBytes { size } => {
            println!("{}", size::to_bytes(&size)?);
            Ok(())
        }
        Commands::ToHuman { bytes, si } => {
            println!("{}", size::to_human_size(bytes, si));
            Ok(())
        }
    }
}

async fn provision(
    settings: &Settings,
    spec_path: &std::path::Path,
    installers_path: Option<&std::path::Path>,
    no_volumes: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(spec_path)
        .with_context(|| format!("Failed to read spec {}", spec_path.display()))?;
    let spec: WorkspaceEnvironmentSpec =
        serde_json::from_str(&content).context("Failed to parse workspace environment spec")?;

    let mut installer_registry = StaticInstallerRegistry::new();
    if let Some(path) = installers_path {
        let catalog = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read installer catalog {}", path.display()))?;
        let installers: Vec<Installer> =
            serde_json::from_str(&catalog).context("Failed to parse installer catalog")?;
        for installer in installers {
            installer_registry.register(installer);
        }
    }

    let registry = ParserRegistry::with_default_parsers();
    let mut env = registry.parse(&spec)?;

    let mut volume_options = VolumeOptions::from_settings(settings);
    if no_volumes {
        volume_options.enabled = false;
    }

    let mut pipeline = ProvisionerPipeline::new();
    pipeline.add(Arc::new(InstallerConfigProvisioner::new(Arc::new(
        installer_registry,
    ))));
    pipeline.add(Arc::new(WorkspaceVolumeProvisioner::new(volume_options)));
    pipeline.provision(&spec, &mut env).await?;

    info!(
        "provisioned runtime {} with {} container(s)",
        Uuid::new_v4(),
        env.containers.len()
    );
    println!("{}", serde_json::to_string_pretty(&env)?);
    Ok(())
}
