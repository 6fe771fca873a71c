//! Wheelhouse CLI - serve private Python distributions as a simple index

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wheelhouse_index::{IndexConfig, build_registry};
use wheelhouse_server::{AppState, app};

#[derive(Parser)]
#[command(name = "wheelhouse")]
#[command(version)]
#[command(about = "Simple-repository index server for private Python distributions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the index server
    Serve {
        /// Configuration file (default: ~/.config/wheelhouse/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,

        /// Artifact cache directory (overrides configuration)
        #[arg(long)]
        artifact_dir: Option<PathBuf>,
    },

    /// Load the configuration, build the registry and report what
    /// would be served, without starting the server
    CheckConfig {
        /// Configuration file (default: ~/.config/wheelhouse/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<IndexConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(IndexConfig::load_from(path)?),
        None => Ok(IndexConfig::load()?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Serve {
            config,
            port,
            artifact_dir,
        } => serve(config, port, artifact_dir).await,
        Commands::CheckConfig { config } => check_config(config),
    }
}

async fn serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    artifact_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path.as_ref())?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = artifact_dir {
        config.server.artifact_dir = dir;
    }

    let registry = build_registry(&config.origins).map_err(|e| {
        tracing::error!("Registry construction failed: {e}");
        e
    })?;
    if registry.is_empty() {
        tracing::warn!("No origins configured; the index will be empty");
    }

    let port = config.server.port;
    let state = AppState::new(registry, config.server)?;
    let router = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("wheelhouse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn check_config(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path.as_ref())?;
    let registry = build_registry(&config.origins)?;

    println!("Configuration OK");
    println!("  port:          {}", config.server.port);
    println!("  artifact dir:  {}", config.server.artifact_dir.display());
    if !config.server.base_path.is_empty() {
        println!("  base path:     {}", config.server.base_path);
    }
    println!("  origins:       {}", config.origins.len());
    println!("  distributions: {}", registry.len());
    for name in registry.names() {
        println!("    {name}");
    }

    Ok(())
}
