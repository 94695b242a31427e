//! Edge router configuration CLI.
//!
//! Builds the dynamic routing configuration from an instance snapshot, once
//! or on every change of the snapshot file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use edge_router::config::{load_settings, Settings, SnapshotWatcher};
use edge_router::dynamic::Configuration;
use edge_router::observability::logging;
use edge_router::provider::{load_file, load_snapshot};
use edge_router::{ConfigurationBuilder, ConfigurationStore};

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(about = "Assemble edge router configuration from service discovery labels", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the configuration of an instance snapshot and print it as JSON
    Build {
        /// Instance snapshot (JSON or YAML list of instances)
        #[arg(short, long)]
        instances: PathBuf,
    },
    /// Decode a dynamic configuration file (TOML or YAML) and print it as JSON
    DecodeFile {
        path: PathBuf,
    },
    /// Rebuild the configuration whenever the instance snapshot changes
    Watch {
        #[arg(short, long)]
        instances: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    logging::init(&settings.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        prefix = %settings.provider.prefix,
        exposed_by_default = settings.provider.exposed_by_default,
        constraints = settings.provider.constraints.len(),
        "Settings loaded"
    );

    match cli.command {
        Commands::Build { instances } => {
            let builder = ConfigurationBuilder::new(settings.provider);
            let config = builder.build(&load_snapshot(&instances)?);
            print_json(&config)?;
        }
        Commands::DecodeFile { path } => {
            let decoded = load_file(&path)?;
            let errors: Vec<String> = decoded.errors.iter().map(ToString::to_string).collect();
            print_json(&serde_json::json!({
                "configuration": decoded.value,
                "unsupportedKeys": decoded.unsupported_keys,
                "errors": errors,
            }))?;
        }
        Commands::Watch { instances } => {
            watch(settings, &instances).await?;
        }
    }

    Ok(())
}

async fn watch(settings: Settings, instances: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let builder = ConfigurationBuilder::new(settings.provider);
    let store = ConfigurationStore::default();

    match load_snapshot(instances) {
        Ok(snapshot) => publish(&store, builder.build(&snapshot))?,
        Err(e) => tracing::error!(path = ?instances, "Failed to load instance snapshot: {}", e),
    }

    let poll_interval = Duration::from_secs(settings.watch.poll_interval_secs);
    let (watcher, mut updates) = SnapshotWatcher::new(instances, poll_interval);
    let _watcher = watcher.run()?;

    loop {
        tokio::select! {
            Some(snapshot) = updates.recv() => {
                publish(&store, builder.build(&snapshot))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn publish(store: &ConfigurationStore, config: Configuration) -> Result<(), serde_json::Error> {
    if store.publish(config) {
        let current = store.get();
        tracing::info!(
            http_routers = current.http.routers.len(),
            http_services = current.http.services.len(),
            tcp_routers = current.tcp.routers.len(),
            tcp_services = current.tcp.services.len(),
            "Configuration published"
        );
        print_json(current.as_ref())?;
    } else {
        tracing::debug!("Configuration unchanged, skipping publish");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
