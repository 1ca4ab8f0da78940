// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fleet Bridge CLI
//!
//! Subscribes to fleet telemetry topics and persists announcements and
//! readings into SQLite.
//!
//! # Usage
//!
//! ```bash
//! # Run the bridge with a config file
//! fleet-bridge --config bridge.yaml
//!
//! # Inspect the store without touching the broker
//! fleet-bridge --config bridge.yaml sensors
//! fleet-bridge --config bridge.yaml stats
//! fleet-bridge --config bridge.yaml clear --confirm
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_bridge::{BridgePipeline, Config, DocumentStore, MqttTransport, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "fleet-bridge")]
#[command(about = "MQTT-to-document-store bridge for edge sensor fleets", long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = "bridge.yaml")]
    config: PathBuf,

    /// Override the database path from the config
    #[arg(long)]
    db: Option<String>,

    /// Override the broker host from the config
    #[arg(long)]
    host: Option<String>,

    /// Override the client id from the config
    #[arg(long)]
    client_id: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List announced sensors
    Sensors,
    /// Dump stored readings
    Readings,
    /// Show document counts
    Stats,
    /// Clear all stored documents
    Clear {
        /// Confirm deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    if let Some(db) = args.db {
        config.database.path = db;
    }
    if let Some(host) = args.host {
        config.mqtt.host = host;
    }
    if let Some(client_id) = args.client_id {
        config.mqtt.client_id = client_id;
    }

    let store = SqliteStore::new(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;

    // Handle store-inspection subcommands
    if let Some(cmd) = args.command {
        return handle_command(cmd, store);
    }

    tracing::info!("Fleet bridge starting");
    tracing::info!("  Broker: {}:{}", config.mqtt.host, config.mqtt.port);
    tracing::info!("  Database: {}", config.database.path);
    if config.mqtt.tls.is_some() {
        tracing::info!("  TLS: enabled");
    }

    let (transport, events) =
        MqttTransport::connect(&config.mqtt).context("Failed to set up the MQTT connection")?;

    let pipeline = BridgePipeline::new(Arc::new(store), Arc::new(transport), events);
    let stats = pipeline.stats();

    let result = tokio::select! {
        result = pipeline.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            Ok(())
        }
    };

    let snapshot = stats.snapshot();
    tracing::info!(
        "Processed {} messages ({} announcements, {} readings, {} decode failures, {} unrecognized, {} store errors)",
        snapshot.messages_received,
        snapshot.announcements_stored,
        snapshot.readings_stored,
        snapshot.decode_failures,
        snapshot.unrecognized,
        snapshot.store_errors
    );

    result
}

fn handle_command(cmd: Commands, store: SqliteStore) -> Result<()> {
    match cmd {
        Commands::Sensors => {
            let docs = store.announcements()?;
            println!("{} announced sensors:", docs.len());
            for doc in &docs {
                println!("  {}", doc.document);
            }
        }
        Commands::Readings => {
            let docs = store.readings()?;
            println!("{} stored readings:", docs.len());
            for doc in &docs {
                println!("  {} (received_at_ns={})", doc.document, doc.received_at_ns);
            }
        }
        Commands::Stats => {
            println!("Announcements: {}", store.announcements()?.len());
            println!("Readings:      {}", store.readings()?.len());
            println!("Total:         {}", store.count()?);
        }
        Commands::Clear { confirm } => {
            if confirm {
                store.clear()?;
                println!("All documents cleared.");
            } else {
                println!("Use --confirm to actually delete documents.");
            }
        }
    }

    Ok(())
}
