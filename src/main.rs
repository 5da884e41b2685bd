//! Beacon replay: runs a pre-load command queue through one instance.
//!
//! Loads configuration, initializes logging, prepends `configure` built
//! from the `edge` section and prints each command result as JSON.

mod transport;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, fmt};

use beacon_core::config::{AppConfig, LogFormat};
use beacon_core::{AppError, AppResult};
use beacon_runtime::{CONFIGURE, CommandCall, Instance};

use crate::transport::LogTransport;

/// Replays a queued list of commands against a Beacon instance.
#[derive(Debug, Parser)]
#[command(name = "beacon-replay", version, about, long_about = None)]
struct Args {
    /// Configuration file layered over `config/default` and `config/{env}`
    #[arg(short, long)]
    config: Option<String>,

    /// Environment overlay to load
    #[arg(short, long, default_value = "development")]
    env: String,

    /// JSON file holding `[{ "command": ..., "options": ... }]`
    #[arg(short, long)]
    queue: PathBuf,

    /// Instance namespace
    #[arg(short, long, default_value = "alloy")]
    namespace: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.env, args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(args, config).await {
        tracing::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let logging = &config.logging;
    match logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(logging.with_target)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(logging.with_target)
                .init();
        }
    }
}

async fn run(args: Args, config: AppConfig) -> AppResult<()> {
    let raw = tokio::fs::read_to_string(&args.queue).await.map_err(|e| {
        AppError::configuration(format!(
            "Cannot read queue file '{}': {}",
            args.queue.display(),
            e
        ))
    })?;
    let queued: Vec<CommandCall> = serde_json::from_str(&raw)?;

    let mut calls = Vec::with_capacity(queued.len() + 1);
    calls.push(CommandCall::new(CONFIGURE, serde_json::to_value(&config.edge)?));
    calls.extend(queued);

    tracing::info!(
        namespace = %args.namespace,
        commands = calls.len(),
        "Starting replay v{}",
        env!("CARGO_PKG_VERSION")
    );

    let instance = Instance::new(
        &args.namespace,
        Arc::new(LogTransport),
        beacon_components::default_creators(),
    );

    let names: Vec<String> = calls.iter().map(|call| call.command.clone()).collect();
    let results = instance.replay(calls).await;

    let mut failures = 0;
    for (name, result) in names.into_iter().zip(results) {
        let line = match result {
            Ok(value) => json!({ "command": name, "result": value }),
            Err(err) => {
                failures += 1;
                json!({
                    "command": name,
                    "error": { "kind": err.kind, "message": err.message }
                })
            }
        };
        println!("{}", line);
    }

    if failures > 0 {
        tracing::warn!(failures = failures, "Some commands failed");
    }
    Ok(())
}
