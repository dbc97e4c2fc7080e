//! SDW Order Runner - Main Entry Point
//!
//! Composition root: wires the store, the worker spawner, the filesystem
//! signal channel and the JSON-RPC server together, then waits for Ctrl+C.

mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sdw_api_rpc::{RpcServer, RpcServerConfig};
use sdw_core::application::OrderService;
use sdw_core::domain::JobStore;
use sdw_core::port::id_provider::UuidProvider;
use sdw_core::port::time_provider::SystemTimeProvider;
use sdw_infra_system::{FsSignalChannel, TokioWorkerSpawner, WorkerCommand};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_RPC_PORT: u16 = 8721;
const DEFAULT_PYTHON_BIN: &str = "python3";
const DEFAULT_WORKER_SCRIPT: &str = "~/.sdw/sdw_worker.py";
const DEFAULT_CONFIRM_DIR: &str = "~/.sdw/confirm";
const DEFAULT_RESPONSE_DIR: &str = "~/.sdw/responses";

fn env_or_tilde(var: &str, default: &str) -> String {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    shellexpand::tilde(&raw).into_owned()
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("SDW_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("sdw=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("SDW Order Runner v{} starting...", VERSION);

    // 1.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let rpc_port: u16 = std::env::var("SDW_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RPC_PORT);

    let python_bin =
        std::env::var("SDW_PYTHON_BIN").unwrap_or_else(|_| DEFAULT_PYTHON_BIN.to_string());
    let worker_script = env_or_tilde("SDW_WORKER_SCRIPT", DEFAULT_WORKER_SCRIPT);
    let confirm_dir = env_or_tilde("SDW_CONFIRM_DIR", DEFAULT_CONFIRM_DIR);
    let response_dir = env_or_tilde("SDW_RESPONSE_DIR", DEFAULT_RESPONSE_DIR);

    info!(
        python_bin = %python_bin,
        worker_script = %worker_script,
        "Worker command configured"
    );

    // 3. Setup dependencies (DI wiring)
    let store = Arc::new(JobStore::new());
    let spawner = Arc::new(TokioWorkerSpawner::new(WorkerCommand {
        python_bin,
        script_path: worker_script,
    }));
    let signals = Arc::new(FsSignalChannel::new(confirm_dir, response_dir));
    let id_provider = Arc::new(UuidProvider);
    let time_provider = Arc::new(SystemTimeProvider);

    let service = Arc::new(OrderService::new(
        store,
        spawner,
        signals,
        id_provider,
        time_provider,
    ));

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_server = RpcServer::new(rpc_config, service);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Waiting for order requests...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown. In-flight workers have kill_on_drop and die
    // with the daemon; their jobs live only in this process anyway.
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete.");

    Ok(())
}
