//! mimird: the Mimir daemon.
//!
//! Serves the semantic cache as an Envoy ext_proc gRPC service, together
//! with a `grpc.health.v1` liveness endpoint.

use std::net::SocketAddr;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mimir::MimirError;
use mimir::server::config::Config;
use mimir::server::{ExtProcService, HealthService};

/// Mimir daemon, a semantic response cache sidecar.
#[derive(Parser)]
#[command(name = "mimird")]
#[command(version = mimir::PKG_VERSION)]
#[command(about = "Mimir semantic cache ext_proc daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "MIMIR_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Parse address
    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| MimirError::Configuration(format!("Invalid address: {e}")))?;

    let processor = config.processor()?;

    info!(
        version = %mimir::version_string(),
        %addr,
        embedding_server = config.embedding.server_url.as_deref().unwrap_or(""),
        embedding_host = config.embedding.host.as_deref().unwrap_or(""),
        threshold = processor.threshold(),
        "mimird starting"
    );

    let ext_proc = ExtProcService::new(processor).with_buffer(config.server.stream_buffer);

    Server::builder()
        .add_service(ext_proc.into_server())
        .add_service(HealthService.into_server())
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("mimird stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
