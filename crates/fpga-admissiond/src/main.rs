//! fpga-admissiond — the FPGA admission webhook daemon.
//!
//! Assembles the webhook:
//! - Configuration (TOML)
//! - Per-namespace resource registries, seeded from config
//! - Pod admission + registry-sync API
//!
//! TLS termination is left to the fronting proxy or service mesh.
//!
//! # Usage
//!
//! ```text
//! fpga-admissiond serve --config /etc/fpga-admission/fpga-admission.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fpga_core::AdmissionConfig;
use fpga_patcher::PatcherManager;
use tracing::info;

#[derive(Parser)]
#[command(name = "fpga-admissiond", about = "FPGA admission webhook daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the pod mutation webhook.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,fpga_admissiond=debug,fpga_patcher=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port } => run_serve(config, port).await,
    }
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    info!("FPGA admission webhook starting");

    let config = match &config_path {
        Some(path) => {
            let config = AdmissionConfig::from_file(path)?;
            info!(path = ?path, "config loaded");
            config
        }
        None => AdmissionConfig::default(),
    };

    let manager = Arc::new(PatcherManager::new());
    fpga_admissiond::seed_registry(&manager, &config);

    let router = fpga_webhook_api::build_router(manager);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.server.port)));

    info!(%addr, "webhook server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("FPGA admission webhook stopped");
    Ok(())
}
