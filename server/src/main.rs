//! Todo API server.
//!
//! # Environment Variables
//!
//! - `TODOS_DATA_DIR`: directory holding `todos.json` (default: `~/.todos`)
//! - `TODOS_BIND_ADDR`: listen address (default: `127.0.0.1:3000`)
//! - `RUST_LOG`: logging filter (e.g. `todos_server=debug,tower_http=info`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use todos_core::{Config, FileTaskRepository, MemoryTaskRepository, SharedRepository};
use todos_server::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "todos-server")]
#[command(about = "HTTP API for the todo list", long_about = None)]
struct Args {
    /// Address to listen on (overrides TODOS_BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Directory for the task file (overrides TODOS_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Keep tasks in memory only
    #[arg(long, conflicts_with = "data_dir")]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos_server=debug,todos_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let repository: SharedRepository = if args.memory {
        tracing::warn!("using in-memory store; tasks are lost on exit");
        Arc::new(MemoryTaskRepository::new())
    } else {
        let data_dir = match args.data_dir {
            Some(dir) => dir,
            None => config.data_dir()?,
        };
        let repo = FileTaskRepository::new(&data_dir)?;
        tracing::info!(path = %repo.path().display(), "using file store");
        Arc::new(repo)
    };

    let address = match args.bind {
        Some(address) => address,
        None => config.bind_addr()?,
    };
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to address {}", address))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(repository)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
