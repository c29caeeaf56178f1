#![forbid(unsafe_code)]
//! Vex TCP server.
//!
//! Speaks a RESP-style protocol on a plain TCP socket. See [`commands`] for
//! the command set. Each client connection is served by its own
//! thread; the tokio runtime only accepts sockets and drives shutdown.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod connection;
mod env_utils;
mod errors;
mod state;
mod stats;

use crate::config::{AppConfig, LogFormat};
use crate::connection::serve;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    let bind = config.bind;
    let state = AppState::new(config.clone())?;
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind server socket on {bind}"))?;

    tracing::info!(
        %bind,
        partitions = config.partitions,
        strict_finite = config.strict_finite,
        max_dimension = config.max_dimension,
        max_topk = config.max_topk,
        max_connections = config.max_connections,
        idle_timeout_ms = config.idle_timeout_ms,
        "vex server started"
    );

    serve(listener, state.clone(), shutdown_signal())
        .await
        .context("server exited unexpectedly")?;

    tracing::info!(
        total_commands = state.stats.total_commands(),
        "vex server stopped"
    );
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = result {
        eprintln!("failed to initialize tracing subscriber: {error}");
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(error) => tracing::error!(%error, "failed to install Ctrl-C handler"),
    }
}

#[cfg(test)]
mod tests;
