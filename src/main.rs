//! Rategate Server entry point.

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use rategate_server::config::Config;
use rategate_service::CLEANUP_INTERVAL;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = match rategate_server::build_state(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rate_limit = state.gate().is_enabled(),
        limit_per_minute = state.gate().limit().map(|l| l.get()),
        store = state.gate().store_name(),
        "Rategate Server starting",
    );

    let app = rategate_server::router(state.clone());

    let host = match config.host.parse::<IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(host = %config.host, "invalid host: {e}");
            return ExitCode::FAILURE;
        }
    };
    let addr = SocketAddr::new(host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Spawn in-process counter cleanup (no-op for Redis)
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CLEANUP_INTERVAL).await;
            let removed = cleanup_state.cleanup_counters();
            if removed > 0 {
                tracing::debug!(removed, "Cleaned up expired rate-limit counters");
            }
        }
    });

    tracing::info!(%addr, "Rategate Server ready");

    if let Err(e) = rategate_http::serve(listener, app, shutdown_signal()).await {
        tracing::error!("server error: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Rategate Server shut down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install signal handler");
    tracing::info!("Shutdown signal received");
}
