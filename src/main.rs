// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, time::Duration};

use axum_server::tls_rustls::RustlsConfig;
use safestat_server::{
    api::router,
    config::{ServerConfig, TlsPaths},
    logging::init_tracing,
    state::AppState,
};
use tokio::net::TcpListener;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    let app = router(AppState::default());

    match config.tls {
        Some(tls) => serve_https(config.addr, &tls, app).await?,
        None => {
            let listener = TcpListener::bind(config.addr).await?;
            tracing::info!(addr = %config.addr, "SafeStat server listening on http://{} (docs at /docs)", config.addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn serve_https(
    addr: std::net::SocketAddr,
    tls: &TlsPaths,
    app: axum::Router,
) -> Result<(), Box<dyn Error>> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
    tracing::info!(cert = %tls.cert.display(), "Loaded TLS certificate");

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    tracing::info!(addr = %addr, "SafeStat server listening on https://{addr} (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
