//! HTTP server startup.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use super::lifecycle::serve_with_shutdown;
use super::{ServerError, ServerResult, shutdown_signal};
use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;

/// Binds the configured address and serves the router until a shutdown
/// signal arrives.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    server_config
        .validate()
        .map_err(|err| ServerError::invalid_config(&err))?;

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %err,
            "Failed to bind to address"
        );
        ServerError::bind_error(&server_addr.to_string(), err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "Server is ready and listening for connections"
    );

    let shutdown = shutdown_signal(server_config.shutdown_timeout());
    serve_with_shutdown(&server_config, || async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    })
    .await
    .map_err(ServerError::Runtime)
}
