//! Server lifecycle logging.

use std::future::Future;
use std::io;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Runs the server future and logs uptime and failures around it.
pub async fn serve_with_shutdown<F>(
    server_config: &ServerConfig,
    serve_fn: impl FnOnce() -> F,
) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let start_time = Instant::now();

    if server_config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server bound to all interfaces (0.0.0.0) - ensure firewall is configured"
        );
    }

    let result = serve_fn().await;
    let uptime = start_time.elapsed();

    match &result {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                uptime_secs = uptime.as_secs(),
                "Shutdown completed"
            );
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %err,
                kind = ?err.kind(),
                uptime_secs = uptime.as_secs(),
                "Fatal error"
            );
        }
    }

    result
}
