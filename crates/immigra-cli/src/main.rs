#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use immigra_server::handler::routes;
use immigra_server::middleware::{
    RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt, RouterSecurityExt,
};
use immigra_server::service::ServiceState;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "immigra_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "immigra_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "immigra_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "Application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "Application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.logging.init_tracing();
    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service).context("failed to create service state")?;
    if !state.is_provider_configured() {
        tracing::warn!(
            target: TRACING_TARGET_CONFIG,
            "OPENAI_API_KEY is not set, agent requests will fail until it is configured"
        );
    }

    let router = create_router(state, &cli.middleware);
    if let Err(error) = server::serve(router, cli.server).await {
        if let Some(suggestion) = error.suggestion() {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                suggestion,
                "Recovery suggestion"
            );
        }

        return Err(error.into());
    }

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Security - CORS, security headers, body limit, compression
/// 4. Routes (innermost) - agent and health handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes()
        .with_open_api(&middleware.openapi)
        .with_state(state)
        .with_metrics()
        .with_security(&middleware.cors, &middleware.headers)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
