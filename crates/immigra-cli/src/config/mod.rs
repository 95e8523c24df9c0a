//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, shutdown
//! ├── middleware: MiddlewareConfig # CORS, OpenAPI, recovery/timeouts
//! ├── logging: LoggingConfig       # Log output format
//! └── service: ServiceConfig       # Provider credential, models, auth secret
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! immigra --openai-api-key "sk-..." --port 8080
//!
//! # Or via environment variables
//! OPENAI_API_KEY="sk-..." PORT=8080 immigra
//! ```

mod logging;
mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
use immigra_server::service::ServiceConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "immigra")]
#[command(about = "Immigra immigration assistance agent gateway")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Log output configuration.
    #[clap(flatten)]
    pub logging: LoggingConfig,

    /// Completion provider, model and identity configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so that clap's `env` fallbacks see its values.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "Starting immigra server"
        );

        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            provider_configured = self.service.api_credential().is_some(),
            base_url = ?self.service.openai_base_url,
            provider_timeout_secs = self.service.provider_timeout_secs,
            default_model = %self.service.default_model,
            economy_model = %self.service.economy_model,
            identity_enabled = self.service.load_auth_keys().is_enabled(),
            document_store_capacity = self.service.document_store_capacity,
            "Service configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["immigra"]).unwrap();
        assert_eq!(cli.server.port, 3000);
        assert_eq!(cli.middleware.recovery.request_timeout_secs, 60);
        assert_eq!(cli.middleware.openapi.open_api_json, "/api/openapi.json");
        assert_eq!(cli.service.default_model, "gpt-4o");
        assert_eq!(cli.service.economy_model, "gpt-4o-mini");
        assert_eq!(cli.logging.log_format, LogFormat::Text);
        assert!(!cli.middleware.headers.hsts);
        assert_eq!(cli.service.document_store_capacity, 1024);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "immigra",
            "--port",
            "8080",
            "--default-model",
            "gpt-4.1",
            "--log-format",
            "json",
            "--hsts",
            "--document-store-capacity",
            "32",
        ])
        .unwrap();

        assert_eq!(cli.server.port, 8080);
        assert_eq!(cli.service.default_model, "gpt-4.1");
        assert_eq!(cli.logging.log_format, LogFormat::Json);
        assert!(cli.middleware.headers.hsts);
        assert_eq!(cli.service.document_store_capacity, 32);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn rejects_privileged_port() {
        let cli = Cli::try_parse_from(["immigra", "--port", "80"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
