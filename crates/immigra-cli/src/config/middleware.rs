//! Middleware configuration for the HTTP server.
//!
//! All middleware configs are re-exported from `immigra-server` and support
//! both CLI arguments and environment variables.
//!
//! # Example
//!
//! ```bash
//! immigra --cors-origins "https://immigra.dev" --request-timeout-secs 90
//! ```

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use immigra_server::middleware::{
    CorsConfig, OpenApiConfig, RecoveryConfig, SecurityHeadersConfig,
};
use serde::{Deserialize, Serialize};

use super::TRACING_TARGET_CONFIG;

/// Middleware configuration combining CORS, OpenAPI, and recovery settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// CORS (Cross-Origin Resource Sharing) configuration.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// HSTS and the API reference CDN allowed by the content security policy.
    #[clap(flatten)]
    pub headers: SecurityHeadersConfig,

    /// Paths of the OpenAPI JSON document and the Scalar UI.
    #[clap(flatten)]
    pub openapi: OpenApiConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Validates middleware settings.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.recovery.request_timeout_secs == 0 || self.recovery.request_timeout_secs > 600 {
            return Err(anyhow!(
                "Request timeout {} seconds is invalid. Must be between 1 and 600 seconds.",
                self.recovery.request_timeout_secs
            ));
        }

        if !self.headers.docs_cdn_origin.starts_with("https://") {
            return Err(anyhow!(
                "Docs CDN origin {:?} must be an https:// origin",
                self.headers.docs_cdn_origin
            ));
        }

        for path in [&self.openapi.open_api_json, &self.openapi.scalar_ui] {
            if !path.starts_with('/') {
                return Err(anyhow!("Documentation path {path:?} must start with '/'"));
            }
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            max_age_secs = self.cors.max_age_seconds,
            "CORS configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            hsts = self.headers.hsts,
            docs_cdn_origin = %self.headers.docs_cdn_origin,
            "Security headers configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            openapi_path = %self.openapi.open_api_json,
            scalar_path = %self.openapi.scalar_ui,
            "OpenAPI configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout_secs,
            "Recovery configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MiddlewareConfig {
        MiddlewareConfig {
            cors: CorsConfig::default(),
            headers: SecurityHeadersConfig::default(),
            openapi: OpenApiConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = config();
        config.recovery.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_plain_http_docs_cdn() {
        let mut config = config();
        config.headers.docs_cdn_origin = "http://cdn.example.com".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_relative_docs_path() {
        let mut config = config();
        config.openapi.scalar_ui = "scalar".to_owned();
        assert!(config.validate().is_err());
    }
}
