//! Security middleware for HTTP request protection.
//!
//! CORS rules, security headers, response compression and the request body
//! limit. The body limit leaves room for base64-encoded images.

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::Method;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

/// Default maximum request body size: 16MB.
///
/// Requests above it are answered with `413 { error }`.
pub const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Origin the Scalar API reference loads its bundle from.
pub const DEFAULT_DOCS_CDN_ORIGIN: &str = "https://cdn.jsdelivr.net";

/// One year, sent when HSTS is enabled.
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Browser origins allowed when none are configured.
const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Headers sent unchanged on every response.
const FIXED_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::REFERRER_POLICY, "no-referrer"),
];

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Layers CORS, security headers, compression and the body limit.
    fn with_security(self, cors: &CorsConfig, headers: &SecurityHeadersConfig) -> Self;

    /// Layers security middlewares with default configurations.
    fn with_default_security(self) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, cors: &CorsConfig, headers: &SecurityHeadersConfig) -> Self {
        // Identity travels in the Authorization header, never in cookies.
        let cors_layer = CorsLayer::new()
            .allow_origin(cors.origins())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .max_age(cors.max_age());

        let mut router = self
            .layer(DefaultBodyLimit::max(DEFAULT_MAX_BODY_SIZE))
            .layer(CompressionLayer::new())
            .layer(cors_layer);

        for (name, value) in FIXED_HEADERS {
            router = router.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ));
        }

        for (name, value) in headers.dynamic_headers() {
            router = router.layer(SetResponseHeaderLayer::overriding(name, value));
        }

        router
    }

    fn with_default_security(self) -> Self {
        self.with_security(&CorsConfig::default(), &SecurityHeadersConfig::default())
    }
}

/// Browser origins allowed to call the agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// Allowed origins. Local development origins are used when empty.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// How long browsers may cache a preflight answer, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
        }
    }
}

impl CorsConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Returns the parsable configured origins, or the local ones.
    pub fn origins(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            return LOCAL_ORIGINS.map(HeaderValue::from_static).to_vec();
        }

        self.allowed_origins
            .iter()
            .filter_map(|origin| origin.trim().parse().ok())
            .collect()
    }
}

/// Response headers that depend on the deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct SecurityHeadersConfig {
    /// Sends `Strict-Transport-Security`; enable when served over HTTPS.
    #[cfg_attr(feature = "config", arg(long = "hsts", env = "HSTS_ENABLED"))]
    pub hsts: bool,

    /// Origin allowed to serve scripts and styles of the API reference.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "DOCS_CDN_ORIGIN", default_value = DEFAULT_DOCS_CDN_ORIGIN)
    )]
    pub docs_cdn_origin: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            hsts: false,
            docs_cdn_origin: DEFAULT_DOCS_CDN_ORIGIN.to_owned(),
        }
    }
}

impl SecurityHeadersConfig {
    /// Returns the `Content-Security-Policy` value.
    pub fn content_security_policy(&self) -> String {
        let cdn = self.docs_cdn_origin.trim();
        format!(
            "default-src 'self'; script-src 'self' 'unsafe-inline' {cdn}; \
             style-src 'self' 'unsafe-inline' {cdn}; img-src 'self' data:; \
             connect-src 'self'; frame-ancestors 'none'; base-uri 'self'"
        )
    }

    fn dynamic_headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = Vec::with_capacity(2);
        if let Ok(csp) = HeaderValue::from_str(&self.content_security_policy()) {
            headers.push((header::CONTENT_SECURITY_POLICY, csp));
        }
        if self.hsts {
            headers.push((
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(HSTS_VALUE),
            ));
        }
        headers
    }
}
