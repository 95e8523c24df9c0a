//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Recovery (panics, timeouts, service errors)
//! - Observability (request ids, tracing, timings)
//! - Security (CORS, headers, body limit)
//! - OpenAPI documentation
//!
//! ```rust,no_run
//! use axum::Router;
//! use immigra_server::middleware::{
//!     RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt,
//! };
//!
//! let app: Router = Router::new()
//!     .with_default_security()
//!     .with_observability()
//!     .with_default_recovery();
//! ```

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::{RouterObservabilityExt, track_request_metrics};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{
    CorsConfig, DEFAULT_DOCS_CDN_ORIGIN, DEFAULT_MAX_BODY_SIZE, RouterSecurityExt,
    SecurityHeadersConfig,
};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
