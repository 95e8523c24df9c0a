//! Observability middleware for request tracing and timing.
//!
//! Assigns each request an `x-request-id`, opens a tracing span per request,
//! redacts credentials from logged headers and records request timings.

use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::header;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

/// Tracing target for request timings.
const TRACING_TARGET: &str = "immigra_server::middleware::metrics";

/// Header carrying the request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extension trait for `axum::`[`Router`] to apply observability middleware.
pub trait RouterObservabilityExt<S> {
    /// Layers request ids, tracing spans and sensitive header redaction.
    fn with_observability(self) -> Self;

    /// Layers request timing logs.
    fn with_metrics(self) -> Self;
}

impl<S> RouterObservabilityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_observability(self) -> Self {
        self.layer(PropagateRequestIdLayer::new(
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ))
        .layer(SetSensitiveRequestHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            header::HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
    }

    fn with_metrics(self) -> Self {
        self.layer(from_fn(track_request_metrics))
    }
}

/// Logs method, path, status and duration of every request.
pub async fn track_request_metrics(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let request_size = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::debug!(
        target: TRACING_TARGET,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis() as u64,
        request_size,
        "request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue};
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[tokio::test]
    async fn responses_carry_a_request_id() -> anyhow::Result<()> {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .with_metrics()
            .with_observability();
        let server = TestServer::new(app)?;

        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        let response = server.get("/ping").await;
        response.assert_status_ok();
        assert!(response.maybe_header(request_id.clone()).is_some());

        let response = server
            .get("/ping")
            .add_header(request_id.clone(), HeaderValue::from_static("req-42"))
            .await;
        assert_eq!(response.header(request_id), "req-42");
        Ok(())
    }
}
