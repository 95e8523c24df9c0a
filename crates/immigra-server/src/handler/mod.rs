//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod agents;
mod error;
mod monitors;
mod response;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::agents::AgentPathParams;
pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::{ErrorResponse, HealthStatus};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes.
///
/// `/health` is matched before the `/{kind}` agent route.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(monitors::routes())
        .merge(agents::routes())
        .fallback(handler)
}
