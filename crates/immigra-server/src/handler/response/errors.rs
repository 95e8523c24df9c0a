use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schemars::JsonSchema;
use serde::Serialize;

/// Tracing target for error responses.
const TRACING_TARGET: &str = "immigra_server::handler::errors";

/// HTTP error envelope: `{ error, details? }`.
///
/// `name` and `status` select the response but are not serialized.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
    /// Human-readable error message safe for client display
    pub error: Cow<'a, str>,
    /// Upstream error text for provider failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Cow<'a, str>>,

    /// The error name/type identifier (not serialized in JSON)
    #[serde(skip)]
    pub name: Cow<'a, str>,
    /// HTTP status code (not serialized in JSON)
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self =
        Self::new("bad_request", "Invalid request", StatusCode::BAD_REQUEST);
    pub const NOT_FOUND: Self = Self::new("not_found", "Not found", StatusCode::NOT_FOUND);
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(
        "payload_too_large",
        "Request exceeds allowed size",
        StatusCode::PAYLOAD_TOO_LARGE,
    );
    pub const UNAUTHORIZED: Self = Self::new(
        "unauthorized",
        "Authentication required",
        StatusCode::UNAUTHORIZED,
    );
    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "Internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, error: &'a str, status: StatusCode) -> Self {
        Self {
            error: Cow::Borrowed(error),
            details: None,
            name: Cow::Borrowed(name),
            status,
        }
    }

    /// Replaces the error message.
    pub fn with_error(mut self, error: impl Into<Cow<'a, str>>) -> Self {
        self.error = error.into();
        self
    }

    /// Attaches details to the error response.
    /// If details already exist, it merges them with a separator.
    pub fn with_details(mut self, details: impl Into<Cow<'a, str>>) -> Self {
        let new_details = details.into();
        self.details = Some(match self.details {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_details)),
            None => new_details,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(self) -> Response {
        tracing::warn!(
            target: TRACING_TARGET,
            status = self.status.as_u16(),
            name = %self.name,
            error = %self.error,
            details = self.details.as_deref().unwrap_or_default(),
            "HTTP error response"
        );

        (self.status, Json(self)).into_response()
    }
}
