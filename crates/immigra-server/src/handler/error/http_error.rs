//! HTTP error handling with builder pattern for dynamic error responses.
//!
//! Every error renders as the `{ error, details? }` envelope described by
//! [`ErrorResponse`].

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// The error type for HTTP handlers in the server.
///
/// Carries an [`ErrorKind`] selecting the status code, an optional message
/// replacing the kind's default text, and optional details.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    details: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            details: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Sets the user-facing message of the error.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Attaches details, rendered as the `details` field of the envelope.
    #[inline]
    pub fn with_details(self, details: impl Into<Cow<'a, str>>) -> Self {
        Self {
            details: Some(details.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the details if present.
    #[inline]
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Converts this error into a static version by cloning all borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            details: self.details.map(|d| Cow::Owned(d.into_owned())),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();

        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("name", &response.name)
            .field("status", &response.status);

        if let Some(ref message) = self.message {
            debug_struct.field("message", message);
        }

        if let Some(ref details) = self.details {
            debug_struct.field("details", details);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        let message = self.message.as_deref().unwrap_or(&response.error);

        write!(f, "{} ({}): {}", response.name, response.status, message)?;

        if let Some(ref details) = self.details {
            write!(f, " - {}", details)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut response = self.kind.response();

        if let Some(message) = self.message {
            response = response.with_error(message);
        }

        if let Some(details) = self.details {
            response = response.with_details(details);
        }

        response.into_response()
    }
}

impl aide::OperationOutput for Error<'_> {
    type Inner = ErrorResponse<'static>;
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A specialized [`Result`] type for HTTP operations.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// All HTTP error kinds produced by the server.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 4xx Client Errors
    /// 400 Bad Request - Invalid request data
    BadRequest,
    /// 401 Unauthorized - Identity required
    Unauthorized,
    /// 404 Not Found - Route not found
    NotFound,
    /// 413 Payload Too Large - Request body exceeds the limit
    PayloadTooLarge,

    // 5xx Server Errors
    /// 500 Internal Server Error - Unexpected server error
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified details.
    #[inline]
    pub fn with_details<'a>(self, details: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_details(details)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the default response of this error kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::Unauthorized => ErrorResponse::UNAUTHORIZED,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::PayloadTooLarge => ErrorResponse::PAYLOAD_TOO_LARGE,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response().name)
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}
