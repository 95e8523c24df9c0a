//! Gateway error taxonomy.

use std::borrow::Cow;

use immigra_service::BoxedError;
use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for Results with the gateway error.
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

/// Categories of dispatch failures.
///
/// Every failure is reported to the caller; none is retried by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GatewayErrorKind {
    /// The client input is malformed.
    Validation,
    /// The process credential is missing or unusable.
    Configuration,
    /// The upstream call failed for a reason other than credential validity.
    Provider,
    /// The agent kind requires an authenticated caller.
    Auth,
}

/// Structured dispatch error.
///
/// `message` is safe to show to end users; `details` carries the upstream
/// error text for provider failures.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]: {message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: Cow<'static, str>,
    pub details: Option<String>,
    #[source]
    pub source: Option<BoxedError>,
}

impl GatewayError {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: GatewayErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attaches details for the error envelope.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Adds a source error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(GatewayErrorKind::Validation, message)
    }

    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(GatewayErrorKind::Configuration, message)
    }

    pub fn provider(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(GatewayErrorKind::Provider, message)
    }

    pub fn auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(GatewayErrorKind::Auth, message)
    }

    /// Returns true for errors caused by the client input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = GatewayError::validation("Message is required");
        assert_eq!(error.to_string(), "[validation]: Message is required");
        assert!(error.is_validation());
    }

    #[test]
    fn provider_error_carries_details() {
        let error = GatewayError::provider("Failed to get a response").with_details("model overloaded");
        assert_eq!(error.kind, GatewayErrorKind::Provider);
        assert_eq!(error.details.as_deref(), Some("model overloaded"));
        assert!(!error.is_validation());
    }
}
