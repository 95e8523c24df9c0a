//! Common error type definitions.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source of structured errors so any provider-specific failure
/// can be carried without leaking its concrete type.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur when talking to external providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed before the request left the process.
    InvalidInput,
    /// The provider rejected the configured credential.
    InvalidCredential,
    /// The credential is valid but not allowed to perform the operation.
    Authorization,
    /// Rate limit or quota exceeded.
    RateLimited,
    /// Network-related error occurred.
    NetworkError,
    /// The request did not complete within the configured bound.
    Timeout,
    /// The provider answered with an error.
    ExternalError,
    /// Serialization/deserialization error.
    Serialization,
    /// Configuration error.
    Configuration,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

/// A structured error type for provider operations.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new invalid credential error.
    pub fn invalid_credential() -> Self {
        Self::new(ErrorKind::InvalidCredential)
    }

    /// Creates a new authorization error.
    pub fn authorization() -> Self {
        Self::new(ErrorKind::Authorization)
    }

    /// Creates a new rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    /// Creates a new network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a new external error.
    pub fn external_error() -> Self {
        Self::new(ErrorKind::ExternalError)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Returns true if the provider rejected the credential itself.
    ///
    /// This is the only provider failure the gateway converts into a
    /// successful fallback response.
    #[must_use]
    pub const fn is_invalid_credential(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidCredential)
    }

    /// Returns true if the request ran past its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Returns the message, falling back to the kind name.
    pub fn detail(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.kind.as_ref().replace('_', " "))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization()
            .with_message("Failed to process JSON payload")
            .with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_builder_pattern() {
        let error = Error::external_error().with_message("model overloaded");
        assert_eq!(error.kind, ErrorKind::ExternalError);
        assert_eq!(error.message.as_deref(), Some("model overloaded"));
        assert!(error.source.is_none());
    }

    #[test]
    fn error_display_includes_kind_and_message() {
        let error = Error::invalid_credential().with_message("Incorrect API key provided");
        let display = error.to_string();
        assert!(display.contains("invalid_credential"));
        assert!(display.contains("Incorrect API key provided"));
    }

    #[test]
    fn only_credential_errors_are_flagged() {
        assert!(Error::invalid_credential().is_invalid_credential());
        assert!(!Error::authorization().is_invalid_credential());
        assert!(!Error::timeout().is_invalid_credential());
        assert!(Error::timeout().is_timeout());
    }

    #[test]
    fn detail_falls_back_to_kind() {
        assert_eq!(Error::rate_limited().detail(), "rate limited");
        assert_eq!(Error::timeout().with_message("slow").detail(), "slow");
    }
}
