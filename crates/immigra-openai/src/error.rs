//! Error types for the OpenAI client.

use immigra_service::Error as ServiceError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::client::ErrorEnvelope;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error code OpenAI returns for unknown or revoked keys.
const INVALID_API_KEY: &str = "invalid_api_key";

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The API answered with a non-success status.
    #[error("OpenAI API error ({status}): {message}")]
    Api {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },
}

impl Error {
    /// Builds an API error from a non-success response body.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
        let (code, message) = match envelope {
            Some(envelope) => (envelope.error.code, envelope.error.message),
            None if body.trim().is_empty() => (None, status.to_string()),
            None => (None, body.trim().to_owned()),
        };

        Self::Api {
            status,
            code,
            message,
        }
    }

    /// Returns true if the API rejected the credential.
    pub fn is_invalid_credential(&self) -> bool {
        matches!(
            self,
            Self::Api { status, code, .. }
                if *status == StatusCode::UNAUTHORIZED || code.as_deref() == Some(INVALID_API_KEY)
        )
    }
}

impl From<Error> for ServiceError {
    fn from(err: Error) -> Self {
        if err.is_invalid_credential() {
            let message = err.to_string();
            return ServiceError::invalid_credential()
                .with_message(message)
                .with_source(err);
        }

        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    ServiceError::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    ServiceError::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    ServiceError::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    ServiceError::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => ServiceError::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Api {
                status, message, ..
            } => {
                let error = match status {
                    StatusCode::FORBIDDEN => ServiceError::authorization(),
                    StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limited(),
                    StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                        ServiceError::timeout()
                    }
                    _ => ServiceError::external_error(),
                };
                error.with_message(format!("OpenAI API error ({status}): {message}"))
            }
        }
    }
}
