//! Gateway error to HTTP error conversion.

use immigra_gateway::{GatewayError, GatewayErrorKind};

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for gateway error conversions.
const TRACING_TARGET: &str = "immigra_server::handler::gateway";

impl From<GatewayError> for HttpError<'static> {
    fn from(error: GatewayError) -> Self {
        match error.kind {
            GatewayErrorKind::Validation | GatewayErrorKind::Auth => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Agent request rejected"
                );
            }
            GatewayErrorKind::Configuration => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Gateway is not configured"
                );
            }
            GatewayErrorKind::Provider => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    details = error.details.as_deref().unwrap_or_default(),
                    "Completion provider failed"
                );
            }
        }

        let kind = match error.kind {
            GatewayErrorKind::Validation => ErrorKind::BadRequest,
            GatewayErrorKind::Auth => ErrorKind::Unauthorized,
            GatewayErrorKind::Configuration | GatewayErrorKind::Provider => {
                ErrorKind::InternalServerError
            }
        };

        let http_error = kind.with_message(error.message);
        match error.details {
            Some(details) if error.kind == GatewayErrorKind::Provider => {
                http_error.with_details(details)
            }
            _ => http_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (GatewayError::validation("Message is required"), StatusCode::BAD_REQUEST),
            (GatewayError::auth("Authentication required"), StatusCode::UNAUTHORIZED),
            (
                GatewayError::configuration("OpenAI API key is not configured"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GatewayError::provider("Failed to get a response from the assistant"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            let message = error.message.to_string();
            let http_error = HttpError::from(error);
            assert_eq!(http_error.kind().status_code(), status);
            assert_eq!(http_error.message(), Some(message.as_str()));
        }
    }

    #[test]
    fn only_provider_errors_carry_details() {
        let error = HttpError::from(
            GatewayError::provider("Failed to get a response from the assistant")
                .with_details("model overloaded"),
        );
        assert_eq!(error.details(), Some("model overloaded"));

        let error = HttpError::from(
            GatewayError::configuration("Failed to initialize the completion provider")
                .with_details("bad header"),
        );
        assert_eq!(error.details(), None);
    }
}
