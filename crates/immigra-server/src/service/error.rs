//! Service layer error types.

use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failures while building the application state from configuration.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// External service client could not be created.
    #[error("External service error ({service}): {message}")]
    ExternalService {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServiceError {
    /// Creates a new external service error with source.
    pub fn external_service_with_source(
        service: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
