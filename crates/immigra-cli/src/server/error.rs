//! Server error types.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Errors raised while starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Server configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to bind to the specified address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Runtime server error.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Creates an invalid configuration error from an anyhow error.
    pub fn invalid_config(err: &anyhow::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }

    /// Creates a bind error with address context.
    pub fn bind_error(address: &str, source: io::Error) -> Self {
        Self::BindError {
            address: address.to_owned(),
            source,
        }
    }

    /// Provides a human-readable suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig(_) => {
                Some("Check the command-line arguments and environment variables")
            }
            Self::BindError { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => {
                    Some("Try using a port above 1024 or run with appropriate privileges")
                }
                io::ErrorKind::AddrInUse => Some(
                    "The port is already in use. Try a different port or stop the conflicting service",
                ),
                io::ErrorKind::AddrNotAvailable => {
                    Some("The address is not available. Check network interface configuration")
                }
                _ => Some("Check network configuration and firewall settings"),
            },
            Self::Runtime(err) => match err.kind() {
                io::ErrorKind::TimedOut => {
                    Some("The operation timed out, consider increasing timeout values")
                }
                _ => None,
            },
        }
    }
}
