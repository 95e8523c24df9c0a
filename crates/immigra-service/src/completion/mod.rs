//! Chat completion abstractions.
//!
//! A [`CompletionProvider`] turns an ordered list of chat messages into one
//! or more candidate answers. Concrete providers live in their own crates and
//! are handed to the rest of the system through two seams:
//!
//! - [`CompletionService`]: the shared, cloneable handle used per request.
//! - [`ProviderConnector`]: builds a service from an [`ApiCredential`]
//!   without touching the network, so construction can happen lazily.
//!
//! # Example
//!
//! ```rust,ignore
//! use immigra_service::completion::{CompletionRequest, Message};
//!
//! let service = connector.connect(&credential)?;
//! let request = CompletionRequest::new("gpt-4o", vec![Message::user("Hello")]);
//! let response = service.complete(&request).await?;
//! ```

mod credential;
mod message;
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;
mod request;
mod response;
mod service;

pub use credential::ApiCredential;
pub use message::{Content, ContentPart, ImageData, Message, Role};
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use mock::{MockBehavior, MockProvider};
pub use request::{CompletionRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
pub use response::{Choice, CompletionResponse, Usage};
pub use service::CompletionService;

pub use crate::{Error, ErrorKind, Result};

/// Tracing target for completion operations.
pub const TRACING_TARGET: &str = "immigra_service::completion";

/// Core trait for chat completion providers.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Issues exactly one completion request to the provider.
    ///
    /// Implementations must not retry. A rejected credential is reported as
    /// [`ErrorKind::InvalidCredential`].
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

/// Builds completion services from a credential.
///
/// Connecting must not perform network I/O.
pub trait ProviderConnector: Send + Sync {
    /// Creates a service authenticated with the given credential.
    fn connect(&self, credential: &ApiCredential) -> Result<CompletionService>;
}
