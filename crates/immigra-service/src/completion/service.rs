//! Completion service wrapper with observability.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;

use super::{CompletionProvider, CompletionRequest, CompletionResponse, Result, TRACING_TARGET};

/// Completion service wrapper with observability.
///
/// This wrapper adds structured logging to any [`CompletionProvider`]. The
/// provider is held in an `Arc` so the service is cheap to clone and share
/// between concurrent requests.
#[derive(Clone)]
pub struct CompletionService {
    provider: Arc<dyn CompletionProvider>,
}

impl fmt::Debug for CompletionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionService").finish_non_exhaustive()
    }
}

impl CompletionService {
    /// Creates a new completion service from a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: CompletionProvider + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Issues a single completion request.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            model = %request.model,
            messages = request.messages.len(),
            has_image = request.has_image(),
            max_tokens = request.max_tokens,
            "Processing completion request"
        );

        let result = self.provider.complete(request).await;
        let elapsed = Timestamp::now().duration_since(started_at);

        match &result {
            Ok(response) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    choices = response.choices.len(),
                    total_tokens = response.usage.map(|u| u.total_tokens),
                    elapsed_ms = elapsed.as_millis(),
                    "Completion request succeeded"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Completion request failed"
                );
            }
        }

        result
    }
}
