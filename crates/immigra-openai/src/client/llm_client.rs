//! OpenAI chat completions client.

use std::sync::Arc;

use immigra_service::completion::{
    ApiCredential, CompletionProvider, CompletionRequest, CompletionResponse, CompletionService,
};
use jiff::Timestamp;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use super::wire::{ChatRequest, ChatResponse};
use super::{LlmConfig, TRACING_TARGET};
use crate::Error;

/// Inner client that holds the HTTP client and configuration.
struct LlmClientInner {
    http: Client,
    endpoint: Url,
    config: LlmConfig,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Building the client performs no network I/O. Each completion is a single
/// HTTP call bounded by the configured request timeout, without retries.
///
/// # Examples
///
/// ```rust,ignore
/// use immigra_openai::{LlmClient, LlmConfig};
/// use immigra_service::completion::{ApiCredential, CompletionRequest, Message};
///
/// let client = LlmClient::new(ApiCredential::new("sk-..."), LlmConfig::default())?;
/// let service = client.into_service();
/// let request = CompletionRequest::new("gpt-4o", vec![Message::user("Hello")]);
/// let response = service.complete(&request).await?;
/// ```
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<LlmClientInner>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Creates a new client for the given credential.
    pub fn new(credential: ApiCredential, config: LlmConfig) -> immigra_service::Result<Self> {
        let timeout = config.effective_request_timeout();
        let endpoint = config.completions_url().map_err(|e| {
            immigra_service::Error::configuration()
                .with_message(format!("Invalid completions endpoint: {e}"))
                .with_source(e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            credential = %credential,
            timeout_ms = timeout.as_millis(),
            "Creating OpenAI client"
        );

        let headers = Self::default_headers(&credential, &config)?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.effective_user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                immigra_service::Error::configuration()
                    .with_message("Failed to create HTTP client")
                    .with_source(e)
            })?;

        let inner = LlmClientInner {
            http,
            endpoint,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.inner.config
    }

    /// Converts this client into a [`CompletionService`].
    pub fn into_service(self) -> CompletionService {
        CompletionService::new(self)
    }

    fn default_headers(
        credential: &ApiCredential,
        config: &LlmConfig,
    ) -> immigra_service::Result<HeaderMap> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            immigra_service::Error::invalid_credential()
                .with_message("API key contains characters not allowed in a header")
                .with_source(e)
        };

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(invalid)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        if let Some(organization) = config.organization() {
            let value = HeaderValue::from_str(organization).map_err(|e| {
                immigra_service::Error::configuration()
                    .with_message("Invalid organization header")
                    .with_source(e)
            })?;
            headers.insert("OpenAI-Organization", value);
        }

        Ok(headers)
    }

    async fn send(&self, request: &CompletionRequest) -> crate::Result<ChatResponse> {
        let body = ChatRequest::from(request);
        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status, &text));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> immigra_service::Result<CompletionResponse> {
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            model = %request.model,
            "Sending chat completion"
        );

        let response = self.send(request).await.map_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %request.request_id,
                error = %error,
                "Chat completion failed"
            );
            immigra_service::Error::from(error)
        })?;

        let elapsed = Timestamp::now().duration_since(started_at);
        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            choices = response.choices.len(),
            elapsed_ms = elapsed.as_millis(),
            "Chat completion received"
        );

        Ok(response.into_completion(request.request_id))
    }
}
