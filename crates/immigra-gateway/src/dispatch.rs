//! Agent dispatch.

use std::sync::Arc;

use immigra_service::completion::CompletionRequest;
use immigra_service::{DocumentAnalysis, DocumentSink};
use jiff::Timestamp;
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::request::messages;
use crate::{
    AgentKind, AgentPayload, AgentReply, AgentRequest, AgentResponse, ComposedPrompt, GatewayError,
    ModelPolicy, PersonaTable, ProviderCallResult, ProviderFactory, ResponseMapper, Result,
};

/// Tracing target for dispatch operations.
pub const TRACING_TARGET: &str = "immigra_gateway::dispatch";

/// Caller identity as seen by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    Authenticated(Uuid),
}

impl Caller {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

/// Stages of a single dispatch. Nothing is retried or revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStage {
    Received,
    Validated,
    PromptComposed,
    ProviderCalled,
    Succeeded,
    FallbackSubstituted,
    Failed,
}

#[derive(Clone)]
struct GatewayInner {
    personas: PersonaTable,
    factory: ProviderFactory,
    policy: ModelPolicy,
    mapper: ResponseMapper,
    document_sink: Option<Arc<dyn DocumentSink>>,
}

/// One gateway serving every agent kind.
///
/// Cheap to clone; all state is read-only after construction.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("factory", &self.inner.factory)
            .field("policy", &self.inner.policy)
            .field("document_sink", &self.inner.document_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway without a document sink.
    pub fn new(personas: PersonaTable, factory: ProviderFactory, policy: ModelPolicy) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                personas,
                factory,
                policy,
                mapper: ResponseMapper,
                document_sink: None,
            }),
        }
    }

    /// Sets the sink receiving successful document reviews.
    #[must_use]
    pub fn with_document_sink<S>(self, sink: S) -> Self
    where
        S: DocumentSink + 'static,
    {
        let inner = Arc::unwrap_or_clone(self.inner);
        Self {
            inner: Arc::new(GatewayInner {
                document_sink: Some(Arc::new(sink)),
                ..inner
            }),
        }
    }

    /// Returns true if a provider credential is configured.
    pub fn is_configured(&self) -> bool {
        self.inner.factory.is_configured()
    }

    /// Validates a raw payload, dispatches it and shapes the reply body.
    pub async fn handle(
        &self,
        kind: &str,
        payload: AgentPayload,
        caller: Caller,
    ) -> Result<AgentReply> {
        tracing::debug!(
            target: TRACING_TARGET,
            stage = %DispatchStage::Received,
            kind,
            "Agent request received"
        );

        let request = AgentRequest::validate(kind, payload).inspect_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET,
                stage = %DispatchStage::Failed,
                kind,
                error = %error,
                "Agent request rejected"
            );
        })?;

        let kind = request.kind;
        let response = self.dispatch(request, caller).await?;
        Ok(self.inner.mapper.envelope(kind, response))
    }

    /// Dispatches a validated request to the provider.
    pub async fn dispatch(&self, request: AgentRequest, caller: Caller) -> Result<AgentResponse> {
        let kind = request.kind;
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET,
            stage = %DispatchStage::Validated,
            kind = %kind,
            history = request.history.len(),
            "Agent request validated"
        );

        let persona = self
            .inner
            .personas
            .get(kind)
            .ok_or_else(|| GatewayError::validation(messages::UNKNOWN_KIND))?;

        if kind.requires_identity() && !caller.is_authenticated() {
            tracing::debug!(
                target: TRACING_TARGET,
                stage = %DispatchStage::Failed,
                kind = %kind,
                "Anonymous caller rejected"
            );
            return Err(GatewayError::auth("Authentication required"));
        }

        let client = self.inner.factory.get_client().await?;

        let prompt = ComposedPrompt::compose(&request, persona);
        let model = self.inner.policy.select(&client.credential, persona);

        tracing::debug!(
            target: TRACING_TARGET,
            stage = %DispatchStage::PromptComposed,
            kind = %kind,
            model,
            messages = prompt.len(),
            "Prompt composed"
        );

        let completion = prompt.into_request(model, persona);
        let outcome = client.service.complete(&completion).await;
        let result = ProviderCallResult::from(&outcome);

        tracing::debug!(
            target: TRACING_TARGET,
            stage = %DispatchStage::ProviderCalled,
            kind = %kind,
            request_id = %completion.request_id,
            succeeded = result.succeeded,
            elapsed_ms = Timestamp::now().duration_since(started_at).as_millis(),
            "Provider call finished"
        );

        if result.is_invalid_credential() {
            return Ok(self.substitute_fallback(kind, &completion));
        }

        let response = self.inner.mapper.map(result).inspect_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                stage = %DispatchStage::Failed,
                kind = %kind,
                request_id = %completion.request_id,
                error = %error,
                details = error.details.as_deref().unwrap_or_default(),
                "Provider call failed"
            );
        })?;

        tracing::info!(
            target: TRACING_TARGET,
            stage = %DispatchStage::Succeeded,
            kind = %kind,
            model,
            request_id = %completion.request_id,
            "Agent request succeeded"
        );

        if let (Some(document_id), Some(owner_id)) = (request.document_id, caller.user_id()) {
            self.store_analysis(DocumentAnalysis::new(
                document_id,
                owner_id,
                model,
                response.content.clone(),
            ));
        }

        Ok(response)
    }

    /// Converts a rejected provider credential into the fixed fallback answer.
    ///
    /// Raw credential errors are never shown to end users; the response is a
    /// success carrying `is_fallback`.
    fn substitute_fallback(&self, kind: AgentKind, completion: &CompletionRequest) -> AgentResponse {
        tracing::warn!(
            target: TRACING_TARGET,
            stage = %DispatchStage::FallbackSubstituted,
            kind = %kind,
            request_id = %completion.request_id,
            "Provider rejected the credential, returning fallback answer"
        );

        AgentResponse::fallback()
    }

    /// Hands an analysis to the document sink without waiting for it.
    fn store_analysis(&self, analysis: DocumentAnalysis) {
        let Some(sink) = self.inner.document_sink.clone() else {
            return;
        };

        tokio::spawn(async move {
            let document_id = analysis.document_id;
            if let Err(error) = sink.store(analysis).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    document_id = %document_id,
                    error = %error,
                    "Failed to store document analysis"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use immigra_service::completion::{ApiCredential, Role};
    use immigra_service::{MemoryDocumentStore, MockProvider};

    use super::*;
    use crate::{ChatTurn, FALLBACK_MESSAGE, GatewayErrorKind, NO_RESPONSE_PLACEHOLDER};

    fn gateway(key: Option<&str>, mock: &MockProvider) -> Gateway {
        let factory = ProviderFactory::new(key.map(ApiCredential::new), mock.clone());
        Gateway::new(PersonaTable::builtin(), factory, ModelPolicy::default())
    }

    fn user() -> Caller {
        Caller::Authenticated(Uuid::new_v4())
    }

    #[tokio::test]
    async fn valid_message_makes_exactly_one_call() {
        let mock = MockProvider::replying("You will need Form I-485 and a medical exam.");
        let gateway = gateway(Some("sk-test"), &mock);

        let reply = gateway
            .handle(
                "green-card",
                AgentPayload::message("What documents do I need for a green card?"),
                Caller::Anonymous,
            )
            .await
            .unwrap();

        assert!(matches!(reply, AgentReply::Single { .. }));
        assert!(!reply.text().is_empty());
        assert!(!reply.is_fallback());
        assert_eq!(mock.call_count(), 1);

        let request = &mock.requests()[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(
            request.messages.last().map(|m| m.content.text()),
            Some("What documents do I need for a green card?".to_owned())
        );
    }

    #[tokio::test]
    async fn empty_message_never_reaches_the_provider() {
        let mock = MockProvider::default();
        let gateway = gateway(Some("sk-test"), &mock);

        let error = gateway
            .handle("visa", AgentPayload::default(), Caller::Anonymous)
            .await
            .unwrap_err();

        assert_eq!(error.kind, GatewayErrorKind::Validation);
        assert_eq!(error.message, "Message is required");
        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.connect_count(), 0);
    }

    #[tokio::test]
    async fn identical_requests_are_not_cached() {
        let mock = MockProvider::replying("answer");
        let gateway = gateway(Some("sk-test"), &mock);

        for _ in 0..2 {
            let reply = gateway
                .handle("citizenship", AgentPayload::message("Am I eligible?"), Caller::Anonymous)
                .await
                .unwrap();
            assert_eq!(reply.text(), "answer");
        }

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].request_id, requests[1].request_id);
        assert_eq!(mock.connect_count(), 1);
    }

    #[tokio::test]
    async fn rejected_credential_becomes_fallback() {
        let mock = MockProvider::rejecting_credential();
        let gateway = gateway(Some("sk-revoked"), &mock);

        let reply = gateway
            .handle(
                "generic-chat",
                AgentPayload::conversation(vec![ChatTurn::new("user", "hello")]),
                Caller::Anonymous,
            )
            .await
            .unwrap();

        assert!(reply.is_fallback());
        assert_eq!(reply.text(), FALLBACK_MESSAGE);
        assert!(matches!(reply, AgentReply::Chat { ref role, .. } if role == "assistant"));
    }

    #[tokio::test]
    async fn other_failures_are_provider_errors() {
        let mock = MockProvider::failing("The server had an error");
        let gateway = gateway(Some("sk-test"), &mock);

        let error = gateway
            .handle("visa", AgentPayload::message("hi"), Caller::Anonymous)
            .await
            .unwrap_err();

        assert_eq!(error.kind, GatewayErrorKind::Provider);
        assert_eq!(error.details.as_deref(), Some("The server had an error"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn model_follows_credential_prefix() {
        let restricted = MockProvider::default();
        gateway(Some("sk-proj-abc"), &restricted)
            .handle("student-visa", AgentPayload::message("F-1 rules?"), Caller::Anonymous)
            .await
            .unwrap();
        assert_eq!(restricted.models(), vec!["gpt-4o-mini".to_owned()]);

        let standard = MockProvider::default();
        gateway(Some("sk-abc"), &standard)
            .handle("student-visa", AgentPayload::message("F-1 rules?"), Caller::Anonymous)
            .await
            .unwrap();
        assert_eq!(standard.models(), vec!["gpt-4o".to_owned()]);
    }

    #[tokio::test]
    async fn missing_credential_is_configuration_error() {
        let mock = MockProvider::default();
        let error = gateway(None, &mock)
            .handle("visa", AgentPayload::message("hi"), Caller::Anonymous)
            .await
            .unwrap_err();

        assert_eq!(error.kind, GatewayErrorKind::Configuration);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn document_review_requires_identity() {
        let mock = MockProvider::default();
        let error = gateway(Some("sk-test"), &mock)
            .handle("document-review", AgentPayload::message("Check my I-130"), Caller::Anonymous)
            .await
            .unwrap_err();

        assert_eq!(error.kind, GatewayErrorKind::Auth);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_completion_uses_placeholder() {
        let mock = MockProvider::empty();
        let reply = gateway(Some("sk-test"), &mock)
            .handle("translation", AgentPayload::message("Hola"), Caller::Anonymous)
            .await
            .unwrap();
        assert_eq!(reply.text(), NO_RESPONSE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn document_review_is_stored() {
        let mock = MockProvider::replying("The affidavit is missing a signature.");
        let store = MemoryDocumentStore::new();
        let gateway = gateway(Some("sk-test"), &mock).with_document_sink(store.clone());

        let document_id = Uuid::new_v4();
        let caller = user();
        let payload = AgentPayload {
            document_id: Some(document_id),
            ..AgentPayload::message("Review my I-864.")
        };
        let reply = gateway.handle("document-review", payload, caller).await.unwrap();
        assert_eq!(reply.text(), "The affidavit is missing a signature.");

        let mut stored = None;
        for _ in 0..50 {
            stored = store.get(document_id).await;
            if stored.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let stored = stored.unwrap();
        assert_eq!(Some(stored.owner_id), caller.user_id());
        assert_eq!(stored.content, "The affidavit is missing a signature.");
    }

    #[tokio::test]
    async fn fallback_is_not_stored() {
        let mock = MockProvider::rejecting_credential();
        let store = MemoryDocumentStore::new();
        let gateway = gateway(Some("sk-test"), &mock).with_document_sink(store.clone());

        let payload = AgentPayload {
            document_id: Some(Uuid::new_v4()),
            ..AgentPayload::message("Review my I-864.")
        };
        let reply = gateway.handle("document-review", payload, user()).await.unwrap();
        assert!(reply.is_fallback());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_empty().await);
    }
}
