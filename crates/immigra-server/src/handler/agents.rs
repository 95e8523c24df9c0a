//! Agent dispatch handlers.
//!
//! One route serves every agent kind; the kind selects the persona, the
//! accepted payload shape and the reply envelope.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, State};
use immigra_gateway::{AgentPayload, AgentReply, Gateway};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::extract::{Identity, Json};
use crate::handler::{ErrorResponse, Result};
use crate::service::ServiceState;

/// Tracing target for agent operations.
const TRACING_TARGET: &str = "immigra_server::handler::agents";

/// Path parameters of the agent route.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AgentPathParams {
    /// Agent kind, e.g. `green-card`, `document-review` or `generic-chat`.
    pub kind: String,
}

/// Dispatches a question to an agent.
#[tracing::instrument(
    skip_all,
    fields(
        kind = %path_params.kind,
        authenticated = identity.caller().is_authenticated(),
    )
)]
async fn dispatch_agent(
    State(gateway): State<Gateway>,
    Path(path_params): Path<AgentPathParams>,
    identity: Identity,
    Json(payload): Json<AgentPayload>,
) -> Result<Json<AgentReply>> {
    tracing::debug!(target: TRACING_TARGET, "Dispatching agent request");

    let reply = gateway
        .handle(&path_params.kind, payload, identity.caller())
        .await?;

    tracing::debug!(
        target: TRACING_TARGET,
        is_fallback = reply.is_fallback(),
        "Agent request answered"
    );

    Ok(Json(reply))
}

fn dispatch_agent_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Ask an agent")
        .description(
            "Sends a question to an immigration assistance agent. Single-turn agents \
             take `{ message, history?, documentId? }`, the image agent takes \
             `{ image, prompt? }` and generic chat takes `{ messages }`.",
        )
        .response::<200, Json<AgentReply>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Returns routes for agent dispatch.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/{kind}", post_with(dispatch_agent, dispatch_agent_docs))
        .with_path_items(|item| item.tag("Agents"))
}

#[cfg(test)]
mod tests {
    use immigra_gateway::{FALLBACK_MESSAGE, ModelPolicy, PersonaTable, ProviderFactory};
    use immigra_service::{ApiCredential, MemoryDocumentStore, MockProvider};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::*;
    use crate::extract::AuthClaims;
    use crate::handler::test::create_test_server_with_state;
    use crate::service::AuthKeys;

    const SECRET: &str = "test-secret";

    fn state_with(mock: &MockProvider, api_key: Option<&str>) -> ServiceState {
        let factory = ProviderFactory::new(api_key.map(ApiCredential::new), mock.clone());
        let gateway = Gateway::new(PersonaTable::builtin(), factory, ModelPolicy::default());
        ServiceState::new(gateway, AuthKeys::from_secret(SECRET))
    }

    fn bearer(user_id: Uuid) -> anyhow::Result<String> {
        let claims = AuthClaims {
            sub: user_id,
            exp: jiff::Timestamp::now().as_second() + 3600,
            iat: None,
        };
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        Ok(format!(
            "Bearer {}",
            jsonwebtoken::encode(&Header::default(), &claims, &key)?
        ))
    }

    #[tokio::test]
    async fn answers_a_green_card_question() -> anyhow::Result<()> {
        let mock = MockProvider::replying("You need Form I-485 and supporting evidence.");
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/green-card")
            .json(&json!({"message": "What documents do I need for a green card?"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "message": "You need Form I-485 and supporting evidence."
        }));
        assert_eq!(mock.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn empty_payload_is_rejected_without_calling_the_provider() -> anyhow::Result<()> {
        let mock = MockProvider::default();
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server.post("/visa").json(&json!({})).await;
        response.assert_status_bad_request();
        response.assert_json(&json!({"error": "Message is required"}));

        let response = server.post("/visa").json(&json!({"message": "   "})).await;
        response.assert_status_bad_request();

        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn generic_chat_requires_messages() -> anyhow::Result<()> {
        let mock = MockProvider::default();
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/generic-chat")
            .json(&json!({"messages": []}))
            .await;
        response.assert_status_bad_request();
        response.assert_json(&json!({"error": "No messages provided"}));
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn generic_chat_uses_the_chat_envelope() -> anyhow::Result<()> {
        let mock = MockProvider::replying("Hello! How can I help?");
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/generic-chat")
            .json(&json!({"messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello."},
                {"role": "user", "content": "Can you help me?"}
            ]}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "role": "assistant",
            "content": "Hello! How can I help?"
        }));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_kind_is_a_bad_request() -> anyhow::Result<()> {
        let mock = MockProvider::default();
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/tax-advice")
            .json(&json!({"message": "Hello"}))
            .await;
        response.assert_status_bad_request();
        response.assert_json(&json!({"error": "Unknown agent kind"}));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() -> anyhow::Result<()> {
        let mock = MockProvider::default();
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/visa")
            .content_type("application/json")
            .text("{\"message\":")
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "Invalid request body");
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credential_returns_the_fallback() -> anyhow::Result<()> {
        let mock = MockProvider::rejecting_credential();
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/citizenship")
            .json(&json!({"message": "When can I naturalize?"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "message": FALLBACK_MESSAGE,
            "isFallback": true
        }));
        assert_eq!(mock.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn provider_failure_is_a_server_error_with_details() -> anyhow::Result<()> {
        let mock = MockProvider::failing("model overloaded");
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let response = server
            .post("/visa")
            .json(&json!({"message": "Can I travel on advance parole?"}))
            .await;

        response.assert_status_internal_server_error();
        response.assert_json(&json!({
            "error": "Failed to get a response from the assistant",
            "details": "model overloaded"
        }));
        Ok(())
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() -> anyhow::Result<()> {
        let mock = MockProvider::default();
        let server = create_test_server_with_state(routes(), state_with(&mock, None))?;

        let response = server
            .post("/visa")
            .json(&json!({"message": "Hello"}))
            .await;

        response.assert_status_internal_server_error();
        response.assert_json(&json!({"error": "OpenAI API key is not configured"}));
        assert_eq!(mock.connect_count(), 0);
        assert_eq!(mock.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn model_depends_on_the_credential() -> anyhow::Result<()> {
        let body = json!({"message": "Is my H-1B transferable?"});

        let restricted = MockProvider::default();
        let server =
            create_test_server_with_state(routes(), state_with(&restricted, Some("sk-proj-abc")))?;
        server.post("/visa").json(&body).await.assert_status_ok();
        assert_eq!(restricted.models(), vec!["gpt-4o-mini".to_owned()]);

        let unrestricted = MockProvider::default();
        let server =
            create_test_server_with_state(routes(), state_with(&unrestricted, Some("sk-abc")))?;
        server.post("/visa").json(&body).await.assert_status_ok();
        assert_eq!(unrestricted.models(), vec!["gpt-4o".to_owned()]);
        Ok(())
    }

    #[tokio::test]
    async fn identical_requests_call_the_provider_each_time() -> anyhow::Result<()> {
        let mock = MockProvider::default();
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;
        let body = json!({"message": "How long is OPT?"});

        server.post("/student-visa").json(&body).await.assert_status_ok();
        server.post("/student-visa").json(&body).await.assert_status_ok();

        assert_eq!(mock.call_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn document_review_requires_identity() -> anyhow::Result<()> {
        let mock = MockProvider::replying("The passport expires in 2027.");
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;
        let body = json!({
            "message": "Please review my passport scan.",
            "documentId": Uuid::new_v4(),
        });

        let response = server.post("/document-review").json(&body).await;
        response.assert_status_unauthorized();
        response.assert_json(&json!({"error": "Authentication required"}));

        let response = server
            .post("/document-review")
            .authorization("Bearer not-a-jwt")
            .json(&body)
            .await;
        response.assert_status_unauthorized();
        assert_eq!(mock.call_count(), 0);

        let response = server
            .post("/document-review")
            .authorization(bearer(Uuid::new_v4())?)
            .json(&body)
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "The passport expires in 2027."}));
        assert_eq!(mock.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn reviewed_documents_reach_the_store() -> anyhow::Result<()> {
        let mock = MockProvider::replying("All pages are legible.");
        let store = MemoryDocumentStore::new();
        let factory = ProviderFactory::new(Some(ApiCredential::new("sk-test")), mock.clone());
        let gateway = Gateway::new(PersonaTable::builtin(), factory, ModelPolicy::default())
            .with_document_sink(store.clone());
        let state = ServiceState::new(gateway, AuthKeys::from_secret(SECRET));
        let server = create_test_server_with_state(routes(), state)?;

        let document_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        server
            .post("/document-review")
            .authorization(bearer(owner_id)?)
            .json(&json!({"message": "Check my I-20.", "documentId": document_id}))
            .await
            .assert_status_ok();

        let mut stored = None;
        for _ in 0..50 {
            stored = store.get(document_id).await;
            if stored.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let analysis = stored.ok_or_else(|| anyhow::anyhow!("analysis was not stored"))?;
        assert_eq!(analysis.owner_id, owner_id);
        assert_eq!(analysis.content, "All pages are legible.");
        Ok(())
    }

    #[tokio::test]
    async fn image_agent_accepts_base64_images() -> anyhow::Result<()> {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD;

        let mock = MockProvider::replying("This is an I-94 record.");
        let server = create_test_server_with_state(routes(), state_with(&mock, Some("sk-test")))?;

        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let response = server
            .post("/image")
            .json(&json!({"image": STANDARD.encode(png)}))
            .await;
        response.assert_status_ok();
        assert!(mock.requests()[0].has_image());

        let response = server.post("/image").json(&json!({"prompt": "Read it"})).await;
        response.assert_status_bad_request();
        response.assert_json(&json!({"error": "Image is required"}));
        Ok(())
    }
}
