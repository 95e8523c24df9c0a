//! Health monitoring handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use immigra_gateway::Gateway;

use crate::extract::Json;
use crate::handler::response::HealthStatus;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "immigra_server::handler::monitors";

/// Reports server health and whether a provider credential is configured.
///
/// Never contacts the provider.
#[tracing::instrument(skip_all)]
async fn health_status(State(gateway): State<Gateway>) -> Json<HealthStatus> {
    let status = HealthStatus::new(gateway.is_configured());

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy = status.is_healthy,
        provider_configured = status.provider_configured,
        "Health status response prepared"
    );

    Json(status)
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get system health status")
        .description("Reports whether the server is up and a provider credential is configured.")
        .response::<200, Json<HealthStatus>>()
}

/// Returns routes for health monitoring.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Health"))
}

#[cfg(test)]
mod tests {
    use immigra_gateway::{ModelPolicy, PersonaTable, ProviderFactory};
    use immigra_service::{ApiCredential, MockProvider};

    use super::*;
    use crate::handler::test::create_test_server_with_state;
    use crate::service::AuthKeys;

    fn state_with(api_key: Option<&str>) -> ServiceState {
        let factory = ProviderFactory::new(api_key.map(ApiCredential::new), MockProvider::default());
        let gateway = Gateway::new(PersonaTable::builtin(), factory, ModelPolicy::default());
        ServiceState::new(gateway, AuthKeys::disabled())
    }

    #[tokio::test]
    async fn reports_provider_configuration() -> anyhow::Result<()> {
        let server = create_test_server_with_state(routes(), state_with(Some("sk-test")))?;
        let response = server.get("/health").await;
        response.assert_status_ok();

        let status = response.json::<HealthStatus>();
        assert!(status.is_healthy);
        assert!(status.provider_configured);

        let elapsed = jiff::Timestamp::now().duration_since(status.updated_at);
        assert!(elapsed.as_secs() < 60, "timestamp should be recent");
        Ok(())
    }

    #[tokio::test]
    async fn healthy_without_credential() -> anyhow::Result<()> {
        let server = create_test_server_with_state(routes(), state_with(None))?;
        let response = server.get("/health").await;
        response.assert_status_ok();

        let status = response.json::<HealthStatus>();
        assert!(status.is_healthy);
        assert!(!status.provider_configured);
        Ok(())
    }
}
