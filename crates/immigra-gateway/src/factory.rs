//! Provider client factory.

use std::fmt;
use std::sync::Arc;

use immigra_service::completion::{ApiCredential, CompletionService, ProviderConnector};
use tokio::sync::OnceCell;

use crate::{GatewayError, Result};

/// Tracing target for client construction.
const TRACING_TARGET: &str = "immigra_gateway::factory";

/// Configured completion client together with the credential it uses.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    pub credential: ApiCredential,
    pub service: CompletionService,
}

/// Builds the process-wide provider client on first use.
///
/// Construction performs no network I/O. Concurrent callers share one
/// construction; a missing credential is reported on every call and never
/// cached.
#[derive(Clone)]
pub struct ProviderFactory {
    credential: Option<ApiCredential>,
    connector: Arc<dyn ProviderConnector>,
    client: Arc<OnceCell<ProviderClient>>,
}

impl fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("credential", &self.credential)
            .field("initialized", &self.client.initialized())
            .finish_non_exhaustive()
    }
}

impl ProviderFactory {
    /// Creates a factory from an optional credential and a connector.
    pub fn new<C>(credential: Option<ApiCredential>, connector: C) -> Self
    where
        C: ProviderConnector + 'static,
    {
        Self {
            credential: credential.filter(|c| !c.is_blank()),
            connector: Arc::new(connector),
            client: Arc::new(OnceCell::new()),
        }
    }

    /// Returns true if a credential is configured.
    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    /// Returns the cached client, building it on first use.
    pub async fn get_client(&self) -> Result<ProviderClient> {
        let Some(credential) = &self.credential else {
            tracing::error!(
                target: TRACING_TARGET,
                "Completion provider credential is not configured"
            );
            return Err(GatewayError::configuration(
                "OpenAI API key is not configured",
            ));
        };

        let client = self
            .client
            .get_or_try_init(|| async {
                let service = self.connector.connect(credential).map_err(|error| {
                    GatewayError::configuration("Failed to initialize the completion provider")
                        .with_details(error.detail())
                        .with_source(error)
                })?;

                tracing::info!(
                    target: TRACING_TARGET,
                    credential = %credential,
                    "Completion provider client initialized"
                );

                Ok::<_, GatewayError>(ProviderClient {
                    credential: credential.clone(),
                    service,
                })
            })
            .await?;

        Ok(client.clone())
    }
}

#[cfg(test)]
mod tests {
    use immigra_service::MockProvider;

    use super::*;
    use crate::GatewayErrorKind;

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let mock = MockProvider::default();
        let factory = ProviderFactory::new(None, mock.clone());
        let error = factory.get_client().await.unwrap_err();
        assert_eq!(error.kind, GatewayErrorKind::Configuration);
        assert!(!factory.is_configured());

        let blank = ProviderFactory::new(Some(ApiCredential::new("  ")), mock.clone());
        assert!(blank.get_client().await.is_err());
        assert_eq!(mock.connect_count(), 0);
    }

    #[tokio::test]
    async fn client_is_built_once() {
        let mock = MockProvider::default();
        let factory = ProviderFactory::new(Some(ApiCredential::new("sk-test")), mock.clone());

        let clones: Vec<_> = (0..8).map(|_| factory.clone()).collect();
        let handles: Vec<_> = clones
            .into_iter()
            .map(|f| tokio::spawn(async move { f.get_client().await.map(|c| c.credential) }))
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().expose(), "sk-test");
        }

        assert_eq!(mock.connect_count(), 1);
    }
}
