//! Lazy construction of OpenAI-backed completion services.

use immigra_service::completion::{ApiCredential, CompletionService, ProviderConnector};

use crate::{LlmClient, LlmConfig};

/// Builds [`LlmClient`]-backed services from an API key.
#[derive(Debug, Clone, Default)]
pub struct OpenAiConnector {
    config: LlmConfig,
}

impl OpenAiConnector {
    /// Creates a connector sharing the given client configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

impl ProviderConnector for OpenAiConnector {
    fn connect(&self, credential: &ApiCredential) -> immigra_service::Result<CompletionService> {
        let client = LlmClient::new(credential.clone(), self.config.clone())?;
        Ok(client.into_service())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_does_not_touch_the_network() {
        let config = LlmConfig::builder()
            .with_base_url("http://127.0.0.1:9/v1")
            .build()
            .unwrap();
        let connector = OpenAiConnector::new(config);
        assert!(connector.connect(&ApiCredential::new("sk-test")).is_ok());
    }

    #[test]
    fn header_unsafe_key_is_rejected() {
        let connector = OpenAiConnector::default();
        let error = connector
            .connect(&ApiCredential::new("sk-bad\nkey"))
            .unwrap_err();
        assert!(error.is_invalid_credential());
    }
}
