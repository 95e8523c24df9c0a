use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use immigra_gateway::{Gateway, ModelPolicy, PersonaTable, ProviderFactory};
use immigra_openai::{LlmConfig, OpenAiConnector};
use immigra_service::ApiCredential;
use serde::{Deserialize, Serialize};

use crate::service::{AuthKeys, Result, ServiceError};

/// Default values for configuration options.
mod defaults {
    /// Default upper bound on a single completion call, in seconds.
    pub const PROVIDER_TIMEOUT_SECS: u64 = 30;

    /// Default prefix of restricted-cost credentials.
    pub const RESTRICTED_KEY_PREFIX: &str = immigra_gateway::DEFAULT_RESTRICTED_PREFIX;

    /// Default model for unrestricted credentials.
    pub const DEFAULT_MODEL: &str = immigra_gateway::DEFAULT_MODEL;

    /// Default model for restricted credentials.
    pub const ECONOMY_MODEL: &str = immigra_gateway::ECONOMY_MODEL;

    /// Default number of document analyses kept in memory.
    pub const DOCUMENT_STORE_CAPACITY: usize = immigra_service::DEFAULT_DOCUMENT_CAPACITY;
}

/// Validates the ServiceConfig before building.
fn validate_config(builder: &ServiceConfigBuilder) -> std::result::Result<(), String> {
    if builder.provider_timeout_secs == Some(0) {
        return Err("Provider timeout must be greater than zero".to_owned());
    }

    if builder.document_store_capacity == Some(0) {
        return Err("Document store capacity must be greater than zero".to_owned());
    }

    for (name, model) in [
        ("default", &builder.default_model),
        ("economy", &builder.economy_model),
    ] {
        if model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(format!("The {name} model name must not be empty"));
        }
    }

    Ok(())
}

/// App [`state`] configuration.
///
/// A missing `OPENAI_API_KEY` is not a startup error: the server still runs
/// and every agent request fails with a configuration error.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "validate_config")
)]
pub struct ServiceConfig {
    /// OpenAI API key used for every completion call.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAI_API_KEY", hide_env_values = true)
    )]
    #[builder(default)]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL.
    #[cfg_attr(feature = "config", arg(long, env = "OPENAI_BASE_URL"))]
    #[builder(default)]
    pub openai_base_url: Option<String>,

    /// OpenAI organization sent as the `OpenAI-Organization` header.
    #[cfg_attr(feature = "config", arg(long, env = "OPENAI_ORGANIZATION"))]
    #[builder(default)]
    pub openai_organization: Option<String>,

    /// Upper bound on a single completion call, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PROVIDER_TIMEOUT", default_value = "30")
    )]
    #[builder(default = "defaults::PROVIDER_TIMEOUT_SECS")]
    pub provider_timeout_secs: u64,

    /// Credentials starting with this prefix are routed to the economy model.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "RESTRICTED_KEY_PREFIX", default_value = "sk-proj-")
    )]
    #[builder(default = "defaults::RESTRICTED_KEY_PREFIX.to_owned()")]
    pub restricted_key_prefix: String,

    /// Model used for unrestricted credentials.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "DEFAULT_MODEL", default_value = "gpt-4o")
    )]
    #[builder(default = "defaults::DEFAULT_MODEL.to_owned()")]
    pub default_model: String,

    /// Model used for restricted credentials.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ECONOMY_MODEL", default_value = "gpt-4o-mini")
    )]
    #[builder(default = "defaults::ECONOMY_MODEL.to_owned()")]
    pub economy_model: String,

    /// Shared secret verifying HS256 identity tokens.
    ///
    /// Without it every caller is anonymous.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "AUTH_SECRET", hide_env_values = true)
    )]
    #[builder(default)]
    pub auth_secret: Option<String>,

    /// Most document analyses kept in memory; the oldest is evicted first.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "DOCUMENT_STORE_CAPACITY", default_value = "1024")
    )]
    #[builder(default = "defaults::DOCUMENT_STORE_CAPACITY")]
    pub document_store_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            openai_organization: None,
            provider_timeout_secs: defaults::PROVIDER_TIMEOUT_SECS,
            restricted_key_prefix: defaults::RESTRICTED_KEY_PREFIX.to_owned(),
            default_model: defaults::DEFAULT_MODEL.to_owned(),
            economy_model: defaults::ECONOMY_MODEL.to_owned(),
            auth_secret: None,
            document_store_capacity: defaults::DOCUMENT_STORE_CAPACITY,
        }
    }
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the provider call timeout as a Duration.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Returns the configured credential, if any and not blank.
    pub fn api_credential(&self) -> Option<ApiCredential> {
        self.openai_api_key
            .as_deref()
            .map(ApiCredential::new)
            .filter(|credential| !credential.is_blank())
    }

    /// Builds the OpenAI client configuration.
    pub fn llm_config(&self) -> Result<LlmConfig> {
        let mut builder = LlmConfig::builder().with_request_timeout(self.provider_timeout());
        if let Some(base_url) = &self.openai_base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        if let Some(organization) = &self.openai_organization {
            builder = builder.with_organization(organization.clone());
        }

        builder.build().map_err(|e| {
            ServiceError::external_service_with_source("OpenAI", "Invalid client configuration", e)
        })
    }

    /// Returns the persona table with the configured models.
    pub fn personas(&self) -> PersonaTable {
        PersonaTable::with_models(&self.default_model, &self.economy_model)
    }

    /// Returns the model selection policy.
    pub fn model_policy(&self) -> ModelPolicy {
        ModelPolicy::new(self.restricted_key_prefix.clone())
    }

    /// Creates the agent gateway backed by the OpenAI connector.
    ///
    /// No network I/O happens here; the provider client is built on first use.
    pub fn create_gateway(&self) -> Result<Gateway> {
        let connector = OpenAiConnector::new(self.llm_config()?);
        let factory = ProviderFactory::new(self.api_credential(), connector);
        Ok(Gateway::new(self.personas(), factory, self.model_policy()))
    }

    /// Loads the identity token verification keys.
    pub fn load_auth_keys(&self) -> AuthKeys {
        self.auth_secret
            .as_deref()
            .map(AuthKeys::from_secret)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() -> anyhow::Result<()> {
        let config = ServiceConfig::builder()
            .with_openai_api_key("sk-test")
            .build()?;

        assert_eq!(config.provider_timeout(), Duration::from_secs(30));
        assert_eq!(config.restricted_key_prefix, "sk-proj-");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.economy_model, "gpt-4o-mini");
        assert_eq!(config.api_credential().map(|c| c.expose().to_owned()).as_deref(), Some("sk-test"));
        assert!(!config.load_auth_keys().is_enabled());
        assert_eq!(config.document_store_capacity, 1024);
        Ok(())
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(
            ServiceConfig::builder()
                .with_provider_timeout_secs(0u64)
                .build()
                .is_err()
        );
        assert!(
            ServiceConfig::builder()
                .with_economy_model("  ")
                .build()
                .is_err()
        );
        assert!(
            ServiceConfig::builder()
                .with_document_store_capacity(0usize)
                .build()
                .is_err()
        );
    }

    #[test]
    fn blank_key_is_not_a_credential() {
        let config = ServiceConfig {
            openai_api_key: Some("   ".into()),
            ..ServiceConfig::default()
        };
        assert!(config.api_credential().is_none());
        assert!(!config.create_gateway().is_ok_and(|g| g.is_configured()));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = ServiceConfig {
            openai_base_url: Some("ftp://example.com".into()),
            ..ServiceConfig::default()
        };
        assert!(config.llm_config().is_err());
    }
}
