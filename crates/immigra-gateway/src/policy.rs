//! Model selection policy.

use immigra_service::completion::ApiCredential;

use crate::PersonaConfig;

/// Key prefix of project-scoped credentials, which are routed to the
/// cheaper model.
pub const DEFAULT_RESTRICTED_PREFIX: &str = "sk-proj-";

/// Chooses a model from the persona's candidates based on the credential.
///
/// Pure and deterministic. An empty prefix disables the economy route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPolicy {
    restricted_prefix: String,
}

impl ModelPolicy {
    pub fn new(restricted_prefix: impl Into<String>) -> Self {
        Self {
            restricted_prefix: restricted_prefix.into(),
        }
    }

    /// Returns true if the credential is a restricted-cost key.
    pub fn is_restricted(&self, credential: &ApiCredential) -> bool {
        credential.has_prefix(&self.restricted_prefix)
    }

    /// Selects the model for a call.
    pub fn select<'a>(&self, credential: &ApiCredential, persona: &'a PersonaConfig) -> &'a str {
        if self.is_restricted(credential) {
            persona.economy_model()
        } else {
            persona.default_model()
        }
    }
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESTRICTED_PREFIX)
    }
}
