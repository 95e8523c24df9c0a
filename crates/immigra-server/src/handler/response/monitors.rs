//! Monitor response types.

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Health status response.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Whether the server is able to serve requests.
    pub is_healthy: bool,
    /// Whether a completion provider credential is configured.
    pub provider_configured: bool,
    /// Timestamp when this status was generated.
    pub updated_at: Timestamp,
}

impl HealthStatus {
    pub fn new(provider_configured: bool) -> Self {
        Self {
            is_healthy: true,
            provider_configured,
            updated_at: Timestamp::now(),
        }
    }
}
