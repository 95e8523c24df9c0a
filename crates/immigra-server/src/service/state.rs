//! Application state and dependency injection.

use immigra_gateway::Gateway;
use immigra_service::MemoryDocumentStore;

use crate::service::{AuthKeys, Result, ServiceConfig};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    gateway: Gateway,
    auth_keys: AuthKeys,
}

impl ServiceState {
    /// Creates the state from already constructed services.
    pub fn new(gateway: Gateway, auth_keys: AuthKeys) -> Self {
        Self { gateway, auth_keys }
    }

    /// Initializes application state from configuration.
    ///
    /// Document reviews are kept in a bounded in-memory store.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let gateway = config
            .create_gateway()?
            .with_document_sink(MemoryDocumentStore::with_capacity(
                config.document_store_capacity,
            ));

        Ok(Self::new(gateway, config.load_auth_keys()))
    }

    /// Returns true if a completion provider credential is configured.
    pub fn is_provider_configured(&self) -> bool {
        self.gateway.is_configured()
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(gateway: Gateway);
impl_di!(auth_keys: AuthKeys);
