//! Application state and dependency injection.

mod auth_keys;
mod config;
mod error;
mod state;

pub use crate::service::auth_keys::AuthKeys;
pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder, ServiceConfigBuilderError};
pub use crate::service::error::{Result, ServiceError};
pub use crate::service::state::ServiceState;
