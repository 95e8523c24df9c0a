//! OpenAI client and configuration.

mod llm_client;
mod llm_config;
mod wire;

pub use llm_client::LlmClient;
pub use llm_config::{LlmConfig, LlmConfigBuilder, LlmConfigBuilderError};
pub(crate) use wire::ErrorEnvelope;

/// Tracing target for OpenAI client operations.
pub const TRACING_TARGET: &str = "immigra_openai::client";
