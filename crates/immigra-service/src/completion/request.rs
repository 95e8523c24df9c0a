//! Completion request type.

use uuid::Uuid;

use super::Message;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default upper bound on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// A single chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Unique identifier used to correlate logs.
    pub request_id: Uuid,
    /// Model identifier understood by the provider.
    pub model: String,
    /// Ordered conversation, system message first.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Creates a new request with default sampling parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            model: model.into(),
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum number of generated tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Returns true if any message carries an image.
    pub fn has_image(&self) -> bool {
        self.messages.iter().any(|m| m.content.has_image())
    }
}
